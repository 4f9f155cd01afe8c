use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::constants::{
    ADVANCE_DELAY_MS, DEFAULT_CORRECT_IDS, DEFAULT_START_NODE_ID, MESSAGE_CORRECT,
    MESSAGE_GAME_CLEAR, MESSAGE_INCORRECT,
};
use crate::semantic::{CorrectnessSet, GraphRule, SemanticGraph};

/// Errors raised when engine configuration invariants are violated.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("start node id must not be blank")]
    BlankStartNode,
    #[error("correctness allow-list is empty")]
    EmptyAllowList,
    #[error("network correctness rule lists no node types or relations")]
    EmptyGraphRule,
    #[error("network correctness requires semantic network data")]
    MissingNetwork,
    #[error("invalid engine config: {0}")]
    Parse(String),
}

/// Where the engine's notion of "historically correct" comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum CorrectnessSource {
    /// Fixed list of semantic ids.
    AllowList {
        #[serde(default = "CorrectnessSource::default_ids")]
        ids: Vec<String>,
    },
    /// Derive the accepted ids from the semantic network.
    Network {
        #[serde(default)]
        types: Vec<String>,
        #[serde(default)]
        relations: Vec<String>,
    },
}

impl CorrectnessSource {
    fn default_ids() -> Vec<String> {
        DEFAULT_CORRECT_IDS.iter().map(ToString::to_string).collect()
    }

    /// Build the concrete correctness set for a session.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingNetwork`] when the source is
    /// network-derived and no graph was loaded.
    pub fn build(&self, graph: Option<&SemanticGraph>) -> Result<CorrectnessSet, ConfigError> {
        match self {
            Self::AllowList { ids } => Ok(CorrectnessSet::new(ids.iter().cloned())),
            Self::Network { types, relations } => {
                let rule = GraphRule {
                    types: types.clone(),
                    relations: relations.clone(),
                };
                graph
                    .map(|graph| graph.correct_set(&rule))
                    .ok_or(ConfigError::MissingNetwork)
            }
        }
    }

    #[must_use]
    pub const fn needs_network(&self) -> bool {
        matches!(self, Self::Network { .. })
    }
}

impl Default for CorrectnessSource {
    fn default() -> Self {
        Self::AllowList {
            ids: Self::default_ids(),
        }
    }
}

/// Status texts attached to resolution results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Messages {
    #[serde(default = "Messages::default_correct")]
    pub correct: String,
    #[serde(default = "Messages::default_incorrect")]
    pub incorrect: String,
    #[serde(default = "Messages::default_game_clear")]
    pub game_clear: String,
}

impl Messages {
    fn default_correct() -> String {
        MESSAGE_CORRECT.to_string()
    }

    fn default_incorrect() -> String {
        MESSAGE_INCORRECT.to_string()
    }

    fn default_game_clear() -> String {
        MESSAGE_GAME_CLEAR.to_string()
    }

    /// Text shown when the last correct answer ends the session.
    #[must_use]
    pub fn cleared(&self) -> String {
        format!("{}\n{}", self.correct, self.game_clear)
    }
}

impl Default for Messages {
    fn default() -> Self {
        Self {
            correct: Self::default_correct(),
            incorrect: Self::default_incorrect(),
            game_clear: Self::default_game_clear(),
        }
    }
}

/// Tunable engine behavior.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "EngineConfig::default_start_node_id")]
    pub start_node_id: String,
    #[serde(default = "EngineConfig::default_advance_delay_ms")]
    pub advance_delay_ms: u64,
    /// Run the referential-integrity pass when the session is built.
    #[serde(default)]
    pub validate_references_on_load: bool,
    #[serde(default)]
    pub correctness: CorrectnessSource,
    #[serde(default)]
    pub messages: Messages,
}

impl EngineConfig {
    fn default_start_node_id() -> String {
        DEFAULT_START_NODE_ID.to_string()
    }

    const fn default_advance_delay_ms() -> u64 {
        ADVANCE_DELAY_MS
    }

    /// Parse and validate a config from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] on malformed JSON, or the first
    /// invariant violation reported by [`EngineConfig::validate`].
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check config invariants.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.start_node_id.trim().is_empty() {
            return Err(ConfigError::BlankStartNode);
        }
        match &self.correctness {
            CorrectnessSource::AllowList { ids } if ids.iter().all(|id| id.trim().is_empty()) => {
                Err(ConfigError::EmptyAllowList)
            }
            CorrectnessSource::Network { types, relations }
                if types.is_empty() && relations.is_empty() =>
            {
                Err(ConfigError::EmptyGraphRule)
            }
            _ => Ok(()),
        }
    }

    #[must_use]
    pub const fn advance_delay(&self) -> Duration {
        Duration::from_millis(self.advance_delay_ms)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            start_node_id: Self::default_start_node_id(),
            advance_delay_ms: Self::default_advance_delay_ms(),
            validate_references_on_load: false,
            correctness: CorrectnessSource::default(),
            messages: Messages::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::SemanticNetwork;

    #[test]
    fn empty_json_yields_defaults() {
        let config = EngineConfig::from_json("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.start_node_id, "start");
        assert_eq!(config.advance_delay(), Duration::from_millis(2_000));
        assert!(!config.validate_references_on_load);
        assert_eq!(config.messages.cleared(), "Correct choice!\nGame clear!");
    }

    #[test]
    fn allow_list_without_ids_uses_builtin_answers() {
        let config = EngineConfig::from_json(r#"{ "correctness": { "source": "allow_list" } }"#)
            .unwrap();
        let set = config.correctness.build(None).unwrap();
        assert_eq!(set, CorrectnessSet::default_allow_list());
    }

    #[test]
    fn network_source_needs_a_graph() {
        let config = EngineConfig::from_json(
            r#"{ "correctness": { "source": "network", "types": ["person"] } }"#,
        )
        .unwrap();
        assert!(config.correctness.needs_network());
        assert_eq!(
            config.correctness.build(None).unwrap_err(),
            ConfigError::MissingNetwork
        );

        let graph = SemanticGraph::new(
            SemanticNetwork::from_json(
                r#"{ "nodes": [ { "id": "okubo", "label": "Okubo Toshimichi", "type": "person" } ] }"#,
            )
            .unwrap(),
        );
        let set = config.correctness.build(Some(&graph)).unwrap();
        assert!(set.contains("okubo"));
    }

    #[test]
    fn invariants_are_enforced() {
        assert_eq!(
            EngineConfig::from_json(r#"{ "start_node_id": "  " }"#).unwrap_err(),
            ConfigError::BlankStartNode
        );
        assert_eq!(
            EngineConfig::from_json(r#"{ "correctness": { "source": "allow_list", "ids": [] } }"#)
                .unwrap_err(),
            ConfigError::EmptyAllowList
        );
        assert_eq!(
            EngineConfig::from_json(r#"{ "correctness": { "source": "network" } }"#).unwrap_err(),
            ConfigError::EmptyGraphRule
        );
        assert!(matches!(
            EngineConfig::from_json("[1, 2]"),
            Err(ConfigError::Parse(_))
        ));
    }
}
