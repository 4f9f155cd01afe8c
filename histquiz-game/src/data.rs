use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// Errors raised while reading scenario or network data.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("malformed {source_name} data: {error}")]
    Malformed {
        source_name: &'static str,
        #[source]
        error: serde_json::Error,
    },
    #[error("scenario node id at position {index} is blank")]
    EmptyId { index: usize },
    #[error("duplicate scenario node id '{id}'")]
    DuplicateNode { id: String },
}

impl DataError {
    pub(crate) const fn scenario(error: serde_json::Error) -> Self {
        Self::Malformed {
            source_name: "scenario",
            error,
        }
    }

    pub(crate) const fn network(error: serde_json::Error) -> Self {
        Self::Malformed {
            source_name: "network",
            error,
        }
    }
}

/// Treat a missing or `null` string as empty.
fn empty_if_null<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// A selectable option within a scenario node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Choice {
    pub text: String,
    /// Successor node; empty means the choice ends the session.
    #[serde(default, deserialize_with = "empty_if_null")]
    pub next_node_id: String,
    /// Key looked up by the correctness predicate; empty is never correct.
    #[serde(default, deserialize_with = "empty_if_null")]
    pub semantic_node_id: String,
}

impl Choice {
    #[must_use]
    pub fn new(
        text: impl Into<String>,
        next_node_id: impl Into<String>,
        semantic_node_id: impl Into<String>,
    ) -> Self {
        Self {
            text: text.into(),
            next_node_id: next_node_id.into(),
            semantic_node_id: semantic_node_id.into(),
        }
    }

    /// Successor node id, if the choice has one. Only an empty string ends
    /// the session; anything else must name a node.
    #[must_use]
    pub fn next(&self) -> Option<&str> {
        let id = self.next_node_id.as_str();
        (!id.is_empty()).then_some(id)
    }

    /// Semantic key exactly as written, if the choice carries a non-blank one.
    #[must_use]
    pub fn semantic_id(&self) -> Option<&str> {
        let id = self.semantic_node_id.as_str();
        (!id.trim().is_empty()).then_some(id)
    }
}

/// A scenario state with descriptive text and outgoing choices
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioNode {
    pub id: String,
    pub description: String,
    pub choices: Vec<Choice>,
}

/// Root of the scenario data file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ScenarioData {
    pub nodes: Vec<ScenarioNode>,
}

impl ScenarioData {
    /// Load scenario data from a JSON string
    ///
    /// # Errors
    ///
    /// Returns [`DataError::Malformed`] if the root object or any required
    /// node field is missing.
    pub fn from_json(json: &str) -> Result<Self, DataError> {
        serde_json::from_str(json).map_err(DataError::scenario)
    }

    #[must_use]
    pub fn from_nodes(nodes: Vec<ScenarioNode>) -> Self {
        Self { nodes }
    }
}

/// A concept in the semantic network (person, event, policy...)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkNode {
    pub id: String,
    #[serde(default)]
    pub label: String,
    #[serde(default, rename = "type")]
    pub kind: String,
}

/// A directed, labelled relation between two network nodes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkEdge {
    pub source: String,
    pub target: String,
    #[serde(default)]
    pub relation: String,
}

/// Root of the semantic network data file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SemanticNetwork {
    pub nodes: Vec<NetworkNode>,
    #[serde(default)]
    pub edges: Vec<NetworkEdge>,
}

impl SemanticNetwork {
    /// Load the semantic network from a JSON string
    ///
    /// # Errors
    ///
    /// Returns [`DataError::Malformed`] if the JSON does not match the
    /// network shape.
    pub fn from_json(json: &str) -> Result<Self, DataError> {
        serde_json::from_str(json).map_err(DataError::network)
    }
}
