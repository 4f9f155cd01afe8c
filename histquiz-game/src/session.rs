use std::sync::Arc;
use thiserror::Error;

use crate::config::EngineConfig;
use crate::data::{ScenarioData, SemanticNetwork};
use crate::engine::{ChoiceRef, NodeView, QuizError, Resolution, ScenarioEngine};
use crate::semantic::{CorrectnessSet, SemanticGraph};
use crate::shuffle::ChoiceShuffler;
use crate::state::{SessionState, SessionStatus};
use crate::store::ScenarioStore;

/// Failure while assembling a session from a [`crate::DataLoader`].
#[derive(Debug, Error)]
pub enum SessionError<E>
where
    E: std::error::Error + 'static,
{
    #[error("failed to load quiz data")]
    Load(#[source] E),
    #[error(transparent)]
    Quiz(#[from] QuizError),
}

/// Loaded quiz data shared by any number of sessions.
#[derive(Debug, Clone)]
pub struct QuizData {
    pub store: Arc<ScenarioStore>,
    pub graph: Option<Arc<SemanticGraph>>,
}

impl QuizData {
    /// Index scenario data and, when present, the semantic network.
    ///
    /// # Errors
    ///
    /// Returns [`QuizError::Data`] for duplicate or blank node ids.
    pub fn new(
        scenario: ScenarioData,
        network: Option<SemanticNetwork>,
    ) -> Result<Self, QuizError> {
        let store = ScenarioStore::from_data(scenario)?;
        Ok(Self {
            store: Arc::new(store),
            graph: network.map(|network| Arc::new(SemanticGraph::new(network))),
        })
    }
}

/// High-level session wrapper binding the engine to the data it was built
/// from.
#[derive(Debug)]
pub struct QuizSession<S = Box<dyn ChoiceShuffler + Send>> {
    engine: ScenarioEngine<CorrectnessSet, S>,
    graph: Option<Arc<SemanticGraph>>,
}

impl<S: ChoiceShuffler> QuizSession<S> {
    /// Build a session over already-loaded data.
    ///
    /// # Errors
    ///
    /// Returns [`QuizError::Config`] for an invalid config or a
    /// network-derived correctness source without network data, and
    /// [`QuizError::Reference`] when eager reference validation is enabled
    /// and finds a dangling choice.
    pub fn from_data(data: &QuizData, config: EngineConfig, shuffler: S) -> Result<Self, QuizError> {
        config.validate()?;
        if config.validate_references_on_load {
            data.store.validate_references()?;
        }
        let predicate = config.correctness.build(data.graph.as_deref())?;
        log::debug!(
            "session built over {} nodes with {} accepted semantic ids",
            data.store.len(),
            predicate.len()
        );
        Ok(Self {
            engine: ScenarioEngine::new(Arc::clone(&data.store), predicate, shuffler, config),
            graph: data.graph.clone(),
        })
    }

    /// See [`ScenarioEngine::start`].
    ///
    /// # Errors
    ///
    /// Returns [`QuizError::UnknownNode`] when the start node is missing.
    pub fn start(&mut self) -> Result<&SessionState, QuizError> {
        self.engine.start()
    }

    /// See [`ScenarioEngine::present_node`].
    ///
    /// # Errors
    ///
    /// Returns [`QuizError::InvalidState`] outside an active session.
    pub fn present_node(&mut self) -> Result<NodeView, QuizError> {
        self.engine.present_node()
    }

    /// See [`ScenarioEngine::resolve_choice`].
    ///
    /// # Errors
    ///
    /// Propagates every [`ScenarioEngine::resolve_choice`] failure.
    pub fn resolve_choice(&mut self, choice_ref: ChoiceRef) -> Result<Resolution, QuizError> {
        self.engine.resolve_choice(choice_ref)
    }

    pub fn reset(&mut self) {
        self.engine.reset();
    }

    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        self.engine.is_terminal()
    }

    #[must_use]
    pub const fn status(&self) -> SessionStatus {
        self.engine.status()
    }

    #[must_use]
    pub const fn state(&self) -> &SessionState {
        self.engine.state()
    }

    /// Borrow the engine.
    #[must_use]
    pub const fn engine(&self) -> &ScenarioEngine<CorrectnessSet, S> {
        &self.engine
    }

    /// Semantic network the session was built with, if any.
    #[must_use]
    pub fn graph(&self) -> Option<&SemanticGraph> {
        self.graph.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CorrectnessSource;
    use crate::data::{Choice, ScenarioNode};
    use crate::shuffle::IdentityShuffler;

    fn data() -> QuizData {
        QuizData::new(
            ScenarioData::from_nodes(vec![ScenarioNode {
                id: "start".to_string(),
                description: "Who led the 1873 return from Europe?".to_string(),
                choices: vec![
                    Choice::new("Iwakura Tomomi", "", "iwakura"),
                    Choice::new("A detour", "gone", "okubo"),
                ],
            }]),
            Some(
                SemanticNetwork::from_json(
                    r#"{ "nodes": [ { "id": "iwakura", "label": "Iwakura Tomomi", "type": "person" } ] }"#,
                )
                .unwrap(),
            ),
        )
        .unwrap()
    }

    #[test]
    fn eager_validation_rejects_dangling_choices() {
        let config = EngineConfig {
            validate_references_on_load: true,
            ..EngineConfig::default()
        };
        let err = QuizSession::from_data(&data(), config, IdentityShuffler).unwrap_err();
        assert!(matches!(err, QuizError::Reference(_)));
    }

    #[test]
    fn lazy_validation_builds_the_session() {
        let mut session =
            QuizSession::from_data(&data(), EngineConfig::default(), IdentityShuffler).unwrap();
        session.start().unwrap();
        assert_eq!(session.status(), SessionStatus::InProgress);
        assert_eq!(session.graph().map(SemanticGraph::node_count), Some(1));
    }

    #[test]
    fn network_correctness_drives_validation() {
        let config = EngineConfig {
            correctness: CorrectnessSource::Network {
                types: vec!["person".to_string()],
                relations: Vec::new(),
            },
            ..EngineConfig::default()
        };
        let mut session = QuizSession::from_data(&data(), config, IdentityShuffler).unwrap();
        session.start().unwrap();
        let view = session.present_node().unwrap();
        let resolution = session.resolve_choice(view.choices[0].choice_ref).unwrap();
        assert!(resolution.outcome.is_correct());
        assert_eq!(session.status(), SessionStatus::GameClear);
    }
}
