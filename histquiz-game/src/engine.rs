//! Scenario state machine: node traversal, choice shuffling, and answer
//! resolution.
//!
//! The engine never sleeps or renders. A correct, non-terminal answer hands
//! back a [`PendingAdvance`] that the presentation layer schedules; the
//! engine only remembers which session generation that advance belongs to.
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::config::{ConfigError, EngineConfig};
use crate::data::{Choice, DataError, ScenarioNode};
use crate::semantic::{CorrectnessPredicate, CorrectnessSet, is_correct_choice};
use crate::shuffle::{ChoiceShuffler, EntropyShuffler};
use crate::state::{SessionState, SessionStatus, VisitRecord};
use crate::store::{ReferenceError, ScenarioStore, UnknownNode};

/// Every failure the engine can surface to a presentation layer.
#[derive(Debug, Error)]
pub enum QuizError {
    #[error(transparent)]
    UnknownNode(#[from] UnknownNode),
    #[error(transparent)]
    Reference(#[from] ReferenceError),
    #[error(transparent)]
    Data(#[from] DataError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("operation not allowed while session is {status}")]
    InvalidState { status: SessionStatus },
    #[error("choice reference belongs to an earlier node visit")]
    StaleChoice,
    #[error("choice index {index} out of range for node with {len} choices")]
    ChoiceOutOfRange { index: usize, len: usize },
}

/// Opaque handle to one choice of the node visit that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChoiceRef {
    epoch: u64,
    visit: u32,
    index: usize,
}

/// One entry of a rendered choice list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresentedChoice {
    pub choice_ref: ChoiceRef,
    pub text: String,
}

/// Snapshot of the current node, choices already shuffled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeView {
    pub node_id: String,
    pub description: String,
    pub choices: Vec<PresentedChoice>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Outcome {
    Incorrect,
    CorrectTerminal,
    CorrectContinue { next_node_id: String },
}

impl Outcome {
    #[must_use]
    pub const fn is_correct(&self) -> bool {
        !matches!(self, Self::Incorrect)
    }
}

/// Deferred re-render the presentation layer owes after a correct answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingAdvance {
    pub next_node_id: String,
    pub delay: Duration,
    epoch: u64,
    visit: u32,
}

/// Result of resolving one choice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub outcome: Outcome,
    pub message: String,
    /// The choice that was resolved.
    pub choice: Choice,
    pub pending: Option<PendingAdvance>,
}

/// The quiz state machine.
#[derive(Debug, Clone)]
pub struct ScenarioEngine<P = CorrectnessSet, S = EntropyShuffler> {
    store: Arc<ScenarioStore>,
    predicate: P,
    shuffler: S,
    config: EngineConfig,
    state: SessionState,
}

impl ScenarioEngine {
    /// Engine with the built-in allow-list, entropy shuffling and default
    /// config.
    #[must_use]
    pub fn with_defaults(store: impl Into<Arc<ScenarioStore>>) -> Self {
        Self::new(
            store,
            CorrectnessSet::default_allow_list(),
            EntropyShuffler::new(),
            EngineConfig::default(),
        )
    }
}

impl<P, S> ScenarioEngine<P, S>
where
    P: CorrectnessPredicate,
    S: ChoiceShuffler,
{
    #[must_use]
    pub fn new(
        store: impl Into<Arc<ScenarioStore>>,
        predicate: P,
        shuffler: S,
        config: EngineConfig,
    ) -> Self {
        Self {
            store: store.into(),
            predicate,
            shuffler,
            config,
            state: SessionState::default(),
        }
    }

    /// Begin a new session at the configured start node, discarding any
    /// previous progress.
    ///
    /// # Errors
    ///
    /// Returns [`QuizError::UnknownNode`] when the start node is missing; the
    /// session then stays [`SessionStatus::NotStarted`].
    pub fn start(&mut self) -> Result<&SessionState, QuizError> {
        self.state.reset();
        let start_id = self.config.start_node_id.as_str();
        if !self.store.contains(start_id) {
            log::warn!("start node '{start_id}' is missing from the scenario store");
            return Err(UnknownNode(start_id.to_string()).into());
        }
        self.state.arrive(start_id);
        log::info!(
            "session {} started at node '{start_id}'",
            self.state.epoch()
        );
        Ok(&self.state)
    }

    /// Abandon the session. Pending advances from it stop being current.
    pub fn reset(&mut self) {
        self.state.reset();
        log::debug!("session reset to epoch {}", self.state.epoch());
    }

    /// Current node with its choices in a fresh random order.
    ///
    /// # Errors
    ///
    /// Returns [`QuizError::InvalidState`] outside an active session, or
    /// [`QuizError::UnknownNode`] if the current id cannot be resolved.
    pub fn present_node(&mut self) -> Result<NodeView, QuizError> {
        let node = current_node_in(&self.store, &self.state)?;
        let order = self.shuffler.permutation(node.choices.len());
        let (epoch, visit) = (self.state.epoch(), self.state.visit());
        let choices = order
            .into_iter()
            .filter_map(|index| {
                node.choices.get(index).map(|choice| PresentedChoice {
                    choice_ref: ChoiceRef {
                        epoch,
                        visit,
                        index,
                    },
                    text: choice.text.clone(),
                })
            })
            .collect();
        Ok(NodeView {
            node_id: node.id.clone(),
            description: node.description.clone(),
            choices,
        })
    }

    /// Look at the choice behind a reference without resolving it.
    ///
    /// # Errors
    ///
    /// Same as [`ScenarioEngine::resolve_choice`] minus the traversal checks.
    pub fn choice(&self, choice_ref: ChoiceRef) -> Result<&Choice, QuizError> {
        let node = current_node_in(&self.store, &self.state)?;
        if choice_ref.epoch != self.state.epoch() || choice_ref.visit != self.state.visit() {
            log::warn!("rejected stale choice reference {choice_ref:?}");
            return Err(QuizError::StaleChoice);
        }
        node.choices
            .get(choice_ref.index)
            .ok_or(QuizError::ChoiceOutOfRange {
                index: choice_ref.index,
                len: node.choices.len(),
            })
    }

    /// Validate the selected choice and advance the session.
    ///
    /// # Errors
    ///
    /// - [`QuizError::InvalidState`] unless the session is in progress;
    ///   terminal sessions are never mutated.
    /// - [`QuizError::StaleChoice`] / [`QuizError::ChoiceOutOfRange`] for a
    ///   reference that does not belong to the current node visit.
    /// - [`QuizError::Reference`] when a correct choice points at a missing
    ///   node; the session is left untouched.
    pub fn resolve_choice(&mut self, choice_ref: ChoiceRef) -> Result<Resolution, QuizError> {
        let choice = self.choice(choice_ref)?.clone();
        let node_id = self
            .state
            .current_node_id()
            .unwrap_or_default()
            .to_string();
        let correct = is_correct_choice(&self.predicate, &choice.semantic_node_id);

        let (outcome, message, pending) = if !correct {
            (Outcome::Incorrect, self.config.messages.incorrect.clone(), None)
        } else if let Some(next) = choice.next() {
            if !self.store.contains(next) {
                let err = ReferenceError {
                    node_id,
                    choice_index: choice_ref.index,
                    target: next.to_string(),
                };
                log::warn!("{err}");
                return Err(err.into());
            }
            let next = next.to_string();
            (
                Outcome::CorrectContinue {
                    next_node_id: next.clone(),
                },
                self.config.messages.correct.clone(),
                Some(next),
            )
        } else {
            (Outcome::CorrectTerminal, self.config.messages.cleared(), None)
        };

        self.state.record(VisitRecord {
            node_id: node_id.clone(),
            choice_text: choice.text.clone(),
            semantic_node_id: choice.semantic_node_id.clone(),
            correct,
        });

        let pending = match (&outcome, pending) {
            (Outcome::Incorrect, _) => {
                self.state.finish(SessionStatus::GameOver);
                None
            }
            (Outcome::CorrectTerminal, _) => {
                self.state.finish(SessionStatus::GameClear);
                None
            }
            (Outcome::CorrectContinue { .. }, next) => next.map(|next_node_id| {
                self.state.arrive(&next_node_id);
                PendingAdvance {
                    next_node_id,
                    delay: self.config.advance_delay(),
                    epoch: self.state.epoch(),
                    visit: self.state.visit(),
                }
            }),
        };

        log::debug!(
            "node '{node_id}' resolved '{}' as {outcome:?}; session {}",
            choice.semantic_node_id,
            self.state.status()
        );

        Ok(Resolution {
            outcome,
            message,
            choice,
            pending,
        })
    }

    /// Whether `pending` still belongs to the live session and node visit.
    #[must_use]
    pub fn is_pending_current(&self, pending: &PendingAdvance) -> bool {
        self.state.status() == SessionStatus::InProgress
            && pending.epoch == self.state.epoch()
            && pending.visit == self.state.visit()
    }

    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        self.state.status().is_terminal()
    }

    #[must_use]
    pub const fn status(&self) -> SessionStatus {
        self.state.status()
    }

    #[must_use]
    pub const fn state(&self) -> &SessionState {
        &self.state
    }

    #[must_use]
    pub fn store(&self) -> &ScenarioStore {
        &self.store
    }

    #[must_use]
    pub const fn predicate(&self) -> &P {
        &self.predicate
    }

    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The node the session currently sits on.
    ///
    /// # Errors
    ///
    /// Returns [`QuizError::InvalidState`] outside an active session.
    pub fn current_node(&self) -> Result<&ScenarioNode, QuizError> {
        current_node_in(&self.store, &self.state)
    }
}

fn current_node_in<'a>(
    store: &'a ScenarioStore,
    state: &SessionState,
) -> Result<&'a ScenarioNode, QuizError> {
    let status = state.status();
    if status != SessionStatus::InProgress {
        return Err(QuizError::InvalidState { status });
    }
    let id = state
        .current_node_id()
        .ok_or(QuizError::InvalidState { status })?;
    Ok(store.get(id)?)
}
