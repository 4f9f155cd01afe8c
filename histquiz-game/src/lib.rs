//! HistQuiz Game Engine
//!
//! Platform-agnostic core of the HistQuiz branching history quiz. This crate
//! owns scenario traversal, choice shuffling and answer validation without
//! any UI or file-system dependencies.

pub mod config;
pub mod constants;
pub mod data;
#[cfg(feature = "async")]
pub mod deferred;
pub mod engine;
pub mod semantic;
pub mod session;
pub mod shuffle;
pub mod state;
pub mod store;

// Re-export commonly used types
pub use config::{ConfigError, CorrectnessSource, EngineConfig, Messages};
pub use data::{Choice, DataError, NetworkEdge, NetworkNode, ScenarioData, ScenarioNode, SemanticNetwork};
#[cfg(feature = "async")]
pub use deferred::AdvanceTimer;
pub use engine::{
    ChoiceRef, NodeView, Outcome, PendingAdvance, PresentedChoice, QuizError, Resolution,
    ScenarioEngine,
};
pub use semantic::{
    CorrectnessPredicate, CorrectnessSet, GraphRule, Neighbor, SemanticGraph, is_correct_choice,
};
pub use session::{QuizData, QuizSession, SessionError};
pub use shuffle::{ChoiceOrder, ChoiceShuffler, EntropyShuffler, IdentityShuffler, SeededShuffler};
pub use state::{SessionState, SessionStatus, VisitRecord};
pub use store::{ReferenceError, ScenarioStore, UnknownNode};

/// Trait for abstracting data loading operations
/// Platform-specific implementations should provide this
pub trait DataLoader {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load the scenario graph from the platform-specific source
    ///
    /// # Errors
    ///
    /// Returns an error if the scenario data cannot be loaded or parsed.
    fn load_scenario_data(&self) -> Result<ScenarioData, Self::Error>;

    /// Load the semantic network, if the platform provides one
    ///
    /// # Errors
    ///
    /// Returns an error if the network exists but cannot be loaded or parsed.
    fn load_network_data(&self) -> Result<Option<SemanticNetwork>, Self::Error>;
}

/// Loader over the data files compiled into this crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct BundledLoader;

impl BundledLoader {
    pub const SCENARIO_JSON: &'static str = include_str!("../assets/data/scenario.json");
    pub const NETWORK_JSON: &'static str = include_str!("../assets/data/history_network.json");
}

impl DataLoader for BundledLoader {
    type Error = DataError;

    fn load_scenario_data(&self) -> Result<ScenarioData, Self::Error> {
        ScenarioData::from_json(Self::SCENARIO_JSON)
    }

    fn load_network_data(&self) -> Result<Option<SemanticNetwork>, Self::Error> {
        SemanticNetwork::from_json(Self::NETWORK_JSON).map(Some)
    }
}

/// Main game engine for creating quiz sessions
pub struct GameEngine<L>
where
    L: DataLoader,
{
    data_loader: L,
    config: EngineConfig,
}

impl<L> GameEngine<L>
where
    L: DataLoader,
{
    /// Create a new game engine with the provided data loader and config
    pub const fn new(data_loader: L, config: EngineConfig) -> Self {
        Self {
            data_loader,
            config,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Load and index everything a session needs.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Load`] if the loader fails and
    /// [`SessionError::Quiz`] if the data cannot be indexed.
    pub fn load_data(&self) -> Result<QuizData, SessionError<L::Error>> {
        let scenario = self
            .data_loader
            .load_scenario_data()
            .map_err(SessionError::Load)?;
        let network = self
            .data_loader
            .load_network_data()
            .map_err(SessionError::Load)?;
        Ok(QuizData::new(scenario, network)?)
    }

    /// Load data and build a fresh session using `shuffler` for choice order.
    ///
    /// # Errors
    ///
    /// Returns an error if the data cannot be loaded, indexed or validated
    /// against the engine config.
    pub fn create_session<S>(&self, shuffler: S) -> Result<QuizSession<S>, SessionError<L::Error>>
    where
        S: ChoiceShuffler,
    {
        let data = self.load_data()?;
        Ok(QuizSession::from_data(&data, self.config.clone(), shuffler)?)
    }
}
