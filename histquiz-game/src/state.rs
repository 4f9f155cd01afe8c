use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of a quiz session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    #[default]
    NotStarted,
    InProgress,
    /// A wrong answer ended the session.
    GameOver,
    /// A correct answer with no successor ended the session.
    GameClear,
}

impl SessionStatus {
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::GameOver | Self::GameClear)
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::NotStarted => "not started",
            Self::InProgress => "in progress",
            Self::GameOver => "game over",
            Self::GameClear => "game clear",
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One answered node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisitRecord {
    pub node_id: String,
    pub choice_text: String,
    pub semantic_node_id: String,
    pub correct: bool,
}

/// Mutable session ledger, owned and mutated only by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SessionState {
    current_node_id: Option<String>,
    status: SessionStatus,
    /// Session generation; bumped on every start and reset.
    epoch: u64,
    /// Node arrivals within the current epoch.
    visit: u32,
    #[serde(default)]
    history: Vec<VisitRecord>,
}

impl SessionState {
    #[must_use]
    pub fn current_node_id(&self) -> Option<&str> {
        self.current_node_id.as_deref()
    }

    #[must_use]
    pub const fn status(&self) -> SessionStatus {
        self.status
    }

    #[must_use]
    pub const fn epoch(&self) -> u64 {
        self.epoch
    }

    #[must_use]
    pub const fn visit(&self) -> u32 {
        self.visit
    }

    #[must_use]
    pub fn history(&self) -> &[VisitRecord] {
        &self.history
    }

    /// Number of correctly answered nodes.
    #[must_use]
    pub fn correct_answers(&self) -> usize {
        self.history.iter().filter(|record| record.correct).count()
    }

    pub(crate) fn reset(&mut self) {
        self.epoch = self.epoch.wrapping_add(1);
        self.visit = 0;
        self.current_node_id = None;
        self.status = SessionStatus::NotStarted;
        self.history.clear();
    }

    pub(crate) fn arrive(&mut self, node_id: &str) {
        self.current_node_id = Some(node_id.to_string());
        self.status = SessionStatus::InProgress;
        self.visit = self.visit.saturating_add(1);
    }

    pub(crate) fn record(&mut self, record: VisitRecord) {
        self.history.push(record);
    }

    pub(crate) const fn finish(&mut self, status: SessionStatus) {
        self.status = status;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_bumps_epoch_and_clears_progress() {
        let mut state = SessionState::default();
        state.arrive("start");
        state.record(VisitRecord {
            node_id: "start".to_string(),
            choice_text: "Broker the alliance".to_string(),
            semantic_node_id: "sakamoto".to_string(),
            correct: true,
        });
        assert_eq!(state.visit(), 1);
        assert_eq!(state.correct_answers(), 1);

        state.reset();
        assert_eq!(state.epoch(), 1);
        assert_eq!(state.visit(), 0);
        assert_eq!(state.status(), SessionStatus::NotStarted);
        assert!(state.current_node_id().is_none());
        assert!(state.history().is_empty());
    }

    #[test]
    fn terminal_statuses() {
        assert!(SessionStatus::GameOver.is_terminal());
        assert!(SessionStatus::GameClear.is_terminal());
        assert!(!SessionStatus::InProgress.is_terminal());
        assert!(!SessionStatus::NotStarted.is_terminal());
        assert_eq!(SessionStatus::GameClear.to_string(), "game clear");
    }
}
