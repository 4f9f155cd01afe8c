//! Centralized defaults for the HistQuiz engine.
//!
//! Everything here can be overridden through [`crate::config::EngineConfig`];
//! these values are what a session uses when the config leaves a field out.

// Traversal ----------------------------------------------------------------
/// Node id every session starts from.
pub const DEFAULT_START_NODE_ID: &str = "start";
/// Pause between a correct answer and the next node being shown.
pub const ADVANCE_DELAY_MS: u64 = 2_000;

// Correctness --------------------------------------------------------------
/// Semantic ids accepted by the built-in allow-list.
pub const DEFAULT_CORRECT_IDS: [&str; 8] = [
    "sakamoto",
    "satsucho",
    "saigo",
    "okubo",
    "iwakura",
    "restoration",
    "oath",
    "abolition",
];

// Status messages ----------------------------------------------------------
pub const MESSAGE_CORRECT: &str = "Correct choice!";
pub const MESSAGE_INCORRECT: &str = "Wrong choice. Game over!";
pub const MESSAGE_GAME_CLEAR: &str = "Game clear!";

// Inline capacity for per-view choice orderings.
pub(crate) const INLINE_CHOICES: usize = 6;
