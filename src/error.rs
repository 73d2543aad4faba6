use thiserror::Error;

/// Errors produced by the rules engine and configuration layer
///
/// None of these are fatal: the session layer treats every one of them as a
/// no-op or clamps the offending value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    #[error("invalid move, column {column} is out of range or full")]
    InvalidMove { column: usize },

    #[error("invalid move, the game is already over")]
    GameOver,

    #[error("no moves to undo")]
    EmptyHistory,

    #[error("{what} must be between {min} and {max}, got {value}")]
    ConfigurationOutOfRange {
        what: &'static str,
        value: usize,
        min: usize,
        max: usize,
    },
}
