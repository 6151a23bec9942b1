//! Errors - Construction-time contract violations and config failures
//!
//! The per-frame simulation never fails; only building a race from bad
//! inputs or loading a bad config file does.

use thiserror::Error;

/// Rejected race or lane construction
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RaceError {
    #[error("player count must be 1 or 2, got {0}")]
    InvalidPlayerCount(u8),

    #[error("tile code {0} is outside 0..=12")]
    InvalidTileCode(u8),

    #[error("malformed tile sequence: {0}")]
    MalformedSequence(String),

    #[error("lane length {0} is not one of the selectable lengths")]
    InvalidLaneLength(usize),
}

/// Failure to load or validate a [`crate::config::GameConfig`]
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}
