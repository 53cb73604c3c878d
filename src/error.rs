//! Error types for the leveling engine.

use thiserror::Error;

/// Everything the engine refuses to guess about.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LevelError {
    #[error("Unknown participant: {0}")]
    UnknownParticipant(String),

    #[error("Participant already exists: {0}")]
    DuplicateParticipant(String),

    #[error("Level {0} is outside 1-20")]
    InvalidLevel(u32),

    #[error("{exp}xp is not within level {level}")]
    ExpOutsideLevel { level: u32, exp: u32 },

    #[error("Level {level} + {requested} levels exceeds the level cap")]
    ExceedsMaxLevel { level: u32, requested: u32 },

    #[error("Invalid level change: {0}")]
    InvalidLevelChange(u32),

    #[error("XP pool cannot be negative ({0})")]
    NegativePool(i64),

    #[error("Invalid XP pool term: '{0}'")]
    InvalidPoolTerm(String),

    #[error("Gold cannot be negative ({0})")]
    NegativeGold(i64),

    #[error("Invalid gold expression: '{0}'")]
    InvalidGoldTerm(String),

    #[error("{holder} has {available}gp, cannot give {requested}gp")]
    InsufficientGold { holder: String, available: u64, requested: u64 },

    #[error("No participants specified")]
    EmptyParty,

    #[error("{0} cannot transfer to themselves")]
    SelfTransfer(String),

    #[error("Invalid level table: {0}")]
    InvalidLevelTable(String),

    #[error("Config error: {0}")]
    Config(String),
}

impl LevelError {
    /// Whether the error comes from caller input rather than engine setup.
    pub fn is_input_error(&self) -> bool {
        !matches!(self, LevelError::InvalidLevelTable(_) | LevelError::Config(_))
    }
}
