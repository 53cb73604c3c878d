//! Levelshare - party XP division and level-scaled XP transfers
//!
//! Splits a session's XP pool across a party so lower levels catch up,
//! and converts XP gifted between players of different levels.

pub mod error;
pub mod config;
pub mod progression;
pub mod session;
pub mod roster;

// Re-export commonly used types
pub use error::LevelError;
pub use config::EconomyConfig;
pub use progression::{LevelTable, Participant, TransferEngine, divide_exp};
pub use session::{QuestLog, SessionMember, SessionOutcome, SessionRequest, run_session};
pub use roster::{Member, Roster};
