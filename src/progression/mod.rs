//! Progression systems

pub mod xp;
pub mod allocation;
pub mod quest_log;
pub mod transfer;

pub use xp::{LevelTable, LevelProgress, MAX_LEVEL, STANDARD_CAPS};
pub use allocation::{Participant, divide_exp, weight};
pub use quest_log::{GoldDice, QUEST_LOG_GOLD, bonus_exp_for_quest_log, roll_quest_log_gold, seed_from_label};
pub use transfer::{ScaledTable, TransferEngine};
