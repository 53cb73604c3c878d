//! Quest log rewards
//!
//! Players who write up the previous session earn a flat XP bonus and a gold
//! roll. The roll is seeded per session so replaying a session reproduces it.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::allocation::Participant;
use super::xp::{LevelTable, MAX_LEVEL};
use crate::error::LevelError;

/// Default quest log XP bonus, as a percent of the writer's current level span
pub const DEFAULT_BONUS_PERCENT: u32 = 5;

/// Gold dice for one level: `multiplier x 1d{dice_size}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoldDice {
    pub multiplier: u32,
    pub dice_size: u32,
}

const fn dice(multiplier: u32, dice_size: u32) -> GoldDice {
    GoldDice { multiplier, dice_size }
}

/// Quest log gold dice by level (index 0 is level 1)
pub const QUEST_LOG_GOLD: [GoldDice; MAX_LEVEL as usize] = [
    dice(5, 4),
    dice(10, 4),
    dice(15, 6),
    dice(20, 6),
    dice(25, 8),
    dice(30, 8),
    dice(35, 10),
    dice(40, 10),
    dice(45, 12),
    dice(50, 12),
    dice(55, 20),
    dice(60, 20),
    dice(65, 20),
    dice(70, 20),
    dice(75, 20),
    dice(80, 20),
    dice(85, 20),
    dice(90, 20),
    dice(95, 20),
    dice(100, 20),
];

/// Gold dice for a level
pub fn gold_dice(level: u32) -> Result<GoldDice, LevelError> {
    level
        .checked_sub(1)
        .and_then(|i| QUEST_LOG_GOLD.get(i as usize))
        .copied()
        .ok_or(LevelError::InvalidLevel(level))
}

/// Flat XP bonus for a quest log: `percent` of the level span, rounded up
pub fn bonus_exp_for_quest_log(table: &LevelTable, level: u32, percent: u32) -> Result<u32, LevelError> {
    let span = u64::from(table.level_span(level)?);
    Ok((span * u64::from(percent)).div_ceil(100) as u32)
}

/// Roll the quest log gold for a level
pub fn roll_quest_log_gold(level: u32, rng: &mut impl Rng) -> Result<u32, LevelError> {
    let dice = gold_dice(level)?;
    let roll = rng.gen_range(1..=dice.dice_size);
    Ok(roll * dice.multiplier)
}

/// Deterministic RNG for one session's rolls
pub fn session_rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// Turn a session label (such as its timestamp) into a stable seed.
/// FNV-1a, so the value never changes between builds.
pub fn seed_from_label(label: &str) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;

    label
        .bytes()
        .fold(OFFSET, |hash, byte| (hash ^ u64::from(byte)).wrapping_mul(PRIME))
}

/// Roll gold for every participant flagged for it, in party order
pub fn roll_gold_bonuses(participants: &mut [Participant], rng: &mut impl Rng) -> Result<u64, LevelError> {
    let mut total = 0u64;
    for participant in participants.iter_mut().filter(|p| p.quest_log_gold) {
        participant.quest_log_bonus_gold = roll_quest_log_gold(participant.level, rng)?;
        total += u64::from(participant.quest_log_bonus_gold);
    }
    Ok(total)
}

/// Add the flat XP bonus to every flagged participant after the pool has been
/// divided. The bonus is never clamped to the level cap, but crossing it
/// still counts as a level up.
pub fn apply_exp_bonuses(
    table: &LevelTable,
    participants: &mut [Participant],
    percent: u32,
) -> Result<u64, LevelError> {
    let mut total = 0u64;
    for participant in participants.iter_mut().filter(|p| p.quest_log_exp) {
        let bonus = bonus_exp_for_quest_log(table, participant.level, percent)?;
        participant.gained_exp += f64::from(bonus);
        participant.quest_log_bonus_exp = bonus;
        if table.level_from_exp(participant.new_exp()) > participant.level {
            participant.leveled_up = true;
        }
        total += u64::from(bonus);
    }
    Ok(total)
}
