//! Party XP division
//!
//! Splits a shared XP pool across a party so that lower levels catch up.
//! Shares that would carry someone past their next level stop at the cap and
//! the overflow is divided again among everyone still below theirs.

use std::f64::consts::SQRT_2;

use serde::{Deserialize, Serialize};

use super::xp::LevelTable;
use crate::error::LevelError;

/// Gains this close to a whole number are float noise, not a fraction to round up
const SNAP_EPSILON: f64 = 1e-9;

/// Shares of a pool for a participant at `level` when the party tops out at
/// `max_level`. Every two levels of gap doubles the weight.
///
/// Also used with `max_level` below `level`, which turns the weight into a discount.
pub fn weight(level: u32, max_level: u32) -> f64 {
    let gap = max_level as i32 - level as i32;
    let doubled = 2f64.powi(gap.div_euclid(2));
    if gap.rem_euclid(2) == 1 {
        doubled * SQRT_2
    } else {
        doubled
    }
}

/// A party member's working record for one reward pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    pub name: String,
    /// XP before this pass
    pub exp: u32,
    /// Level before this pass
    pub level: u32,
    /// XP gained so far. Fractional only while a division is in progress.
    pub gained_exp: f64,
    pub leveled_up: bool,
    /// Lifted a level by the catch-up rule instead of taking a pool share
    pub auto_leveled: bool,
    /// Earns the flat quest log XP bonus
    pub quest_log_exp: bool,
    /// Earns the quest log gold roll
    pub quest_log_gold: bool,
    pub quest_log_bonus_exp: u32,
    pub quest_log_bonus_gold: u32,
}

impl Participant {
    pub fn new(table: &LevelTable, name: impl Into<String>, exp: u32) -> Self {
        Self {
            name: name.into(),
            exp,
            level: table.level_from_exp(exp),
            gained_exp: 0.0,
            leveled_up: false,
            auto_leveled: false,
            quest_log_exp: false,
            quest_log_gold: false,
            quest_log_bonus_exp: 0,
            quest_log_bonus_gold: 0,
        }
    }

    /// Flag the quest log bonuses this participant has earned
    pub fn with_quest_log(mut self, bonus_exp: bool, bonus_gold: bool) -> Self {
        self.quest_log_exp = bonus_exp;
        self.quest_log_gold = bonus_gold;
        self
    }

    /// Whole XP gained. Only meaningful once [`divide_exp`] has resolved
    /// fractions, after which `gained_exp` is always integral and non-negative.
    pub fn gained(&self) -> u32 {
        self.gained_exp as u32
    }

    pub fn new_exp(&self) -> u32 {
        self.exp.saturating_add(self.gained())
    }
}

/// Divide `pool` XP across the participants, adding to their `gained_exp`.
///
/// Each round hands out the remaining pool by [`weight`] among participants
/// still below their next cap. Anyone who reaches the cap is clamped to it and
/// their excess forms the next round's pool. Once the pool is spent, every
/// gain is rounded up to whole XP.
///
/// Returns the XP nobody could absorb, which is only non-zero when every
/// participant hit their cap.
pub fn divide_exp(
    table: &LevelTable,
    pool: u64,
    participants: &mut [Participant],
) -> Result<u64, LevelError> {
    let mut next_caps = Vec::with_capacity(participants.len());
    for participant in participants.iter() {
        next_caps.push(table.next_cap(participant.level)?);
    }

    // Anchored to the party's starting high-water mark for every round
    let Some(max_level) = participants.iter().map(|p| p.level).max() else {
        return Ok(pool);
    };

    let mut capped: Vec<bool> = participants.iter().map(|p| p.leveled_up).collect();
    let mut remaining = pool as f64;
    let mut round = 0;

    while remaining > 0.0 {
        if capped.iter().all(|&c| c) {
            log::debug!("Whole party capped with {:.2}xp left over", remaining);
            break;
        }
        round += 1;

        let total_weight: f64 = participants
            .iter()
            .zip(&capped)
            .filter(|&(_, &c)| !c)
            .map(|(p, _)| weight(p.level, max_level))
            .sum();

        for (i, participant) in participants.iter_mut().enumerate() {
            if !capped[i] {
                participant.gained_exp += remaining * weight(participant.level, max_level) / total_weight;
            }
        }

        let mut overflow = 0.0;
        for (i, participant) in participants.iter_mut().enumerate() {
            if capped[i] {
                continue;
            }
            let cap = next_caps[i];
            if (participant.exp as f64 + participant.gained_exp).floor() >= cap as f64 {
                let clamped = cap.saturating_sub(participant.exp) as f64;
                overflow += participant.gained_exp - clamped;
                participant.gained_exp = clamped;
                capped[i] = true;
            }
        }

        log::debug!(
            "Division round {}: handed out {:.2}xp, {:.2}xp overflowed",
            round,
            remaining,
            overflow
        );
        remaining = overflow;
    }

    resolve_fractions(table, participants);

    Ok(remaining.max(0.0).round() as u64)
}

/// Round every gain up to whole XP and flag anyone who now sits at a new level
fn resolve_fractions(table: &LevelTable, participants: &mut [Participant]) {
    for participant in participants.iter_mut() {
        let nearest = participant.gained_exp.round();
        participant.gained_exp = if (participant.gained_exp - nearest).abs() < SNAP_EPSILON {
            nearest
        } else {
            participant.gained_exp.ceil()
        };

        if table.level_from_exp(participant.new_exp()) > participant.level {
            participant.leveled_up = true;
        }
    }
}
