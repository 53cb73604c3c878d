//! Session rewards
//!
//! Turns one play session's XP and gold into per-participant awards:
//! resolves the XP pool expression, lifts anyone too far behind, divides the
//! pool, then adds quest log bonuses and the gold split.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::config::EconomyConfig;
use crate::error::LevelError;
use crate::progression::allocation::{divide_exp, Participant};
use crate::progression::quest_log::{apply_exp_bonuses, roll_gold_bonuses, session_rng};
use crate::progression::xp::{LevelTable, MAX_LEVEL};

/// Whether a participant wrote up the last session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum QuestLog {
    #[default]
    None,
    /// Earns the gold roll
    Written,
    /// Written within the time limit: earns the gold roll and the XP bonus
    Fast,
}

impl QuestLog {
    pub fn earns_exp(&self) -> bool {
        matches!(self, QuestLog::Fast)
    }

    pub fn earns_gold(&self) -> bool {
        matches!(self, QuestLog::Written | QuestLog::Fast)
    }
}

/// One term of an XP pool expression like `500+10%`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolTerm {
    /// A flat amount of XP
    Flat(i64),
    /// A percent of the party's combined current level spans
    Percent(u32),
}

/// Parse a `+`-joined pool expression
pub fn parse_pool(expr: &str) -> Result<Vec<PoolTerm>, LevelError> {
    expr.split('+')
        .map(|term| {
            let term = term.trim();
            let parsed = match term.strip_suffix('%') {
                Some(percent) => percent.trim().parse().map(PoolTerm::Percent).ok(),
                None => term.parse().map(PoolTerm::Flat).ok(),
            };
            parsed.ok_or_else(|| LevelError::InvalidPoolTerm(term.to_string()))
        })
        .collect()
}

/// Total XP of a pool expression for a party with the given XP totals
pub fn resolve_pool(table: &LevelTable, expr: &str, party_exps: &[u32]) -> Result<u64, LevelError> {
    let mut total: i64 = 0;
    for term in parse_pool(expr)? {
        let exp = match term {
            PoolTerm::Flat(exp) => exp,
            PoolTerm::Percent(percent) => {
                i64::try_from(table.party_level_percentage(party_exps.iter().copied(), percent))
                    .map_err(|_| LevelError::InvalidPoolTerm(expr.to_string()))?
            }
        };
        total = total
            .checked_add(exp)
            .ok_or_else(|| LevelError::InvalidPoolTerm(expr.to_string()))?;
    }

    u64::try_from(total).map_err(|_| LevelError::NegativePool(total))
}

/// Total gold of a `+`-joined gold expression like `120+35`. Terms may be
/// negative but the total may not.
pub fn resolve_gold(expr: &str) -> Result<u64, LevelError> {
    let mut total: i64 = 0;
    for term in parse_pool(expr)? {
        let PoolTerm::Flat(gold) = term else {
            return Err(LevelError::InvalidGoldTerm(expr.to_string()));
        };
        total = total
            .checked_add(gold)
            .ok_or_else(|| LevelError::InvalidGoldTerm(expr.to_string()))?;
    }

    u64::try_from(total).map_err(|_| LevelError::NegativeGold(total))
}

/// How a session's gold divides between the party and the faction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoldSplit {
    pub per_member: u64,
    pub faction: u64,
}

/// Take the faction's cut, split the rest evenly, and send any remainder to the faction
pub fn split_gold(total: u64, members: usize, tax_percent: u32) -> GoldSplit {
    let tax = total * u64::from(tax_percent.min(100)) / 100;
    if members == 0 {
        return GoldSplit { per_member: 0, faction: total };
    }
    let per_member = (total - tax) / members as u64;
    GoldSplit {
        per_member,
        faction: total - per_member * members as u64,
    }
}

/// A participant as the caller knows them going into the session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionMember {
    pub name: String,
    pub exp: u32,
    pub quest_log: QuestLog,
}

impl SessionMember {
    pub fn new(name: impl Into<String>, exp: u32) -> Self {
        Self {
            name: name.into(),
            exp,
            quest_log: QuestLog::None,
        }
    }

    pub fn with_quest_log(mut self, quest_log: QuestLog) -> Self {
        self.quest_log = quest_log;
        self
    }
}

/// Everything needed to reward one session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRequest {
    /// Pool expression, e.g. `"1200"` or `"800+10%"`
    pub exp_pool: String,
    /// Gold expression, e.g. `"250"` or `"120+35"`
    pub gold_pool: String,
    pub members: Vec<SessionMember>,
    /// Highest level across the whole roster, for the catch-up rule.
    /// Defaults to the highest level among the members.
    pub reference_level: Option<u32>,
    /// Seed for the quest log gold rolls
    pub seed: u64,
}

/// One participant's result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Award {
    pub name: String,
    pub previous_exp: u32,
    pub previous_level: u32,
    pub gained_exp: u32,
    pub new_exp: u32,
    pub new_level: u32,
    pub leveled_up: bool,
    pub auto_leveled: bool,
    pub quest_log_bonus_exp: u32,
    pub quest_log_bonus_gold: u32,
    /// Even share of the session gold plus any quest log gold
    pub gold: u64,
}

/// The full result of a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionOutcome {
    pub awards: Vec<Award>,
    /// XP in the pool after resolving the expression
    pub total_exp: u64,
    /// XP handed out beyond the pool by rounding and flat bonuses
    pub bonus_exp: i64,
    /// Pool XP nobody could absorb because everyone hit their cap
    pub unallocated_exp: u64,
    pub total_gold: u64,
    pub faction_gold: u64,
}

impl SessionOutcome {
    pub fn bonus_exp_per_participant(&self) -> f64 {
        if self.awards.is_empty() {
            0.0
        } else {
            self.bonus_exp as f64 / self.awards.len() as f64
        }
    }

    pub fn award(&self, name: &str) -> Option<&Award> {
        self.awards.iter().find(|a| a.name == name)
    }
}

/// Reward one session
pub fn run_session(
    config: &EconomyConfig,
    table: &LevelTable,
    request: &SessionRequest,
) -> Result<SessionOutcome, LevelError> {
    if request.members.is_empty() {
        return Err(LevelError::EmptyParty);
    }
    if let Some(level) = request.reference_level {
        if !(1..=MAX_LEVEL).contains(&level) {
            return Err(LevelError::InvalidLevel(level));
        }
    }
    let mut seen = HashSet::new();
    for member in &request.members {
        if !seen.insert(member.name.as_str()) {
            return Err(LevelError::DuplicateParticipant(member.name.clone()));
        }
    }

    let party_exps: Vec<u32> = request.members.iter().map(|m| m.exp).collect();
    let total_exp = resolve_pool(table, &request.exp_pool, &party_exps)?;
    let total_gold = resolve_gold(&request.gold_pool)?;

    let mut participants: Vec<Participant> = request
        .members
        .iter()
        .map(|m| {
            Participant::new(table, m.name.clone(), m.exp)
                .with_quest_log(m.quest_log.earns_exp(), m.quest_log.earns_gold())
        })
        .collect();

    let mut rng = session_rng(request.seed);
    roll_gold_bonuses(&mut participants, &mut rng)?;

    auto_level(config, table, request.reference_level, &mut participants)?;

    // Catch-up participants sit out the division entirely
    let (lifted, sharing): (Vec<_>, Vec<_>) = participants
        .into_iter()
        .enumerate()
        .partition(|(_, p)| p.auto_leveled);
    let (sharing_order, mut sharing): (Vec<usize>, Vec<Participant>) = sharing.into_iter().unzip();

    let unallocated_exp = divide_exp(table, total_exp, &mut sharing)?;
    let pooled_gain: i64 = sharing.iter().map(|p| i64::from(p.gained())).sum();

    let mut merged: Vec<(usize, Participant)> = lifted
        .into_iter()
        .chain(sharing_order.into_iter().zip(sharing))
        .collect();
    merged.sort_by_key(|(i, _)| *i);
    let mut participants: Vec<Participant> = merged.into_iter().map(|(_, p)| p).collect();

    let quest_log_exp = apply_exp_bonuses(table, &mut participants, config.quest_log_bonus_percent)?;

    let gold = split_gold(total_gold, participants.len(), config.faction_tax_percent);

    let awards: Vec<Award> = participants
        .iter()
        .map(|p| {
            let new_exp = p.new_exp();
            Award {
                name: p.name.clone(),
                previous_exp: p.exp,
                previous_level: p.level,
                gained_exp: p.gained(),
                new_exp,
                new_level: table.level_from_exp(new_exp),
                leveled_up: p.leveled_up,
                auto_leveled: p.auto_leveled,
                quest_log_bonus_exp: p.quest_log_bonus_exp,
                quest_log_bonus_gold: p.quest_log_bonus_gold,
                gold: gold.per_member + u64::from(p.quest_log_bonus_gold),
            }
        })
        .collect();

    let bonus_exp = pooled_gain + quest_log_exp as i64 - total_exp as i64;
    log::info!(
        "Session: {}xp across {} participants ({:+}xp bonus, {}xp unallocated), {}gp with {}gp to the faction",
        total_exp,
        awards.len(),
        bonus_exp,
        unallocated_exp,
        total_gold,
        gold.faction
    );

    Ok(SessionOutcome {
        awards,
        total_exp,
        bonus_exp,
        unallocated_exp,
        total_gold,
        faction_gold: gold.faction,
    })
}

/// Lift everyone more than the configured window behind the reference level
/// straight to their next level
fn auto_level(
    config: &EconomyConfig,
    table: &LevelTable,
    reference_level: Option<u32>,
    participants: &mut [Participant],
) -> Result<(), LevelError> {
    let Some(window) = config.auto_level_window else {
        return Ok(());
    };
    let party_max = participants.iter().map(|p| p.level).max().unwrap_or(1);
    let reference = reference_level.unwrap_or(party_max).max(party_max);
    let threshold = reference.saturating_sub(window);

    for participant in participants.iter_mut().filter(|p| p.level < threshold) {
        let needed = table.exp_needed_for_bonus_levels(participant.exp, 1, false)?;
        participant.gained_exp = f64::from(needed);
        participant.leveled_up = true;
        participant.auto_leveled = true;
        log::info!(
            "{} is more than {} levels behind level {}; auto-leveling to {}",
            participant.name,
            window,
            reference,
            participant.level + 1
        );
    }
    Ok(())
}
