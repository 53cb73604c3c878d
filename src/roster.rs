//! Campaign roster
//!
//! Current XP and gold for every known player, plus the faction coffers.
//! Every lookup of an unknown name is an error rather than a fresh record.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::EconomyConfig;
use crate::error::LevelError;
use crate::progression::transfer::TransferEngine;
use crate::progression::xp::LevelTable;
use crate::session::{run_session, QuestLog, SessionMember, SessionOutcome, SessionRequest};

/// Name used for the faction coffers in messages
pub const FACTION: &str = "faction";

/// A player's standing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub exp: u32,
    pub gold: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roster {
    members: BTreeMap<String, Member>,
    /// Gold held by the faction rather than any player
    coffers: u64,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_member(&mut self, name: &str, starting_exp: u32) -> Result<(), LevelError> {
        if self.members.contains_key(name) {
            return Err(LevelError::DuplicateParticipant(name.to_string()));
        }
        self.members.insert(name.to_string(), Member { exp: starting_exp, gold: 0 });
        log::info!("Added {} starting with {}xp", name, starting_exp);
        Ok(())
    }

    /// Add a member starting at the configured starting XP
    pub fn add_new_member(&mut self, config: &EconomyConfig, name: &str) -> Result<(), LevelError> {
        self.add_member(name, config.starting_exp)
    }

    pub fn member(&self, name: &str) -> Result<&Member, LevelError> {
        self.members
            .get(name)
            .ok_or_else(|| LevelError::UnknownParticipant(name.to_string()))
    }

    fn member_mut(&mut self, name: &str) -> Result<&mut Member, LevelError> {
        self.members
            .get_mut(name)
            .ok_or_else(|| LevelError::UnknownParticipant(name.to_string()))
    }

    pub fn members(&self) -> impl Iterator<Item = (&str, &Member)> {
        self.members.iter().map(|(name, member)| (name.as_str(), member))
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn coffers(&self) -> u64 {
        self.coffers
    }

    /// Highest level anyone on the roster has reached
    pub fn highest_level(&self, table: &LevelTable) -> Option<u32> {
        self.members.values().map(|m| table.level_from_exp(m.exp)).max()
    }

    /// Out-of-band XP grant. Negative amounts take XP away, never below zero.
    /// Returns the new total.
    pub fn grant_exp(&mut self, name: &str, exp: i64) -> Result<u32, LevelError> {
        let member = self.member_mut(name)?;
        let total = i64::from(member.exp).saturating_add(exp).clamp(0, i64::from(u32::MAX));
        member.exp = total as u32;
        log::info!(
            "{} {} {}xp, now at {}xp",
            name,
            if exp < 0 { "lost" } else { "gained" },
            exp.unsigned_abs(),
            member.exp
        );
        Ok(member.exp)
    }

    /// Move gold between two players. `None` on either side is the faction coffers.
    pub fn give_gold(&mut self, from: Option<&str>, to: Option<&str>, amount: u64) -> Result<(), LevelError> {
        if from == to {
            return Err(LevelError::SelfTransfer(from.unwrap_or(FACTION).to_string()));
        }
        if let Some(to) = to {
            self.member(to)?;
        }

        let source = match from {
            Some(name) => &mut self.member_mut(name)?.gold,
            None => &mut self.coffers,
        };
        if *source < amount {
            return Err(LevelError::InsufficientGold {
                holder: from.unwrap_or(FACTION).to_string(),
                available: *source,
                requested: amount,
            });
        }
        *source -= amount;

        match to {
            Some(name) => self.member_mut(name)?.gold += amount,
            None => self.coffers += amount,
        }
        log::info!(
            "{} gave {}gp to {}",
            from.unwrap_or(FACTION),
            amount,
            to.unwrap_or(FACTION)
        );
        Ok(())
    }

    /// Lift a player whole levels. Returns the XP it took.
    pub fn level_up(
        &mut self,
        table: &LevelTable,
        name: &str,
        levels: u32,
        preserve_progress: bool,
    ) -> Result<u32, LevelError> {
        let member = self.member_mut(name)?;
        let gained = table.exp_needed_for_bonus_levels(member.exp, levels, preserve_progress)?;
        member.exp += gained;
        log::info!(
            "{} gained {} levels ({}xp), now level {}",
            name,
            levels,
            gained,
            table.level_from_exp(member.exp)
        );
        Ok(gained)
    }

    /// Pass all of the donor's XP to the recipient through the transfer
    /// engine. The donor is left with nothing. Returns the recipient's new XP.
    pub fn transfer_exp(
        &mut self,
        engine: &TransferEngine,
        donor: &str,
        recipient: &str,
    ) -> Result<u32, LevelError> {
        if donor == recipient {
            return Err(LevelError::SelfTransfer(donor.to_string()));
        }
        let donor_exp = self.member(donor)?.exp;
        let recipient_exp = self.member(recipient)?.exp;

        let new_exp = engine.transfer(donor_exp, recipient_exp);
        self.member_mut(recipient)?.exp = new_exp;
        self.member_mut(donor)?.exp = 0;
        Ok(new_exp)
    }

    /// Reward a session for the named attendees and record the results
    pub fn run_session(
        &mut self,
        config: &EconomyConfig,
        table: &LevelTable,
        exp_pool: &str,
        gold_pool: &str,
        attendees: &[(&str, QuestLog)],
        seed: u64,
    ) -> Result<SessionOutcome, LevelError> {
        let members = attendees
            .iter()
            .map(|&(name, quest_log)| {
                let member = self.member(name)?;
                Ok(SessionMember::new(name, member.exp).with_quest_log(quest_log))
            })
            .collect::<Result<Vec<_>, LevelError>>()?;

        let request = SessionRequest {
            exp_pool: exp_pool.to_string(),
            gold_pool: gold_pool.to_string(),
            members,
            reference_level: self.highest_level(table),
            seed,
        };
        let outcome = run_session(config, table, &request)?;

        for award in &outcome.awards {
            let member = self.member_mut(&award.name)?;
            member.exp = award.new_exp;
            member.gold += award.gold;
        }
        self.coffers += outcome.faction_gold;

        Ok(outcome)
    }
}
