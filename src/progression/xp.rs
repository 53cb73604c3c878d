//! Experience and leveling
//!
//! The level table, level lookup, and whole-level XP helpers.

use serde::{Deserialize, Serialize};

use crate::error::LevelError;

/// Highest reachable level
pub const MAX_LEVEL: u32 = 20;

/// Number of entries in a level table (one per level plus the level 20 sentinel)
pub const CAP_COUNT: usize = MAX_LEVEL as usize + 1;

/// Minimum cumulative XP for each level, with the last cap repeated as a sentinel
pub const STANDARD_CAPS: [u32; CAP_COUNT] = [
    0,      // Level 1
    300,    // Level 2
    900,    // Level 3
    2700,   // Level 4
    6500,   // Level 5
    14000,  // Level 6
    23000,  // Level 7
    34000,  // Level 8
    48000,  // Level 9
    64000,  // Level 10
    85000,  // Level 11
    100000, // Level 12
    120000, // Level 13
    140000, // Level 14
    165000, // Level 15
    195000, // Level 16
    225000, // Level 17
    265000, // Level 18
    305000, // Level 19
    355000, // Level 20
    355000, // no level 21
];

/// Find the band a value falls in: the smallest level `L` with `value < caps[L]`,
/// or the max level once the value reaches the last real cap.
pub(crate) fn band_for<T: PartialOrd + Copy>(caps: &[T], value: T) -> u32 {
    (1..caps.len())
        .find(|&level| value < caps[level])
        .map(|level| level as u32)
        .unwrap_or(MAX_LEVEL)
}

/// Where a participant stands inside their current level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelProgress {
    /// XP earned since reaching the level
    pub into_level: u32,
    /// Total XP the level spans
    pub span: u32,
    /// XP still needed to reach the next level
    pub remaining: u32,
}

/// Cumulative XP thresholds for levels 1-20
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelTable {
    caps: [u32; CAP_COUNT],
}

impl Default for LevelTable {
    fn default() -> Self {
        Self::standard()
    }
}

impl LevelTable {
    /// The campaign's standard progression
    pub fn standard() -> Self {
        Self { caps: STANDARD_CAPS }
    }

    /// Build a table from raw caps, checking the table invariants
    pub fn new(caps: &[u32]) -> Result<Self, LevelError> {
        if caps.len() != CAP_COUNT {
            return Err(LevelError::InvalidLevelTable(format!(
                "expected {} caps, found {}",
                CAP_COUNT,
                caps.len()
            )));
        }
        if caps[0] != 0 {
            return Err(LevelError::InvalidLevelTable(format!(
                "level 1 must start at 0xp, not {}",
                caps[0]
            )));
        }
        for i in 0..CAP_COUNT - 2 {
            if caps[i] >= caps[i + 1] {
                return Err(LevelError::InvalidLevelTable(format!(
                    "level {} cap ({}) must be above level {} cap ({})",
                    i + 2,
                    caps[i + 1],
                    i + 1,
                    caps[i]
                )));
            }
        }
        if caps[CAP_COUNT - 1] != caps[CAP_COUNT - 2] {
            return Err(LevelError::InvalidLevelTable(
                "the sentinel cap must repeat the level 20 cap".to_string(),
            ));
        }

        let mut table = [0; CAP_COUNT];
        table.copy_from_slice(caps);
        Ok(Self { caps: table })
    }

    pub fn caps(&self) -> &[u32; CAP_COUNT] {
        &self.caps
    }

    /// XP needed to sit at the start of a level
    pub fn min_exp(&self, level: u32) -> Result<u32, LevelError> {
        check_level(level)?;
        Ok(self.caps[level as usize - 1])
    }

    /// XP at which a participant of this level reaches the next one
    pub fn next_cap(&self, level: u32) -> Result<u32, LevelError> {
        check_level(level)?;
        Ok(self.caps[level as usize])
    }

    /// Highest XP anyone can hold
    pub fn max_exp(&self) -> u32 {
        self.caps[CAP_COUNT - 1]
    }

    /// Level for a cumulative XP total. XP past the level 20 cap stays level 20.
    pub fn level_from_exp(&self, exp: u32) -> u32 {
        band_for(&self.caps, exp)
    }

    /// XP covered by a level (0 at level 20)
    pub fn level_span(&self, level: u32) -> Result<u32, LevelError> {
        check_level(level)?;
        Ok(self.caps[level as usize] - self.caps[level as usize - 1])
    }

    /// Progress within a level. The XP must lie within that level's bounds.
    pub fn remaining_in_level(&self, level: u32, exp: u32) -> Result<LevelProgress, LevelError> {
        check_level(level)?;
        let low = self.caps[level as usize - 1];
        let high = self.caps[level as usize];
        if exp < low || exp > high {
            return Err(LevelError::ExpOutsideLevel { level, exp });
        }

        Ok(LevelProgress {
            into_level: exp - low,
            span: high - low,
            remaining: high - exp,
        })
    }

    /// XP that lifts a participant `levels` whole levels. With `preserve_progress`
    /// they keep the same fraction of the way through the new level, rounded up.
    pub fn exp_needed_for_bonus_levels(
        &self,
        exp: u32,
        levels: u32,
        preserve_progress: bool,
    ) -> Result<u32, LevelError> {
        if levels == 0 {
            return Err(LevelError::InvalidLevelChange(levels));
        }

        let current = self.level_from_exp(exp);
        let target = current + levels;
        // Level 20 has no span to carry progress into
        if target > MAX_LEVEL || (preserve_progress && target == MAX_LEVEL) {
            return Err(LevelError::ExceedsMaxLevel { level: current, requested: levels });
        }

        let target_min = self.caps[target as usize - 1];
        let preserved = if preserve_progress {
            let progress = u64::from(exp - self.caps[current as usize - 1]);
            let current_span = u64::from(self.level_span(current)?);
            let target_span = u64::from(self.level_span(target)?);
            ((progress * target_span).div_ceil(current_span)) as u32
        } else {
            0
        };

        Ok(target_min + preserved - exp)
    }

    /// A percentage of the XP that would take every listed participant through
    /// one full level of their current level, rounded down.
    pub fn party_level_percentage<I>(&self, exps: I, percent: u32) -> u64
    where
        I: IntoIterator<Item = u32>,
    {
        let total_span: u64 = exps
            .into_iter()
            .map(|exp| {
                let level = self.level_from_exp(exp) as usize;
                u64::from(self.caps[level] - self.caps[level - 1])
            })
            .sum();
        total_span * u64::from(percent) / 100
    }
}

fn check_level(level: u32) -> Result<(), LevelError> {
    if (1..=MAX_LEVEL).contains(&level) {
        Ok(())
    } else {
        Err(LevelError::InvalidLevel(level))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_from_exp() {
        let table = LevelTable::standard();
        assert_eq!(table.level_from_exp(0), 1);
        assert_eq!(table.level_from_exp(299), 1);
        assert_eq!(table.level_from_exp(300), 2);
        assert_eq!(table.level_from_exp(354_999), 19);
        assert_eq!(table.level_from_exp(355_000), 20);
        assert_eq!(table.level_from_exp(1_000_000), 20); // Capped, not an error
    }

    #[test]
    fn test_level_from_exp_is_monotonic() {
        let table = LevelTable::standard();
        let mut last = 1;
        for exp in (0..=360_000).step_by(50) {
            let level = table.level_from_exp(exp);
            assert!(level >= last, "level dropped at {}xp", exp);
            last = level;
        }
    }

    #[test]
    fn test_remaining_in_level() {
        let table = LevelTable::standard();
        let progress = table.remaining_in_level(3, 1000).unwrap();
        assert_eq!(progress, LevelProgress { into_level: 100, span: 1800, remaining: 1700 });

        // Sitting exactly on the next cap is still inside the range
        let progress = table.remaining_in_level(1, 300).unwrap();
        assert_eq!(progress.remaining, 0);

        assert_eq!(table.remaining_in_level(0, 0), Err(LevelError::InvalidLevel(0)));
        assert_eq!(table.remaining_in_level(21, 0), Err(LevelError::InvalidLevel(21)));
        assert_eq!(
            table.remaining_in_level(2, 100),
            Err(LevelError::ExpOutsideLevel { level: 2, exp: 100 })
        );
    }

    #[test]
    fn test_level_span() {
        let table = LevelTable::standard();
        assert_eq!(table.level_span(1).unwrap(), 300);
        assert_eq!(table.level_span(19).unwrap(), 50_000);
        assert_eq!(table.level_span(20).unwrap(), 0);
    }

    #[test]
    fn test_table_validation() {
        assert!(LevelTable::new(&STANDARD_CAPS).is_ok());
        assert!(LevelTable::new(&STANDARD_CAPS[..20]).is_err());

        let mut caps = STANDARD_CAPS;
        caps[5] = caps[4];
        assert!(matches!(LevelTable::new(&caps), Err(LevelError::InvalidLevelTable(_))));

        let mut caps = STANDARD_CAPS;
        caps[20] = 400_000;
        assert!(LevelTable::new(&caps).is_err());

        let mut caps = STANDARD_CAPS;
        caps[0] = 10;
        assert!(LevelTable::new(&caps).is_err());
    }

    #[test]
    fn test_bonus_levels() {
        let table = LevelTable::standard();
        // 450xp is a quarter through level 2; one level lands on 900
        assert_eq!(table.exp_needed_for_bonus_levels(450, 1, false).unwrap(), 450);
        // A quarter of level 3's 1800xp span is 450, landing on 1350
        assert_eq!(table.exp_needed_for_bonus_levels(450, 1, true).unwrap(), 900);
        assert_eq!(table.exp_needed_for_bonus_levels(0, 3, false).unwrap(), 2700);
    }

    #[test]
    fn test_bonus_levels_past_cap() {
        let table = LevelTable::standard();
        assert_eq!(
            table.exp_needed_for_bonus_levels(0, 0, false),
            Err(LevelError::InvalidLevelChange(0))
        );
        assert!(table.exp_needed_for_bonus_levels(305_000, 1, false).is_ok());
        assert_eq!(
            table.exp_needed_for_bonus_levels(305_000, 1, true),
            Err(LevelError::ExceedsMaxLevel { level: 19, requested: 1 })
        );
        assert!(table.exp_needed_for_bonus_levels(355_000, 1, false).is_err());
    }

    #[test]
    fn test_party_level_percentage() {
        let table = LevelTable::standard();
        // Spans: level 1 = 300, level 3 = 1800
        assert_eq!(table.party_level_percentage([0, 1000], 10), 210);
        assert_eq!(table.party_level_percentage([0, 1000], 0), 0);
        assert_eq!(table.party_level_percentage(Vec::new(), 50), 0);
    }
}
