//! Level-scaled XP transfers
//!
//! Gifting XP between participants of different levels goes through a
//! "scaled" XP space where each level is worth less than the one below it.
//! A donor's XP is converted into scaled XP, taxed, added to the recipient's
//! scaled XP, and converted back.
//!
//! Each level occupies a band of scaled XP `floor(span * weight(level, 1))`
//! wide. Progress inside a level maps linearly onto its band, which keeps the
//! mapping strictly increasing and exactly invertible on whole XP.

use serde::{Deserialize, Serialize};

use super::allocation::weight;
use super::xp::{band_for, LevelTable, CAP_COUNT, MAX_LEVEL};
use crate::error::LevelError;

/// Share of the donor's scaled XP that reaches the recipient
pub const DEFAULT_EFFICIENCY: f64 = 0.5;

/// Cumulative scaled XP thresholds, derived from a level table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScaledTable {
    caps: [u64; CAP_COUNT],
}

impl ScaledTable {
    pub fn from_levels(levels: &LevelTable) -> Self {
        let raw = levels.caps();
        let mut caps = [0u64; CAP_COUNT];
        for i in 0..CAP_COUNT - 2 {
            let span = f64::from(raw[i + 1] - raw[i]);
            let band = (span * weight(i as u32 + 1, 1)).floor() as u64;
            caps[i + 1] = caps[i] + band;
        }
        caps[CAP_COUNT - 1] = caps[CAP_COUNT - 2];
        Self { caps }
    }

    pub fn caps(&self) -> &[u64; CAP_COUNT] {
        &self.caps
    }

    pub fn max_scaled(&self) -> u64 {
        self.caps[CAP_COUNT - 1]
    }

    /// Scaled width of a level
    fn band(&self, level: u32) -> u64 {
        self.caps[level as usize] - self.caps[level as usize - 1]
    }
}

/// Converts XP gifts between levels
#[derive(Debug, Clone)]
pub struct TransferEngine {
    levels: LevelTable,
    scaled: ScaledTable,
    /// Scaled caps as floats for band lookup
    bounds: [f64; CAP_COUNT],
    efficiency: f64,
}

impl TransferEngine {
    pub fn new(levels: LevelTable) -> Self {
        let scaled = ScaledTable::from_levels(&levels);
        let bounds = scaled.caps.map(|cap| cap as f64);
        Self {
            levels,
            scaled,
            bounds,
            efficiency: DEFAULT_EFFICIENCY,
        }
    }

    /// Use a different transfer efficiency (must be in `(0, 1]`)
    pub fn with_efficiency(mut self, efficiency: f64) -> Result<Self, LevelError> {
        if !(efficiency > 0.0 && efficiency <= 1.0) {
            return Err(LevelError::Config(format!(
                "transfer efficiency must be in (0, 1], got {}",
                efficiency
            )));
        }
        self.efficiency = efficiency;
        Ok(self)
    }

    pub fn levels(&self) -> &LevelTable {
        &self.levels
    }

    pub fn scaled_table(&self) -> &ScaledTable {
        &self.scaled
    }

    pub fn efficiency(&self) -> f64 {
        self.efficiency
    }

    /// Map XP into scaled XP. XP past the level 20 cap maps to the top of the scale.
    ///
    /// Progress converts at `band / span` rather than the raw `weight(level, 1)`.
    /// The raw weight overshoots the floored band, which makes the mapping step
    /// backwards at level boundaries (visibly at 19/20); this rate keeps it
    /// strictly increasing.
    pub fn to_scaled(&self, exp: u32) -> f64 {
        let exp = exp.min(self.levels.max_exp());
        let level = self.levels.level_from_exp(exp);
        if level == MAX_LEVEL {
            return self.bounds[MAX_LEVEL as usize - 1];
        }

        let caps = self.levels.caps();
        let low = caps[level as usize - 1];
        let span = u64::from(caps[level as usize] - low);
        let progress = u64::from(exp - low);
        let band = self.scaled.band(level);

        self.bounds[level as usize - 1] + (progress * band) as f64 / span as f64
    }

    /// Map scaled XP back to XP, rounding to the nearest whole XP
    pub fn from_scaled(&self, scaled: f64) -> u32 {
        let scaled = scaled.clamp(0.0, self.bounds[CAP_COUNT - 1]);
        let level = band_for(&self.bounds, scaled);
        let caps = self.levels.caps();
        let low = caps[level as usize - 1];
        if level == MAX_LEVEL {
            return low;
        }

        let band = self.scaled.band(level);
        if band == 0 {
            return low;
        }
        let span = caps[level as usize] - low;
        let into_band = scaled - self.bounds[level as usize - 1];
        let progress = (into_band * f64::from(span) / band as f64).round() as u32;

        low + progress.min(span)
    }

    /// The recipient's XP after receiving the donor's XP
    pub fn transfer(&self, donor_exp: u32, target_exp: u32) -> u32 {
        if donor_exp == 0 {
            return target_exp;
        }

        let donated = (self.to_scaled(donor_exp) * self.efficiency).floor();
        let total = (donated + self.to_scaled(target_exp)).min(self.bounds[CAP_COUNT - 1]);

        // A gift never takes XP away, even from a target already past the cap
        let new_exp = self.from_scaled(total).max(target_exp);

        log::info!(
            "Transfer: {}xp (level {}) gives level {} at {}xp -> {}xp (level {})",
            donor_exp,
            self.levels.level_from_exp(donor_exp),
            self.levels.level_from_exp(target_exp),
            target_exp,
            new_exp,
            self.levels.level_from_exp(new_exp)
        );
        new_exp
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Ten evenly spaced XP values per level, plus the level 20 cap
    fn tenth_level_segments(levels: &LevelTable) -> Vec<u32> {
        let caps = levels.caps();
        let mut segments = Vec::new();
        for level in 0..MAX_LEVEL as usize - 1 {
            let span = caps[level + 1] - caps[level];
            for step in 0..10 {
                segments.push(caps[level] + span * step / 10);
            }
        }
        segments.push(caps[MAX_LEVEL as usize]);
        segments
    }

    #[test]
    fn test_scaled_table() {
        let scaled = ScaledTable::from_levels(&LevelTable::standard());
        let caps = scaled.caps();
        assert_eq!(caps[0], 0);
        assert_eq!(caps[1], 300); // Level 1 keeps full weight
        assert_eq!(caps[2], 300 + 424); // floor(600 / sqrt 2)
        assert_eq!(caps[3], 300 + 424 + 900); // floor(1800 / 2)
        assert_eq!(caps[20], caps[19]);
        for i in 0..CAP_COUNT - 2 {
            assert!(caps[i] < caps[i + 1]);
        }
    }

    #[test]
    fn test_to_scaled_at_caps() {
        let engine = TransferEngine::new(LevelTable::standard());
        let levels = LevelTable::standard();
        for level in 1..=MAX_LEVEL as usize {
            let cap = levels.caps()[level - 1];
            assert_eq!(engine.to_scaled(cap), engine.scaled_table().caps()[level - 1] as f64);
        }
        assert_eq!(engine.to_scaled(150), 150.0);
        assert_eq!(engine.to_scaled(600), 300.0 + 212.0);
    }

    #[test]
    fn test_round_trip() {
        let levels = LevelTable::standard();
        let engine = TransferEngine::new(levels.clone());
        for exp in (0..=levels.max_exp()).step_by(7).chain([299, 300, 301, 354_999, 355_000]) {
            assert_eq!(engine.from_scaled(engine.to_scaled(exp)), exp, "round trip of {}", exp);
        }
    }

    #[test]
    fn test_to_scaled_is_increasing() {
        let levels = LevelTable::standard();
        let engine = TransferEngine::new(levels.clone());
        let mut last = -1.0;
        for exp in (0..=levels.max_exp()).step_by(3) {
            let scaled = engine.to_scaled(exp);
            assert!(scaled > last, "scaled xp stalled at {}", exp);
            last = scaled;
        }
    }

    #[test]
    fn test_to_scaled_increases_across_level_boundaries() {
        let levels = LevelTable::standard();
        let engine = TransferEngine::new(levels.clone());
        for level in 2..=MAX_LEVEL as usize {
            let cap = levels.caps()[level - 1];
            assert!(engine.to_scaled(cap - 1) < engine.to_scaled(cap), "step back entering level {}", level);
            assert!(engine.to_scaled(cap) < engine.to_scaled(cap + 1) || level == MAX_LEVEL as usize);
        }
    }

    #[test]
    fn test_transfer_high_to_low() {
        let engine = TransferEngine::new(LevelTable::standard());
        let result = engine.transfer(23_000, 300);
        assert!(result > 300);
        assert!(f64::from(result) < 23_000.0 * 0.5 + 300.0);
        assert_eq!(result, engine.transfer(23_000, 300));
    }

    #[test]
    fn test_transfer_nothing() {
        let engine = TransferEngine::new(LevelTable::standard());
        assert_eq!(engine.transfer(0, 5000), 5000);
        assert_eq!(engine.transfer(0, 0), 0);
    }

    #[test]
    fn test_transfer_clamps_at_max() {
        let engine = TransferEngine::new(LevelTable::standard());
        assert_eq!(engine.transfer(355_000, 355_000), 355_000);
        assert_eq!(engine.transfer(355_000, 300_000), 355_000);
        assert_eq!(engine.transfer(10, 400_000), 400_000);
    }

    #[test]
    fn test_transfer_low_to_high_is_small() {
        let engine = TransferEngine::new(LevelTable::standard());
        // 300xp halves to 150 scaled XP, which buys 8xp apiece at level 7
        assert_eq!(engine.transfer(300, 23_000), 24_200);
        // Level 1 scaled XP is raw XP
        let low = engine.transfer(200, 0);
        assert_eq!(low, 100);
    }

    #[test]
    fn test_transfer_is_monotonic() {
        let levels = LevelTable::standard();
        let engine = TransferEngine::new(levels.clone());
        let segments = tenth_level_segments(&levels);
        let grid: Vec<Vec<u32>> = segments
            .iter()
            .map(|&donor| segments.iter().map(|&target| engine.transfer(donor, target)).collect())
            .collect();

        for (y, row) in grid.iter().enumerate() {
            for x in 0..row.len() {
                if x + 1 < row.len() {
                    assert!(row[x] <= row[x + 1], "target increase lowered result at {},{}", y, x);
                }
                if y + 1 < grid.len() {
                    assert!(row[x] <= grid[y + 1][x], "donor increase lowered result at {},{}", y, x);
                }
            }
        }
    }

    #[test]
    fn test_efficiency() {
        let engine = TransferEngine::new(LevelTable::standard());
        assert!(engine.clone().with_efficiency(0.0).is_err());
        assert!(engine.clone().with_efficiency(1.5).is_err());
        assert!(engine.clone().with_efficiency(f64::NAN).is_err());

        let full = engine.clone().with_efficiency(1.0).unwrap();
        assert_eq!(full.transfer(200, 0), 200);
        assert!(full.transfer(23_000, 300) > engine.transfer(23_000, 300));
    }
}
