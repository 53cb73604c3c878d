//! Economy configuration
//!
//! Tunable rules loaded from a RON file, with fallback to the standard rules.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::LevelError;
use crate::progression::quest_log::DEFAULT_BONUS_PERCENT;
use crate::progression::transfer::{TransferEngine, DEFAULT_EFFICIENCY};
use crate::progression::xp::{LevelTable, STANDARD_CAPS};

/// Config file name inside the config directory
pub const CONFIG_FILE: &str = "economy.ron";

/// Rules for session rewards and XP transfers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EconomyConfig {
    /// Cumulative XP thresholds (21 entries, last one repeated)
    pub level_caps: Vec<u32>,
    /// Participants more than this many levels behind the roster's highest
    /// level are lifted one level instead of sharing the pool. `None` disables it.
    pub auto_level_window: Option<u32>,
    /// Quest log XP bonus as a percent of the level span
    pub quest_log_bonus_percent: u32,
    /// Percent of session gold that goes to the faction coffers
    pub faction_tax_percent: u32,
    /// Share of scaled XP that survives a transfer
    pub transfer_efficiency: f64,
    /// XP for newly added roster members
    pub starting_exp: u32,
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            level_caps: STANDARD_CAPS.to_vec(),
            auto_level_window: Some(5),
            quest_log_bonus_percent: DEFAULT_BONUS_PERCENT,
            faction_tax_percent: 20,
            transfer_efficiency: DEFAULT_EFFICIENCY,
            starting_exp: 300,
        }
    }
}

impl EconomyConfig {
    /// Load from the user's config directory, falling back to defaults
    pub fn load() -> Self {
        let path = config_path();
        if !path.exists() {
            log::info!("No config at {:?}, using default rules", path);
            return Self::default();
        }

        match Self::load_from(&path) {
            Ok(config) => {
                log::info!("Config loaded from {:?}", path);
                config
            }
            Err(e) => {
                log::warn!("{}, using default rules", e);
                Self::default()
            }
        }
    }

    /// Load and validate a specific config file
    pub fn load_from(path: &Path) -> Result<Self, LevelError> {
        let content = fs::read_to_string(path)
            .map_err(|e| LevelError::Config(format!("failed to read {:?}: {}", path, e)))?;
        Self::from_ron(&content)
    }

    pub fn from_ron(content: &str) -> Result<Self, LevelError> {
        let config: Self = ron::from_str(content)
            .map_err(|e| LevelError::Config(format!("failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_ron(&self) -> Result<String, LevelError> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| LevelError::Config(format!("failed to serialize config: {}", e)))
    }

    /// Write the config to a file, creating its directory if needed
    pub fn save_to(&self, path: &Path) -> Result<(), LevelError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| LevelError::Config(format!("failed to create {:?}: {}", parent, e)))?;
        }
        fs::write(path, self.to_ron()?)
            .map_err(|e| LevelError::Config(format!("failed to write {:?}: {}", path, e)))?;
        log::info!("Config saved to {:?}", path);
        Ok(())
    }

    pub fn validate(&self) -> Result<(), LevelError> {
        self.level_table()?;
        if self.faction_tax_percent > 100 {
            return Err(LevelError::Config(format!(
                "faction tax must be at most 100%, got {}%",
                self.faction_tax_percent
            )));
        }
        self.transfer_engine()?;
        Ok(())
    }

    pub fn level_table(&self) -> Result<LevelTable, LevelError> {
        LevelTable::new(&self.level_caps)
    }

    pub fn transfer_engine(&self) -> Result<TransferEngine, LevelError> {
        TransferEngine::new(self.level_table()?).with_efficiency(self.transfer_efficiency)
    }
}

/// Where the config file lives
pub fn config_path() -> PathBuf {
    use directories::ProjectDirs;

    if let Some(proj_dirs) = ProjectDirs::from("com", "levelshare", "Levelshare") {
        proj_dirs.config_dir().join(CONFIG_FILE)
    } else {
        PathBuf::from(".").join(CONFIG_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = EconomyConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.level_table().unwrap(), LevelTable::standard());
    }

    #[test]
    fn test_partial_ron_uses_defaults() {
        let config = EconomyConfig::from_ron("(auto_level_window: None, faction_tax_percent: 10)").unwrap();
        assert_eq!(config.auto_level_window, None);
        assert_eq!(config.faction_tax_percent, 10);
        assert_eq!(config.quest_log_bonus_percent, 5);
        assert_eq!(config.level_caps, STANDARD_CAPS.to_vec());
    }

    #[test]
    fn test_invalid_config() {
        assert!(matches!(
            EconomyConfig::from_ron("(faction_tax_percent: 120)"),
            Err(LevelError::Config(_))
        ));
        assert!(matches!(
            EconomyConfig::from_ron("(level_caps: [0, 300, 900])"),
            Err(LevelError::InvalidLevelTable(_))
        ));
        assert!(EconomyConfig::from_ron("(transfer_efficiency: 0.0)").is_err());
        assert!(EconomyConfig::from_ron("not ron at all (").is_err());
    }

    #[test]
    fn test_ron_round_trip() {
        let mut config = EconomyConfig::default();
        config.auto_level_window = Some(3);
        config.transfer_efficiency = 0.75;
        let text = config.to_ron().unwrap();
        assert_eq!(EconomyConfig::from_ron(&text).unwrap(), config);
    }

    #[test]
    fn test_shipped_asset_matches_defaults() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("assets").join(CONFIG_FILE);
        assert_eq!(EconomyConfig::load_from(&path).unwrap(), EconomyConfig::default());
    }

    #[test]
    fn test_save_and_load_file() {
        let path = std::env::temp_dir()
            .join(format!("levelshare-test-{}", std::process::id()))
            .join(CONFIG_FILE);
        let mut config = EconomyConfig::default();
        config.starting_exp = 900;
        config.save_to(&path).unwrap();

        assert_eq!(EconomyConfig::load_from(&path).unwrap(), config);
        let _ = fs::remove_dir_all(path.parent().unwrap());

        assert!(EconomyConfig::load_from(&path).is_err());
    }
}
