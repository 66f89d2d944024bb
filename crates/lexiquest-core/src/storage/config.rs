//! TOML-based engine configuration.
//!
//! Stores tuning knobs for the reward engine:
//! - Combo timeout, risk window, base answer XP, multiplier ceiling
//! - Boost stacking cap
//! - Streak risk hour and local timezone offset
//!
//! Configuration is stored at `~/.config/lexiquest/config.toml`. A missing
//! file yields the defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::data_dir;
use crate::boost::BoostConfig;
use crate::combo::ComboConfig;
use crate::error::ConfigError;
use crate::streak::StreakConfig;

/// Engine configuration.
///
/// Serialized to/from TOML at `~/.config/lexiquest/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub combo: ComboConfig,
    #[serde(default)]
    pub boost: BoostConfig,
    #[serde(default)]
    pub streak: StreakConfig,
}

impl EngineConfig {
    /// Path of the config file.
    pub fn path() -> Result<PathBuf, ConfigError> {
        let dir = data_dir().map_err(|e| ConfigError::LoadFailed {
            path: PathBuf::from("~/.config/lexiquest"),
            message: e.to_string(),
        })?;
        Ok(dir.join("config.toml"))
    }

    /// Load the config, falling back to defaults when the file is missing.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::path()?;
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(&path).map_err(|e| ConfigError::LoadFailed {
            path: path.clone(),
            message: e.to_string(),
        })?;
        toml::from_str(&contents).map_err(|e| ConfigError::ParseFailed(e.to_string()))
    }

    /// Save the config.
    ///
    /// # Errors
    /// Returns an error if serialization or the write fails.
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::path()?;
        let contents =
            toml::to_string_pretty(self).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        std::fs::write(&path, contents).map_err(|e| ConfigError::SaveFailed {
            path: path.clone(),
            message: e.to_string(),
        })
    }
}
