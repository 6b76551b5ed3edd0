//! Tracker configuration.

use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

use crate::constants::{
    DATA_DIR_ENV_VAR, DATA_DIR_NAME, DEFAULT_SEASON_LENGTH_DAYS, DEFAULT_STATE_FILE,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default = "TrackerConfig::default_save_enabled")]
    pub save_enabled: bool,
    #[serde(default = "TrackerConfig::default_state_file_name")]
    pub state_file_name: String,
    /// Visibility modes applied to freshly created state.
    #[serde(default)]
    pub auto_collapse: bool,
    #[serde(default)]
    pub auto_hide: bool,
    #[serde(default = "TrackerConfig::default_season_length_days")]
    pub season_length_days: i64,
}

impl TrackerConfig {
    const fn default_save_enabled() -> bool {
        true
    }

    fn default_state_file_name() -> String {
        DEFAULT_STATE_FILE.to_string()
    }

    const fn default_season_length_days() -> i64 {
        DEFAULT_SEASON_LENGTH_DAYS
    }

    /// Parse a JSON config; absent fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is not valid JSON for this shape.
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    #[must_use]
    pub fn state_file(&self) -> PathBuf {
        self.data_dir.join(&self.state_file_name)
    }
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            save_enabled: Self::default_save_enabled(),
            state_file_name: Self::default_state_file_name(),
            auto_collapse: false,
            auto_hide: false,
            season_length_days: Self::default_season_length_days(),
        }
    }
}

/// `$RANKLINE_DATA_DIR`, else the platform's per-user data directory.
#[must_use]
pub fn default_data_dir() -> PathBuf {
    if let Some(dir) = env::var_os(DATA_DIR_ENV_VAR).filter(|dir| !dir.is_empty()) {
        return PathBuf::from(dir);
    }
    if cfg!(windows)
        && let Some(app_data) = env::var_os("APPDATA")
    {
        return PathBuf::from(app_data).join(DATA_DIR_NAME);
    }
    env::var_os("HOME").map_or_else(
        || PathBuf::from(".").join(DATA_DIR_NAME),
        |home| {
            PathBuf::from(home)
                .join(".local")
                .join("share")
                .join(DATA_DIR_NAME)
        },
    )
}
