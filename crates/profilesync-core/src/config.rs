//! Configuration for the profile sync component
//!
//! Every field has a default, so an empty JSON object is a valid config.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ProfileSyncError, SyncResult};

/// Default location of the local profile record, relative to the data directory
pub const DEFAULT_PROFILE_PATH: &str = "players/user/profile_info";

/// Profile sync settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileSyncConfig {
    /// Where the local participant's profile info is stored
    pub profile_path: PathBuf,
    /// Seconds between membership sweeps
    pub reconcile_interval_secs: u64,
    /// Seconds between the first ingest of a burst and the cache refresh
    pub cache_refresh_delay_secs: u64,
}

impl Default for ProfileSyncConfig {
    fn default() -> Self {
        Self {
            profile_path: PathBuf::from(DEFAULT_PROFILE_PATH),
            reconcile_interval_secs: 5,
            cache_refresh_delay_secs: 5,
        }
    }
}

impl ProfileSyncConfig {
    /// Load and validate a JSON config file
    pub fn load(path: impl AsRef<Path>) -> SyncResult<Self> {
        let data = std::fs::read(path.as_ref())?;
        Self::from_json(&data)
    }

    /// Parse and validate a JSON config
    pub fn from_json(data: &[u8]) -> SyncResult<Self> {
        let config: Self = serde_json::from_slice(data)
            .map_err(|e| ProfileSyncError::Serialization(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the scheduler cannot work with
    pub fn validate(&self) -> SyncResult<()> {
        if self.reconcile_interval_secs == 0 {
            return Err(ProfileSyncError::Config(
                "reconcile_interval_secs must be greater than zero".to_string(),
            ));
        }
        if self.cache_refresh_delay_secs == 0 {
            return Err(ProfileSyncError::Config(
                "cache_refresh_delay_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn reconcile_interval(&self) -> Duration {
        Duration::from_secs(self.reconcile_interval_secs)
    }

    pub fn cache_refresh_delay(&self) -> Duration {
        Duration::from_secs(self.cache_refresh_delay_secs)
    }
}
