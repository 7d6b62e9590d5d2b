//! Local Profile Store - the local participant's own profile info on disk
//!
//! Only the local participant's info is ever persisted. Remote entries live in
//! the in-memory registry and are rebuilt from the network each session.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, warn};

use super::DurableStorage;
use crate::error::SyncResult;
use crate::types::ProfileInfo;

/// Loads and saves the local participant's own profile info
#[derive(Clone)]
pub struct LocalProfileStore {
    storage: Arc<dyn DurableStorage>,
    path: PathBuf,
}

impl std::fmt::Debug for LocalProfileStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalProfileStore")
            .field("storage", &"<DurableStorage>")
            .field("path", &self.path)
            .finish()
    }
}

impl LocalProfileStore {
    /// Create a store that keeps its record at `path` inside `storage`
    pub fn new(storage: Arc<dyn DurableStorage>, path: impl Into<PathBuf>) -> Self {
        Self {
            storage,
            path: path.into(),
        }
    }

    /// Path of the record inside the storage
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the local profile info
    ///
    /// Returns `None` when the record is missing, shorter than the version
    /// field, or unreadable. Nothing here is an error for the caller.
    pub fn load(&self) -> Option<ProfileInfo> {
        let data = match self.storage.read_bytes(&self.path) {
            Ok(Some(data)) => data,
            Ok(None) => {
                debug!(path = %self.path.display(), "No local profile info stored");
                return None;
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to read local profile info");
                return None;
            }
        };

        let info = ProfileInfo::from_record_bytes(&data);
        if info.is_none() {
            debug!(
                path = %self.path.display(),
                len = data.len(),
                "Local profile record too short, treating as absent"
            );
        }
        info
    }

    /// Overwrite the local profile info record
    pub fn save(&self, info: &ProfileInfo) -> SyncResult<()> {
        self.storage.write_bytes(&self.path, &info.to_record_bytes())?;
        debug!(
            path = %self.path.display(),
            version = info.version,
            payload_len = info.payload.len(),
            "Saved local profile info"
        );
        Ok(())
    }
}
