//! Durable storage primitives.
//!
//! The sync core only ever persists one record (the local participant's own
//! profile info), so the storage boundary is a plain byte-file interface:
//! read a whole file, overwrite a whole file.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::error::SyncResult;

// Submodules
mod local_profile;

pub use local_profile::LocalProfileStore;

/// Whole-file durable storage
pub trait DurableStorage: Send + Sync {
    /// Read the full contents at `path`.
    ///
    /// Returns `Ok(None)` if nothing is stored there.
    fn read_bytes(&self, path: &Path) -> SyncResult<Option<Vec<u8>>>;

    /// Replace the contents at `path`.
    fn write_bytes(&self, path: &Path, data: &[u8]) -> SyncResult<()>;
}

/// Filesystem storage rooted at a data directory
///
/// Relative paths are resolved against the root; absolute paths are used
/// as-is.
#[derive(Debug, Clone)]
pub struct FsStorage {
    root: PathBuf,
}

impl FsStorage {
    /// Create storage rooted at `root`. The directory is created lazily.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The data directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        self.root.join(path)
    }
}

impl DurableStorage for FsStorage {
    fn read_bytes(&self, path: &Path) -> SyncResult<Option<Vec<u8>>> {
        match std::fs::read(self.resolve(path)) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write_bytes(&self, path: &Path, data: &[u8]) -> SyncResult<()> {
        let path = self.resolve(path);

        // Create parent directory if needed
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, data)?;
        Ok(())
    }
}

/// In-memory storage, for embedding without a filesystem and for tests
#[derive(Debug, Default)]
pub struct MemoryStorage {
    files: Mutex<HashMap<PathBuf, Vec<u8>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DurableStorage for MemoryStorage {
    fn read_bytes(&self, path: &Path) -> SyncResult<Option<Vec<u8>>> {
        Ok(self.files.lock().get(path).cloned())
    }

    fn write_bytes(&self, path: &Path, data: &[u8]) -> SyncResult<()> {
        self.files.lock().insert(path.to_path_buf(), data.to_vec());
        Ok(())
    }
}
