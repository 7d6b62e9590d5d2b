//! Profile Registry - last known profile info for every other participant
//!
//! The registry is shared between the transport's dispatch context (ingest)
//! and the scheduler (membership sweeps). Every operation takes the same
//! lock for the whole map; there are no separate read and write tiers.
//!
//! Closures passed in run while the lock is held and must not call back into
//! the registry, the transport or the scheduler. Anything that needs to talk
//! to the network takes a [`ProfileRegistry::snapshot`] first.

use std::collections::HashMap;

use parking_lot::Mutex;

use crate::types::{ProfileInfo, UserId};

/// Map from participant to their last known profile info
pub type ProfileMap = HashMap<UserId, ProfileInfo>;

/// Mutation-guarded registry of remote participants' profile info
#[derive(Debug, Default)]
pub struct ProfileRegistry {
    profiles: Mutex<ProfileMap>,
}

impl ProfileRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` with exclusive mutable access to the whole map
    fn access<R>(&self, f: impl FnOnce(&mut ProfileMap) -> R) -> R {
        let mut profiles = self.profiles.lock();
        f(&mut profiles)
    }

    /// Run `f` with exclusive read-only access to the whole map
    fn read<R>(&self, f: impl FnOnce(&ProfileMap) -> R) -> R {
        let profiles = self.profiles.lock();
        f(&profiles)
    }

    /// Insert or replace the entry for `user_id`
    pub fn upsert(&self, user_id: UserId, info: ProfileInfo) {
        self.access(|profiles| {
            profiles.insert(user_id, info);
        });
    }

    /// Copy of the current entry for `user_id`
    pub fn lookup(&self, user_id: UserId) -> Option<ProfileInfo> {
        self.read(|profiles| profiles.get(&user_id).cloned())
    }

    /// Visit every entry, in no particular order
    pub fn for_each(&self, mut visitor: impl FnMut(UserId, &ProfileInfo)) {
        self.read(|profiles| {
            for (user_id, info) in profiles {
                visitor(*user_id, info);
            }
        });
    }

    /// Owned copy of every entry, for use outside the lock
    pub fn snapshot(&self) -> Vec<(UserId, ProfileInfo)> {
        self.read(|profiles| {
            profiles
                .iter()
                .map(|(user_id, info)| (*user_id, info.clone()))
                .collect()
        })
    }

    /// Remove every entry whose id fails `keep`. Returns how many were removed.
    pub fn retain(&self, mut keep: impl FnMut(UserId) -> bool) -> usize {
        self.access(|profiles| {
            let before = profiles.len();
            profiles.retain(|user_id, _| keep(*user_id));
            before - profiles.len()
        })
    }

    /// Remove every entry
    pub fn clear(&self) {
        self.access(|profiles| profiles.clear());
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.read(|profiles| profiles.len())
    }

    /// Whether the registry has no entries
    pub fn is_empty(&self) -> bool {
        self.read(|profiles| profiles.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn info(version: i32, payload: &'static [u8]) -> ProfileInfo {
        ProfileInfo::new(version, payload)
    }

    #[test]
    fn test_upsert_and_lookup() {
        let registry = ProfileRegistry::new();
        registry.upsert(UserId(100), info(1, b"x"));

        assert_eq!(registry.lookup(UserId(100)), Some(info(1, b"x")));
        assert_eq!(registry.lookup(UserId(101)), None);
    }

    #[test]
    fn test_upsert_replaces() {
        let registry = ProfileRegistry::new();
        registry.upsert(UserId(100), info(1, b"x"));
        registry.upsert(UserId(100), info(2, b"y"));

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.lookup(UserId(100)), Some(info(2, b"y")));
    }

    #[test]
    fn test_for_each_visits_all() {
        let registry = ProfileRegistry::new();
        registry.upsert(UserId(1), info(1, b"a"));
        registry.upsert(UserId(2), info(2, b"b"));
        registry.upsert(UserId(3), info(3, b"c"));

        let mut seen = Vec::new();
        registry.for_each(|user_id, info| seen.push((user_id.0, info.version)));
        seen.sort();

        assert_eq!(seen, vec![(1, 1), (2, 2), (3, 3)]);
    }

    #[test]
    fn test_retain_removes_missing() {
        let registry = ProfileRegistry::new();
        registry.upsert(UserId(1), info(1, b"a"));
        registry.upsert(UserId(2), info(2, b"b"));
        registry.upsert(UserId(3), info(3, b"c"));

        let removed = registry.retain(|user_id| user_id != UserId(2));

        assert_eq!(removed, 1);
        assert!(registry.lookup(UserId(2)).is_none());
        assert_eq!(registry.lookup(UserId(1)), Some(info(1, b"a")));
        assert_eq!(registry.lookup(UserId(3)), Some(info(3, b"c")));
    }

    #[test]
    fn test_clear() {
        let registry = ProfileRegistry::new();
        registry.clear();
        assert!(registry.is_empty());

        registry.upsert(UserId(1), info(1, b"a"));
        registry.clear();
        assert!(registry.is_empty());
    }

    #[test]
    fn test_snapshot_is_detached() {
        let registry = ProfileRegistry::new();
        registry.upsert(UserId(1), info(1, b"a"));

        let snapshot = registry.snapshot();
        registry.clear();

        assert_eq!(snapshot, vec![(UserId(1), info(1, b"a"))]);
    }

    #[test]
    fn test_concurrent_upserts() {
        let registry = Arc::new(ProfileRegistry::new());

        let handles: Vec<_> = (0..8u64)
            .map(|t| {
                let registry = registry.clone();
                std::thread::spawn(move || {
                    for i in 0..100u64 {
                        registry.upsert(UserId(t * 1000 + i), info(i as i32, b"p"));
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(registry.len(), 800);
    }

    #[test]
    fn test_sweep_interleaved_with_ingest() {
        use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

        // Even ids stay connected, odd ids have left
        let registry = Arc::new(ProfileRegistry::new());
        let removed = Arc::new(AtomicUsize::new(0));
        let ingesting = Arc::new(AtomicBool::new(true));

        let sweeper = {
            let registry = registry.clone();
            let removed = removed.clone();
            let ingesting = ingesting.clone();
            std::thread::spawn(move || {
                while ingesting.load(Ordering::SeqCst) {
                    let n = registry.retain(|user_id| user_id.0 % 2 == 0);
                    removed.fetch_add(n, Ordering::SeqCst);
                }
            })
        };

        let ingesters: Vec<_> = (0..4u64)
            .map(|t| {
                let registry = registry.clone();
                std::thread::spawn(move || {
                    for i in 0..500u64 {
                        registry.upsert(UserId(t * 1000 + i), info(1, b"p"));
                    }
                })
            })
            .collect();

        for handle in ingesters {
            handle.join().unwrap();
        }
        ingesting.store(false, Ordering::SeqCst);
        sweeper.join().unwrap();

        let n = registry.retain(|user_id| user_id.0 % 2 == 0);
        removed.fetch_add(n, Ordering::SeqCst);

        // Every departed entry was removed exactly once, every connected one survived
        assert_eq!(removed.load(Ordering::SeqCst), 1000);
        assert_eq!(registry.len(), 1000);
        assert!(registry.snapshot().iter().all(|(user_id, _)| user_id.0 % 2 == 0));
    }
}
