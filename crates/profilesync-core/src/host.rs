//! Host capabilities consumed by the sync core
//!
//! The embedding process answers three kinds of questions: who am I, what
//! role am I playing in the current session, and how do I drop my cached
//! profile data. Each is a narrow trait so the protocol can be driven by the
//! real game host or by the in-process implementations below.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use parking_lot::RwLock;
use tracing::info;

use crate::types::{PeerAddress, UserId};

/// Resolves the local participant's identity
pub trait Identity: Send + Sync {
    fn local_identity(&self) -> UserId;
}

/// Role and session state of the local process
///
/// Every role-dependent branch in the core queries this one capability.
pub trait SessionRole: Send + Sync {
    /// Whether this process is the authoritative session host
    fn is_hosting(&self) -> bool;

    /// Whether a session is currently running
    fn is_session_active(&self) -> bool;

    /// Whether `address` belongs to the host of the session we joined
    fn is_session_host(&self, address: &PeerAddress) -> bool;
}

/// Host-side cache of profile data derived from the registry
pub trait ProfileCache: Send + Sync {
    /// Drop cached profile data so it is rebuilt from fresh registry contents
    fn invalidate_profile_cache(&self);
}

/// Fixed identity
#[derive(Debug, Clone, Copy)]
pub struct StaticIdentity(pub UserId);

impl Identity for StaticIdentity {
    fn local_identity(&self) -> UserId {
        self.0
    }
}

/// Role and session state held in atomics, settable from any thread
#[derive(Debug, Default)]
pub struct SessionFlags {
    hosting: AtomicBool,
    session_active: AtomicBool,
    host_address: RwLock<Option<PeerAddress>>,
}

impl SessionFlags {
    /// State for the process hosting an active session
    pub fn hosting() -> Self {
        let flags = Self::default();
        flags.set_hosting(true);
        flags.set_session_active(true);
        flags
    }

    /// State for a participant connected to the host at `host`
    pub fn joined(host: PeerAddress) -> Self {
        let flags = Self::default();
        flags.set_session_active(true);
        flags.set_host_address(Some(host));
        flags
    }

    pub fn set_hosting(&self, hosting: bool) {
        self.hosting.store(hosting, Ordering::SeqCst);
    }

    pub fn set_session_active(&self, active: bool) {
        self.session_active.store(active, Ordering::SeqCst);
    }

    pub fn set_host_address(&self, address: Option<PeerAddress>) {
        *self.host_address.write() = address;
    }
}

impl SessionRole for SessionFlags {
    fn is_hosting(&self) -> bool {
        self.hosting.load(Ordering::SeqCst)
    }

    fn is_session_active(&self) -> bool {
        self.session_active.load(Ordering::SeqCst)
    }

    fn is_session_host(&self, address: &PeerAddress) -> bool {
        self.host_address.read().as_ref() == Some(address)
    }
}

/// Profile cache that only counts invalidations
#[derive(Debug, Default)]
pub struct InvalidationCounter {
    count: AtomicUsize,
}

impl InvalidationCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// How many times the cache has been invalidated
    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

impl ProfileCache for InvalidationCounter {
    fn invalidate_profile_cache(&self) {
        let count = self.count.fetch_add(1, Ordering::SeqCst) + 1;
        info!(count, "Profile cache invalidated");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_flags_roles() {
        let host: PeerAddress = "10.0.0.1:28960".parse().unwrap();
        let other: PeerAddress = "10.0.0.2:28960".parse().unwrap();

        let hosting = SessionFlags::hosting();
        assert!(hosting.is_hosting());
        assert!(hosting.is_session_active());
        assert!(!hosting.is_session_host(&host));

        let joined = SessionFlags::joined(host);
        assert!(!joined.is_hosting());
        assert!(joined.is_session_host(&host));
        assert!(!joined.is_session_host(&other));

        joined.set_host_address(None);
        assert!(!joined.is_session_host(&host));
    }

    #[test]
    fn test_invalidation_counter() {
        let cache = InvalidationCounter::new();
        cache.invalidate_profile_cache();
        cache.invalidate_profile_cache();
        assert_eq!(cache.count(), 2);
    }
}
