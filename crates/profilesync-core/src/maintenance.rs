//! Debounced profile cache refresh
//!
//! Every ingested profile makes the host's profile cache stale, but
//! invalidating it is expensive and ingests arrive in bursts (a full sync
//! replays the whole registry). The trigger coalesces a burst into a single
//! invalidation that fires one delay after the first ingest.
//!
//! ```text
//!          arm()                          delay elapsed
//!   Idle ─────────▶ Pending ──────────────────────────▶ invalidate ─▶ Idle
//!                     │  ▲
//!                     └──┘ arm() is a no-op
//! ```
//!
//! The state is one atomic word; `arm` is a compare-and-swap from Idle to
//! Pending, so exactly one caller per burst schedules the firing.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::host::{ProfileCache, SessionRole};
use crate::scheduler::Scheduler;

/// State of the cache refresh trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RefreshState {
    /// Nothing scheduled; the next arm schedules a firing
    Idle = 0,
    /// A firing is scheduled; arms are ignored until it runs
    Pending = 1,
}

impl RefreshState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Idle,
            _ => Self::Pending,
        }
    }
}

/// Coalesces profile cache invalidations into one per burst of ingests
pub struct CacheRefreshTrigger {
    state: Arc<AtomicU8>,
    delay: Duration,
    role: Arc<dyn SessionRole>,
    scheduler: Arc<dyn Scheduler>,
    cache: Arc<dyn ProfileCache>,
}

impl std::fmt::Debug for CacheRefreshTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheRefreshTrigger")
            .field("state", &self.state())
            .field("delay", &self.delay)
            .finish_non_exhaustive()
    }
}

impl CacheRefreshTrigger {
    pub fn new(
        delay: Duration,
        role: Arc<dyn SessionRole>,
        scheduler: Arc<dyn Scheduler>,
        cache: Arc<dyn ProfileCache>,
    ) -> Self {
        Self {
            state: Arc::new(AtomicU8::new(RefreshState::Idle as u8)),
            delay,
            role,
            scheduler,
            cache,
        }
    }

    /// Current state
    pub fn state(&self) -> RefreshState {
        RefreshState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Request a cache refresh
    ///
    /// Returns `true` if this call scheduled the firing. The host never keeps
    /// a derived profile cache, so arming while hosting does nothing.
    pub fn arm(&self) -> bool {
        if self.role.is_hosting() {
            return false;
        }

        let armed = self
            .state
            .compare_exchange(
                RefreshState::Idle as u8,
                RefreshState::Pending as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok();

        if !armed {
            return false;
        }

        debug!(delay = ?self.delay, "Scheduling profile cache refresh");

        let state = self.state.clone();
        let cache = self.cache.clone();
        self.scheduler.run_once_delayed(
            Box::new(move || {
                cache.invalidate_profile_cache();
                state.store(RefreshState::Idle as u8, Ordering::Release);
            }),
            self.delay,
        );

        true
    }
}
