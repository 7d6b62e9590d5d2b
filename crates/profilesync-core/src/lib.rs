//! Profilesync Core Library
//!
//! Peer-to-peer synchronization of per-participant profile info inside a
//! multiplayer session.
//!
//! ## Overview
//!
//! Each participant owns a small versioned blob of profile info. The local
//! participant's own info is persisted on disk; everyone else's lives in an
//! in-memory registry for the duration of the session. The session host
//! relays profile info: newcomers receive everything the host knows, and
//! every newcomer's info is broadcast to the rest of the session.
//!
//! ## Core Principles
//!
//! - **No echo**: a participant's own info is never ingested from, or
//!   broadcast back over, the network
//! - **Join ordering**: a newcomer receives the pre-join registry before it
//!   is added to it
//! - **Bounded side effects**: a burst of ingests causes one profile cache
//!   refresh, not one per ingest
//!
//! ## Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use profilesync_core::{HostServices, ProfileSyncComponent, ProfileSyncConfig, TokioScheduler};
//!
//! let services = HostServices {
//!     identity,
//!     role,
//!     transport,
//!     scheduler: Arc::new(TokioScheduler::current()?),
//!     storage,
//!     cache,
//! };
//! let profiles = ProfileSyncComponent::start(services, &ProfileSyncConfig::default())?;
//!
//! // A participant connected to our session
//! profiles.add_and_distribute_profile_info(&address, user_id, info);
//! ```

pub mod component;
pub mod config;
pub mod error;
pub mod host;
pub mod logging;
pub mod maintenance;
pub mod registry;
pub mod scheduler;
pub mod storage;
pub mod sync;
pub mod transport;
pub mod types;

// Re-exports
pub use component::{HostServices, ProfileSyncComponent};
pub use config::ProfileSyncConfig;
pub use error::{ProfileSyncError, SyncResult};
pub use host::{Identity, InvalidationCounter, ProfileCache, SessionFlags, SessionRole, StaticIdentity};
pub use maintenance::{CacheRefreshTrigger, RefreshState};
pub use registry::ProfileRegistry;
pub use scheduler::{Scheduler, TaskHandle, TokioScheduler};
pub use storage::{DurableStorage, FsStorage, LocalProfileStore, MemoryStorage};
pub use sync::{MembershipSweep, ProfileInfoMessage, ProfileSync, PROFILE_INFO_TAG};
pub use transport::{MemoryTransport, SentMessage, Transport};
pub use types::*;
