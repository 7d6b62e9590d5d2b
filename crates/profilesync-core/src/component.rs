//! Component lifecycle
//!
//! Wires the registry, local store, cache refresh trigger and distribution
//! protocol together, and hooks them into the host's scheduler and message
//! dispatch. The component owns the session's registry: it is created on
//! `start` and dropped with the component.

use std::sync::Arc;

use tracing::{info, warn};

use crate::config::ProfileSyncConfig;
use crate::error::SyncResult;
use crate::host::{Identity, ProfileCache, SessionRole};
use crate::maintenance::CacheRefreshTrigger;
use crate::registry::ProfileRegistry;
use crate::scheduler::{Scheduler, TaskHandle};
use crate::storage::{DurableStorage, LocalProfileStore};
use crate::sync::{MembershipSweep, ProfileSync, PROFILE_INFO_TAG};
use crate::transport::Transport;
use crate::types::PeerAddress;

/// Everything the component consumes from its host
#[derive(Clone)]
pub struct HostServices {
    pub identity: Arc<dyn Identity>,
    pub role: Arc<dyn SessionRole>,
    pub transport: Arc<dyn Transport>,
    pub scheduler: Arc<dyn Scheduler>,
    pub storage: Arc<dyn DurableStorage>,
    pub cache: Arc<dyn ProfileCache>,
}

/// Running profile sync for one process
///
/// Dereferences to [`ProfileSync`] for the public entry points.
pub struct ProfileSyncComponent {
    sync: Arc<ProfileSync>,
    sweep: Arc<MembershipSweep>,
    sweep_task: TaskHandle,
}

impl std::fmt::Debug for ProfileSyncComponent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProfileSyncComponent")
            .field("sync", &self.sync)
            .field("sweep_task", &self.sweep_task)
            .finish()
    }
}

impl ProfileSyncComponent {
    /// Build the component and register it with the host
    ///
    /// This will:
    /// - Create an empty registry for the session
    /// - Schedule the membership sweep every `reconcile_interval`
    /// - Register the `profileInfo` handler, unless this process is the host
    ///   (the host only relays; it never learns profiles from the wire)
    pub fn start(services: HostServices, config: &ProfileSyncConfig) -> SyncResult<Self> {
        config.validate()?;

        let registry = Arc::new(ProfileRegistry::new());
        let local_store = LocalProfileStore::new(services.storage.clone(), config.profile_path.clone());
        let cache_refresh = CacheRefreshTrigger::new(
            config.cache_refresh_delay(),
            services.role.clone(),
            services.scheduler.clone(),
            services.cache.clone(),
        );

        let sync = Arc::new(ProfileSync::new(
            services.identity.clone(),
            services.role.clone(),
            services.transport.clone(),
            registry.clone(),
            local_store,
            cache_refresh,
        ));

        let sweep = Arc::new(MembershipSweep::new(
            services.role.clone(),
            services.transport.clone(),
            registry,
        ));

        let sweep_for_task = sweep.clone();
        let sweep_task = services.scheduler.run_periodic(
            Box::new(move || {
                sweep_for_task.run();
            }),
            config.reconcile_interval(),
        );

        if !services.role.is_hosting() {
            // Weak: the transport outlives the component and must not keep it alive
            let handler_sync = Arc::downgrade(&sync);
            services.transport.on(
                PROFILE_INFO_TAG,
                Arc::new(move |origin: PeerAddress, data: &[u8]| {
                    let Some(sync) = handler_sync.upgrade() else {
                        return;
                    };
                    if let Err(e) = sync.handle_message(origin, data) {
                        warn!(%origin, error = %e, "Failed to handle profile info message");
                    }
                }),
            );
        }

        info!(
            local_identity = %services.identity.local_identity(),
            hosting = services.role.is_hosting(),
            "Profile sync started"
        );

        Ok(Self {
            sync,
            sweep,
            sweep_task,
        })
    }

    /// The distribution protocol
    pub fn sync(&self) -> &Arc<ProfileSync> {
        &self.sync
    }

    /// The session's registry
    pub fn registry(&self) -> &Arc<ProfileRegistry> {
        self.sync.registry()
    }

    /// Run a membership sweep immediately. Returns how many entries were removed.
    pub fn sweep_now(&self) -> usize {
        self.sweep.run()
    }

    /// Stop the periodic sweep
    pub fn shutdown(&self) {
        self.sweep_task.abort();
        info!("Profile sync stopped");
    }
}

impl std::ops::Deref for ProfileSyncComponent {
    type Target = ProfileSync;

    fn deref(&self) -> &Self::Target {
        &self.sync
    }
}

impl Drop for ProfileSyncComponent {
    fn drop(&mut self) {
        self.sweep_task.abort();
    }
}
