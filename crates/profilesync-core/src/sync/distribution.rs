//! Profile info distribution
//!
//! Store-and-forward gossip of profile info between session participants.
//!
//! ## Propagation patterns
//!
//! - **Broadcast**: a newly known profile is sent to every connected peer.
//! - **Full sync**: a joining peer is sent everything we know, plus our own
//!   profile when we are not the host.
//! - **Ingest**: received profiles are stored and the host's profile cache
//!   refresh is armed.
//!
//! ## Join ordering
//!
//! ```text
//! Host                                Newcomer (N)
//!   |--- full sync: every known entry -->|   registry does not contain N yet
//!   |   ingest N                         |
//!   |--- broadcast N to every peer ----->|   (N is connected, so it receives
//!   |                                    |    its own info last)
//! ```
//!
//! A participant's own identity is filtered on both ingest and broadcast, so
//! profile info never loops back to its owner through this node.

use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, info, warn};

use super::protocol::{encode_profile_info, ProfileInfoMessage, PROFILE_INFO_TAG};
use crate::error::SyncResult;
use crate::host::{Identity, SessionRole};
use crate::maintenance::CacheRefreshTrigger;
use crate::registry::ProfileRegistry;
use crate::storage::LocalProfileStore;
use crate::transport::Transport;
use crate::types::{ConnectedPeer, PeerAddress, ProfileInfo, UserId};

/// Profile info distribution for one session participant
///
/// Owns nothing global: the registry, store and trigger are handed in by
/// whoever owns the session (normally [`crate::ProfileSyncComponent`]).
pub struct ProfileSync {
    identity: Arc<dyn Identity>,
    role: Arc<dyn SessionRole>,
    transport: Arc<dyn Transport>,
    registry: Arc<ProfileRegistry>,
    local_store: LocalProfileStore,
    cache_refresh: CacheRefreshTrigger,
}

impl std::fmt::Debug for ProfileSync {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProfileSync")
            .field("local_identity", &self.identity.local_identity().to_string())
            .field("registry_len", &self.registry.len())
            .field("local_store", &self.local_store)
            .field("cache_refresh", &self.cache_refresh)
            .finish_non_exhaustive()
    }
}

impl ProfileSync {
    pub fn new(
        identity: Arc<dyn Identity>,
        role: Arc<dyn SessionRole>,
        transport: Arc<dyn Transport>,
        registry: Arc<ProfileRegistry>,
        local_store: LocalProfileStore,
        cache_refresh: CacheRefreshTrigger,
    ) -> Self {
        Self {
            identity,
            role,
            transport,
            registry,
            local_store,
            cache_refresh,
        }
    }

    /// The registry this instance distributes from
    pub fn registry(&self) -> &Arc<ProfileRegistry> {
        &self.registry
    }

    /// The cache refresh trigger armed by ingests
    pub fn cache_refresh(&self) -> &CacheRefreshTrigger {
        &self.cache_refresh
    }

    fn is_local(&self, user_id: UserId) -> bool {
        user_id == self.identity.local_identity()
    }

    fn encode(&self, user_id: UserId, info: &ProfileInfo) -> Option<Bytes> {
        match encode_profile_info(user_id, info) {
            Ok(data) => Some(data),
            Err(e) => {
                warn!(%user_id, error = %e, "Failed to encode profile info");
                None
            }
        }
    }

    fn send(&self, address: &PeerAddress, data: Bytes) {
        if let Err(e) = self.transport.send(address, PROFILE_INFO_TAG, data) {
            warn!(peer = %address, error = %e, "Failed to send profile info");
        }
    }

    /// Store a participant's profile info
    ///
    /// Our own identity is ignored: the local profile lives in durable storage
    /// and must not be overwritten by a copy that went around the network.
    pub fn add_profile_info(&self, user_id: UserId, info: ProfileInfo) {
        if self.is_local(user_id) {
            debug!(%user_id, "Ignoring own profile info");
            return;
        }

        debug!(%user_id, version = info.version, "Storing profile info");
        self.registry.upsert(user_id, info);

        self.cache_refresh.arm();
    }

    /// Send one participant's profile info to a single address
    pub fn distribute_profile_info_to_user(
        &self,
        address: &PeerAddress,
        user_id: UserId,
        info: &ProfileInfo,
    ) {
        let Some(data) = self.encode(user_id, info) else {
            return;
        };

        debug!(peer = %address, %user_id, "Sending profile info");
        self.send(address, data);
    }

    /// Send a participant's profile info to every connected peer
    ///
    /// Our own identity is never broadcast from here.
    pub fn distribute_profile_info(&self, user_id: UserId, info: &ProfileInfo) {
        if self.is_local(user_id) {
            return;
        }

        let Some(data) = self.encode(user_id, info) else {
            return;
        };

        let mut recipients = 0usize;
        self.transport.for_each_connected_peer(&mut |peer: &ConnectedPeer| {
            self.send(&peer.address, data.clone());
            recipients += 1;
        });

        debug!(%user_id, recipients, "Broadcast profile info");
    }

    /// Send everything we know to one address
    ///
    /// Registry entries are snapshotted first so nothing is sent while the
    /// registry lock is held. A non-host also sends its own stored profile,
    /// since no other participant would forward it to the newcomer.
    pub fn distribute_profile_infos_to_user(&self, address: &PeerAddress) {
        let entries = self.registry.snapshot();
        for (user_id, info) in &entries {
            self.distribute_profile_info_to_user(address, *user_id, info);
        }

        if !self.role.is_hosting() {
            if let Some(info) = self.get_local_profile_info() {
                self.distribute_profile_info_to_user(address, self.identity.local_identity(), &info);
            }
        }

        info!(peer = %address, entries = entries.len(), "Full profile sync sent");
    }

    /// A participant joined: bring them up to date, then tell everyone about them
    ///
    /// The newcomer receives the pre-join snapshot before it is added to the
    /// registry, so the full sync never contains its own info.
    pub fn add_and_distribute_profile_info(
        &self,
        address: &PeerAddress,
        user_id: UserId,
        info: ProfileInfo,
    ) {
        self.distribute_profile_infos_to_user(address);

        self.add_profile_info(user_id, info.clone());
        self.distribute_profile_info(user_id, &info);
    }

    /// Forget every remote participant's profile info
    pub fn clear_profile_infos(&self) {
        self.registry.clear();
        info!("Cleared profile infos");
    }

    /// The local participant's own profile info, from durable storage
    pub fn get_local_profile_info(&self) -> Option<ProfileInfo> {
        self.local_store.load()
    }

    /// A participant's profile info
    ///
    /// For our own identity this reads durable storage, otherwise the registry.
    pub fn get_profile_info(&self, user_id: UserId) -> Option<ProfileInfo> {
        debug!(%user_id, "Requesting profile info");

        if self.is_local(user_id) {
            return self.get_local_profile_info();
        }

        self.registry.lookup(user_id)
    }

    /// Persist new local profile info
    pub fn update_local_profile_info(&self, info: &ProfileInfo) -> SyncResult<()> {
        self.local_store.save(info)
    }

    /// Handle an inbound `profileInfo` message
    ///
    /// Only the host of the session we joined is trusted to relay profile
    /// info; messages from anyone else are dropped without error.
    pub fn handle_message(&self, origin: PeerAddress, data: &[u8]) -> SyncResult<()> {
        if !self.role.is_session_host(&origin) {
            debug!(%origin, "Dropping profile info from non-host");
            return Ok(());
        }

        let msg = ProfileInfoMessage::decode(data)?;
        self.add_profile_info(msg.user_id, msg.info);
        Ok(())
    }
}
