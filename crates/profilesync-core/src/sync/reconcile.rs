//! Membership reconciliation
//!
//! The host periodically drops registry entries for participants that are
//! no longer connected. The sweep only touches the registry: nothing is sent
//! and no other side effect is raised.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, info};

use crate::host::SessionRole;
use crate::registry::ProfileRegistry;
use crate::transport::{connected_peers, Transport};
use crate::types::UserId;

/// Identities of every currently connected peer
pub fn connected_user_ids(transport: &dyn Transport) -> HashSet<UserId> {
    connected_peers(transport)
        .into_iter()
        .map(|peer| peer.user_id)
        .collect()
}

/// Periodic sweep of disconnected participants out of the registry
pub struct MembershipSweep {
    role: Arc<dyn SessionRole>,
    transport: Arc<dyn Transport>,
    registry: Arc<ProfileRegistry>,
}

impl MembershipSweep {
    pub fn new(
        role: Arc<dyn SessionRole>,
        transport: Arc<dyn Transport>,
        registry: Arc<ProfileRegistry>,
    ) -> Self {
        Self {
            role,
            transport,
            registry,
        }
    }

    /// Run one sweep. Returns how many entries were removed.
    ///
    /// Only the host of an active session sweeps; anywhere else this is a
    /// no-op returning 0.
    pub fn run(&self) -> usize {
        if !self.role.is_hosting() || !self.role.is_session_active() {
            return 0;
        }

        // Connection set is taken before the registry lock
        let connected = connected_user_ids(self.transport.as_ref());
        let removed = self.registry.retain(|user_id| connected.contains(&user_id));

        if removed > 0 {
            info!(removed, connected = connected.len(), "Removed profile infos of disconnected peers");
        } else {
            debug!(connected = connected.len(), "Profile info sweep found nothing to remove");
        }

        removed
    }
}

impl std::fmt::Debug for MembershipSweep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MembershipSweep").finish_non_exhaustive()
    }
}
