//! In-process transport
//!
//! Records every send instead of putting it on a wire, and lets the caller
//! inject inbound messages with [`MemoryTransport::deliver`]. The connection
//! set is whatever the caller says it is.

use std::collections::HashMap;

use bytes::Bytes;
use parking_lot::{Mutex, RwLock};
use tracing::{debug, warn};

use super::{MessageHandler, Transport};
use crate::error::SyncResult;
use crate::types::{ConnectedPeer, PeerAddress, UserId};

/// A message handed to the transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub to: PeerAddress,
    pub tag: String,
    pub data: Bytes,
}

/// Transport that keeps everything in memory
#[derive(Default)]
pub struct MemoryTransport {
    peers: RwLock<Vec<ConnectedPeer>>,
    handlers: RwLock<HashMap<String, MessageHandler>>,
    sent: Mutex<Vec<SentMessage>>,
}

impl std::fmt::Debug for MemoryTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryTransport")
            .field("peers", &*self.peers.read())
            .field("handlers", &self.handlers.read().keys().collect::<Vec<_>>())
            .field("sent", &self.sent.lock().len())
            .finish()
    }
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a peer to the connection set, replacing any peer with the same identity
    pub fn connect(&self, peer: ConnectedPeer) {
        let mut peers = self.peers.write();
        peers.retain(|p| p.user_id != peer.user_id);
        peers.push(peer);
    }

    /// Remove a peer from the connection set
    pub fn disconnect(&self, user_id: UserId) {
        self.peers.write().retain(|p| p.user_id != user_id);
    }

    /// Every message sent so far, in send order
    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().clone()
    }

    /// Messages sent to `address`, in send order
    pub fn sent_to(&self, address: &PeerAddress) -> Vec<SentMessage> {
        self.sent
            .lock()
            .iter()
            .filter(|msg| &msg.to == address)
            .cloned()
            .collect()
    }

    /// Drain the send log
    pub fn take_sent(&self) -> Vec<SentMessage> {
        std::mem::take(&mut *self.sent.lock())
    }

    /// Whether a handler is registered for `tag`
    pub fn has_handler(&self, tag: &str) -> bool {
        self.handlers.read().contains_key(tag)
    }

    /// Deliver an inbound message to the handler for `tag`
    ///
    /// Returns `false` if no handler is registered.
    pub fn deliver(&self, origin: PeerAddress, tag: &str, data: &[u8]) -> bool {
        let handler = self.handlers.read().get(tag).cloned();
        match handler {
            Some(handler) => {
                handler(origin, data);
                true
            }
            None => {
                warn!(%origin, tag, "No handler registered, dropping message");
                false
            }
        }
    }
}

impl Transport for MemoryTransport {
    fn send(&self, to: &PeerAddress, tag: &str, data: Bytes) -> SyncResult<()> {
        debug!(%to, tag, len = data.len(), "Sending message");
        self.sent.lock().push(SentMessage {
            to: *to,
            tag: tag.to_string(),
            data,
        });
        Ok(())
    }

    fn on(&self, tag: &str, handler: MessageHandler) {
        debug!(tag, "Registering message handler");
        self.handlers.write().insert(tag.to_string(), handler);
    }

    fn for_each_connected_peer(&self, visitor: &mut dyn FnMut(&ConnectedPeer)) {
        let peers = self.peers.read().clone();
        for peer in &peers {
            visitor(peer);
        }
    }
}
