//! Message transport boundary
//!
//! The transport owns addressing, framing on the wire and delivery
//! guarantees. Sends are fire-and-forget: a successful `send` means the
//! message was handed off, not that it arrived.

use std::sync::Arc;

use bytes::Bytes;

use crate::error::SyncResult;
use crate::types::{ConnectedPeer, PeerAddress};

pub mod memory;

pub use memory::{MemoryTransport, SentMessage};

/// Handler for inbound messages on one tag: `(origin, payload)`
pub type MessageHandler = Arc<dyn Fn(PeerAddress, &[u8]) + Send + Sync>;

/// Unreliable tagged message channel to connected peers
pub trait Transport: Send + Sync {
    /// Hand `data` to the transport for delivery to `to` under `tag`
    fn send(&self, to: &PeerAddress, tag: &str, data: Bytes) -> SyncResult<()>;

    /// Register the handler for inbound messages carrying `tag`
    fn on(&self, tag: &str, handler: MessageHandler);

    /// Visit every currently connected peer
    fn for_each_connected_peer(&self, visitor: &mut dyn FnMut(&ConnectedPeer));
}

/// Collect the current connection set
pub fn connected_peers(transport: &dyn Transport) -> Vec<ConnectedPeer> {
    let mut peers = Vec::new();
    transport.for_each_connected_peer(&mut |peer: &ConnectedPeer| peers.push(*peer));
    peers
}
