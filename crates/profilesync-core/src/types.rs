//! Core types for profilesync

use std::net::SocketAddr;
use std::str::FromStr;

pub mod profile;

pub use profile::ProfileInfo;

/// Stable 64-bit participant identifier
///
/// Identifies a participant across sessions. This is never a transient
/// connection slot; two connections from the same account share a `UserId`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UserId(pub u64);

impl UserId {
    /// Create a UserId from its raw value
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Get the raw 64-bit value
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl From<u64> for UserId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:X}", self.0)
    }
}

/// Network address of a connected peer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PeerAddress(pub SocketAddr);

impl PeerAddress {
    /// Wrap a socket address
    pub const fn new(addr: SocketAddr) -> Self {
        Self(addr)
    }

    /// Get the underlying socket address
    pub fn socket_addr(&self) -> SocketAddr {
        self.0
    }
}

impl From<SocketAddr> for PeerAddress {
    fn from(addr: SocketAddr) -> Self {
        Self(addr)
    }
}

impl FromStr for PeerAddress {
    type Err = std::net::AddrParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

impl std::fmt::Display for PeerAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A peer currently connected to the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectedPeer {
    /// Where to send messages for this peer
    pub address: PeerAddress,
    /// The peer's stable identity
    pub user_id: UserId,
}

impl ConnectedPeer {
    pub fn new(address: PeerAddress, user_id: UserId) -> Self {
        Self { address, user_id }
    }
}
