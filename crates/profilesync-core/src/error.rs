//! Error types for profilesync

use thiserror::Error;

/// Main error type for profile sync operations
#[derive(Error, Debug)]
pub enum ProfileSyncError {
    /// A value cannot be represented in the wire format
    #[error("Encode error: {0}")]
    Encode(String),

    /// A received buffer was too short or otherwise malformed
    #[error("Decode error: {0}")]
    Decode(String),

    /// General I/O error (durable storage, log files)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error during serialization/deserialization of configuration
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The transport refused or failed to hand off a message
    #[error("Transport error: {0}")]
    Transport(String),

    /// No async runtime available to schedule work on
    #[error("Runtime error: {0}")]
    Runtime(String),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Result type alias using ProfileSyncError
pub type SyncResult<T> = Result<T, ProfileSyncError>;
