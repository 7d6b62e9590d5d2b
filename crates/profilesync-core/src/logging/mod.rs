//! Structured logging with an optional per-participant JSONL event log.
//!
//! Library code only emits `tracing` events. Binaries install a subscriber
//! with [`LoggingBuilder`]; when given a logs directory it also appends every
//! event to a JSONL file named after the participant, which makes it easy to
//! line up what several processes in one session saw.
//!
//! ```text
//! logs/
//! └── raw/
//!     ├── 2026-10-16_1.jsonl        # host
//!     └── 2026-10-16_64.jsonl       # participant 0x64
//! ```
//!
//! ```ignore
//! use profilesync_core::logging::LoggingBuilder;
//!
//! LoggingBuilder::new("info")
//!     .with_logs_dir("./logs")
//!     .with_participant("1")
//!     .init()?;
//! ```
//!
//! ```bash
//! # Everything one participant ingested, in order
//! jq 'select(.msg == "Storing profile info")' logs/raw/*_64.jsonl
//!
//! # Every event about participant 0x65, across all processes
//! jq 'select(.user_id == "65")' logs/raw/*.jsonl
//! ```

pub mod entry;
pub mod layer;
pub mod writer;

pub use entry::JsonLogEntry;
pub use layer::{JsonlLayer, LoggingBuilder};
pub use writer::{read_entries, ParticipantLogWriter};
