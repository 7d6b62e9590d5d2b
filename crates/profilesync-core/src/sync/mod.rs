//! Profile info synchronization between session participants
//!
//! ## Overview
//!
//! Every participant keeps the last known profile info of every other
//! participant in a [`ProfileRegistry`](crate::registry::ProfileRegistry).
//! The session host relays profile info between participants: it replays the
//! registry to newcomers and broadcasts each newcomer's info to everyone.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  ProfileSync (distribution)                                     │
//! │  ├── handle_message: decode + ingest "profileInfo" messages    │
//! │  ├── add_profile_info: registry upsert + cache refresh arm     │
//! │  ├── distribute_profile_info: broadcast to connected peers     │
//! │  └── distribute_profile_infos_to_user: full sync to one peer   │
//! │                                                                 │
//! │  MembershipSweep (reconcile)                                    │
//! │  └── drops entries of participants no longer connected         │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod distribution;
pub mod protocol;
pub mod reconcile;

pub use distribution::ProfileSync;
pub use protocol::{encode_profile_info, ProfileInfoMessage, PROFILE_INFO_TAG};
pub use reconcile::{connected_user_ids, MembershipSweep};
