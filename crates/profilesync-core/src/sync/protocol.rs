//! Wire format for `profileInfo` messages
//!
//! ```text
//! [user_id: u64 LE][version: i32 LE][len: u32 LE][payload: len bytes]
//! ```
//!
//! The transport delivers the message body as-is; there is no envelope, no
//! message type byte and no protocol version. Bytes after the payload are
//! ignored.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::SyncResult;
use crate::types::profile::ensure_remaining;
use crate::types::{ProfileInfo, UserId};

/// Message tag the transport routes profile info messages under
pub const PROFILE_INFO_TAG: &str = "profileInfo";

const USER_ID_LEN: usize = std::mem::size_of::<u64>();

/// One participant's profile info, as sent between peers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileInfoMessage {
    /// Whose profile info this is
    pub user_id: UserId,
    pub info: ProfileInfo,
}

impl ProfileInfoMessage {
    pub fn new(user_id: UserId, info: ProfileInfo) -> Self {
        Self { user_id, info }
    }

    /// Encode to the wire format
    pub fn encode(&self) -> SyncResult<Bytes> {
        encode_profile_info(self.user_id, &self.info)
    }

    /// Decode from the wire format
    pub fn decode(mut data: &[u8]) -> SyncResult<Self> {
        ensure_remaining(&data, USER_ID_LEN, "user id")?;
        let user_id = UserId(data.get_u64_le());
        let info = ProfileInfo::decode(&mut data)?;

        Ok(Self { user_id, info })
    }
}

/// Encode `(user_id, info)` without building a message first
pub fn encode_profile_info(user_id: UserId, info: &ProfileInfo) -> SyncResult<Bytes> {
    let mut buf = BytesMut::with_capacity(USER_ID_LEN + info.encoded_len());
    buf.put_u64_le(user_id.as_u64());
    info.encode(&mut buf)?;
    Ok(buf.freeze())
}
