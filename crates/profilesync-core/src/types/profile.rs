//! Profile info value type and its binary encodings
//!
//! Two layouts exist for the same value:
//!
//! ```text
//! wire:    [version: i32 LE][len: u32 LE][payload: len bytes]
//! record:  [version: i32 LE][payload: rest of file]
//! ```
//!
//! The wire layout is embedded in `profileInfo` messages. The record layout is
//! what the local participant's own info looks like on disk; its payload
//! length is implicit.

use bytes::{Buf, BufMut, Bytes};

use crate::error::{ProfileSyncError, SyncResult};

/// Width of the version field in both layouts
pub const VERSION_LEN: usize = std::mem::size_of::<i32>();

/// Width of the payload length prefix in the wire layout
const PAYLOAD_LEN_PREFIX: usize = std::mem::size_of::<u32>();

/// Versioned opaque profile metadata owned by one participant
///
/// The payload is never interpreted here. Cloning is cheap: the payload is a
/// reference-counted `Bytes`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileInfo {
    /// Owner-assigned version tag
    pub version: i32,
    /// Opaque payload
    pub payload: Bytes,
}

impl ProfileInfo {
    /// Create profile info from caller-supplied fields
    pub fn new(version: i32, payload: impl Into<Bytes>) -> Self {
        Self {
            version,
            payload: payload.into(),
        }
    }

    /// Number of bytes `encode` will write
    pub fn encoded_len(&self) -> usize {
        VERSION_LEN + PAYLOAD_LEN_PREFIX + self.payload.len()
    }

    /// Append the wire encoding to `buf`
    ///
    /// Fails with [`ProfileSyncError::Encode`], writing nothing, when the
    /// payload is longer than the `u32` length prefix can express.
    pub fn encode(&self, buf: &mut impl BufMut) -> SyncResult<()> {
        let len = payload_len_prefix(self.payload.len())?;
        buf.put_i32_le(self.version);
        buf.put_u32_le(len);
        buf.put_slice(&self.payload);
        Ok(())
    }

    /// Read one wire-encoded value from the front of `buf`
    ///
    /// Fails with [`ProfileSyncError::Decode`] when `buf` ends before the
    /// declared payload does.
    pub fn decode(buf: &mut impl Buf) -> SyncResult<Self> {
        ensure_remaining(buf, VERSION_LEN, "profile version")?;
        let version = buf.get_i32_le();

        ensure_remaining(buf, PAYLOAD_LEN_PREFIX, "payload length")?;
        let len = buf.get_u32_le() as usize;

        ensure_remaining(buf, len, "payload")?;
        let payload = buf.copy_to_bytes(len);

        Ok(Self { version, payload })
    }

    /// Durable record layout: version followed by the raw payload
    pub fn to_record_bytes(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(VERSION_LEN + self.payload.len());
        data.put_i32_le(self.version);
        data.extend_from_slice(&self.payload);
        data
    }

    /// Parse the durable record layout
    ///
    /// Returns `None` when the record is too short to hold a version.
    pub fn from_record_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < VERSION_LEN {
            return None;
        }

        let (mut version, payload) = data.split_at(VERSION_LEN);
        Some(Self {
            version: version.get_i32_le(),
            payload: Bytes::copy_from_slice(payload),
        })
    }
}

/// Wire length prefix for a payload of `len` bytes
fn payload_len_prefix(len: usize) -> SyncResult<u32> {
    u32::try_from(len).map_err(|_| {
        ProfileSyncError::Encode(format!(
            "payload of {} bytes exceeds the {} byte limit",
            len,
            u32::MAX
        ))
    })
}

/// Fail with a decode error unless `buf` has at least `needed` bytes left
pub(crate) fn ensure_remaining(buf: &impl Buf, needed: usize, field: &str) -> SyncResult<()> {
    let remaining = buf.remaining();
    if remaining < needed {
        return Err(ProfileSyncError::Decode(format!(
            "{} needs {} bytes, {} remaining",
            field, needed, remaining
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    #[test]
    fn test_encode_decode_roundtrip() {
        let info = ProfileInfo::new(7, vec![0x01, 0x02, 0x03]);

        let mut buf = BytesMut::new();
        info.encode(&mut buf).unwrap();
        assert_eq!(buf.len(), info.encoded_len());

        let decoded = ProfileInfo::decode(&mut buf.freeze()).unwrap();
        assert_eq!(decoded, info);
    }

    #[test]
    fn test_wire_layout() {
        let info = ProfileInfo::new(1, &b"x"[..]);

        let mut buf: Vec<u8> = Vec::new();
        info.encode(&mut buf).unwrap();

        assert_eq!(buf, vec![1, 0, 0, 0, 1, 0, 0, 0, b'x']);
    }

    #[test]
    fn test_payload_len_prefix_limit() {
        assert_eq!(payload_len_prefix(0).unwrap(), 0);
        assert_eq!(payload_len_prefix(u32::MAX as usize).unwrap(), u32::MAX);
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn test_oversized_payload_rejected() {
        let err = payload_len_prefix(u32::MAX as usize + 1).unwrap_err();
        assert!(matches!(err, ProfileSyncError::Encode(_)));
    }

    #[test]
    fn test_decode_truncated_payload() {
        let mut buf: Vec<u8> = Vec::new();
        buf.put_i32_le(3);
        buf.put_u32_le(10);
        buf.put_slice(b"short");

        let err = ProfileInfo::decode(&mut &buf[..]).unwrap_err();
        assert!(matches!(err, ProfileSyncError::Decode(_)));
    }

    #[test]
    fn test_decode_empty_buffer() {
        let err = ProfileInfo::decode(&mut &[0u8; 0][..]).unwrap_err();
        assert!(err.to_string().contains("profile version"));
    }

    #[test]
    fn test_record_layout() {
        let info = ProfileInfo::new(-2, &b"ddl"[..]);
        let record = info.to_record_bytes();

        assert_eq!(record, vec![0xFE, 0xFF, 0xFF, 0xFF, b'd', b'd', b'l']);
        assert_eq!(ProfileInfo::from_record_bytes(&record), Some(info));
    }

    #[test]
    fn test_record_too_short_is_absent() {
        assert_eq!(ProfileInfo::from_record_bytes(&[]), None);
        assert_eq!(ProfileInfo::from_record_bytes(&[1, 2, 3]), None);
    }

    #[test]
    fn test_record_with_empty_payload() {
        let info = ProfileInfo::from_record_bytes(&[5, 0, 0, 0]).unwrap();
        assert_eq!(info.version, 5);
        assert!(info.payload.is_empty());
    }
}
