//! Journal records
//!
//! Defines the on-disk unit of the journal: a fixed header followed by a
//! bincode payload, zero-padded up to the configured rounding block.

use bytes::{Buf, BufMut, BytesMut};

use crate::error::{FieldError, Result};
use crate::key::Key;

/// Header size: Tag (1) + Reserved (1) + Version (2) + Size (4) + PayloadLen (4) + CRC (4)
pub const HEADER_SIZE: usize = 16;

/// Upper bound on a single record, anything larger is treated as corruption
pub const MAX_RECORD_SIZE: usize = 64 * 1024 * 1024;

/// First version whose records carry a payload checksum
pub(crate) const CHECKSUM_VERSION: u16 = 2;

/// Record type tags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RecordTag {
    Init = 1,
    Index = 2,
    Clear = 3,
    Wipe = 4,
}

impl TryFrom<u8> for RecordTag {
    type Error = u8;

    fn try_from(value: u8) -> std::result::Result<Self, u8> {
        match value {
            1 => Ok(RecordTag::Init),
            2 => Ok(RecordTag::Index),
            3 => Ok(RecordTag::Clear),
            4 => Ok(RecordTag::Wipe),
            other => Err(other),
        }
    }
}

/// A decoded journal record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JournalRecord {
    /// Identifies the database; first record of every journal
    Init { key: Key },

    /// Adds an index segment
    Index {
        path: String,
        offset: u64,
        metadata: Vec<u8>,
    },

    /// Retracts a previously added index segment
    Clear { path: String, offset: u64 },

    /// Drops every index segment added so far
    Wipe,
}

impl JournalRecord {
    pub fn tag(&self) -> RecordTag {
        match self {
            JournalRecord::Init { .. } => RecordTag::Init,
            JournalRecord::Index { .. } => RecordTag::Index,
            JournalRecord::Clear { .. } => RecordTag::Clear,
            JournalRecord::Wipe => RecordTag::Wipe,
        }
    }

    fn encode_payload(&self) -> Result<Vec<u8>> {
        let payload = match self {
            JournalRecord::Init { key } => bincode::serialize(key)?,
            JournalRecord::Index {
                path,
                offset,
                metadata,
            } => bincode::serialize(&(path, offset, metadata))?,
            JournalRecord::Clear { path, offset } => bincode::serialize(&(path, offset))?,
            JournalRecord::Wipe => Vec::new(),
        };
        Ok(payload)
    }

    /// Decode a payload for the given tag
    pub fn decode_payload(tag: RecordTag, payload: &[u8]) -> bincode::Result<Self> {
        Ok(match tag {
            RecordTag::Init => JournalRecord::Init {
                key: bincode::deserialize(payload)?,
            },
            RecordTag::Index => {
                let (path, offset, metadata): (String, u64, Vec<u8>) =
                    bincode::deserialize(payload)?;
                JournalRecord::Index {
                    path,
                    offset,
                    metadata,
                }
            }
            RecordTag::Clear => {
                let (path, offset): (String, u64) = bincode::deserialize(payload)?;
                JournalRecord::Clear { path, offset }
            }
            RecordTag::Wipe => JournalRecord::Wipe,
        })
    }

    /// Encode header + payload, padded to a multiple of `round_size`
    pub fn encode(&self, version: u16, round_size: usize) -> Result<Vec<u8>> {
        if round_size < HEADER_SIZE {
            return Err(FieldError::Config(format!(
                "round size {} is smaller than the record header ({} bytes)",
                round_size, HEADER_SIZE
            )));
        }
        let payload = self.encode_payload()?;
        let size = round(HEADER_SIZE + payload.len(), round_size);
        if size > MAX_RECORD_SIZE {
            return Err(FieldError::Serialization(format!(
                "{:?} record of {} bytes exceeds the {} byte limit",
                self.tag(),
                size,
                MAX_RECORD_SIZE
            )));
        }

        let crc = if version >= CHECKSUM_VERSION {
            crc32fast::hash(&payload)
        } else {
            0
        };

        let mut buf = BytesMut::with_capacity(size);
        buf.put_u8(self.tag() as u8);
        buf.put_u8(0);
        buf.put_u16_le(version);
        buf.put_u32_le(size as u32);
        buf.put_u32_le(payload.len() as u32);
        buf.put_u32_le(crc);
        buf.put_slice(&payload);
        buf.resize(size, 0);

        Ok(buf.to_vec())
    }
}

/// Raw record header, not yet validated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordHeader {
    pub tag: u8,
    pub version: u16,
    pub size: u32,
    pub payload_len: u32,
    pub crc: u32,
}

impl RecordHeader {
    pub fn decode(bytes: &[u8; HEADER_SIZE]) -> Self {
        let mut buf = &bytes[..];
        let tag = buf.get_u8();
        let _reserved = buf.get_u8();
        let version = buf.get_u16_le();
        let size = buf.get_u32_le();
        let payload_len = buf.get_u32_le();
        let crc = buf.get_u32_le();
        Self {
            tag,
            version,
            size,
            payload_len,
            crc,
        }
    }
}

/// Round `a` up to a multiple of `b`
pub(crate) fn round(a: usize, b: usize) -> usize {
    a.div_ceil(b) * b
}
