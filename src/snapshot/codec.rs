//! Snapshot Codec
//!
//! Binary layout (all integers big-endian):
//!
//! ```text
//! magic "SHCS" | version u16
//! 256 x { count u32, count x { key_len u32, key, value_len u32, value, expire_at i64 } }
//! ```
//!
//! `expire_at` is Unix seconds, with 0 meaning the entry never expires.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::cache::{CacheEntry, SEGMENT_COUNT};
use crate::error::{CacheError, Result};

pub const MAGIC: &[u8; 4] = b"SHCS";
pub const FORMAT_VERSION: u16 = 1;

const HEADER_LEN: usize = MAGIC.len() + 2;
/// key_len + value_len + expire_at, with empty key and value
const MIN_ENTRY_LEN: usize = 4 + 4 + 8;

// == Snapshot ==
/// A fully decoded snapshot: one list of entries per segment record.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Snapshot {
    segments: Vec<Vec<(String, CacheEntry)>>,
}

impl Snapshot {
    pub fn new(segments: Vec<Vec<(String, CacheEntry)>>) -> Self {
        Self { segments }
    }

    pub fn segments(&self) -> &[Vec<(String, CacheEntry)>] {
        &self.segments
    }

    /// Total number of entries across all records.
    pub fn len(&self) -> usize {
        self.segments.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn into_entries(self) -> impl Iterator<Item = (String, CacheEntry)> {
        self.segments.into_iter().flatten()
    }
}

// == Encode ==
/// Encodes exactly [`SEGMENT_COUNT`] segment records.
pub fn encode(snapshot: &Snapshot) -> Result<Bytes> {
    if snapshot.segments.len() != SEGMENT_COUNT {
        return Err(CacheError::Encode(format!(
            "expected {} segment records, got {}",
            SEGMENT_COUNT,
            snapshot.segments.len()
        )));
    }

    let mut buf = BytesMut::with_capacity(HEADER_LEN + SEGMENT_COUNT * 4);
    buf.put_slice(MAGIC);
    buf.put_u16(FORMAT_VERSION);

    for entries in &snapshot.segments {
        buf.put_u32(length_prefix(entries.len(), "segment entry count")?);

        for (key, entry) in entries {
            buf.put_u32(length_prefix(key.len(), "key length")?);
            buf.put_slice(key.as_bytes());
            buf.put_u32(length_prefix(entry.value.len(), "value length")?);
            buf.put_slice(&entry.value);
            buf.put_i64(entry.expires_at.unwrap_or(0));
        }
    }

    Ok(buf.freeze())
}

fn length_prefix(len: usize, what: &str) -> Result<u32> {
    u32::try_from(len).map_err(|_| CacheError::Encode(format!("{} {} exceeds u32", what, len)))
}

// == Decode ==
/// Decodes a whole snapshot, rejecting any truncated or trailing input.
pub fn decode(mut buf: &[u8]) -> Result<Snapshot> {
    ensure(&buf, HEADER_LEN, "header")?;
    if &buf[..MAGIC.len()] != MAGIC {
        return Err(CacheError::Decode("bad magic".to_string()));
    }
    buf.advance(MAGIC.len());

    let version = buf.get_u16();
    if version != FORMAT_VERSION {
        return Err(CacheError::Decode(format!(
            "unsupported format version {}",
            version
        )));
    }

    let mut segments = Vec::with_capacity(SEGMENT_COUNT);
    for index in 0..SEGMENT_COUNT {
        ensure(&buf, 4, "segment entry count")?;
        let count = buf.get_u32() as usize;
        // Cap the allocation by what the input could possibly hold
        let mut entries = Vec::with_capacity(count.min(buf.remaining() / MIN_ENTRY_LEN));

        for _ in 0..count {
            let key = read_bytes(&mut buf, "key")?;
            let key = String::from_utf8(key.to_vec()).map_err(|_| {
                CacheError::Decode(format!("non UTF-8 key in segment {}", index))
            })?;
            let value = read_bytes(&mut buf, "value")?;

            ensure(&buf, 8, "expiration")?;
            let expires_at = match buf.get_i64() {
                0 => None,
                at => Some(at),
            };

            entries.push((key, CacheEntry::with_expiration(value, expires_at)));
        }
        segments.push(entries);
    }

    if buf.has_remaining() {
        return Err(CacheError::Decode(format!(
            "{} trailing bytes after last segment",
            buf.remaining()
        )));
    }

    Ok(Snapshot { segments })
}

fn ensure(buf: &&[u8], needed: usize, what: &str) -> Result<()> {
    if buf.remaining() < needed {
        return Err(CacheError::Decode(format!(
            "truncated {}: need {} bytes, have {}",
            what,
            needed,
            buf.remaining()
        )));
    }
    Ok(())
}

fn read_bytes(buf: &mut &[u8], what: &str) -> Result<Bytes> {
    ensure(buf, 4, what)?;
    let len = buf.get_u32() as usize;
    ensure(buf, len, what)?;
    Ok(buf.copy_to_bytes(len))
}
