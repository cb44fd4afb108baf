//! Snapshot Module
//!
//! Best-effort persistence of a cache to a single binary blob.
//!
//! Restoring merges per key: a loaded entry is installed only when the live
//! cache has no entry for that key or its entry has expired. A blob that
//! fails to decode leaves the cache untouched.

mod codec;

use std::fs;
use std::io::{Read, Write};
use std::path::Path;

use bytes::Bytes;
use tracing::{info, warn};

use crate::cache::{current_timestamp, segment_index, Cache, SEGMENT_COUNT};
use crate::error::Result;

pub use codec::{decode, encode, Snapshot, FORMAT_VERSION, MAGIC};

impl Cache {
    // == Capture ==
    /// Copies every segment under its own lock into a [`Snapshot`].
    pub fn capture(&self) -> Snapshot {
        Snapshot::new(self.segments().iter().map(|segment| segment.export()).collect())
    }

    // == Serialize ==
    /// Encodes the whole cache, expired-but-unswept entries included.
    pub fn serialize(&self) -> Result<Bytes> {
        encode(&self.capture())
    }

    // == Restore ==
    /// Merges a decoded snapshot into the cache and returns the number of
    /// entries installed.
    pub fn restore(&self, snapshot: Snapshot) -> usize {
        let now = current_timestamp();

        let mut routed = vec![Vec::new(); SEGMENT_COUNT];
        for (key, entry) in snapshot.into_entries() {
            routed[segment_index(&key)].push((key, entry));
        }

        self.segments()
            .iter()
            .zip(routed)
            .map(|(segment, entries)| segment.merge(entries, now))
            .sum()
    }

    /// Decodes `bytes` completely, then merges them into the cache.
    pub fn restore_from(&self, bytes: &[u8]) -> Result<usize> {
        let snapshot = decode(bytes).map_err(|err| {
            warn!("Rejected snapshot: {}", err);
            err
        })?;
        Ok(self.restore(snapshot))
    }

    // == Stream IO ==
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        let bytes = self.serialize()?;
        writer.write_all(&bytes)?;
        writer.flush()?;
        Ok(())
    }

    pub fn read_from<R: Read>(&self, reader: &mut R) -> Result<usize> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        self.restore_from(&bytes)
    }

    // == File IO ==
    /// Writes a snapshot to `path` through a sibling temp file and a rename.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let bytes = self.serialize()?;

        let mut tmp = path.as_os_str().to_owned();
        tmp.push(".tmp");
        fs::write(&tmp, &bytes)?;
        fs::rename(&tmp, path)?;

        info!("Snapshot saved to {} ({} bytes)", path.display(), bytes.len());
        Ok(())
    }

    /// Loads and merges the snapshot at `path`.
    pub fn load(&self, path: impl AsRef<Path>) -> Result<usize> {
        let path = path.as_ref();
        let bytes = fs::read(path)?;
        let installed = self.restore_from(&bytes)?;

        info!(
            "Snapshot loaded from {}: {} entries installed",
            path.display(),
            installed
        );
        Ok(installed)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheEntry;
    use crate::error::CacheError;

    #[test]
    fn test_serialize_restore_roundtrip() {
        let source = Cache::with_default_ttl(0, 0);
        source.set("a", "v1", 0).unwrap();
        source.set("b", "v2", 100).unwrap();

        let bytes = source.serialize().unwrap();
        let target = Cache::default();
        assert_eq!(target.restore_from(&bytes).unwrap(), 2);

        assert_eq!(target.get("a"), Some(Bytes::from_static(b"v1")));
        assert_eq!(target.get("b"), Some(Bytes::from_static(b"v2")));
        assert_eq!(target.ttl("a"), Some(None));
    }

    #[test]
    fn test_restore_live_wins() {
        let live = Cache::with_default_ttl(0, 0);
        live.set("a", "v1", 0).unwrap();

        let other = Cache::with_default_ttl(0, 0);
        other.set("a", "v2", 0).unwrap();
        other.set("c", "v3", 0).unwrap();

        let installed = live.restore_from(&other.serialize().unwrap()).unwrap();
        assert_eq!(installed, 1);
        assert_eq!(live.get("a"), Some(Bytes::from_static(b"v1")));
        assert_eq!(live.get("c"), Some(Bytes::from_static(b"v3")));
    }

    #[test]
    fn test_restore_replaces_expired_live_entry() {
        let live = Cache::default();
        let key = "a".to_string();
        live.segments()[segment_index(&key)].merge(
            vec![(
                key.clone(),
                CacheEntry::with_expiration(Bytes::from_static(b"stale"), Some(1)),
            )],
            0,
        );
        assert!(live.is_expired("a"));

        let mut records = vec![Vec::new(); SEGMENT_COUNT];
        records[segment_index(&key)].push((
            key,
            CacheEntry::with_expiration(Bytes::from_static(b"loaded"), None),
        ));
        assert_eq!(live.restore(Snapshot::new(records)), 1);
        assert_eq!(live.get("a"), Some(Bytes::from_static(b"loaded")));
    }

    #[test]
    fn test_restore_does_not_touch_unrelated_keys() {
        let live = Cache::default();
        live.set("mine", "keep", 60).unwrap();

        let empty = Cache::default().serialize().unwrap();
        assert_eq!(live.restore_from(&empty).unwrap(), 0);
        assert_eq!(live.get("mine"), Some(Bytes::from_static(b"keep")));
    }

    #[test]
    fn test_failed_decode_leaves_cache_unchanged() {
        let source = Cache::default();
        for i in 0..50 {
            source.set(format!("k{}", i), "v", 60).unwrap();
        }
        let bytes = source.serialize().unwrap();

        let target = Cache::default();
        target.set("existing", "value", 60).unwrap();

        let result = target.restore_from(&bytes[..bytes.len() - 1]);
        assert!(matches!(result, Err(CacheError::Decode(_))));
        assert_eq!(target.count(), 1);
        assert!(target.get("k0").is_none());
    }

    #[test]
    fn test_stream_roundtrip() {
        let source = Cache::default();
        source.set("k", "v", 60).unwrap();

        let mut buf = Vec::new();
        source.write_to(&mut buf).unwrap();

        let target = Cache::default();
        assert_eq!(target.read_from(&mut buf.as_slice()).unwrap(), 1);
        assert_eq!(target.get("k"), Some(Bytes::from_static(b"v")));
    }

    #[test]
    fn test_capture_has_every_segment() {
        let cache = Cache::default();
        cache.set("k", "v", 60).unwrap();

        let snapshot = cache.capture();
        assert_eq!(snapshot.segments().len(), SEGMENT_COUNT);
        assert_eq!(snapshot.segments()[segment_index("k")].len(), 1);
    }
}
