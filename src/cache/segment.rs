//! Segment Module
//!
//! One lock-guarded partition of the key space. Every operation takes the
//! segment's single mutex for its full duration, reads included.

use std::collections::HashMap;

use bytes::Bytes;
use parking_lot::Mutex;

use crate::cache::{CacheEntry, CacheStats};
use crate::error::{CacheError, Result};

// == Segment ==
/// A lock-guarded map of keys to entries.
#[derive(Debug)]
pub struct Segment {
    /// Position of this segment in the table
    id: usize,
    /// TTL in seconds applied when a caller passes `ttl == 0`; 0 = never expires
    default_ttl: u64,
    inner: Mutex<SegmentInner>,
}

#[derive(Debug, Default)]
struct SegmentInner {
    entries: HashMap<String, CacheEntry>,
    stats: CacheStats,
}

impl SegmentInner {
    fn live(&self, key: &str, now: i64) -> Option<&CacheEntry> {
        self.entries.get(key).filter(|entry| !entry.is_expired_at(now))
    }
}

impl Segment {
    // == Constructor ==
    /// Creates an empty segment pre-sized for `capacity` entries.
    pub fn new(id: usize, capacity: usize, default_ttl: u64) -> Self {
        Self {
            id,
            default_ttl,
            inner: Mutex::new(SegmentInner {
                entries: HashMap::with_capacity(capacity),
                stats: CacheStats::new(),
            }),
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    /// Resolves a caller TTL: negative is rejected, zero falls back to the default.
    fn effective_ttl(&self, ttl: i64) -> Result<u64> {
        match ttl {
            t if t < 0 => Err(CacheError::InvalidExpiration(t)),
            0 => Ok(self.default_ttl),
            t => Ok(t as u64),
        }
    }

    // == Set ==
    /// Stores `value` under `key`, overwriting any existing entry.
    pub fn set(&self, key: String, value: Bytes, ttl: i64, now: i64) -> Result<()> {
        let ttl = self.effective_ttl(ttl)?;
        let entry = CacheEntry::new(value, ttl, now);

        self.inner.lock().entries.insert(key, entry);
        Ok(())
    }

    // == Get ==
    /// Returns the value for `key` if present and not expired at `now`.
    ///
    /// Expired entries are left in place for the next sweep.
    pub fn get(&self, key: &str, now: i64) -> Option<Bytes> {
        let mut inner = self.inner.lock();
        let value = inner.live(key, now).map(|entry| entry.value.clone());

        match value {
            Some(_) => inner.stats.record_hit(),
            None => inner.stats.record_miss(),
        }
        value
    }

    // == Add ==
    /// Stores `value` only if no live entry exists for `key`.
    ///
    /// An expired entry still physically present counts as absent and is replaced.
    pub fn add(&self, key: String, value: Bytes, ttl: i64, now: i64) -> Result<()> {
        let ttl = self.effective_ttl(ttl)?;

        let mut inner = self.inner.lock();
        if inner.live(&key, now).is_some() {
            return Err(CacheError::AlreadyExists(key));
        }
        inner.entries.insert(key, CacheEntry::new(value, ttl, now));
        Ok(())
    }

    // == Delete ==
    /// Removes `key`; absent keys are ignored.
    pub fn delete(&self, key: &str) {
        self.inner.lock().entries.remove(key);
    }

    // == Clear Expired ==
    /// Removes every entry with an expiration strictly before `now`.
    ///
    /// Returns the number of entries removed.
    pub fn clear_expired(&self, now: i64) -> usize {
        let mut inner = self.inner.lock();
        let before = inner.entries.len();
        inner.entries.retain(|_, entry| !entry.is_expired_at(now));

        let removed = before - inner.entries.len();
        inner.stats.record_expired(removed);
        removed
    }

    // == Clean ==
    /// Drops every entry.
    pub fn clean(&self) {
        self.inner.lock().entries.clear();
    }

    // == Count ==
    /// Number of physically stored entries, expired-but-unswept included.
    pub fn count(&self) -> usize {
        self.inner.lock().entries.len()
    }

    /// True if `key` is absent or expired at `now`.
    pub fn is_expired(&self, key: &str, now: i64) -> bool {
        self.inner.lock().live(key, now).is_none()
    }

    /// Remaining TTL of a live key; `Some(None)` means it never expires.
    pub fn ttl(&self, key: &str, now: i64) -> Option<Option<u64>> {
        self.inner
            .lock()
            .live(key, now)
            .map(|entry| entry.ttl_remaining_at(now))
    }

    // == Snapshot Support ==
    /// Copies every stored entry under the segment lock.
    pub fn export(&self) -> Vec<(String, CacheEntry)> {
        self.inner
            .lock()
            .entries
            .iter()
            .map(|(key, entry)| (key.clone(), entry.clone()))
            .collect()
    }

    /// Installs each loaded entry whose key is absent or expired here.
    ///
    /// Live entries always win. Returns the number of entries installed.
    pub fn merge<I>(&self, loaded: I, now: i64) -> usize
    where
        I: IntoIterator<Item = (String, CacheEntry)>,
    {
        let mut inner = self.inner.lock();
        let mut installed = 0;

        for (key, entry) in loaded {
            if inner.live(&key, now).is_none() {
                inner.entries.insert(key, entry);
                installed += 1;
            }
        }
        installed
    }

    /// Returns this segment's counters with the current entry count.
    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock();
        let mut stats = inner.stats.clone();
        stats.total_entries = inner.entries.len();
        stats
    }
}
