//! Segment Table Module
//!
//! The cache proper: a fixed table of segments with every keyed operation
//! routed to `segment_index(key)`.

use bytes::Bytes;
use tracing::debug;

use crate::cache::{
    current_timestamp, segment_index, CacheStats, Segment, DEFAULT_TTL_SECS, MIN_CAPACITY,
    SEGMENT_COUNT,
};
use crate::error::Result;

// == Cache ==
/// Thread-safe TTL cache split into independently locked segments.
///
/// Operations on keys in different segments never contend. Table-wide
/// operations visit segments one at a time, so `count` and `stats` are not
/// atomic snapshots under concurrent writes.
#[derive(Debug)]
pub struct Cache {
    segments: Box<[Segment]>,
    default_ttl: u64,
}

impl Cache {
    // == Constructor ==
    /// Creates a cache with the standard default TTL.
    ///
    /// `capacity` is a sizing hint only, raised to at least [`MIN_CAPACITY`].
    pub fn new(capacity: usize) -> Self {
        Self::with_default_ttl(capacity, DEFAULT_TTL_SECS)
    }

    /// Creates a cache whose `ttl == 0` writes use `default_ttl` seconds.
    ///
    /// A `default_ttl` of zero makes such entries never expire.
    pub fn with_default_ttl(capacity: usize, default_ttl: u64) -> Self {
        let per_segment = capacity.max(MIN_CAPACITY) / SEGMENT_COUNT;
        let segments = (0..SEGMENT_COUNT)
            .map(|id| Segment::new(id, per_segment, default_ttl))
            .collect::<Vec<_>>()
            .into_boxed_slice();

        debug!(per_segment, default_ttl, "cache segments allocated");
        Self {
            segments,
            default_ttl,
        }
    }

    pub fn default_ttl(&self) -> u64 {
        self.default_ttl
    }

    #[inline]
    fn segment_for(&self, key: &str) -> &Segment {
        &self.segments[segment_index(key)]
    }

    pub(crate) fn segments(&self) -> &[Segment] {
        &self.segments
    }

    // == Set ==
    /// Stores a value, overwriting any existing entry.
    ///
    /// `ttl` is in seconds: negative fails, zero applies the default TTL.
    pub fn set(&self, key: impl Into<String>, value: impl Into<Bytes>, ttl: i64) -> Result<()> {
        let key = key.into();
        self.segment_for(&key)
            .set(key, value.into(), ttl, current_timestamp())
    }

    // == Get ==
    /// Returns the value for a live key.
    pub fn get(&self, key: &str) -> Option<Bytes> {
        self.segment_for(key).get(key, current_timestamp())
    }

    // == Add ==
    /// Stores a value only if the key has no live entry.
    pub fn add(&self, key: impl Into<String>, value: impl Into<Bytes>, ttl: i64) -> Result<()> {
        let key = key.into();
        self.segment_for(&key)
            .add(key, value.into(), ttl, current_timestamp())
    }

    // == Delete ==
    pub fn delete(&self, key: &str) {
        self.segment_for(key).delete(key);
    }

    // == Clean ==
    /// Removes every entry from every segment.
    pub fn clean(&self) {
        for segment in self.segments.iter() {
            segment.clean();
        }
    }

    // == Count ==
    /// Total physically stored entries, including expired-but-unswept ones.
    pub fn count(&self) -> usize {
        self.segments.iter().map(Segment::count).sum()
    }

    /// Entry count of the segment that owns `key`.
    pub fn count_for_key(&self, key: &str) -> usize {
        self.segment_for(key).count()
    }

    // == Clear Expired ==
    /// Sweeps every segment and returns the number of entries removed.
    ///
    /// The clock is sampled once and used for the whole pass.
    pub fn clear_expired(&self) -> usize {
        let now = current_timestamp();
        self.segments
            .iter()
            .map(|segment| segment.clear_expired(now))
            .sum()
    }

    /// True if the key is absent or expired.
    pub fn is_expired(&self, key: &str) -> bool {
        self.segment_for(key).is_expired(key, current_timestamp())
    }

    /// Remaining TTL in seconds of a live key; `Some(None)` if it never expires.
    pub fn ttl(&self, key: &str) -> Option<Option<u64>> {
        self.segment_for(key).ttl(key, current_timestamp())
    }

    // == Stats ==
    /// Sums the counters of every segment.
    pub fn stats(&self) -> CacheStats {
        self.segments
            .iter()
            .fold(CacheStats::new(), |mut total, segment| {
                total.merge(&segment.stats());
                total
            })
    }
}

impl Default for Cache {
    fn default() -> Self {
        Self::new(MIN_CAPACITY)
    }
}
