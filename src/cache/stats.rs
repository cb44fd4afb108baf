//! Cache Statistics Module
//!
//! Tracks lookup hits and misses plus entries reclaimed by sweeps.

use serde::Serialize;

// == Cache Stats ==
/// Cache performance counters.
///
/// Each segment keeps its own copy under its lock; the table sums them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Number of lookups that found a live entry
    pub hits: u64,
    /// Number of lookups that found nothing or an expired entry
    pub misses: u64,
    /// Number of entries physically removed by `clear_expired`
    pub expired_removed: u64,
    /// Number of physically stored entries, expired-but-unswept included
    pub total_entries: usize,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no lookups have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_expired(&mut self, removed: usize) {
        self.expired_removed += removed as u64;
    }

    // == Merge ==
    /// Adds another segment's counters into this one.
    pub fn merge(&mut self, other: &CacheStats) {
        self.hits += other.hits;
        self.misses += other.misses;
        self.expired_removed += other.expired_removed;
        self.total_entries += other.total_entries;
    }
}
