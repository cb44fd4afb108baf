//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

use bytes::Bytes;

// == Cache Entry ==
/// A stored value plus its absolute expiration instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    /// The stored value
    pub value: Bytes,
    /// Expiration timestamp (Unix seconds), None = never expires
    pub expires_at: Option<i64>,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates an entry that expires `ttl_seconds` after `now`.
    ///
    /// A TTL of zero produces an entry that never expires.
    pub fn new(value: Bytes, ttl_seconds: u64, now: i64) -> Self {
        let expires_at = if ttl_seconds == 0 {
            None
        } else {
            Some(now.saturating_add(ttl_seconds.min(i64::MAX as u64) as i64))
        };

        Self { value, expires_at }
    }

    /// Creates an entry with a fixed expiration instant, as read back from a snapshot.
    pub fn with_expiration(value: Bytes, expires_at: Option<i64>) -> Self {
        Self { value, expires_at }
    }

    // == Is Expired ==
    /// Checks whether the entry is logically expired at `now`.
    ///
    /// The entry stays live for the whole second named by `expires_at` and
    /// is expired once `now` is strictly past it.
    pub fn is_expired_at(&self, now: i64) -> bool {
        match self.expires_at {
            Some(expires) => now > expires,
            None => false,
        }
    }

    /// Checks whether the entry is expired against the wall clock.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(current_timestamp())
    }

    // == Time To Live ==
    /// Returns remaining TTL in seconds at `now`, or None if no expiration is set.
    ///
    /// # Returns
    /// - `Some(0)` if the entry has expired
    /// - `Some(remaining_seconds)` if the entry has TTL and hasn't expired
    /// - `None` if the entry never expires
    pub fn ttl_remaining_at(&self, now: i64) -> Option<u64> {
        self.expires_at
            .map(|expires| if expires > now { (expires - now) as u64 } else { 0 })
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in seconds.
pub fn current_timestamp() -> i64 {
    chrono::Utc::now().timestamp()
}
