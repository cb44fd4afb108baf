//! Key Hashing
//!
//! Stable 64-bit key hash used to pick a segment. Snapshot placement depends
//! on it, so the seed and algorithm must not change between releases.

use std::hash::Hasher;

use twox_hash::Xxh3Hash64;

use crate::cache::SEGMENT_COUNT;

const KEY_HASH_SEED: u64 = 0;

/// Hashes the raw key bytes with XXH3-64.
pub fn fast_hash64(key: &str) -> u64 {
    let mut hasher = Xxh3Hash64::with_seed(KEY_HASH_SEED);
    hasher.write(key.as_bytes());
    hasher.finish()
}

/// Returns the index of the segment owning `key`.
#[inline]
pub fn segment_index(key: &str) -> usize {
    (fast_hash64(key) & (SEGMENT_COUNT as u64 - 1)) as usize
}
