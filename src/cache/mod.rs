//! Cache Module
//!
//! Segment-partitioned in-memory storage with lazy TTL expiration.

mod entry;
mod hasher;
mod segment;
mod stats;
mod table;


// Re-export public types
pub use entry::{current_timestamp, CacheEntry};
pub use hasher::{fast_hash64, segment_index};
pub use segment::Segment;
pub use stats::CacheStats;
pub use table::Cache;

// == Public Constants ==
/// Number of segments in every cache; fixed for the lifetime of the format
pub const SEGMENT_COUNT: usize = 256;

/// Smallest total capacity hint a cache is created with
pub const MIN_CAPACITY: usize = 256 * 1024;

/// TTL in seconds applied when callers pass a TTL of zero
pub const DEFAULT_TTL_SECS: u64 = 30;
