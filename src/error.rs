//! Error types for the cache
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for cache, snapshot and ring operations.
///
/// A missing key is never an error; lookups report it as `None`.
#[derive(Error, Debug)]
pub enum CacheError {
    /// A negative TTL was supplied
    #[error("Invalid expiration: {0} seconds")]
    InvalidExpiration(i64),

    /// `add` found a live entry for the key
    #[error("Key already exists: {0}")]
    AlreadyExists(String),

    /// Snapshot input is corrupt, truncated or from an unknown format
    #[error("Snapshot decode failed: {0}")]
    Decode(String),

    /// Cache contents could not be encoded into a snapshot
    #[error("Snapshot encode failed: {0}")]
    Encode(String),

    /// Underlying storage failure during save/load
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;
