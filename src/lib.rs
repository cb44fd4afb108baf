//! Shardcache - A segment-partitioned in-process cache
//!
//! Provides a TTL cache split into 256 independently locked segments,
//! best-effort snapshot persistence, and a weighted consistent-hash ring for
//! routing keys across cache instances.

pub mod cache;
pub mod config;
pub mod error;
pub mod ring;
pub mod snapshot;
pub mod tasks;

pub use cache::Cache;
pub use config::Config;
pub use error::{CacheError, Result};
pub use ring::HashRing;
pub use snapshot::Snapshot;
pub use tasks::{spawn_sweeper, SweeperHandle};
