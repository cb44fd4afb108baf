//! Configuration Module
//!
//! Handles loading the driver's configuration from environment variables.
//! The cache itself never reads the environment.

use std::env;
use std::path::PathBuf;

use crate::cache::{DEFAULT_TTL_SECS, MIN_CAPACITY};
use crate::ring::DEFAULT_SLOTS;

/// Runtime configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Capacity hint for the cache
    pub capacity: usize,
    /// Default TTL in seconds for writes with a TTL of zero; 0 = never expire
    pub default_ttl: u64,
    /// Expiration sweep interval in seconds
    pub sweep_interval: u64,
    /// Snapshot loaded at startup and written at shutdown
    pub snapshot_path: Option<PathBuf>,
    /// Virtual nodes per destination on the routing ring
    pub ring_slots: usize,
    /// Routing destinations with their weights
    pub ring_destinations: Vec<(String, u32)>,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_CAPACITY` - Capacity hint (default: 262144)
    /// - `DEFAULT_TTL` - Default TTL in seconds (default: 30)
    /// - `SWEEP_INTERVAL` - Sweep frequency in seconds (default: 1)
    /// - `SNAPSHOT_PATH` - Snapshot file (default: none)
    /// - `RING_SLOTS` - Virtual nodes per destination (default: 160)
    /// - `RING_DESTINATIONS` - `name=weight` pairs separated by commas (default: none)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            capacity: parse_var("CACHE_CAPACITY").unwrap_or(defaults.capacity),
            default_ttl: parse_var("DEFAULT_TTL").unwrap_or(defaults.default_ttl),
            sweep_interval: parse_var("SWEEP_INTERVAL").unwrap_or(defaults.sweep_interval),
            snapshot_path: env::var("SNAPSHOT_PATH")
                .ok()
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
            ring_slots: parse_var("RING_SLOTS").unwrap_or(defaults.ring_slots),
            ring_destinations: env::var("RING_DESTINATIONS")
                .map(|v| parse_destinations(&v))
                .unwrap_or_default(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            capacity: MIN_CAPACITY,
            default_ttl: DEFAULT_TTL_SECS,
            sweep_interval: 1,
            snapshot_path: None,
            ring_slots: DEFAULT_SLOTS,
            ring_destinations: Vec::new(),
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}

/// Parses `"a=1,b=2"`; a bare name gets weight 1 and malformed pairs are skipped.
pub fn parse_destinations(list: &str) -> Vec<(String, u32)> {
    list.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .filter_map(|part| match part.split_once('=') {
            Some((name, weight)) => weight
                .trim()
                .parse()
                .ok()
                .map(|weight| (name.trim().to_string(), weight)),
            None => Some((part.to_string(), 1)),
        })
        .filter(|(name, _)| !name.is_empty())
        .collect()
}
