//! Background Tasks Module
//!
//! Drivers that run alongside the cache without being part of it.
//!
//! # Tasks
//! - Sweeper: calls `Cache::clear_expired` at a fixed interval until cancelled

mod sweeper;

pub use sweeper::{spawn_sweeper, SweeperHandle};
