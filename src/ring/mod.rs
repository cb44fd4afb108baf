//! Ring Module
//!
//! Weighted consistent hashing for routing keys to cache instances. The ring
//! only computes destinations; reaching the chosen node is up to the caller.

mod hash_ring;
mod node;

pub use hash_ring::{HashRing, DEFAULT_SLOTS};
pub use node::{ring_hash, VirtualNode};
