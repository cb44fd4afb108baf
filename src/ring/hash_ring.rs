//! Consistent Hash Ring
//!
//! Maps keys to destinations through weighted virtual nodes. The weight
//! table and the sorted node array share one read/write lock: every
//! membership change rebuilds the array under the write lock, lookups hold
//! the read lock, so `route` never sees a half-built ring.

use std::collections::HashMap;

use parking_lot::RwLock;
use tracing::debug;

use crate::ring::{ring_hash, VirtualNode};

/// Virtual nodes per destination when none is configured
pub const DEFAULT_SLOTS: usize = 160;

#[derive(Debug, Default)]
struct RingState {
    weights: HashMap<String, u32>,
    /// Sorted ascending by hash, ties by destination
    nodes: Vec<VirtualNode>,
}

// == Hash Ring ==
/// Weighted consistent-hash ring.
#[derive(Debug)]
pub struct HashRing {
    slots: usize,
    state: RwLock<RingState>,
}

impl HashRing {
    // == Constructor ==
    /// Creates an empty ring with `slots` virtual nodes per destination on average.
    ///
    /// A value of 0 selects [`DEFAULT_SLOTS`].
    pub fn new(slots: usize) -> Self {
        let slots = if slots == 0 { DEFAULT_SLOTS } else { slots };
        Self {
            slots,
            state: RwLock::new(RingState::default()),
        }
    }

    pub fn slots(&self) -> usize {
        self.slots
    }

    // == Membership ==
    /// Adds a destination, or replaces its weight if already present.
    pub fn add(&self, destination: impl Into<String>, weight: u32) {
        let mut state = self.state.write();
        state.weights.insert(destination.into(), weight);
        self.rebuild(&mut state);
    }

    /// Adds several destinations with a single rebuild.
    pub fn add_multiple<I, S>(&self, weights: I)
    where
        I: IntoIterator<Item = (S, u32)>,
        S: Into<String>,
    {
        let mut state = self.state.write();
        state
            .weights
            .extend(weights.into_iter().map(|(name, weight)| (name.into(), weight)));
        self.rebuild(&mut state);
    }

    /// Removes a destination; unknown names still trigger a rebuild.
    pub fn remove(&self, destination: &str) {
        let mut state = self.state.write();
        state.weights.remove(destination);
        self.rebuild(&mut state);
    }

    /// Sets the weight of a destination, adding it if missing.
    pub fn update(&self, destination: impl Into<String>, weight: u32) {
        self.add(destination, weight);
    }

    // == Rebuild ==
    /// Regenerates and sorts every virtual node from the weight table.
    ///
    /// Destination `d` with weight `w` gets `floor(w / total * slots * n)`
    /// nodes, computed in integers.
    fn rebuild(&self, state: &mut RingState) {
        let total: u128 = state.weights.values().map(|w| *w as u128).sum();
        let ring_slots = self.slots as u128 * state.weights.len() as u128;

        let mut nodes = Vec::new();
        if total > 0 {
            for (destination, weight) in &state.weights {
                let count = (*weight as u128 * ring_slots / total) as usize;
                nodes.extend((1..=count).map(|i| VirtualNode::new(destination, i)));
            }
        }
        nodes.sort_unstable_by(|a, b| {
            a.hash
                .cmp(&b.hash)
                .then_with(|| a.destination.cmp(&b.destination))
        });

        debug!(
            destinations = state.weights.len(),
            virtual_nodes = nodes.len(),
            "hash ring rebuilt"
        );
        state.nodes = nodes;
    }

    // == Route ==
    /// Returns the destination owning `key`, or None on an empty ring.
    ///
    /// The owner is the first virtual node clockwise from the key's hash,
    /// wrapping to the lowest node past the top of the ring.
    pub fn route(&self, key: &str) -> Option<String> {
        let state = self.state.read();
        if state.nodes.is_empty() {
            return None;
        }

        let hash = ring_hash(key.as_bytes());
        let index = state.nodes.partition_point(|node| node.hash < hash);
        let node = state.nodes.get(index).unwrap_or(&state.nodes[0]);
        Some(node.destination.clone())
    }

    // == Queries ==
    /// Current number of virtual nodes.
    pub fn size(&self) -> usize {
        self.state.read().nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.read().nodes.is_empty()
    }

    pub fn weight(&self, destination: &str) -> Option<u32> {
        self.state.read().weights.get(destination).copied()
    }

    /// Registered destination names, sorted.
    pub fn destinations(&self) -> Vec<String> {
        let mut names: Vec<String> = self.state.read().weights.keys().cloned().collect();
        names.sort();
        names
    }

    #[cfg(test)]
    fn nodes(&self) -> Vec<VirtualNode> {
        self.state.read().nodes.clone()
    }
}

impl Default for HashRing {
    fn default() -> Self {
        Self::new(DEFAULT_SLOTS)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::thread;

    const SAMPLE_KEYS: usize = 100_000;

    fn route_counts(ring: &HashRing) -> HashMap<String, usize> {
        let mut counts = HashMap::new();
        for i in 0..SAMPLE_KEYS {
            let destination = ring.route(&format!("key-{}", i)).unwrap();
            *counts.entry(destination).or_insert(0) += 1;
        }
        counts
    }

    #[test]
    fn test_empty_ring_routes_nowhere() {
        let ring = HashRing::default();
        assert_eq!(ring.size(), 0);
        assert!(ring.is_empty());
        assert_eq!(ring.route("anything"), None);
    }

    #[test]
    fn test_zero_slots_uses_default() {
        assert_eq!(HashRing::new(0).slots(), DEFAULT_SLOTS);
        assert_eq!(HashRing::new(40).slots(), 40);
    }

    #[test]
    fn test_single_destination_owns_everything() {
        let ring = HashRing::default();
        ring.add("n1", 1);

        assert_eq!(ring.size(), DEFAULT_SLOTS);
        for i in 0..100 {
            assert_eq!(ring.route(&format!("k{}", i)).as_deref(), Some("n1"));
        }
    }

    #[test]
    fn test_virtual_node_counts_follow_weights() {
        let ring = HashRing::new(160);
        ring.add_multiple(vec![("n1", 1), ("n2", 3)]);

        // floor(1/4 * 160 * 2) + floor(3/4 * 160 * 2)
        assert_eq!(ring.size(), 80 + 240);
        let nodes = ring.nodes();
        assert_eq!(nodes.iter().filter(|n| n.destination == "n1").count(), 80);
        assert_eq!(nodes.iter().filter(|n| n.destination == "n2").count(), 240);
    }

    #[test]
    fn test_counts_are_floored() {
        let ring = HashRing::new(10);
        ring.add_multiple(vec![("a", 1), ("b", 1), ("c", 1)]);
        assert_eq!(ring.size(), 30);

        ring.update("c", 2);
        // floor(1/4 * 30) * 2 + floor(2/4 * 30)
        assert_eq!(ring.size(), 7 + 7 + 15);
    }

    #[test]
    fn test_nodes_sorted() {
        let ring = HashRing::default();
        ring.add_multiple(vec![("n1", 2), ("n2", 1), ("n3", 5)]);

        let nodes = ring.nodes();
        assert!(nodes.windows(2).all(|pair| pair[0].hash <= pair[1].hash));
    }

    #[test]
    fn test_route_picks_successor_and_wraps() {
        let ring = HashRing::new(4);
        ring.add_multiple(vec![("n1", 1), ("n2", 1)]);
        let nodes = ring.nodes();

        for i in 0..1_000 {
            let key = format!("probe-{}", i);
            let hash = ring_hash(key.as_bytes());
            let expected = nodes
                .iter()
                .find(|node| node.hash >= hash)
                .unwrap_or(&nodes[0]);
            assert_eq!(ring.route(&key), Some(expected.destination.clone()));
        }
    }

    #[test]
    fn test_route_deterministic() {
        let a = HashRing::default();
        let b = HashRing::default();
        a.add_multiple(vec![("n1", 1), ("n2", 2)]);
        b.add("n2", 2);
        b.add("n1", 1);

        for i in 0..1_000 {
            let key = format!("key-{}", i);
            assert_eq!(a.route(&key), b.route(&key));
        }
    }

    #[test]
    fn test_even_distribution() {
        let ring = HashRing::new(160);
        ring.add_multiple(vec![("n1", 1), ("n2", 1)]);

        let counts = route_counts(&ring);
        for name in ["n1", "n2"] {
            let share = counts[name] as f64 / SAMPLE_KEYS as f64;
            assert!(
                (0.4..=0.6).contains(&share),
                "{} received {:.3} of keys",
                name,
                share
            );
        }
    }

    #[test]
    fn test_remove_remaps_minimally() {
        let ring = HashRing::new(160);
        ring.add_multiple(vec![("n1", 1), ("n2", 1), ("n3", 1)]);

        let before: Vec<String> = (0..10_000)
            .map(|i| ring.route(&format!("key-{}", i)).unwrap())
            .collect();

        ring.remove("n3");
        assert_eq!(ring.destinations(), vec!["n1".to_string(), "n2".to_string()]);

        let mut kept = 0;
        let mut survivors = 0;
        for (i, old) in before.iter().enumerate() {
            let new = ring.route(&format!("key-{}", i)).unwrap();
            if old == "n3" {
                assert_ne!(new, "n3");
            } else {
                survivors += 1;
                if &new == old {
                    kept += 1;
                }
            }
        }
        assert!(
            kept as f64 >= survivors as f64 * 0.95,
            "only {} of {} keys kept their destination",
            kept,
            survivors
        );
    }

    #[test]
    fn test_zero_weights_leave_ring_empty() {
        let ring = HashRing::default();
        ring.add("n1", 0);

        assert_eq!(ring.weight("n1"), Some(0));
        assert_eq!(ring.size(), 0);
        assert_eq!(ring.route("k"), None);
    }

    #[test]
    fn test_remove_last_destination() {
        let ring = HashRing::default();
        ring.add("n1", 1);
        ring.remove("n1");
        ring.remove("unknown");

        assert!(ring.is_empty());
        assert_eq!(ring.route("k"), None);
    }

    #[test]
    fn test_concurrent_route_during_rebuilds() {
        let ring = Arc::new(HashRing::default());
        ring.add("n0", 1);

        let writer = {
            let ring = Arc::clone(&ring);
            thread::spawn(move || {
                for i in 1..50 {
                    ring.add(format!("n{}", i), 1 + (i % 3) as u32);
                    if i % 5 == 0 {
                        ring.remove(&format!("n{}", i - 1));
                    }
                }
            })
        };

        let readers: Vec<_> = (0..4)
            .map(|t| {
                let ring = Arc::clone(&ring);
                thread::spawn(move || {
                    for i in 0..2_000 {
                        let destination = ring.route(&format!("key-{}-{}", t, i));
                        assert!(destination.is_some());
                    }
                })
            })
            .collect();

        writer.join().unwrap();
        for reader in readers {
            reader.join().unwrap();
        }
    }
}
