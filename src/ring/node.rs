//! Virtual Node Module
//!
//! Ring positions and the digest used to place both virtual nodes and keys.

use sha1::{Digest, Sha1};

/// Offset of the 4-byte window taken from the SHA-1 digest
const DIGEST_WINDOW_START: usize = 2;

// == Virtual Node ==
/// One position on the ring owned by a destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirtualNode {
    pub hash: u32,
    pub destination: String,
}

impl VirtualNode {
    /// Creates the `index`-th virtual node of `destination`, hashed from `"<destination>:<index>"`.
    pub fn new(destination: &str, index: usize) -> Self {
        Self {
            hash: ring_hash(format!("{}:{}", destination, index).as_bytes()),
            destination: destination.to_string(),
        }
    }
}

/// Hashes bytes onto the ring: SHA-1, bytes `[2..6]` read little-endian.
pub fn ring_hash(data: &[u8]) -> u32 {
    let digest = Sha1::digest(data);
    let window = &digest[DIGEST_WINDOW_START..DIGEST_WINDOW_START + 4];
    u32::from_le_bytes([window[0], window[1], window[2], window[3]])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ring_hash_known_value() {
        // sha1("abc") = a9993e36 4706816a ...
        assert_eq!(ring_hash(b"abc"), u32::from_le_bytes([0x3e, 0x36, 0x47, 0x06]));
    }

    #[test]
    fn test_virtual_node_label() {
        let node = VirtualNode::new("n1", 7);
        assert_eq!(node.destination, "n1");
        assert_eq!(node.hash, ring_hash(b"n1:7"));
    }
}
