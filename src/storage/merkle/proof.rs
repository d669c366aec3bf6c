// src/storage/merkle/proof.rs
use crate::core::crypto::hashing::{hash_pair, Hash};

/// Position of the sibling relative to the node being folded upward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn to_byte(self) -> u8 {
        match self {
            Side::Left => 0,
            Side::Right => 1,
        }
    }

    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(Side::Left),
            1 => Some(Side::Right),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProofEntry {
    pub sibling: Hash,
    pub side: Side,
}

/// Sibling path from a leaf's parent level up to the level just below the
/// root, in leaf-to-root order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MerkleProof {
    entries: Vec<ProofEntry>,
}

impl MerkleProof {
    pub fn new(entries: Vec<ProofEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[ProofEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn reconstruct_root(&self, leaf_hash: &Hash) -> Hash {
        reconstruct_root(leaf_hash, self)
    }
}

/// Folds `leaf_hash` through the proof. A sibling on the right hashes as
/// `current ‖ sibling`, one on the left as `sibling ‖ current`.
pub fn reconstruct_root(leaf_hash: &Hash, proof: &MerkleProof) -> Hash {
    proof
        .entries
        .iter()
        .fold(*leaf_hash, |current, entry| match entry.side {
            Side::Right => hash_pair(&current, &entry.sibling),
            Side::Left => hash_pair(&entry.sibling, &current),
        })
}
