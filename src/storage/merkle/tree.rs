// src/storage/merkle/tree.rs
use super::proof::{MerkleProof, ProofEntry, Side};
use super::{MerkleError, Result, MAX_TREE_DEPTH};
use crate::core::crypto::hashing::{empty_leaf_hash, hash_blob, hash_pair, Hash};

/// Complete binary hash tree over a fixed number of slots.
///
/// Nodes live in one array of `2N - 1` hashes: the root at index 0, the
/// children of `i` at `2i + 1` and `2i + 2`, and slot `s` at `N - 1 + s`.
/// The shape never changes after construction.
#[derive(Debug, Clone)]
pub struct MerkleTree {
    depth: u32,
    nodes: Vec<Hash>,
}

impl MerkleTree {
    /// Builds the whole tree eagerly with every leaf at the empty-slot hash.
    pub fn new(depth: u32) -> Result<Self> {
        if depth > MAX_TREE_DEPTH {
            return Err(MerkleError::InvalidDepth(depth));
        }

        let leaf_count = 1usize << depth;
        let mut nodes = vec![empty_leaf_hash(); 2 * leaf_count - 1];
        for index in (0..leaf_count - 1).rev() {
            nodes[index] = hash_pair(&nodes[2 * index + 1], &nodes[2 * index + 2]);
        }

        Ok(Self { depth, nodes })
    }

    /// Root of an all-empty tree of the given depth, without allocating one.
    pub fn empty_root(depth: u32) -> Result<Hash> {
        if depth > MAX_TREE_DEPTH {
            return Err(MerkleError::InvalidDepth(depth));
        }
        Ok((0..depth).fold(empty_leaf_hash(), |level, _| hash_pair(&level, &level)))
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn leaf_count(&self) -> u32 {
        1 << self.depth
    }

    pub fn current_root(&self) -> Hash {
        self.nodes[0]
    }

    pub fn leaf_hash(&self, slot: u32) -> Result<Hash> {
        Ok(self.nodes[self.leaf_index(slot)?])
    }

    /// Sets the slot's leaf to `SHA-256(blob)`, rehashes every ancestor and
    /// returns the new root with the sibling path collected on the way up.
    ///
    /// The proof is valid against both the new root (with the new leaf) and
    /// the previous root (with the previous leaf): siblings are untouched by
    /// the update.
    pub fn update_leaf(&mut self, slot: u32, blob: &[u8]) -> Result<(Hash, MerkleProof)> {
        self.update_leaf_hash(slot, hash_blob(blob))
    }

    pub fn update_leaf_hash(&mut self, slot: u32, leaf_hash: Hash) -> Result<(Hash, MerkleProof)> {
        let mut index = self.leaf_index(slot)?;
        self.nodes[index] = leaf_hash;

        let mut entries = Vec::with_capacity(self.depth as usize);
        while index > 0 {
            let (entry, parent) = self.step_up(index);
            entries.push(entry);
            let (left, right) = (2 * parent + 1, 2 * parent + 2);
            self.nodes[parent] = hash_pair(&self.nodes[left], &self.nodes[right]);
            index = parent;
        }

        Ok((self.current_root(), MerkleProof::new(entries)))
    }

    /// Inclusion proof for the slot's current leaf, without mutating anything.
    pub fn proof(&self, slot: u32) -> Result<MerkleProof> {
        let mut index = self.leaf_index(slot)?;

        let mut entries = Vec::with_capacity(self.depth as usize);
        while index > 0 {
            let (entry, parent) = self.step_up(index);
            entries.push(entry);
            index = parent;
        }

        Ok(MerkleProof::new(entries))
    }

    fn step_up(&self, index: usize) -> (ProofEntry, usize) {
        // Odd indices are left children.
        let (sibling, side) = if index % 2 == 1 {
            (index + 1, Side::Right)
        } else {
            (index - 1, Side::Left)
        };

        let entry = ProofEntry {
            sibling: self.nodes[sibling],
            side,
        };
        (entry, (index - 1) / 2)
    }

    fn leaf_index(&self, slot: u32) -> Result<usize> {
        let leaf_count = self.leaf_count();
        if slot >= leaf_count {
            return Err(MerkleError::SlotOutOfRange { slot, leaf_count });
        }
        Ok((leaf_count - 1) as usize + slot as usize)
    }
}
