// src/storage/merkle/mod.rs
mod proof;
mod tree;

use thiserror::Error;

use crate::utils::error::NodeError;

pub use proof::{reconstruct_root, MerkleProof, ProofEntry, Side};
pub use tree::MerkleTree;

/// Slot ids travel as 3 bytes, so the tree can address at most `2^24` slots.
pub const MAX_TREE_DEPTH: u32 = 24;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MerkleError {
    #[error("Slot {slot} is out of range for a tree of {leaf_count} leaves")]
    SlotOutOfRange { slot: u32, leaf_count: u32 },

    #[error("Tree depth {0} exceeds the maximum of {}", MAX_TREE_DEPTH)]
    InvalidDepth(u32),
}

pub type Result<T> = std::result::Result<T, MerkleError>;

impl From<MerkleError> for NodeError {
    fn from(err: MerkleError) -> Self {
        match err {
            MerkleError::SlotOutOfRange { .. } => NodeError::Validation(err.to_string()),
            MerkleError::InvalidDepth(_) => NodeError::Config(err.to_string()),
        }
    }
}
