// src/client/verifier.rs
use thiserror::Error;
use tracing::{debug, warn};

use crate::core::crypto::hashing::{short_hex, Hash};
use crate::storage::merkle::{reconstruct_root, MerkleError, Side, MAX_TREE_DEPTH};
use crate::storage::service::UpdateReceipt;

/// A proof that does not line up with what the client trusts. Never retried.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IntegrityError {
    #[error("proof has {actual} entries, expected {expected}")]
    ProofLength { expected: usize, actual: usize },

    #[error("proof entry {level} places the leaf outside slot {slot}")]
    SlotMismatch { slot: u32, level: usize },

    #[error("proof does not reconstruct the server's previous root")]
    PreviousRootMismatch,

    #[error("server's previous root differs from the trusted root")]
    TrustedRootMismatch,

    #[error("proof does not reconstruct the claimed new root")]
    NewRootMismatch,
}

/// Holds the client's only persistent state, the trusted root, and advances
/// it strictly after a receipt has been checked against it.
#[derive(Debug, Clone)]
pub struct UpdateVerifier {
    depth: u32,
    trusted_root: Option<Hash>,
}

impl UpdateVerifier {
    pub fn new(depth: u32) -> Result<Self, MerkleError> {
        if depth > MAX_TREE_DEPTH {
            return Err(MerkleError::InvalidDepth(depth));
        }
        Ok(Self {
            depth,
            trusted_root: None,
        })
    }

    pub fn with_trusted_root(depth: u32, root: Hash) -> Result<Self, MerkleError> {
        let mut verifier = Self::new(depth)?;
        verifier.trusted_root = Some(root);
        Ok(verifier)
    }

    pub fn trusted_root(&self) -> Option<Hash> {
        self.trusted_root
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Runs every check without touching the trusted root.
    pub fn check_update(
        &self,
        slot: u32,
        old_leaf_hash: &Hash,
        new_leaf_hash: &Hash,
        receipt: &UpdateReceipt,
    ) -> Result<(), IntegrityError> {
        let expected = self.depth as usize;
        if receipt.proof.len() != expected {
            return Err(IntegrityError::ProofLength {
                expected,
                actual: receipt.proof.len(),
            });
        }

        // Level k's sibling sits on the left exactly when bit k of the slot is set.
        for (level, entry) in receipt.proof.entries().iter().enumerate() {
            let expected_side = if (slot >> level) & 1 == 1 {
                Side::Left
            } else {
                Side::Right
            };
            if entry.side != expected_side {
                return Err(IntegrityError::SlotMismatch { slot, level });
            }
        }

        let expected_old_root = reconstruct_root(old_leaf_hash, &receipt.proof);
        if expected_old_root != receipt.previous_root {
            return Err(IntegrityError::PreviousRootMismatch);
        }
        if let Some(trusted) = &self.trusted_root {
            if *trusted != expected_old_root {
                return Err(IntegrityError::TrustedRootMismatch);
            }
        }

        let expected_new_root = reconstruct_root(new_leaf_hash, &receipt.proof);
        if expected_new_root != receipt.new_root {
            return Err(IntegrityError::NewRootMismatch);
        }

        Ok(())
    }

    /// Checks the receipt and, only if it passes, adopts its new root.
    pub fn verify_update(
        &mut self,
        slot: u32,
        old_leaf_hash: &Hash,
        new_leaf_hash: &Hash,
        receipt: &UpdateReceipt,
    ) -> Result<Hash, IntegrityError> {
        if let Err(e) = self.check_update(slot, old_leaf_hash, new_leaf_hash, receipt) {
            warn!("Update verification for slot {} failed: {}", slot, e);
            return Err(e);
        }

        debug!(
            "Trusted root advanced {} -> {}",
            self.trusted_root
                .as_ref()
                .map(short_hex)
                .unwrap_or_else(|| "<none>".into()),
            short_hex(&receipt.new_root)
        );
        self.trusted_root = Some(receipt.new_root);
        Ok(receipt.new_root)
    }
}
