// src/storage/service.rs
use std::sync::Arc;
use std::time::Instant;

use parking_lot::RwLock;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::blob_store::{BlobStore, MemoryBlobStore};
use super::merkle::{MerkleProof, MerkleTree};
use crate::core::crypto::hashing::{hash_blob, short_hex, Hash};
use crate::utils::config::StorageConfig;
use crate::utils::error::{NodeError, Result};
use crate::utils::metrics::{Metrics, MetricsSnapshot};

/// What the server hands back for a put: the root it held before the write,
/// the root after it, and the sibling path that links both to the slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateReceipt {
    pub previous_root: Hash,
    pub new_root: Hash,
    pub proof: MerkleProof,
}

/// Server-side orchestration over one blob map and one tree covering the same
/// slot range.
pub struct StorageService {
    blobs: Arc<dyn BlobStore>,
    tree: RwLock<MerkleTree>,
    // Serialises the whole put: blob write, tree update and receipt.
    write_gate: Mutex<()>,
    // Fixed at construction, so range checks never touch the tree lock.
    leaf_count: u32,
    max_blob_size: usize,
    metrics: Metrics,
}

impl StorageService {
    pub fn new(config: &StorageConfig) -> Result<Self> {
        Self::with_store(config, Arc::new(MemoryBlobStore::new()))
    }

    pub fn with_store(config: &StorageConfig, blobs: Arc<dyn BlobStore>) -> Result<Self> {
        let tree = MerkleTree::new(config.tree_depth)?;

        Ok(Self {
            blobs,
            leaf_count: tree.leaf_count(),
            tree: RwLock::new(tree),
            write_gate: Mutex::new(()),
            max_blob_size: config.max_blob_size,
            metrics: Metrics::new(),
        })
    }

    pub fn leaf_count(&self) -> u32 {
        self.leaf_count
    }

    pub fn depth(&self) -> u32 {
        self.tree.read().depth()
    }

    pub fn max_blob_size(&self) -> usize {
        self.max_blob_size
    }

    /// Always the root of some completed update.
    pub fn current_root(&self) -> Hash {
        self.tree.read().current_root()
    }

    pub fn proof(&self, slot: u32) -> Result<MerkleProof> {
        Ok(self.tree.read().proof(slot)?)
    }

    pub async fn put(&self, slot: u32, blob: Vec<u8>) -> Result<UpdateReceipt> {
        let started = Instant::now();
        if let Err(e) = self.check_put(slot, &blob) {
            self.metrics.record_rejection();
            warn!("Rejected put to slot {}: {}", slot, e);
            return Err(e);
        }

        let leaf_hash = hash_blob(&blob);

        let _gate = self.write_gate.lock().await;
        self.blobs.put(slot, blob).await?;

        let receipt = {
            let mut tree = self.tree.write();
            let previous_root = tree.current_root();
            let (new_root, proof) = tree.update_leaf_hash(slot, leaf_hash)?;
            UpdateReceipt {
                previous_root,
                new_root,
                proof,
            }
        };

        debug!(
            "Slot {} updated, root {} -> {}",
            slot,
            short_hex(&receipt.previous_root),
            short_hex(&receipt.new_root)
        );
        self.metrics.record_put(started.elapsed());
        Ok(receipt)
    }

    /// Plain read; does not wait for in-flight puts.
    pub async fn get(&self, slot: u32) -> Result<Option<Vec<u8>>> {
        let started = Instant::now();
        let leaf_count = self.leaf_count;
        if slot >= leaf_count {
            self.metrics.record_rejection();
            return Err(NodeError::Validation(format!(
                "Slot {} is out of range for a tree of {} leaves",
                slot, leaf_count
            )));
        }

        let blob = self.blobs.get(slot).await?;
        self.metrics.record_get(started.elapsed());
        Ok(blob)
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    fn check_put(&self, slot: u32, blob: &[u8]) -> Result<()> {
        let leaf_count = self.leaf_count;
        if slot >= leaf_count {
            return Err(NodeError::Validation(format!(
                "Slot {} is out of range for a tree of {} leaves",
                slot, leaf_count
            )));
        }
        if blob.len() > self.max_blob_size {
            return Err(NodeError::Validation(format!(
                "Blob of {} bytes exceeds the {} byte limit",
                blob.len(),
                self.max_blob_size
            )));
        }
        Ok(())
    }
}
