// src/storage/blob_store.rs
use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::utils::error::Result;

/// Opaque `slot -> blob` map. Knows nothing about the Merkle tree.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn put(&self, slot: u32, blob: Vec<u8>) -> Result<()>;
    async fn get(&self, slot: u32) -> Result<Option<Vec<u8>>>;
    async fn len(&self) -> usize;
}

/// Process-scoped store; contents live exactly as long as the node.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: RwLock<HashMap<u32, Vec<u8>>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, slot: u32, blob: Vec<u8>) -> Result<()> {
        self.blobs.write().insert(slot, blob);
        Ok(())
    }

    async fn get(&self, slot: u32) -> Result<Option<Vec<u8>>> {
        Ok(self.blobs.read().get(&slot).cloned())
    }

    async fn len(&self) -> usize {
        self.blobs.read().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_replaces_wholesale() {
        let store = MemoryBlobStore::new();
        assert_eq!(store.get(4).await.unwrap(), None);

        store.put(4, b"first version".to_vec()).await.unwrap();
        store.put(4, b"v2".to_vec()).await.unwrap();

        assert_eq!(store.get(4).await.unwrap(), Some(b"v2".to_vec()));
        assert_eq!(store.len().await, 1);
    }
}
