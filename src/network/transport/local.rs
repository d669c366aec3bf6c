// src/network/transport/local.rs
use std::sync::Arc;

use async_trait::async_trait;

use super::VaultTransport;
use crate::storage::service::{StorageService, UpdateReceipt};
use crate::utils::error::Result;

/// Talks to a storage service in the same process, skipping the wire.
#[derive(Clone)]
pub struct LocalTransport {
    service: Arc<StorageService>,
}

impl LocalTransport {
    pub fn new(service: Arc<StorageService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl VaultTransport for LocalTransport {
    async fn put_blob(&mut self, slot: u32, blob: Vec<u8>) -> Result<UpdateReceipt> {
        self.service.put(slot, blob).await
    }

    async fn get_blob(&mut self, slot: u32) -> Result<Option<Vec<u8>>> {
        self.service.get(slot).await
    }
}
