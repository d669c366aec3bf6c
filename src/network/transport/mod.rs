// src/network/transport/mod.rs
pub mod error;
mod local;
mod tcp;

use std::time::Duration;

use async_trait::async_trait;

use crate::storage::service::UpdateReceipt;
use crate::utils::config::Config;
use crate::utils::error::Result;

pub use error::TransportError;
pub use local::LocalTransport;
pub use tcp::TcpTransport;

/// How a client reaches a storage service. One outstanding call at a time.
#[async_trait]
pub trait VaultTransport: Send {
    async fn put_blob(&mut self, slot: u32, blob: Vec<u8>) -> Result<UpdateReceipt>;
    async fn get_blob(&mut self, slot: u32) -> Result<Option<Vec<u8>>>;
}

#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub max_frame_size: usize,
}

impl TransportConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            connect_timeout: config.get_connect_timeout(),
            request_timeout: config.get_request_timeout(),
            max_frame_size: config.storage.max_blob_size,
        }
    }
}
