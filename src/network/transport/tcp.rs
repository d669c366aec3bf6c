// src/network/transport/tcp.rs
use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tracing::{debug, warn};

use super::error::{Result, TransportError};
use super::{TransportConfig, VaultTransport};
use crate::network::protocol::{self, Request};
use crate::storage::service::UpdateReceipt;

/// Client end of the wire protocol over one TCP connection.
///
/// The connection is opened lazily and dropped after any failed call, so the
/// next call starts from a clean stream instead of a half-read frame.
pub struct TcpTransport {
    address: String,
    config: TransportConfig,
    stream: Option<BufReader<TcpStream>>,
}

impl TcpTransport {
    pub fn new(address: impl Into<String>, config: TransportConfig) -> Self {
        Self {
            address: address.into(),
            config,
            stream: None,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    pub async fn connect(&mut self) -> Result<()> {
        if self.stream.is_some() {
            return Ok(());
        }

        let stream = match tokio::time::timeout(
            self.config.connect_timeout,
            TcpStream::connect(&self.address),
        )
        .await
        {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => return Err(TransportError::ConnectionFailed(e.to_string())),
            Err(_) => return Err(TransportError::Timeout),
        };
        stream.set_nodelay(true)?;

        debug!("Connected to {}", self.address);
        self.stream = Some(BufReader::new(stream));
        Ok(())
    }

    async fn put(&mut self, slot: u32, blob: Vec<u8>) -> Result<UpdateReceipt> {
        if blob.len() > self.config.max_frame_size {
            return Err(TransportError::FrameTooLarge {
                len: blob.len(),
                max: self.config.max_frame_size,
            });
        }
        let frame = Request::Put { slot, blob }.encode()?;
        let timeout = self.config.request_timeout;

        let stream = self.ready_stream().await?;
        let result = with_timeout(timeout, async move {
            stream.get_mut().write_all(&frame).await?;
            protocol::read_put_response(stream).await
        })
        .await;

        self.settle(result)
    }

    async fn get(&mut self, slot: u32) -> Result<Option<Vec<u8>>> {
        let frame = Request::Get { slot }.encode()?;
        let timeout = self.config.request_timeout;
        let max = self.config.max_frame_size;

        let stream = self.ready_stream().await?;
        let result = with_timeout(timeout, async move {
            stream.get_mut().write_all(&frame).await?;
            protocol::read_get_response(stream, max).await
        })
        .await;

        self.settle(result)
    }

    async fn ready_stream(&mut self) -> Result<&mut BufReader<TcpStream>> {
        self.connect().await?;
        self.stream
            .as_mut()
            .ok_or_else(|| TransportError::ConnectionFailed("not connected".into()))
    }

    /// Any failure drops the stream: it may be mid-frame, or the server may
    /// already have closed its end after refusing the request.
    fn settle<T>(&mut self, result: Result<T>) -> Result<T> {
        if let Err(e) = &result {
            warn!("Dropping connection to {}: {}", self.address, e);
            self.stream = None;
        }
        result
    }
}

async fn with_timeout<T>(timeout: Duration, exchange: impl Future<Output = Result<T>>) -> Result<T> {
    match tokio::time::timeout(timeout, exchange).await {
        Ok(result) => result,
        Err(_) => Err(TransportError::Timeout),
    }
}

#[async_trait]
impl VaultTransport for TcpTransport {
    async fn put_blob(&mut self, slot: u32, blob: Vec<u8>) -> crate::utils::error::Result<UpdateReceipt> {
        Ok(self.put(slot, blob).await?)
    }

    async fn get_blob(&mut self, slot: u32) -> crate::utils::error::Result<Option<Vec<u8>>> {
        Ok(self.get(slot).await?)
    }
}
