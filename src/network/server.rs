// src/network/server.rs
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

use super::protocol::{self, Request, STATUS_NO};
use super::transport::error::{Result as TransportResult, TransportError};
use crate::storage::service::StorageService;
use crate::utils::error::{NodeError, Result};

/// Accepts connections and serves each on its own task. All tasks share one
/// storage service, which serialises the writes.
pub struct VaultServer {
    listener: TcpListener,
    service: Arc<StorageService>,
}

impl VaultServer {
    pub async fn bind(address: &str, service: Arc<StorageService>) -> Result<Self> {
        let listener = TcpListener::bind(address)
            .await
            .map_err(|e| NodeError::Connection(format!("Failed to bind {}: {}", address, e)))?;

        Ok(Self { listener, service })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.listener
            .local_addr()
            .map_err(|e| NodeError::Connection(e.to_string()))
    }

    /// Serves until `shutdown` flips to `true`. Connections already accepted
    /// keep running until their peers hang up.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        info!("Listening on {}", self.local_addr()?);

        loop {
            tokio::select! {
                accepted = self.listener.accept() => {
                    match accepted {
                        Ok((stream, peer)) => self.spawn_connection(stream, peer),
                        Err(e) => error!("Failed to accept connection: {}", e),
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("Server stopping");
                        return Ok(());
                    }
                }
            }
        }
    }

    fn spawn_connection(&self, stream: TcpStream, peer: SocketAddr) {
        let service = self.service.clone();
        let span = info_span!("connection", id = %Uuid::new_v4(), %peer);

        tokio::spawn(
            async move {
                debug!("Accepted");
                match handle_connection(stream, service).await {
                    Ok(()) => debug!("Closed"),
                    Err(e) => warn!("Connection ended with error: {}", e),
                }
            }
            .instrument(span),
        );
    }
}

async fn handle_connection(stream: TcpStream, service: Arc<StorageService>) -> TransportResult<()> {
    stream.set_nodelay(true)?;
    let mut stream = BufReader::new(stream);
    let max_blob_size = service.max_blob_size();

    loop {
        let request = match protocol::read_request(&mut stream, max_blob_size).await {
            Ok(Some(request)) => request,
            Ok(None) => return Ok(()),
            Err(e @ TransportError::FrameTooLarge { .. }) => {
                // The body is still on the wire, so the stream cannot be resynced.
                stream.get_mut().write_all(STATUS_NO).await?;
                return Err(e);
            }
            Err(e) => return Err(e),
        };

        let response = match request {
            Request::Put { slot, blob } => {
                debug!("PUT slot {} ({} bytes)", slot, blob.len());
                match service.put(slot, blob).await {
                    Ok(receipt) => protocol::encode_put_response(&receipt),
                    Err(e) => {
                        warn!("PUT slot {} refused: {}", slot, e);
                        STATUS_NO.to_vec()
                    }
                }
            }
            Request::Get { slot } => {
                debug!("GET slot {}", slot);
                match service.get(slot).await {
                    Ok(blob) => protocol::encode_get_response(blob.as_deref())?,
                    Err(e) => {
                        warn!("GET slot {} refused: {}", slot, e);
                        STATUS_NO.to_vec()
                    }
                }
            }
        };

        stream.get_mut().write_all(&response).await?;
    }
}
