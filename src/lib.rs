pub mod client;
pub mod core;
pub mod network;
pub mod storage;
pub mod utils;

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::{
    core::crypto::hashing::short_hex,
    network::server::VaultServer,
    storage::service::StorageService,
    utils::{
        config::Config,
        error::{NodeError, Result},
    },
};

pub use crate::client::VaultClient;

/// Process-scoped server state: built once at startup, dropped at exit.
pub struct Application {
    config: Arc<Config>,
    service: Arc<StorageService>,
    shutdown_tx: watch::Sender<bool>,
    server: Mutex<Option<JoinHandle<Result<()>>>>,
}

impl Application {
    pub fn new(config: Config) -> Result<Self> {
        let config = Arc::new(config);

        info!(
            "Initializing storage with {} slots...",
            config.leaf_count()
        );
        let service = Arc::new(StorageService::new(&config.storage)?);
        info!("Empty root {}", short_hex(&service.current_root()));

        let (shutdown_tx, _) = watch::channel(false);

        Ok(Self {
            config,
            service,
            shutdown_tx,
            server: Mutex::new(None),
        })
    }

    /// Binds the configured address and serves in the background.
    pub async fn start(&self) -> Result<SocketAddr> {
        let mut server = self.server.lock().await;
        if server.is_some() {
            return Err(NodeError::Config("Application already started".into()));
        }

        info!("Starting storage server...");
        let listener = VaultServer::bind(&self.config.listen_address(), self.service.clone()).await?;
        let addr = listener.local_addr()?;

        *server = Some(tokio::spawn(listener.run(self.shutdown_tx.subscribe())));

        info!("Application successfully started on {}", addr);
        Ok(addr)
    }

    pub fn service(&self) -> Arc<StorageService> {
        self.service.clone()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub async fn shutdown(&self) -> Result<()> {
        info!("Shutting down application...");
        let _ = self.shutdown_tx.send(true);

        if let Some(handle) = self.server.lock().await.take() {
            match handle.await {
                Ok(result) => result?,
                Err(e) => {
                    error!("Server task failed: {}", e);
                    return Err(NodeError::Connection(format!("Server task failed: {}", e)));
                }
            }
        }

        let stats = self.service.metrics();
        info!(
            "Served {} puts and {} gets ({} rejected) in {:?}",
            stats.puts_total, stats.gets_total, stats.requests_rejected, stats.uptime
        );
        info!("Application shutdown complete");
        Ok(())
    }
}
