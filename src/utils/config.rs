// src/utils/config.rs
use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{builder::DefaultState, Config as ConfigLib, ConfigBuilder, ConfigError, Environment, File};
use serde::Deserialize;

use crate::core::crypto::kdf::MIN_KDF_ITERATIONS;
use crate::storage::merkle::MAX_TREE_DEPTH;
use crate::utils::error::{NodeError, Result};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub node: NodeConfig,
    pub storage: StorageConfig,
    pub security: SecurityConfig,
    pub client: ClientConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NodeConfig {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub log_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// The tree holds `2^tree_depth` slots.
    pub tree_depth: u32,
    pub max_blob_size: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    pub kdf_iterations: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    pub server_address: String,
    pub connect_timeout: u64,
    pub request_timeout: u64,
    pub get_retries: u32,
}

impl Config {
    /// Defaults, then `config/default` and `config/local`, then `VAULTKEEP__*` env vars.
    pub fn new() -> Result<Self> {
        dotenv::dotenv().ok();

        let config = Self::builder_with_defaults()?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g. VAULTKEEP__NODE__PORT=9100
            .add_source(Environment::with_prefix("VAULTKEEP").separator("__"))
            .build()?;

        Self::finish(config)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let config = Self::builder_with_defaults()?
            .add_source(File::from(path))
            .build()?;

        Self::finish(config)
    }

    /// Built-in defaults only; no files or environment are consulted.
    pub fn defaults() -> Result<Self> {
        let config = Self::builder_with_defaults()?.build()?;
        Self::finish(config)
    }

    fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>> {
        let builder = ConfigLib::builder()
            .set_default("node.host", "127.0.0.1")?
            .set_default("node.port", 9000)?
            .set_default("node.log_level", "info")?
            .set_default("storage.tree_depth", 3)?
            .set_default("storage.max_blob_size", 16 * 1024 * 1024)?
            .set_default("security.kdf_iterations", MIN_KDF_ITERATIONS as i64)?
            .set_default("client.server_address", "127.0.0.1:9000")?
            .set_default("client.connect_timeout", 5)?
            .set_default("client.request_timeout", 30)?
            .set_default("client.get_retries", 3)?;

        Ok(builder)
    }

    fn finish(config: ConfigLib) -> Result<Self> {
        let config: Self = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.node.port == 0 {
            return Err(NodeError::Config("Invalid port number".into()));
        }

        if self.storage.tree_depth > MAX_TREE_DEPTH {
            return Err(NodeError::Config(format!(
                "tree_depth must be at most {} (slot ids are 3 bytes)",
                MAX_TREE_DEPTH
            )));
        }
        if self.storage.max_blob_size == 0 {
            return Err(NodeError::Config("max_blob_size must be greater than 0".into()));
        }

        if self.security.kdf_iterations < MIN_KDF_ITERATIONS {
            return Err(NodeError::Config(format!(
                "kdf_iterations must be at least {}",
                MIN_KDF_ITERATIONS
            )));
        }

        if self.client.connect_timeout == 0 || self.client.request_timeout == 0 {
            return Err(NodeError::Config("client timeouts must be greater than 0".into()));
        }

        Ok(())
    }

    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.node.host, self.node.port)
    }

    pub fn leaf_count(&self) -> u32 {
        1 << self.storage.tree_depth
    }

    pub fn get_connect_timeout(&self) -> Duration {
        Duration::from_secs(self.client.connect_timeout)
    }

    pub fn get_request_timeout(&self) -> Duration {
        Duration::from_secs(self.client.request_timeout)
    }
}

impl From<ConfigError> for NodeError {
    fn from(error: ConfigError) -> Self {
        NodeError::Config(error.to_string())
    }
}
