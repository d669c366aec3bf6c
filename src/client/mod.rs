// src/client/mod.rs
pub mod verifier;

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::core::crypto::hashing::{empty_leaf_hash, hash_blob, short_hex, Hash};
use crate::network::transport::{TcpTransport, TransportConfig, VaultTransport};
use crate::storage::encrypted::BlobCipher;
use crate::utils::config::Config;
use crate::utils::error::{NodeError, Result};

pub use verifier::{IntegrityError, UpdateVerifier};

const RETRY_BACKOFF: Duration = Duration::from_millis(50);

/// Encrypts before sending, decrypts after fetching, and checks every put
/// against the single root it trusts.
pub struct VaultClient<T: VaultTransport> {
    transport: T,
    cipher: BlobCipher,
    verifier: UpdateVerifier,
    get_retries: u32,
}

impl VaultClient<TcpTransport> {
    pub async fn connect(config: &Config) -> Result<Self> {
        let mut transport = TcpTransport::new(
            config.client.server_address.clone(),
            TransportConfig::from_config(config),
        );
        transport.connect().await?;
        info!("Connected to vault at {}", config.client.server_address);

        Self::from_config(transport, config)
    }
}

impl<T: VaultTransport> VaultClient<T> {
    /// Fails with [`NodeError::Config`] if `tree_depth` cannot be addressed
    /// with 3-byte slot ids.
    pub fn new(transport: T, cipher: BlobCipher, tree_depth: u32, get_retries: u32) -> Result<Self> {
        Ok(Self {
            transport,
            cipher,
            verifier: UpdateVerifier::new(tree_depth)?,
            get_retries,
        })
    }

    pub fn from_config(transport: T, config: &Config) -> Result<Self> {
        let cipher = BlobCipher::with_iterations(config.security.kdf_iterations)?;
        Self::new(
            transport,
            cipher,
            config.storage.tree_depth,
            config.client.get_retries,
        )
    }

    /// Resume from a root saved by an earlier session.
    pub fn with_trusted_root(mut self, root: Hash) -> Result<Self> {
        self.verifier = UpdateVerifier::with_trusted_root(self.verifier.depth(), root)?;
        Ok(self)
    }

    pub fn trusted_root(&self) -> Option<Hash> {
        self.verifier.trusted_root()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Encrypts and stores `plaintext`, then verifies the server's receipt.
    /// Returns the new trusted root.
    ///
    /// Never retried internally: a second attempt encrypts afresh and is a new
    /// operation with its own verification.
    pub async fn put(&mut self, slot: u32, password: &str, plaintext: &[u8]) -> Result<Hash> {
        self.check_slot(slot)?;

        let old_leaf_hash = match self.get_blob(slot).await? {
            Some(blob) => hash_blob(&blob),
            None => empty_leaf_hash(),
        };

        let new_blob = self.encrypt(slot, password, plaintext).await?;
        let new_leaf_hash = hash_blob(&new_blob);

        let receipt = self.transport.put_blob(slot, new_blob).await?;
        let root = self
            .verifier
            .verify_update(slot, &old_leaf_hash, &new_leaf_hash, &receipt)?;

        debug!("Put to slot {} verified, trusted root {}", slot, short_hex(&root));
        Ok(root)
    }

    /// Fetches and decrypts a slot. `Ok(None)` if it was never written.
    pub async fn get(&mut self, slot: u32, password: &str) -> Result<Option<Vec<u8>>> {
        self.check_slot(slot)?;

        match self.get_blob(slot).await? {
            Some(blob) => Ok(Some(self.decrypt(slot, password, blob).await?)),
            None => Ok(None),
        }
    }

    /// Raw blob fetch, retried on connection failures.
    pub async fn get_blob(&mut self, slot: u32) -> Result<Option<Vec<u8>>> {
        self.check_slot(slot)?;

        let mut attempt = 0;
        loop {
            match self.transport.get_blob(slot).await {
                Ok(blob) => return Ok(blob),
                Err(e) if e.is_retryable() && attempt < self.get_retries => {
                    attempt += 1;
                    warn!("GET slot {} failed ({}), retry {}/{}", slot, e, attempt, self.get_retries);
                    tokio::time::sleep(RETRY_BACKOFF * attempt).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn check_slot(&self, slot: u32) -> Result<()> {
        let leaf_count = 1u32 << self.verifier.depth();
        if slot >= leaf_count {
            return Err(NodeError::Validation(format!(
                "Slot {} is out of range for a tree of {} leaves",
                slot, leaf_count
            )));
        }
        Ok(())
    }

    // PBKDF2 is deliberately slow; keep it off the async workers.
    async fn encrypt(&self, slot: u32, password: &str, plaintext: &[u8]) -> Result<Vec<u8>> {
        let cipher = self.cipher.clone();
        let password = password.to_owned();
        let plaintext = plaintext.to_vec();
        tokio::task::spawn_blocking(move || cipher.encrypt(&password, slot, &plaintext))
            .await
            .map_err(|e| NodeError::Storage(format!("Encryption task failed: {}", e)))?
            .map_err(NodeError::from)
    }

    async fn decrypt(&self, slot: u32, password: &str, blob: Vec<u8>) -> Result<Vec<u8>> {
        let cipher = self.cipher.clone();
        let password = password.to_owned();
        tokio::task::spawn_blocking(move || cipher.decrypt(&password, slot, &blob))
            .await
            .map_err(|e| NodeError::Storage(format!("Decryption task failed: {}", e)))?
            .map_err(NodeError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::transport::LocalTransport;
    use crate::storage::service::{StorageService, UpdateReceipt};
    use crate::utils::config::StorageConfig;
    use async_trait::async_trait;
    use std::sync::Arc;

    fn local_client(depth: u32) -> (VaultClient<LocalTransport>, Arc<StorageService>) {
        let service = Arc::new(
            StorageService::new(&StorageConfig {
                tree_depth: depth,
                max_blob_size: 4096,
            })
            .unwrap(),
        );
        let client = VaultClient::new(
            LocalTransport::new(service.clone()),
            BlobCipher::with_iterations_unchecked(1_000),
            depth,
            2,
        )
        .unwrap();
        (client, service)
    }

    #[tokio::test]
    async fn test_put_get_round_trip() {
        let (mut client, service) = local_client(3);
        assert_eq!(client.trusted_root(), None);

        let root = client.put(0, "ilikerats", b"rats like cheese").await.unwrap();
        assert_eq!(root, service.current_root());
        assert_eq!(client.trusted_root(), Some(root));

        let plaintext = client.get(0, "ilikerats").await.unwrap();
        assert_eq!(plaintext, Some(b"rats like cheese".to_vec()));
        assert_eq!(client.get(5, "ilikerats").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_wrong_password_is_authentication_error() {
        let (mut client, _) = local_client(3);
        client.put(2, "right", b"data").await.unwrap();
        assert!(matches!(client.get(2, "wrong").await, Err(NodeError::Authentication)));
    }

    #[tokio::test]
    async fn test_slot_checked_before_any_io() {
        let (mut client, service) = local_client(2);
        assert!(matches!(client.put(4, "pw", b"x").await, Err(NodeError::Validation(_))));
        assert!(matches!(client.get(4, "pw").await, Err(NodeError::Validation(_))));
        assert_eq!(service.metrics().requests_rejected, 0);
    }

    /// Stores what it is given but lies about the resulting root.
    struct LyingTransport {
        inner: LocalTransport,
    }

    #[async_trait]
    impl VaultTransport for LyingTransport {
        async fn put_blob(&mut self, slot: u32, blob: Vec<u8>) -> Result<UpdateReceipt> {
            let mut receipt = self.inner.put_blob(slot, blob).await?;
            receipt.new_root[0] ^= 0x01;
            Ok(receipt)
        }

        async fn get_blob(&mut self, slot: u32) -> Result<Option<Vec<u8>>> {
            self.inner.get_blob(slot).await
        }
    }

    #[tokio::test]
    async fn test_lying_server_leaves_trust_unchanged() {
        let (honest, service) = local_client(3);
        let mut client = VaultClient::new(
            LyingTransport {
                inner: honest.transport().clone(),
            },
            BlobCipher::with_iterations_unchecked(1_000),
            3,
            0,
        )
        .unwrap();

        let result = client.put(1, "pw", b"payload").await;
        assert!(matches!(
            result,
            Err(NodeError::Integrity(IntegrityError::NewRootMismatch))
        ));
        assert_eq!(client.trusted_root(), None);
        assert_ne!(service.current_root(), crate::storage::merkle::MerkleTree::empty_root(3).unwrap());
    }

    /// Honours every request but files puts under a different slot.
    struct MisfilingTransport {
        inner: LocalTransport,
        redirect: (u32, u32),
    }

    #[async_trait]
    impl VaultTransport for MisfilingTransport {
        async fn put_blob(&mut self, slot: u32, blob: Vec<u8>) -> Result<UpdateReceipt> {
            let (from, to) = self.redirect;
            let target = if slot == from { to } else { slot };
            self.inner.put_blob(target, blob).await
        }

        async fn get_blob(&mut self, slot: u32) -> Result<Option<Vec<u8>>> {
            self.inner.get_blob(slot).await
        }
    }

    #[tokio::test]
    async fn test_put_filed_in_wrong_slot_is_detected() {
        let (honest, service) = local_client(3);
        let mut client = VaultClient::new(
            MisfilingTransport {
                inner: honest.transport().clone(),
                redirect: (1, 3),
            },
            BlobCipher::with_iterations_unchecked(1_000),
            3,
            0,
        )
        .unwrap();

        let result = client.put(1, "pw", b"belongs in slot one").await;
        assert!(matches!(
            result,
            Err(NodeError::Integrity(IntegrityError::SlotMismatch { slot: 1, .. }))
        ));
        assert_eq!(client.trusted_root(), None);
        assert_eq!(service.get(1).await.unwrap(), None);
        assert!(service.get(3).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_unaddressable_depth_is_config_error() {
        let (honest, _) = local_client(3);
        let result = VaultClient::new(
            honest.transport().clone(),
            BlobCipher::with_iterations_unchecked(1_000),
            40,
            0,
        );
        assert!(matches!(result, Err(NodeError::Config(_))));

        let mut config = crate::utils::config::Config::defaults().unwrap();
        config.storage.tree_depth = 32;
        assert!(matches!(
            VaultClient::from_config(honest.transport().clone(), &config),
            Err(NodeError::Config(_))
        ));
    }

    /// Fails the first `failures` GETs with a connection error.
    struct FlakyTransport {
        inner: LocalTransport,
        failures: u32,
    }

    #[async_trait]
    impl VaultTransport for FlakyTransport {
        async fn put_blob(&mut self, slot: u32, blob: Vec<u8>) -> Result<UpdateReceipt> {
            self.inner.put_blob(slot, blob).await
        }

        async fn get_blob(&mut self, slot: u32) -> Result<Option<Vec<u8>>> {
            if self.failures > 0 {
                self.failures -= 1;
                return Err(NodeError::Connection("reset by peer".into()));
            }
            self.inner.get_blob(slot).await
        }
    }

    #[tokio::test]
    async fn test_get_retries_connection_errors() {
        let (honest, _) = local_client(3);
        let inner = honest.transport().clone();

        let mut client = VaultClient::new(
            FlakyTransport {
                inner: inner.clone(),
                failures: 2,
            },
            BlobCipher::with_iterations_unchecked(1_000),
            3,
            2,
        )
        .unwrap();
        assert_eq!(client.get_blob(3).await.unwrap(), None);

        let mut impatient = VaultClient::new(
            FlakyTransport { inner, failures: 3 },
            BlobCipher::with_iterations_unchecked(1_000),
            3,
            2,
        )
        .unwrap();
        assert!(matches!(impatient.get_blob(3).await, Err(NodeError::Connection(_))));
    }
}
