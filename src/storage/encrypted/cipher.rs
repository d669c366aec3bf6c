// src/storage/encrypted/cipher.rs
use aes_gcm::{
    aead::{Aead, KeyInit, Payload},
    Aes256Gcm, Key, Nonce,
};
use hmac::{Hmac, Mac};
use rand::{rngs::OsRng, RngCore};
use sha2::Sha256;

use super::blob::{encode_slot_id, OpaqueBlob, NONCE_LEN, SLOT_ID_LEN};
use super::errors::{CipherError, Result};
use crate::core::crypto::kdf::{KeyMaterial, MIN_KDF_ITERATIONS, SALT_LEN};

type HmacSha256 = Hmac<Sha256>;

/// Turns plaintext into an opaque, slot-bound, tamper-evident blob and back.
///
/// Keys are re-derived from the password and the blob's own salt on every
/// call; a wrong password surfaces as [`CipherError::Authentication`].
#[derive(Debug, Clone)]
pub struct BlobCipher {
    iterations: u32,
}

impl BlobCipher {
    pub fn new() -> Self {
        Self {
            iterations: MIN_KDF_ITERATIONS,
        }
    }

    pub fn with_iterations(iterations: u32) -> Result<Self> {
        if iterations < MIN_KDF_ITERATIONS {
            return Err(CipherError::WeakKdf(iterations));
        }
        Ok(Self { iterations })
    }

    #[cfg(test)]
    pub(crate) fn with_iterations_unchecked(iterations: u32) -> Self {
        Self { iterations }
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    pub fn encrypt(&self, password: &str, slot: u32, plaintext: &[u8]) -> Result<Vec<u8>> {
        let slot_id = encode_slot_id(slot)?;

        let mut salt = [0u8; SALT_LEN];
        OsRng.fill_bytes(&mut salt);
        let keys = KeyMaterial::derive(password.as_bytes(), &salt, self.iterations);

        let mut nonce_bytes = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce_bytes);

        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(keys.aes_key()));
        let ciphertext = cipher
            .encrypt(
                Nonce::from_slice(&nonce_bytes),
                Payload {
                    msg: plaintext,
                    aad: &slot_id,
                },
            )
            .map_err(|e| CipherError::EncryptionFailed(e.to_string()))?;

        let mac = sign(keys.hmac_key(), &slot_id, &ciphertext)?;

        Ok(OpaqueBlob::assemble(&salt, &nonce_bytes, &ciphertext, &mac))
    }

    /// Verifies the HMAC before touching AES-GCM; nothing is returned unless
    /// both checks pass.
    pub fn decrypt(&self, password: &str, slot: u32, blob: &[u8]) -> Result<Vec<u8>> {
        let slot_id = encode_slot_id(slot)?;
        let blob = OpaqueBlob::parse(blob)?;

        let keys = KeyMaterial::derive(password.as_bytes(), blob.salt, self.iterations);

        let mut mac = new_mac(keys.hmac_key())?;
        mac.update(&slot_id);
        mac.update(blob.ciphertext);
        mac.verify_slice(blob.mac)
            .map_err(|_| CipherError::Authentication)?;

        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(keys.aes_key()));
        cipher
            .decrypt(
                Nonce::from_slice(blob.nonce),
                Payload {
                    msg: blob.ciphertext,
                    aad: &slot_id,
                },
            )
            .map_err(|_| CipherError::Authentication)
    }
}

impl Default for BlobCipher {
    fn default() -> Self {
        Self::new()
    }
}

fn new_mac(key: &[u8]) -> Result<HmacSha256> {
    <HmacSha256 as Mac>::new_from_slice(key)
        .map_err(|e| CipherError::EncryptionFailed(format!("HMAC key: {}", e)))
}

fn sign(key: &[u8], slot_id: &[u8; SLOT_ID_LEN], ciphertext: &[u8]) -> Result<Vec<u8>> {
    let mut mac = new_mac(key)?;
    mac.update(slot_id);
    mac.update(ciphertext);
    Ok(mac.finalize().into_bytes().to_vec())
}
