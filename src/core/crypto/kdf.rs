// src/core/crypto/kdf.rs
use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
use zeroize::{Zeroize, ZeroizeOnDrop};

pub const SALT_LEN: usize = 16;
pub const AES_KEY_LEN: usize = 32;
pub const HMAC_KEY_LEN: usize = 32;
const DERIVED_LEN: usize = AES_KEY_LEN + HMAC_KEY_LEN;

/// Lowest PBKDF2-HMAC-SHA-256 round count the node will accept.
pub const MIN_KDF_ITERATIONS: u32 = 200_000;

/// Per-call key pair derived from `(password, salt)`. Never stored, never sent.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct KeyMaterial {
    aes_key: [u8; AES_KEY_LEN],
    hmac_key: [u8; HMAC_KEY_LEN],
}

impl KeyMaterial {
    /// Derives 64 bytes and splits them: the first half keys AES-256-GCM, the
    /// second half keys HMAC-SHA-256.
    pub fn derive(password: &[u8], salt: &[u8; SALT_LEN], iterations: u32) -> Self {
        let mut material = [0u8; DERIVED_LEN];
        pbkdf2_hmac::<Sha256>(password, salt, iterations, &mut material);

        let mut aes_key = [0u8; AES_KEY_LEN];
        let mut hmac_key = [0u8; HMAC_KEY_LEN];
        aes_key.copy_from_slice(&material[..AES_KEY_LEN]);
        hmac_key.copy_from_slice(&material[AES_KEY_LEN..]);
        material.zeroize();

        Self { aes_key, hmac_key }
    }

    pub fn aes_key(&self) -> &[u8; AES_KEY_LEN] {
        &self.aes_key
    }

    pub fn hmac_key(&self) -> &[u8; HMAC_KEY_LEN] {
        &self.hmac_key
    }
}

impl std::fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("KeyMaterial(..)")
    }
}
