// src/storage/encrypted/errors.rs
use thiserror::Error;

use crate::utils::error::NodeError;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum CipherError {
    #[error("Invalid blob format: {0}")]
    InvalidFormat(String),

    #[error("Slot id {0} does not fit in 3 bytes")]
    InvalidSlot(u32),

    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("KDF iteration count {0} is below the minimum")]
    WeakKdf(u32),

    /// HMAC mismatch and AEAD tag mismatch both land here, on purpose.
    #[error("Authentication failed")]
    Authentication,
}

pub type Result<T> = std::result::Result<T, CipherError>;

impl From<CipherError> for NodeError {
    fn from(err: CipherError) -> Self {
        match err {
            CipherError::Authentication => NodeError::Authentication,
            CipherError::WeakKdf(_) => NodeError::Config(err.to_string()),
            CipherError::InvalidFormat(_)
            | CipherError::InvalidSlot(_)
            | CipherError::EncryptionFailed(_) => NodeError::Validation(err.to_string()),
        }
    }
}
