// src/utils/error.rs
use thiserror::Error;

use crate::client::verifier::IntegrityError;

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),

    /// Deliberately carries no detail: callers must not learn which check failed.
    #[error("Authentication failed")]
    Authentication,

    #[error("Integrity error: {0}")]
    Integrity(#[from] IntegrityError),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl NodeError {
    /// Only transport failures are worth retrying, and only for idempotent reads.
    pub fn is_retryable(&self) -> bool {
        matches!(self, NodeError::Connection(_))
    }
}

pub type Result<T> = std::result::Result<T, NodeError>;
