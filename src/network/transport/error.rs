// src/network/transport/error.rs
use thiserror::Error;

use crate::utils::error::NodeError;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Connection timeout")]
    Timeout,

    #[error("Invalid message format: {0}")]
    InvalidMessage(String),

    #[error("Frame of {len} bytes exceeds the {max} byte limit")]
    FrameTooLarge { len: usize, max: usize },

    #[error("Request rejected by server: {0}")]
    Rejected(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, TransportError>;

impl From<TransportError> for NodeError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Rejected(_) | TransportError::FrameTooLarge { .. } => {
                NodeError::Validation(err.to_string())
            }
            _ => NodeError::Connection(err.to_string()),
        }
    }
}
