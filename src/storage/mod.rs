// src/storage/mod.rs
pub mod blob_store;
pub mod encrypted;
pub mod merkle;
pub mod service;

pub use blob_store::{BlobStore, MemoryBlobStore};
pub use encrypted::{BlobCipher, CipherError};
pub use merkle::{MerkleProof, MerkleTree, ProofEntry, Side};
pub use service::{StorageService, UpdateReceipt};
