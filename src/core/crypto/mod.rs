//! Cryptographic primitives shared by the encryption layer and the Merkle tree

pub mod hashing;
pub mod kdf;

pub use hashing::{empty_leaf_hash, hash_blob, hash_pair, Hash, HASH_LEN};
pub use kdf::{KeyMaterial, MIN_KDF_ITERATIONS, SALT_LEN};
