// src/core/crypto/hashing.rs
use sha2::{Digest, Sha256};

pub const HASH_LEN: usize = 32;

/// A SHA-256 digest. Leaves, internal nodes and roots all share this type.
pub type Hash = [u8; HASH_LEN];

/// Leaf hash of a stored blob. Blobs are opaque: no domain prefix, no parsing.
pub fn hash_blob(blob: &[u8]) -> Hash {
    Sha256::digest(blob).into()
}

/// Leaf hash of a slot that has never been written.
pub fn empty_leaf_hash() -> Hash {
    hash_blob(&[])
}

/// `SHA-256(left ‖ right)`. Order is positional, never sorted.
pub fn hash_pair(left: &Hash, right: &Hash) -> Hash {
    let mut hasher = Sha256::new();
    hasher.update(left);
    hasher.update(right);
    hasher.finalize().into()
}

pub fn short_hex(hash: &Hash) -> String {
    hex::encode(&hash[..8])
}
