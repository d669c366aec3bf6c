// src/storage/encrypted/mod.rs
mod blob;
mod cipher;
mod errors;

pub use blob::{encode_slot_id, OpaqueBlob, BLOB_OVERHEAD, MAC_LEN, MAX_SLOT_ID, NONCE_LEN, SLOT_ID_LEN, TAG_LEN};
pub use cipher::BlobCipher;
pub use errors::CipherError;
