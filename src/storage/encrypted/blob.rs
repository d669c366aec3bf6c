// src/storage/encrypted/blob.rs
use super::errors::{CipherError, Result};
use crate::core::crypto::kdf::SALT_LEN;

pub const NONCE_LEN: usize = 12;
pub const TAG_LEN: usize = 16;
pub const MAC_LEN: usize = 32;
pub const SLOT_ID_LEN: usize = 3;

/// Bytes a blob carries on top of its plaintext.
pub const BLOB_OVERHEAD: usize = SALT_LEN + NONCE_LEN + TAG_LEN + MAC_LEN;

pub const MAX_SLOT_ID: u32 = (1 << (8 * SLOT_ID_LEN)) - 1;

/// Fixed-width big-endian slot id, used both on the wire and as associated data.
pub fn encode_slot_id(slot: u32) -> Result<[u8; SLOT_ID_LEN]> {
    if slot > MAX_SLOT_ID {
        return Err(CipherError::InvalidSlot(slot));
    }
    let bytes = slot.to_be_bytes();
    Ok([bytes[1], bytes[2], bytes[3]])
}

/// Borrowed view of `salt[16] ‖ nonce[12] ‖ ciphertext_with_tag ‖ hmac[32]`.
#[derive(Debug, Clone, Copy)]
pub struct OpaqueBlob<'a> {
    pub salt: &'a [u8; SALT_LEN],
    pub nonce: &'a [u8; NONCE_LEN],
    pub ciphertext: &'a [u8],
    pub mac: &'a [u8; MAC_LEN],
}

impl<'a> OpaqueBlob<'a> {
    pub fn parse(bytes: &'a [u8]) -> Result<Self> {
        if bytes.len() < BLOB_OVERHEAD {
            return Err(CipherError::InvalidFormat(format!(
                "blob is {} bytes, need at least {}",
                bytes.len(),
                BLOB_OVERHEAD
            )));
        }

        let (salt, rest) = bytes.split_at(SALT_LEN);
        let (nonce, rest) = rest.split_at(NONCE_LEN);
        let (ciphertext, mac) = rest.split_at(rest.len() - MAC_LEN);

        // Lengths were checked above, so these conversions cannot fail.
        let salt = salt
            .try_into()
            .map_err(|_| CipherError::InvalidFormat("salt".into()))?;
        let nonce = nonce
            .try_into()
            .map_err(|_| CipherError::InvalidFormat("nonce".into()))?;
        let mac = mac
            .try_into()
            .map_err(|_| CipherError::InvalidFormat("hmac".into()))?;

        Ok(Self {
            salt,
            nonce,
            ciphertext,
            mac,
        })
    }

    pub fn assemble(
        salt: &[u8; SALT_LEN],
        nonce: &[u8; NONCE_LEN],
        ciphertext: &[u8],
        mac: &[u8],
    ) -> Vec<u8> {
        let mut blob = Vec::with_capacity(SALT_LEN + NONCE_LEN + ciphertext.len() + mac.len());
        blob.extend_from_slice(salt);
        blob.extend_from_slice(nonce);
        blob.extend_from_slice(ciphertext);
        blob.extend_from_slice(mac);
        blob
    }

    pub fn plaintext_len(&self) -> usize {
        self.ciphertext.len().saturating_sub(TAG_LEN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_id_encoding() {
        assert_eq!(encode_slot_id(0).unwrap(), [0, 0, 0]);
        assert_eq!(encode_slot_id(42).unwrap(), [0, 0, 42]);
        assert_eq!(encode_slot_id(0x01_02_03).unwrap(), [1, 2, 3]);
        assert_eq!(encode_slot_id(MAX_SLOT_ID).unwrap(), [0xff, 0xff, 0xff]);
        assert_eq!(encode_slot_id(MAX_SLOT_ID + 1), Err(CipherError::InvalidSlot(MAX_SLOT_ID + 1)));
    }

    #[test]
    fn test_parse_splits_fixed_offsets() {
        let salt = [1u8; SALT_LEN];
        let nonce = [2u8; NONCE_LEN];
        let ciphertext = [3u8; 20];
        let mac = [4u8; MAC_LEN];
        let bytes = OpaqueBlob::assemble(&salt, &nonce, &ciphertext, &mac);

        let blob = OpaqueBlob::parse(&bytes).unwrap();
        assert_eq!(blob.salt, &salt);
        assert_eq!(blob.nonce, &nonce);
        assert_eq!(blob.ciphertext, &ciphertext);
        assert_eq!(blob.mac, &mac);
        assert_eq!(blob.plaintext_len(), 4);
    }

    #[test]
    fn test_parse_rejects_short_blob() {
        let bytes = vec![0u8; BLOB_OVERHEAD - 1];
        assert!(matches!(OpaqueBlob::parse(&bytes), Err(CipherError::InvalidFormat(_))));
        assert!(OpaqueBlob::parse(&vec![0u8; BLOB_OVERHEAD]).is_ok());
    }
}
