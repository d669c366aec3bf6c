// src/network/protocol.rs
//! Byte-level framing shared by the server loop and the TCP transport.
//!
//! Requests are `opcode[1] ‖ slot[3]`, with PUT adding `len[4] ‖ blob`.
//! Every response opens with a two-byte status, `OK` or `NO`. A PUT `OK`
//! carries `new_root[32] ‖ previous_root[32] ‖ count[1]` followed by `count`
//! entries of `side[1] ‖ sibling[32]`, leaf to root. A GET `OK` carries
//! `len[4] ‖ blob`. All integers are big-endian.

use tokio::io::{AsyncRead, AsyncReadExt};

use super::transport::error::{Result, TransportError};
use crate::core::crypto::hashing::{Hash, HASH_LEN};
use crate::storage::encrypted::{encode_slot_id, SLOT_ID_LEN};
use crate::storage::merkle::{MerkleProof, ProofEntry, Side, MAX_TREE_DEPTH};
use crate::storage::service::UpdateReceipt;

pub const OP_PUT: u8 = 1;
pub const OP_GET: u8 = 2;

pub const STATUS_OK: &[u8; 2] = b"OK";
pub const STATUS_NO: &[u8; 2] = b"NO";

const HEADER_LEN: usize = 1 + SLOT_ID_LEN;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Put { slot: u32, blob: Vec<u8> },
    Get { slot: u32 },
}

impl Request {
    pub fn slot(&self) -> u32 {
        match self {
            Request::Put { slot, .. } | Request::Get { slot } => *slot,
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        let slot_id = encode_slot_id(self.slot())
            .map_err(|e| TransportError::InvalidMessage(e.to_string()))?;

        match self {
            Request::Put { blob, .. } => {
                let len = u32::try_from(blob.len()).map_err(|_| TransportError::FrameTooLarge {
                    len: blob.len(),
                    max: u32::MAX as usize,
                })?;
                let mut frame = Vec::with_capacity(HEADER_LEN + 4 + blob.len());
                frame.push(OP_PUT);
                frame.extend_from_slice(&slot_id);
                frame.extend_from_slice(&len.to_be_bytes());
                frame.extend_from_slice(blob);
                Ok(frame)
            }
            Request::Get { .. } => {
                let mut frame = Vec::with_capacity(HEADER_LEN);
                frame.push(OP_GET);
                frame.extend_from_slice(&slot_id);
                Ok(frame)
            }
        }
    }
}

/// Reads one request. `Ok(None)` means the peer closed cleanly between frames.
pub async fn read_request<R>(reader: &mut R, max_blob_size: usize) -> Result<Option<Request>>
where
    R: AsyncRead + Unpin,
{
    let mut header = [0u8; HEADER_LEN];
    let first = reader.read(&mut header[..1]).await?;
    if first == 0 {
        return Ok(None);
    }
    reader.read_exact(&mut header[1..]).await?;

    let slot = u32::from_be_bytes([0, header[1], header[2], header[3]]);
    match header[0] {
        OP_PUT => {
            let len = reader.read_u32().await? as usize;
            if len > max_blob_size {
                return Err(TransportError::FrameTooLarge {
                    len,
                    max: max_blob_size,
                });
            }
            let mut blob = vec![0u8; len];
            reader.read_exact(&mut blob).await?;
            Ok(Some(Request::Put { slot, blob }))
        }
        OP_GET => Ok(Some(Request::Get { slot })),
        other => Err(TransportError::InvalidMessage(format!("unknown opcode {}", other))),
    }
}

pub fn encode_put_response(receipt: &UpdateReceipt) -> Vec<u8> {
    let entries = receipt.proof.entries();
    let mut frame = Vec::with_capacity(2 + 2 * HASH_LEN + 1 + entries.len() * (1 + HASH_LEN));
    frame.extend_from_slice(STATUS_OK);
    frame.extend_from_slice(&receipt.new_root);
    frame.extend_from_slice(&receipt.previous_root);
    // Depth is capped at MAX_TREE_DEPTH, well inside a byte.
    frame.push(entries.len() as u8);
    for entry in entries {
        frame.push(entry.side.to_byte());
        frame.extend_from_slice(&entry.sibling);
    }
    frame
}

pub fn encode_get_response(blob: Option<&[u8]>) -> Result<Vec<u8>> {
    match blob {
        Some(blob) => {
            let len = u32::try_from(blob.len()).map_err(|_| TransportError::FrameTooLarge {
                len: blob.len(),
                max: u32::MAX as usize,
            })?;
            let mut frame = Vec::with_capacity(2 + 4 + blob.len());
            frame.extend_from_slice(STATUS_OK);
            frame.extend_from_slice(&len.to_be_bytes());
            frame.extend_from_slice(blob);
            Ok(frame)
        }
        None => Ok(STATUS_NO.to_vec()),
    }
}

pub async fn read_put_response<R>(reader: &mut R) -> Result<UpdateReceipt>
where
    R: AsyncRead + Unpin,
{
    if !read_status(reader).await? {
        return Err(TransportError::Rejected("put refused".into()));
    }

    let new_root = read_hash(reader).await?;
    let previous_root = read_hash(reader).await?;

    let count = reader.read_u8().await?;
    if u32::from(count) > MAX_TREE_DEPTH {
        return Err(TransportError::InvalidMessage(format!(
            "proof of {} entries exceeds the maximum depth",
            count
        )));
    }

    let mut entries = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let side_byte = reader.read_u8().await?;
        let side = Side::from_byte(side_byte).ok_or_else(|| {
            TransportError::InvalidMessage(format!("invalid side tag {}", side_byte))
        })?;
        let sibling = read_hash(reader).await?;
        entries.push(ProofEntry { sibling, side });
    }

    Ok(UpdateReceipt {
        previous_root,
        new_root,
        proof: MerkleProof::new(entries),
    })
}

pub async fn read_get_response<R>(reader: &mut R, max_blob_size: usize) -> Result<Option<Vec<u8>>>
where
    R: AsyncRead + Unpin,
{
    if !read_status(reader).await? {
        return Ok(None);
    }

    let len = reader.read_u32().await? as usize;
    if len > max_blob_size {
        return Err(TransportError::FrameTooLarge {
            len,
            max: max_blob_size,
        });
    }
    let mut blob = vec![0u8; len];
    reader.read_exact(&mut blob).await?;
    Ok(Some(blob))
}

async fn read_status<R>(reader: &mut R) -> Result<bool>
where
    R: AsyncRead + Unpin,
{
    let mut status = [0u8; 2];
    reader.read_exact(&mut status).await?;
    match &status {
        STATUS_OK => Ok(true),
        STATUS_NO => Ok(false),
        _ => Err(TransportError::InvalidMessage(format!(
            "unexpected status {:?}",
            String::from_utf8_lossy(&status)
        ))),
    }
}

async fn read_hash<R>(reader: &mut R) -> Result<Hash>
where
    R: AsyncRead + Unpin,
{
    let mut hash = [0u8; HASH_LEN];
    reader.read_exact(&mut hash).await?;
    Ok(hash)
}
