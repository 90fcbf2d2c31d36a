//! Block header construction and serialization.
//!
//! Hash fields are held in display order and written byte-reversed, so the
//! previous block hash goes in exactly as an explorer prints it and the
//! merkle root goes in as [`compute_merkle_root`](crate::merkle::compute_merkle_root)
//! returns it.

use crate::error::{MinerError, Result};
use crate::hash::{double_sha256, reverse_bytes, Hash256};

/// Size of a block header in bytes.
pub const BLOCK_HEADER_SIZE: usize = 80;

/// Offset of the nonce field within the header.
pub const NONCE_OFFSET: usize = 76;

/// A block header (80 bytes serialized).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockHeader {
    /// Block version.
    pub version: u32,
    /// Hash of the previous block (display order).
    pub prev_block_hash: Hash256,
    /// Merkle root of all transactions (display order).
    pub merkle_root: Hash256,
    /// Block timestamp (Unix time).
    pub timestamp: u32,
    /// Difficulty target in compact "bits" format.
    pub bits: u32,
    /// Nonce for proof of work.
    pub nonce: u32,
}

impl BlockHeader {
    /// Create a new block header with a zero nonce.
    pub fn new(
        version: u32,
        prev_block_hash: Hash256,
        merkle_root: Hash256,
        timestamp: u32,
        bits: u32,
    ) -> Self {
        BlockHeader {
            version,
            prev_block_hash,
            merkle_root,
            timestamp,
            bits,
            nonce: 0,
        }
    }

    /// Serialize the block header to 80 bytes.
    pub fn serialize(&self) -> [u8; BLOCK_HEADER_SIZE] {
        let mut header = [0u8; BLOCK_HEADER_SIZE];
        header[..NONCE_OFFSET].copy_from_slice(&self.serialize_without_nonce());

        // Nonce (4 bytes, little-endian)
        header[NONCE_OFFSET..].copy_from_slice(&self.nonce.to_le_bytes());

        header
    }

    /// Serialize the header without the nonce (76 bytes).
    /// Used for efficient mining where we only change the nonce.
    pub fn serialize_without_nonce(&self) -> [u8; NONCE_OFFSET] {
        let mut header = [0u8; NONCE_OFFSET];

        // Version (4 bytes, little-endian)
        header[0..4].copy_from_slice(&self.version.to_le_bytes());

        // Previous block hash (32 bytes, reversed from display order)
        header[4..36].copy_from_slice(&reverse_bytes(self.prev_block_hash.as_bytes()));

        // Merkle root (32 bytes, reversed from display order)
        header[36..68].copy_from_slice(&reverse_bytes(self.merkle_root.as_bytes()));

        // Timestamp (4 bytes, little-endian)
        header[68..72].copy_from_slice(&self.timestamp.to_le_bytes());

        // Bits (4 bytes, little-endian)
        header[72..76].copy_from_slice(&self.bits.to_le_bytes());

        header
    }

    /// Parse a serialized header. Inverse of [`BlockHeader::serialize`].
    pub fn deserialize(bytes: &[u8; BLOCK_HEADER_SIZE]) -> Self {
        BlockHeader {
            version: read_u32_le(bytes, 0),
            prev_block_hash: read_reversed_hash(bytes, 4),
            merkle_root: read_reversed_hash(bytes, 36),
            timestamp: read_u32_le(bytes, 68),
            bits: read_u32_le(bytes, 72),
            nonce: read_u32_le(bytes, NONCE_OFFSET),
        }
    }

    /// Parse a header from a slice, which must be exactly 80 bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let array: &[u8; BLOCK_HEADER_SIZE] = bytes
            .try_into()
            .map_err(|_| MinerError::InvalidHeaderLength(bytes.len()))?;
        Ok(Self::deserialize(array))
    }

    /// Compute the block hash (double SHA256).
    pub fn hash(&self) -> Hash256 {
        double_sha256(&self.serialize())
    }
}

/// Copy a serialized header, rewriting only the nonce field.
#[inline]
pub fn with_nonce(template: &[u8; BLOCK_HEADER_SIZE], nonce: u32) -> [u8; BLOCK_HEADER_SIZE] {
    let mut header = *template;
    set_nonce(&mut header, nonce);
    header
}

/// Overwrite the nonce field of a serialized header in place.
#[inline]
pub fn set_nonce(header: &mut [u8; BLOCK_HEADER_SIZE], nonce: u32) {
    header[NONCE_OFFSET..].copy_from_slice(&nonce.to_le_bytes());
}

/// Get the current Unix timestamp.
#[cfg(feature = "std")]
pub fn current_timestamp() -> u32 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as u32)
        .unwrap_or(0)
}

fn read_u32_le(bytes: &[u8; BLOCK_HEADER_SIZE], offset: usize) -> u32 {
    let mut word = [0u8; 4];
    word.copy_from_slice(&bytes[offset..offset + 4]);
    u32::from_le_bytes(word)
}

fn read_reversed_hash(bytes: &[u8; BLOCK_HEADER_SIZE], offset: usize) -> Hash256 {
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&bytes[offset..offset + 32]);
    Hash256::new(reverse_bytes(&hash))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_header() -> BlockHeader {
        let mut prev = [0u8; 32];
        prev[0] = 0x12;
        prev[31] = 0x99;
        let mut root = [0x34u8; 32];
        root[0] = 0x01;

        BlockHeader::new(
            0x2000_0000,
            Hash256::new(prev),
            Hash256::new(root),
            1_700_000_000,
            0x1703_4219,
        )
    }

    #[test]
    fn test_block_header_serialization() {
        let mut header = sample_header();
        header.nonce = 0xDEADBEEF;

        let serialized = header.serialize();
        assert_eq!(serialized.len(), 80);

        // Version (0x20000000 in little-endian)
        assert_eq!(&serialized[0..4], &[0x00, 0x00, 0x00, 0x20]);

        // Hash fields are reversed relative to display order
        assert_eq!(serialized[4], 0x99);
        assert_eq!(serialized[35], 0x12);
        assert_eq!(serialized[36], 0x34);
        assert_eq!(serialized[67], 0x01);

        // Timestamp and bits
        assert_eq!(&serialized[68..72], &1_700_000_000u32.to_le_bytes());
        assert_eq!(&serialized[72..76], &[0x19, 0x42, 0x03, 0x17]);

        // Nonce (0xDEADBEEF in little-endian)
        assert_eq!(&serialized[76..80], &[0xEF, 0xBE, 0xAD, 0xDE]);
    }

    #[test]
    fn test_with_nonce_changes_only_last_four_bytes() {
        let template = sample_header().serialize();
        let patched = with_nonce(&template, 0x0102_0304);

        assert_eq!(&patched[..NONCE_OFFSET], &template[..NONCE_OFFSET]);
        assert_eq!(&patched[NONCE_OFFSET..], &[0x04, 0x03, 0x02, 0x01]);

        let mut expected = sample_header();
        expected.nonce = 0x0102_0304;
        assert_eq!(patched, expected.serialize());
    }

    #[test]
    fn test_deserialize_inverts_serialize() {
        let mut header = sample_header();
        header.nonce = 77;

        assert_eq!(BlockHeader::deserialize(&header.serialize()), header);
    }

    #[test]
    fn test_from_bytes_checks_length() {
        let bytes = sample_header().serialize();
        assert!(BlockHeader::from_bytes(&bytes).is_ok());
        assert_eq!(
            BlockHeader::from_bytes(&bytes[..79]),
            Err(MinerError::InvalidHeaderLength(79))
        );
    }

    #[test]
    fn test_genesis_block_hash() {
        // Bitcoin genesis header; the merkle root here is given in display order
        let header = BlockHeader {
            version: 1,
            prev_block_hash: Hash256::ZERO,
            merkle_root: Hash256::from_hex(
                "4a5e1e4baab89f3a32518a88c31bc87f618f76673e2cc77ab2127b7afdeda33b",
            )
            .unwrap(),
            timestamp: 1_231_006_505,
            bits: 0x1d00ffff,
            nonce: 2_083_236_893,
        };

        assert_eq!(
            header.hash().to_display_hex(),
            "000000000019d6689c085ae165831e934ff763ae46a2a6c172b3f1b60a8ce26f"
        );
    }
}
