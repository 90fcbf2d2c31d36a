//! Merkle tree computation for block transactions.

use alloc::vec::Vec;
use core::fmt;
use core::str::FromStr;

use crate::error::{MinerError, Result};
use crate::hash::{decode_hex32, double_sha256, reverse_bytes, Hash256};

/// A transaction id in display byte order (as printed by explorers).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TxId([u8; 32]);

impl TxId {
    /// Wrap bytes that are already in display order.
    pub const fn from_display_bytes(bytes: [u8; 32]) -> Self {
        TxId(bytes)
    }

    /// The id in display order.
    pub fn display_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// The id in the internal (little-endian) order used for hashing.
    pub fn internal_bytes(&self) -> [u8; 32] {
        reverse_bytes(&self.0)
    }
}

impl FromStr for TxId {
    type Err = alloc::string::String;

    fn from_str(s: &str) -> core::result::Result<Self, Self::Err> {
        decode_hex32(s).map(TxId)
    }
}

impl fmt::Debug for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TxId({})", hex::encode(self.0))
    }
}

/// Parse a list of hex transaction ids, reporting the first bad one.
pub fn parse_txids<S: AsRef<str>>(txids: &[S]) -> Result<Vec<TxId>> {
    txids
        .iter()
        .enumerate()
        .map(|(index, s)| {
            s.as_ref()
                .parse::<TxId>()
                .map_err(|reason| MinerError::MalformedTransactionId { index, reason })
        })
        .collect()
}

/// Compute the merkle root from hex transaction ids.
///
/// Fails with [`MinerError::MalformedTransactionId`] if any id is not
/// 64 hex characters; nothing is hashed in that case.
pub fn merkle_root<S: AsRef<str>>(txids: &[S]) -> Result<Hash256> {
    let parsed = parse_txids(txids)?;
    Ok(compute_merkle_root(&parsed))
}

/// Compute the merkle root from a list of transaction ids.
///
/// An empty list yields the all-zero hash. A single transaction yields its
/// own id in internal byte order, unhashed.
///
/// For multiple transactions, we build a binary tree of hashes, duplicating
/// the last node of any level with an odd count.
pub fn compute_merkle_root(txids: &[TxId]) -> Hash256 {
    if txids.is_empty() {
        return Hash256::ZERO;
    }

    let mut current_level: Vec<[u8; 32]> = txids.iter().map(TxId::internal_bytes).collect();

    while current_level.len() > 1 {
        // Duplicate this level's last node, not the original list's
        if current_level.len() % 2 == 1 {
            let last = current_level[current_level.len() - 1];
            current_level.push(last);
        }

        current_level = current_level
            .chunks_exact(2)
            .map(|pair| hash_pair(&pair[0], &pair[1]).to_bytes())
            .collect();
    }

    Hash256::new(current_level[0])
}

/// Concatenate two nodes and hash them.
#[inline]
fn hash_pair(left: &[u8; 32], right: &[u8; 32]) -> Hash256 {
    let mut combined = [0u8; 64];
    combined[..32].copy_from_slice(left);
    combined[32..].copy_from_slice(right);
    double_sha256(&combined)
}
