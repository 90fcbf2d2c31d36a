//! SHA256 double-hashing and the 32-byte hash value type.

use alloc::format;
use alloc::string::String;
use core::fmt;
use sha2::{Digest, Sha256};

/// A 32-byte hash value.
///
/// Bytes are kept in the order they were produced (for digests) or parsed
/// (for hex input). Bitcoin displays digests byte-reversed; use
/// [`Hash256::to_display_hex`] for that form.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Hash256([u8; 32]);

impl Hash256 {
    /// The all-zero hash.
    pub const ZERO: Hash256 = Hash256([0u8; 32]);

    /// Wrap raw bytes.
    pub const fn new(bytes: [u8; 32]) -> Self {
        Hash256(bytes)
    }

    /// Parse 64 hex characters, keeping the bytes in the order written.
    pub fn from_hex(s: &str) -> Result<Self, String> {
        decode_hex32(s).map(Hash256)
    }

    /// Borrow the raw bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Copy out the raw bytes.
    pub fn to_bytes(self) -> [u8; 32] {
        self.0
    }

    /// The same value with its bytes reversed.
    pub fn reversed(&self) -> Hash256 {
        Hash256(reverse_bytes(&self.0))
    }

    /// Hex of the raw bytes.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Hex of the reversed bytes, the way block explorers print block hashes.
    pub fn to_display_hex(&self) -> String {
        hex::encode(reverse_bytes(&self.0))
    }
}

impl From<[u8; 32]> for Hash256 {
    fn from(bytes: [u8; 32]) -> Self {
        Hash256(bytes)
    }
}

impl AsRef<[u8]> for Hash256 {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash256({})", self.to_hex())
    }
}

impl fmt::Display for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Bitcoin's double SHA256: SHA256(SHA256(data)).
///
/// This is used for block header hashing and merkle tree nodes.
#[inline]
pub fn double_sha256(data: &[u8]) -> Hash256 {
    let first = Sha256::digest(data);
    let second = Sha256::digest(first);
    let mut result = [0u8; 32];
    result.copy_from_slice(&second);
    Hash256(result)
}

/// Single SHA256 hash.
#[inline]
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let hash = Sha256::digest(data);
    let mut result = [0u8; 32];
    result.copy_from_slice(&hash);
    result
}

/// Reverse the byte order of a 32-byte array.
#[inline]
pub fn reverse_bytes(bytes: &[u8; 32]) -> [u8; 32] {
    let mut reversed = *bytes;
    reversed.reverse();
    reversed
}

/// Decode exactly 64 hex characters into 32 bytes.
pub(crate) fn decode_hex32(s: &str) -> Result<[u8; 32], String> {
    if s.len() != 64 {
        return Err(format!("expected 64 hex characters, got {}", s.len()));
    }
    let mut out = [0u8; 32];
    hex::decode_to_slice(s, &mut out).map_err(|e| format!("{}", e))?;
    Ok(out)
}
