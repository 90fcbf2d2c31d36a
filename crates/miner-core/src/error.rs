//! Error types for header mining.

use alloc::string::String;
use thiserror::Error;

/// Errors raised while preparing a search.
///
/// None of these can occur once the nonce loop has started: hashing is total
/// over well-formed input, and running out of nonces is reported as
/// [`SearchResult::Exhausted`](crate::search::SearchResult::Exhausted).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MinerError {
    /// A transaction id was not 64 hex characters.
    #[error("malformed transaction id at index {index}: {reason}")]
    MalformedTransactionId { index: usize, reason: String },

    /// The compact difficulty encoding does not describe a 256-bit target.
    #[error("invalid difficulty bits 0x{bits:08x}: {reason}")]
    InvalidDifficultyBits { bits: u32, reason: &'static str },

    /// The previous block hash was not 64 hex characters.
    #[error("malformed previous block hash: {0}")]
    MalformedBlockHash(String),

    /// A serialized header must be exactly 80 bytes.
    #[error("block header must be 80 bytes, got {0}")]
    InvalidHeaderLength(usize),
}

impl From<core::convert::Infallible> for MinerError {
    fn from(never: core::convert::Infallible) -> Self {
        match never {}
    }
}

pub type Result<T> = core::result::Result<T, MinerError>;
