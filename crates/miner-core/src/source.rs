//! Previous-block data supplied by an external provider.

use alloc::string::String;
use serde::{Deserialize, Serialize};

use crate::error::{MinerError, Result};
use crate::hash::Hash256;

/// The fields of the chain tip a new header builds on.
///
/// Deserializes from the block JSON served by blockstream.info and
/// mempool.space, where the block's own hash is called `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviousBlock {
    /// Block version to mine with.
    pub version: u32,
    /// Compact difficulty bits.
    pub bits: u32,
    /// Hash of the previous block, 64 hex characters in display order.
    #[serde(rename = "previousBlockHash", alias = "id", alias = "hash")]
    pub hash: String,
}

impl PreviousBlock {
    /// Create a record from its parts.
    pub fn new(version: u32, bits: u32, hash: impl Into<String>) -> Self {
        PreviousBlock {
            version,
            bits,
            hash: hash.into(),
        }
    }

    /// Parse the previous block hash.
    pub fn parsed_hash(&self) -> Result<Hash256> {
        Hash256::from_hex(&self.hash).map_err(MinerError::MalformedBlockHash)
    }
}

/// A provider of previous-block data.
///
/// Fetching is the provider's concern; the search only sees the record.
pub trait BlockSource {
    /// Error raised when the record cannot be obtained.
    type Error;

    /// Return the block the next header should extend.
    fn previous_block(&self) -> core::result::Result<PreviousBlock, Self::Error>;
}

/// A fixed record is its own source.
impl BlockSource for PreviousBlock {
    type Error = core::convert::Infallible;

    fn previous_block(&self) -> core::result::Result<PreviousBlock, Self::Error> {
        Ok(self.clone())
    }
}
