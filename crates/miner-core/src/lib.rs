//! Proof-of-work search over a Bitcoin-style block header.
//!
//! This crate provides pure Rust implementations of:
//! - SHA256 double-hashing
//! - Merkle root computation over transaction ids
//! - Block header serialization
//! - Difficulty target conversion from compact bits
//! - The nonce search loop, sequential or split across threads

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod block;
pub mod difficulty;
pub mod error;
pub mod hash;
pub mod merkle;
#[cfg(feature = "std")]
pub mod parallel;
pub mod rate;
pub mod search;
pub mod source;

pub use block::{with_nonce, BlockHeader};
pub use difficulty::{target_from_bits, Target};
pub use error::{MinerError, Result};
pub use hash::{double_sha256, Hash256};
pub use merkle::{compute_merkle_root, merkle_root, TxId};
#[cfg(feature = "std")]
pub use parallel::mine_parallel;
pub use rate::format_hashrate;
#[cfg(feature = "std")]
pub use search::{mine, SystemClock};
pub use search::{
    search, BatchSearch, BatchStatus, Clock, LogProgress, MiningJob, NoProgress, Progress,
    ProgressObserver, SearchConfig, SearchReport, SearchResult,
};
pub use source::{BlockSource, PreviousBlock};
