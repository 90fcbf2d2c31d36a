//! Command-line arguments and the resolved run configuration.

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::builder::FalseyValueParser;
use clap::{Parser, ValueEnum};
use miner_core::search::{DEFAULT_MAX_ITERATIONS, DEFAULT_PROGRESS_INTERVAL};
use miner_core::{PreviousBlock, SearchConfig};

use crate::input::{self, BlockInput};

/// Block version used when none is given.
pub const DEFAULT_BLOCK_VERSION: u32 = 0x2000_0000;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Search a block header's nonce space for a hash below the target.
#[derive(Debug, Parser)]
#[command(name = "header-miner", version, about)]
pub struct Args {
    /// Transaction ids to include, comma separated, in block order
    #[arg(value_delimiter = ',', env = "HEADER_MINER_TXIDS")]
    pub txids: Vec<String>,

    /// Read transaction ids from a file (JSON array or one per line)
    #[arg(long, env = "HEADER_MINER_TXIDS_FILE", conflicts_with = "txids")]
    pub txids_file: Option<PathBuf>,

    /// Previous block as explorer JSON (needs `id`, `version` and `bits`)
    #[arg(long, env = "HEADER_MINER_BLOCK_FILE", conflicts_with = "prev_hash")]
    pub block_file: Option<PathBuf>,

    /// Previous block hash in display order
    #[arg(long, env = "HEADER_MINER_PREV_HASH", requires = "bits")]
    pub prev_hash: Option<String>,

    /// Compact difficulty bits (decimal or 0x-prefixed hex)
    #[arg(long, env = "HEADER_MINER_BITS", value_parser = parse_u32)]
    pub bits: Option<u32>,

    /// Block version (decimal or 0x-prefixed hex)
    #[arg(long, env = "HEADER_MINER_BLOCK_VERSION", value_parser = parse_u32, default_value_t = DEFAULT_BLOCK_VERSION)]
    pub block_version: u32,

    /// Highest nonce to try
    #[arg(long, env = "HEADER_MINER_MAX_ITERATIONS", default_value_t = DEFAULT_MAX_ITERATIONS)]
    pub max_iterations: u32,

    /// Header timestamp, defaults to now
    #[arg(long, env = "HEADER_MINER_TIMESTAMP")]
    pub timestamp: Option<u32>,

    /// Worker threads (0 = all cores)
    #[arg(long, env = "HEADER_MINER_WORKERS", default_value_t = 1)]
    pub workers: usize,

    /// Nonces between progress reports (0 disables)
    #[arg(long, env = "HEADER_MINER_PROGRESS_INTERVAL", default_value_t = DEFAULT_PROGRESS_INTERVAL)]
    pub progress_interval: u32,

    /// Log filter directive, e.g. "info" or "miner_core=debug"
    #[arg(long, env = "HEADER_MINER_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Log output format
    #[arg(long, env = "HEADER_MINER_LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,

    /// Print the result as JSON on stdout
    #[arg(long, env = "HEADER_MINER_JSON", value_parser = FalseyValueParser::new())]
    pub json: bool,
}

/// Everything a run needs, resolved from [`Args`].
#[derive(Debug)]
pub struct Config {
    pub block: BlockInput,
    pub txids: Vec<String>,
    pub timestamp: u32,
    pub workers: usize,
    pub search: SearchConfig,
    pub json: bool,
}

impl Config {
    /// Resolve arguments: load the transaction list and pick the block source.
    pub fn from_args(args: Args) -> Result<Self> {
        let block = match (args.block_file, args.prev_hash, args.bits) {
            (Some(path), _, _) => BlockInput::File(path),
            (None, Some(hash), Some(bits)) => {
                BlockInput::Fixed(PreviousBlock::new(args.block_version, bits, hash))
            }
            _ => bail!("no previous block given: pass --block-file, or --prev-hash with --bits"),
        };

        let txids = match args.txids_file {
            Some(path) => input::read_txids(&path)?,
            None => args.txids.into_iter().filter(|s| !s.trim().is_empty()).collect(),
        };

        let workers = match args.workers {
            0 => num_cpus::get(),
            n => n,
        };

        Ok(Config {
            block,
            txids,
            timestamp: args.timestamp.unwrap_or_else(miner_core::block::current_timestamp),
            workers,
            search: SearchConfig::default()
                .with_max_iterations(args.max_iterations)
                .with_progress_interval(args.progress_interval),
            json: args.json,
        })
    }
}

/// Parse a u32 written in decimal or as 0x-prefixed hex.
pub fn parse_u32(s: &str) -> Result<u32, String> {
    let s = s.trim();
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|e| format!("invalid number '{}': {}", s, e))
}
