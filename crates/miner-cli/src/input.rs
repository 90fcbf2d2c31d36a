//! Loading the previous block and transaction list from local input.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use miner_core::{BlockSource, PreviousBlock};

/// Where the previous block record comes from.
#[derive(Debug, Clone)]
pub enum BlockInput {
    /// A block JSON file, e.g. saved from `GET /api/block/:hash`.
    File(PathBuf),
    /// Fields given on the command line.
    Fixed(PreviousBlock),
}

impl BlockSource for BlockInput {
    type Error = anyhow::Error;

    fn previous_block(&self) -> Result<PreviousBlock> {
        match self {
            BlockInput::File(path) => {
                let text = fs::read_to_string(path)
                    .with_context(|| format!("reading block file {}", path.display()))?;
                serde_json::from_str(&text)
                    .with_context(|| format!("parsing block file {}", path.display()))
            }
            BlockInput::Fixed(block) => Ok(block.clone()),
        }
    }
}

/// Read a transaction id list from a file.
pub fn read_txids(path: &Path) -> Result<Vec<String>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading transaction file {}", path.display()))?;
    parse_txid_list(&text).with_context(|| format!("parsing transaction file {}", path.display()))
}

/// Parse a JSON array of ids (as served by `GET /api/mempool/txids`) or one
/// id per line. Blank lines are skipped.
pub fn parse_txid_list(text: &str) -> Result<Vec<String>> {
    let trimmed = text.trim_start();
    if trimmed.starts_with('[') {
        return Ok(serde_json::from_str(trimmed)?);
    }

    Ok(text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect())
}
