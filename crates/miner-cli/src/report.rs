//! Rendering the search result for the terminal.

use miner_core::{format_hashrate, SearchResult};

const RULE: &str = "==================================================";

/// Human-readable summary of a finished search, newline terminated.
pub fn summary(result: &SearchResult) -> String {
    match result {
        SearchResult::Found {
            nonce,
            hash,
            elapsed,
            hashrate,
            iterations,
        } => format!(
            "BLOCK SOLVED\n{RULE}\nNonce:      {nonce}\nHash:       {}\nTime:       {elapsed:.2} s\nHashrate:   {}\nIterations: {iterations}\n{RULE}\n",
            hash.to_display_hex(),
            format_hashrate(*hashrate),
        ),
        SearchResult::Exhausted {
            iterations,
            elapsed,
            hashrate,
        } => format!(
            "NONCE LIMIT REACHED\n{RULE}\nMax nonce:  {iterations}\nTime:       {elapsed:.2} s\nHashrate:   {}\nChange the timestamp or transaction set and retry.\n{RULE}\n",
            format_hashrate(*hashrate),
        ),
    }
}
