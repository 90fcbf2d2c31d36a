//! Values handed across the JS boundary.

use miner_core::difficulty::{bits_to_difficulty, format_difficulty};
use miner_core::{MiningJob, Progress, SearchReport};
use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

/// Header template information for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateInfo {
    /// Block version.
    pub version: u32,
    /// Previous block hash (display format).
    pub prev_hash: String,
    /// Merkle root over the selected transactions.
    pub merkle_root: String,
    /// Number of transactions in the merkle tree.
    pub transactions: usize,
    /// Header timestamp.
    pub timestamp: u32,
    /// Difficulty bits.
    pub bits: u32,
    /// Target as 64 hex characters.
    pub target: String,
    /// Difficulty as a number.
    pub difficulty: f64,
    /// Formatted difficulty string.
    pub difficulty_display: String,
}

impl TemplateInfo {
    /// Summarize a prepared job.
    pub fn from_job(job: &MiningJob, transactions: usize) -> Self {
        let header = job.header();
        // The job already validated the bits
        let difficulty = bits_to_difficulty(header.bits).unwrap_or(0.0);

        TemplateInfo {
            version: header.version,
            prev_hash: header.prev_block_hash.to_hex(),
            merkle_root: job.merkle_root().to_hex(),
            transactions,
            timestamp: header.timestamp,
            bits: header.bits,
            target: job.target().to_hex(),
            difficulty,
            difficulty_display: format_difficulty(difficulty),
        }
    }
}

/// Outcome of one `mine_batch` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchInfo {
    /// Whether the search has ended.
    pub done: bool,
    /// Progress after a batch that found nothing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<Progress>,
    /// Final result once `done` is set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<SearchReport>,
}

impl BatchInfo {
    pub fn running(progress: Progress) -> Self {
        BatchInfo {
            done: false,
            progress: Some(progress),
            result: None,
        }
    }

    pub fn done(report: SearchReport) -> Self {
        BatchInfo {
            done: true,
            progress: None,
            result: Some(report),
        }
    }
}

/// Convert any serializable value to a JS value.
pub fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value)
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {:?}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use miner_core::PreviousBlock;

    #[test]
    fn test_template_info_from_job() {
        let prev = "00".repeat(31) + "01";
        let previous = PreviousBlock::new(4, 0x1d00ffff, prev.clone());
        let txids = ["ab".repeat(32)];
        let job = MiningJob::new(&previous, &txids, 1_700_000_000).unwrap();

        let info = TemplateInfo::from_job(&job, txids.len());
        assert_eq!(info.prev_hash, prev);
        assert_eq!(info.merkle_root, "ab".repeat(32));
        assert_eq!(info.transactions, 1);
        assert_eq!(info.difficulty_display, "1.00");
        assert!(info.target.starts_with("00000000ffff"));
    }

    #[test]
    fn test_batch_info_shapes() {
        let report = SearchReport {
            success: false,
            nonce: None,
            hash: None,
            time: 1.0,
            hashrate: 5.0,
            iterations: 5,
        };
        let json = serde_json::to_value(BatchInfo::done(report)).unwrap();
        assert_eq!(json["done"], true);
        assert_eq!(json["result"]["iterations"], 5);
        assert!(json.get("progress").is_none());
    }
}
