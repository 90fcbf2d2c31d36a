//! Mining controller for the WASM miner.

use miner_core::search::DEFAULT_PROGRESS_INTERVAL;
use miner_core::{
    search, target_from_bits, BatchSearch, BatchStatus, Clock, Hash256, MiningJob, PreviousBlock,
    Progress, SearchConfig, SearchReport,
};
use wasm_bindgen::prelude::*;

use crate::api::parse_previous_block;
use crate::state::{to_js, BatchInfo, TemplateInfo};

/// Wall clock from `Date.now()`.
struct DateClock;

impl Clock for DateClock {
    fn now(&self) -> f64 {
        js_sys::Date::now() / 1000.0
    }
}

/// The main mining controller.
#[wasm_bindgen]
pub struct Miner {
    /// The block the header builds on.
    previous: PreviousBlock,
    /// Nonces between progress callbacks.
    progress_interval: u32,
    /// Outcome of the most recent search.
    last_report: Option<SearchReport>,
    /// Batched search in progress, if any.
    session: Option<BatchSearch>,
    /// Whether `mine_batch` may continue the session.
    is_mining: bool,
}

#[wasm_bindgen]
impl Miner {
    /// Create a new miner on top of the given block.
    ///
    /// # Arguments
    /// * `prev_hash` - Previous block hash in display order
    /// * `version` - Block version
    /// * `bits` - Compact difficulty bits
    #[wasm_bindgen(constructor)]
    pub fn new(prev_hash: &str, version: u32, bits: u32) -> Result<Miner, JsValue> {
        Self::with_previous(PreviousBlock::new(version, bits, prev_hash))
    }

    /// Create a miner from a block object returned by `BlockchainApi`.
    pub fn from_block(block: JsValue) -> Result<Miner, JsValue> {
        Self::with_previous(parse_previous_block(&block)?)
    }

    /// Set how many nonces pass between progress callbacks (0 disables them).
    #[wasm_bindgen(setter)]
    pub fn set_progress_interval(&mut self, interval: u32) {
        self.progress_interval = interval;
    }

    /// Nonces between progress callbacks.
    #[wasm_bindgen(getter)]
    pub fn progress_interval(&self) -> u32 {
        self.progress_interval
    }

    /// Compute the merkle root of the given transactions.
    pub fn merkle_root(&self, txids: Vec<String>) -> Result<String, JsValue> {
        miner_core::merkle_root(&txids)
            .map(|root| root.to_hex())
            .map_err(to_js_error)
    }

    /// Describe the header that `mine` would search.
    ///
    /// A `timestamp` of 0 uses the current time.
    pub fn template(&self, txids: Vec<String>, timestamp: u32) -> Result<JsValue, JsValue> {
        let job = self.job(&txids, timestamp)?;
        to_js(&TemplateInfo::from_job(&job, txids.len()))
    }

    /// Search nonces `0..=max_iterations` in one call and return the result
    /// object. This blocks the calling thread until the search ends; pages
    /// should use `start` and `mine_batch` instead.
    ///
    /// `on_progress` is called with a progress object at every checkpoint.
    /// Exceptions it throws are logged and otherwise ignored.
    pub fn mine(
        &mut self,
        txids: Vec<String>,
        max_iterations: u32,
        timestamp: u32,
        on_progress: Option<js_sys::Function>,
    ) -> Result<JsValue, JsValue> {
        let job = self.job(&txids, timestamp)?;
        let config = SearchConfig::default()
            .with_max_iterations(max_iterations)
            .with_progress_interval(self.progress_interval);

        let mut observer = |p: &Progress| {
            if let Some(callback) = &on_progress {
                notify(callback, p);
            }
        };
        let result = search(&job, &config, &DateClock, &mut observer);

        let report = result.report();
        let value = to_js(&report)?;
        self.last_report = Some(report);
        Ok(value)
    }

    /// Begin a batched search over nonces `0..=max_iterations`, replacing any
    /// earlier one. Returns the template object.
    pub fn start(
        &mut self,
        txids: Vec<String>,
        max_iterations: u32,
        timestamp: u32,
    ) -> Result<JsValue, JsValue> {
        let job = self.job(&txids, timestamp)?;
        let info = TemplateInfo::from_job(&job, txids.len());
        self.begin(job, max_iterations, &DateClock);
        to_js(&info)
    }

    /// Hash the next `batch_size` nonces of the running search.
    ///
    /// Returns `{done, progress?, result?}`. Call it from a timer or
    /// animation frame so the page stays responsive between batches.
    pub fn mine_batch(&mut self, batch_size: u32) -> Result<JsValue, JsValue> {
        let info = self
            .advance(batch_size, &DateClock)
            .ok_or_else(|| JsValue::from_str("Mining is not running"))?;
        to_js(&info)
    }

    /// Stop the batched search. Later `mine_batch` calls fail until `start`.
    pub fn stop(&mut self) {
        self.is_mining = false;
    }

    /// Whether a batched search is running.
    #[wasm_bindgen(getter)]
    pub fn is_mining(&self) -> bool {
        self.is_mining
    }

    /// Next nonce the batched search will hash.
    #[wasm_bindgen(getter)]
    pub fn current_nonce(&self) -> f64 {
        self.session
            .as_ref()
            .map_or(0.0, |session| session.next_nonce() as f64)
    }

    /// The most recent result as a JSON string.
    pub fn last_result_json(&self) -> Option<String> {
        self.last_report
            .as_ref()
            .and_then(|report| serde_json::to_string(report).ok())
    }

    /// Double-SHA256 digest of an 80-byte header given as hex, in display order.
    pub fn header_hash(header_hex: &str) -> Result<String, JsValue> {
        let bytes = hex::decode(header_hex)
            .map_err(|_| JsValue::from_str("Invalid header hex"))?;
        let header = miner_core::BlockHeader::from_bytes(&bytes).map_err(to_js_error)?;
        Ok(header.hash().to_display_hex())
    }
}

impl Miner {
    fn with_previous(previous: PreviousBlock) -> Result<Miner, JsValue> {
        // Reject bad input now rather than on the first search
        previous.parsed_hash().map_err(to_js_error)?;
        target_from_bits(previous.bits).map_err(to_js_error)?;

        Ok(Miner {
            previous,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            last_report: None,
            session: None,
            is_mining: false,
        })
    }

    fn begin<C: Clock + ?Sized>(&mut self, job: MiningJob, max_iterations: u32, clock: &C) {
        self.session = Some(BatchSearch::new(job, max_iterations, clock));
        self.is_mining = true;
    }

    fn advance<C: Clock + ?Sized>(&mut self, batch_size: u32, clock: &C) -> Option<BatchInfo> {
        if !self.is_mining {
            return None;
        }

        match self.session.as_mut()?.step(batch_size, clock) {
            BatchStatus::Running(progress) => Some(BatchInfo::running(progress)),
            BatchStatus::Done(result) => {
                self.is_mining = false;
                let report = result.report();
                self.last_report = Some(report.clone());
                Some(BatchInfo::done(report))
            }
        }
    }

    fn job(&self, txids: &[String], timestamp: u32) -> Result<MiningJob, JsValue> {
        let ts = if timestamp > 0 {
            timestamp
        } else {
            (js_sys::Date::now() / 1000.0) as u32
        };
        build_job(&self.previous, txids, ts).map_err(to_js_error)
    }
}

/// Build the job for a search; separated out so it runs without a JS host.
fn build_job(
    previous: &PreviousBlock,
    txids: &[String],
    timestamp: u32,
) -> miner_core::Result<MiningJob> {
    MiningJob::new(previous, txids, timestamp)
}

fn notify(callback: &js_sys::Function, progress: &Progress) {
    let outcome = to_js(progress).and_then(|value| callback.call1(&JsValue::NULL, &value));
    if let Err(err) = outcome {
        web_sys::console::warn_2(&JsValue::from_str("progress callback failed:"), &err);
    }
}

fn to_js_error(err: miner_core::MinerError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// Format a hashrate for display, e.g. "1.50 KH/s".
#[wasm_bindgen]
pub fn format_hashrate(hashrate: f64) -> String {
    miner_core::format_hashrate(hashrate)
}

/// Display form of a raw 32-byte hash given as hex.
#[wasm_bindgen]
pub fn display_hash(raw_hex: &str) -> Result<String, JsValue> {
    Hash256::from_hex(raw_hex)
        .map(|hash| hash.to_display_hex())
        .map_err(|e| JsValue::from_str(&e))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedClock;

    impl Clock for FixedClock {
        fn now(&self) -> f64 {
            1.0
        }
    }

    fn regtest_miner() -> (Miner, MiningJob) {
        let previous = PreviousBlock::new(1, 0x1f00ffff, "00".repeat(32));
        let job = build_job(&previous, &["77".repeat(32)], 1_700_000_000).unwrap();
        (Miner::with_previous(previous).unwrap(), job)
    }

    #[test]
    fn test_build_job_validates_txids() {
        let previous = PreviousBlock::new(1, 0x1d00ffff, "00".repeat(32));
        let txids = vec!["11".repeat(32), "bad".to_string()];

        let err = build_job(&previous, &txids, 1).unwrap_err();
        assert!(err.to_string().contains("index 1"));
    }

    #[test]
    fn test_build_job_sets_timestamp() {
        let previous = PreviousBlock::new(1, 0x1d00ffff, "00".repeat(32));
        let job = build_job(&previous, &[], 1_234).unwrap();
        assert_eq!(job.header().timestamp, 1_234);
    }

    #[test]
    fn test_batches_match_single_search() {
        let (mut miner, job) = regtest_miner();
        let config = SearchConfig::default().with_max_iterations(2_000_000);
        let expected = search(&job, &config, &FixedClock, &mut miner_core::NoProgress);
        assert!(expected.is_found());

        miner.begin(job, 2_000_000, &FixedClock);
        let mut batches = 0;
        let report = loop {
            let info = miner.advance(16, &FixedClock).unwrap();
            batches += 1;
            if let Some(report) = info.result {
                assert!(info.done);
                break report;
            }
            assert_eq!(info.progress.unwrap().nonce, batches * 16 - 1);
        };

        assert_eq!(report, expected.report());
        assert_eq!(miner.last_report, Some(report));
        assert!(!miner.is_mining());
        assert!(miner.advance(16, &FixedClock).is_none());
    }

    #[test]
    fn test_stop_ends_batches() {
        let (mut miner, job) = regtest_miner();
        assert!(miner.advance(10, &FixedClock).is_none());

        let job = MiningJob::with_target(*job.header(), miner_core::Target::ZERO);
        miner.begin(job, u32::MAX, &FixedClock);
        assert!(!miner.advance(10, &FixedClock).unwrap().done);
        assert_eq!(miner.current_nonce(), 10.0);

        miner.stop();
        assert!(!miner.is_mining());
        assert!(miner.advance(10, &FixedClock).is_none());
        assert_eq!(miner.current_nonce(), 10.0);
        assert!(miner.last_report.is_none());
    }
}
