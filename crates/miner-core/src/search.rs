//! The nonce search loop.
//!
//! A search runs in three steps:
//!
//! 1. [`MiningJob::new`] computes the merkle root, the header template and the
//!    target. Bad input fails here, before any hashing.
//! 2. [`search`] walks nonces upward from 0, patching the template and
//!    hashing each candidate, reporting [`Progress`] at a fixed cadence.
//! 3. The first header whose digest is below the target ends the search with
//!    [`SearchResult::Found`]. Running past the last nonce ends it with
//!    [`SearchResult::Exhausted`].

use alloc::string::String;
use core::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::block::{set_nonce, BlockHeader, BLOCK_HEADER_SIZE};
use crate::difficulty::{target_from_bits, Target};
use crate::error::Result;
use crate::hash::{double_sha256, Hash256};
use crate::merkle::merkle_root;
use crate::rate::{format_hashrate, hash_rate};
use crate::source::PreviousBlock;

/// Highest nonce tried by default: the whole 32-bit space.
pub const DEFAULT_MAX_ITERATIONS: u32 = u32::MAX;

/// Nonces between progress reports by default.
pub const DEFAULT_PROGRESS_INTERVAL: u32 = 100_000;

/// Nonces hashed between checks of a cancellation flag.
pub const CANCEL_CHECK_INTERVAL: u64 = 4_096;

/// A source of wall-clock time for elapsed time and hashrate.
pub trait Clock {
    /// Seconds since an arbitrary fixed origin.
    fn now(&self) -> f64;
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> f64 {
        (**self).now()
    }
}

/// Monotonic clock backed by [`std::time::Instant`].
#[cfg(feature = "std")]
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: std::time::Instant,
}

#[cfg(feature = "std")]
impl SystemClock {
    /// Start a clock at the current instant.
    pub fn new() -> Self {
        SystemClock {
            origin: std::time::Instant::now(),
        }
    }
}

#[cfg(feature = "std")]
impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "std")]
impl Clock for SystemClock {
    fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

/// A progress report, emitted every `progress_interval` nonces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    /// Last nonce hashed.
    pub nonce: u32,
    /// Nonces hashed so far in this range.
    pub hashes: u64,
    /// Seconds since the search started.
    pub elapsed: f64,
    /// Average hashrate since the search started.
    pub hashrate: f64,
    /// Hashrate over the interval since the previous report.
    pub interval_hashrate: f64,
    /// Display hex of the last digest computed.
    pub last_hash: String,
}

impl Progress {
    /// Leading 16 hex characters of the last digest, as logged.
    pub fn hash_prefix(&self) -> &str {
        self.last_hash.get(..16).unwrap_or(self.last_hash.as_str())
    }
}

/// Receives progress reports from a running search.
///
/// Observers only watch: nothing they do affects the search outcome.
pub trait ProgressObserver {
    /// Called at each progress checkpoint.
    fn on_progress(&mut self, progress: &Progress);
}

impl<F: FnMut(&Progress)> ProgressObserver for F {
    fn on_progress(&mut self, progress: &Progress) {
        self(progress)
    }
}

/// Observer that ignores all progress.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressObserver for NoProgress {
    fn on_progress(&mut self, _progress: &Progress) {}
}

/// Observer that logs each checkpoint through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogProgress;

impl ProgressObserver for LogProgress {
    fn on_progress(&mut self, p: &Progress) {
        info!(
            nonce = p.nonce,
            hash = %p.hash_prefix(),
            elapsed = p.elapsed,
            hashrate = %format_hashrate(p.hashrate),
            interval = %format_hashrate(p.interval_hashrate),
            "mining progress"
        );
    }
}

/// Terminal outcome of a search.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchResult {
    /// A header below the target was found.
    Found {
        /// The winning nonce.
        nonce: u32,
        /// Digest of the winning header, as produced by the hasher.
        hash: Hash256,
        /// Seconds spent searching.
        elapsed: f64,
        /// Average hashes per second.
        hashrate: f64,
        /// Nonces tried before the winner.
        iterations: u32,
    },
    /// Every nonce up to the limit was tried without success.
    Exhausted {
        /// The nonce limit that was reached.
        iterations: u32,
        /// Seconds spent searching.
        elapsed: f64,
        /// Average hashes per second.
        hashrate: f64,
    },
}

impl SearchResult {
    /// Whether a solution was found.
    pub fn is_found(&self) -> bool {
        matches!(self, SearchResult::Found { .. })
    }

    /// Iteration count as reported for this outcome.
    pub fn iterations(&self) -> u32 {
        match self {
            SearchResult::Found { iterations, .. } | SearchResult::Exhausted { iterations, .. } => {
                *iterations
            }
        }
    }

    /// Seconds spent searching.
    pub fn elapsed(&self) -> f64 {
        match self {
            SearchResult::Found { elapsed, .. } | SearchResult::Exhausted { elapsed, .. } => *elapsed,
        }
    }

    /// Average hashrate over the search.
    pub fn hashrate(&self) -> f64 {
        match self {
            SearchResult::Found { hashrate, .. } | SearchResult::Exhausted { hashrate, .. } => {
                *hashrate
            }
        }
    }

    /// Display hex of the winning block hash, if any.
    pub fn display_hash(&self) -> Option<String> {
        match self {
            SearchResult::Found { hash, .. } => Some(hash.to_display_hex()),
            SearchResult::Exhausted { .. } => None,
        }
    }

    /// The serializable form of this result.
    pub fn report(&self) -> SearchReport {
        SearchReport::from(self)
    }
}

/// Flat, serializable view of a [`SearchResult`].
///
/// Failures carry only `iterations`, `time` and `hashrate`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchReport {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    pub time: f64,
    pub hashrate: f64,
    pub iterations: u32,
}

impl From<&SearchResult> for SearchReport {
    fn from(result: &SearchResult) -> Self {
        match result {
            SearchResult::Found {
                nonce,
                hash,
                elapsed,
                hashrate,
                iterations,
            } => SearchReport {
                success: true,
                nonce: Some(*nonce),
                hash: Some(hash.to_display_hex()),
                time: *elapsed,
                hashrate: *hashrate,
                iterations: *iterations,
            },
            SearchResult::Exhausted {
                iterations,
                elapsed,
                hashrate,
            } => SearchReport {
                success: false,
                nonce: None,
                hash: None,
                time: *elapsed,
                hashrate: *hashrate,
                iterations: *iterations,
            },
        }
    }
}

/// Search limits and reporting cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchConfig {
    /// Highest nonce to try, inclusive.
    pub max_iterations: u32,
    /// Nonces between progress reports. Zero disables reporting.
    pub progress_interval: u32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }
}

impl SearchConfig {
    /// Set the highest nonce to try.
    pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Set the progress cadence.
    pub fn with_progress_interval(mut self, progress_interval: u32) -> Self {
        self.progress_interval = progress_interval;
        self
    }
}

/// Everything fixed for the duration of a search.
#[derive(Debug, Clone)]
pub struct MiningJob {
    header: BlockHeader,
    template: [u8; BLOCK_HEADER_SIZE],
    target: Target,
}

impl MiningJob {
    /// Prepare a job from the previous block and the transactions to include.
    ///
    /// Transaction ids are checked first, then the previous block hash, then
    /// the difficulty bits.
    pub fn new<S: AsRef<str>>(
        previous: &PreviousBlock,
        txids: &[S],
        timestamp: u32,
    ) -> Result<Self> {
        let root = merkle_root(txids)?;
        let prev_hash = previous.parsed_hash()?;
        let header = BlockHeader::new(previous.version, prev_hash, root, timestamp, previous.bits);

        debug!(
            transactions = txids.len(),
            merkle_root = %root,
            prev_hash = %previous.hash,
            "built header template"
        );

        Self::from_header(header)
    }

    /// Prepare a job for an existing header, deriving the target from its bits.
    pub fn from_header(header: BlockHeader) -> Result<Self> {
        let target = target_from_bits(header.bits)?;
        debug!(bits = header.bits, target = %target, "derived target");
        Ok(Self::with_target(header, target))
    }

    /// Prepare a job with an explicit target, ignoring the header's bits.
    pub fn with_target(mut header: BlockHeader, target: Target) -> Self {
        header.nonce = 0;
        MiningJob {
            header,
            template: header.serialize(),
            target,
        }
    }

    /// The header template (nonce 0).
    pub fn header(&self) -> &BlockHeader {
        &self.header
    }

    /// The target digests must beat.
    pub fn target(&self) -> &Target {
        &self.target
    }

    /// The merkle root in the header.
    pub fn merkle_root(&self) -> Hash256 {
        self.header.merkle_root
    }

    /// The serialized template (nonce 0).
    pub fn template(&self) -> &[u8; BLOCK_HEADER_SIZE] {
        &self.template
    }

    /// Digest of the header with the given nonce.
    pub fn hash_nonce(&self, nonce: u32) -> Hash256 {
        let mut header = self.template;
        set_nonce(&mut header, nonce);
        double_sha256(&header)
    }
}

/// An inclusive range of nonces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NonceRange {
    pub start: u32,
    pub end: u32,
}

impl NonceRange {
    /// Nonces `start..=end`.
    pub fn new(start: u32, end: u32) -> Self {
        debug_assert!(start <= end);
        NonceRange { start, end }
    }

    /// Number of nonces in the range.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> u64 {
        self.end as u64 - self.start as u64 + 1
    }
}

/// How a scan over one range ended.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ScanOutcome {
    /// `hashes` counts every digest computed, the winner included.
    Found { nonce: u32, hash: Hash256, hashes: u64 },
    Exhausted { hashes: u64 },
    Cancelled { hashes: u64 },
}

/// Hash every nonce in `range` until one meets the target.
///
/// When `cancel` is given it is checked once per batch of
/// [`CANCEL_CHECK_INTERVAL`] nonces.
pub(crate) fn scan_range<C, O>(
    job: &MiningJob,
    range: NonceRange,
    progress_interval: u32,
    clock: &C,
    started: f64,
    observer: &mut O,
    cancel: Option<&AtomicBool>,
) -> ScanOutcome
where
    C: Clock + ?Sized,
    O: ProgressObserver + ?Sized,
{
    let mut header = job.template;
    let start = range.start as u64;
    let end = range.end as u64;
    let interval = progress_interval as u64;
    let mut last_checkpoint = started;
    let mut nonce = start;

    while nonce <= end {
        if cancel.is_some_and(|flag| flag.load(Ordering::Relaxed)) {
            return ScanOutcome::Cancelled {
                hashes: nonce - start,
            };
        }

        let batch_end = end.min(nonce + CANCEL_CHECK_INTERVAL - 1);
        while nonce <= batch_end {
            set_nonce(&mut header, nonce as u32);
            let hash = double_sha256(&header);

            if job.target.is_met_by(&hash) {
                return ScanOutcome::Found {
                    nonce: nonce as u32,
                    hash,
                    hashes: nonce - start + 1,
                };
            }

            nonce += 1;
            let tried = nonce - start;

            if interval > 0 && tried % interval == 0 {
                let now = clock.now();
                let elapsed = now - started;
                observer.on_progress(&Progress {
                    nonce: (nonce - 1) as u32,
                    hashes: tried,
                    elapsed,
                    hashrate: hash_rate(tried, elapsed),
                    interval_hashrate: hash_rate(interval, now - last_checkpoint),
                    last_hash: hash.to_display_hex(),
                });
                last_checkpoint = now;
            }
        }
    }

    ScanOutcome::Exhausted {
        hashes: end - start + 1,
    }
}

/// Run a single-threaded search over nonces `0..=config.max_iterations`.
pub fn search<C, O>(job: &MiningJob, config: &SearchConfig, clock: &C, observer: &mut O) -> SearchResult
where
    C: Clock + ?Sized,
    O: ProgressObserver + ?Sized,
{
    let max_iterations = config.max_iterations;
    info!(
        max_iterations,
        target = %job.target,
        "starting nonce search"
    );

    let started = clock.now();
    let outcome = scan_range(
        job,
        NonceRange::new(0, max_iterations),
        config.progress_interval,
        clock,
        started,
        observer,
        None,
    );
    let elapsed = clock.now() - started;

    let result = match outcome {
        ScanOutcome::Found { nonce, hash, .. } => SearchResult::Found {
            nonce,
            hash,
            elapsed,
            hashrate: hash_rate(nonce as u64, elapsed),
            iterations: nonce,
        },
        ScanOutcome::Exhausted { .. } | ScanOutcome::Cancelled { .. } => SearchResult::Exhausted {
            iterations: max_iterations,
            elapsed,
            hashrate: hash_rate(max_iterations as u64, elapsed),
        },
    };

    log_result(&result);
    result
}

/// State after one step of a [`BatchSearch`].
#[derive(Debug, Clone, PartialEq)]
pub enum BatchStatus {
    /// The batch finished without a solution; more nonces remain.
    Running(Progress),
    /// The search ended. Further steps return the same result.
    Done(SearchResult),
}

/// A search over `0..=max_iterations` driven in caller-sized batches.
///
/// Hosts that must yield between chunks of work (a browser event loop, a
/// cancellable task) call [`BatchSearch::step`] repeatedly and simply stop
/// calling it to abandon the search. Consecutive batches visit nonces in the
/// same order as [`search`] and end with the same result.
#[derive(Debug, Clone)]
pub struct BatchSearch {
    job: MiningJob,
    max_iterations: u32,
    next_nonce: u64,
    hashes: u64,
    started: f64,
    last_checkpoint: f64,
    result: Option<SearchResult>,
}

impl BatchSearch {
    /// Start a batched search; the clock reading now is time zero.
    pub fn new<C: Clock + ?Sized>(job: MiningJob, max_iterations: u32, clock: &C) -> Self {
        info!(
            max_iterations,
            target = %job.target,
            "starting batched nonce search"
        );

        let started = clock.now();
        BatchSearch {
            job,
            max_iterations,
            next_nonce: 0,
            hashes: 0,
            started,
            last_checkpoint: started,
            result: None,
        }
    }

    /// The job being searched.
    pub fn job(&self) -> &MiningJob {
        &self.job
    }

    /// Next nonce to be hashed.
    pub fn next_nonce(&self) -> u64 {
        self.next_nonce
    }

    /// Nonces hashed so far.
    pub fn hashes(&self) -> u64 {
        self.hashes
    }

    /// The final result, once the search has ended.
    pub fn result(&self) -> Option<&SearchResult> {
        self.result.as_ref()
    }

    pub fn is_done(&self) -> bool {
        self.result.is_some()
    }

    /// Hash up to `batch_size` more nonces (at least one).
    pub fn step<C: Clock + ?Sized>(&mut self, batch_size: u32, clock: &C) -> BatchStatus {
        if let Some(result) = &self.result {
            return BatchStatus::Done(result.clone());
        }

        let start = self.next_nonce;
        let end = (start + batch_size.max(1) as u64 - 1).min(self.max_iterations as u64);
        let range = NonceRange::new(start as u32, end as u32);

        let outcome = scan_range(
            &self.job,
            range,
            0,
            clock,
            self.started,
            &mut NoProgress,
            None,
        );
        let now = clock.now();
        let elapsed = now - self.started;

        let result = match outcome {
            ScanOutcome::Found { nonce, hash, hashes } => {
                self.hashes += hashes;
                SearchResult::Found {
                    nonce,
                    hash,
                    elapsed,
                    hashrate: hash_rate(nonce as u64, elapsed),
                    iterations: nonce,
                }
            }
            ScanOutcome::Exhausted { hashes } | ScanOutcome::Cancelled { hashes } => {
                self.hashes += hashes;
                self.next_nonce = end + 1;

                if end < self.max_iterations as u64 {
                    let progress = Progress {
                        nonce: end as u32,
                        hashes: self.hashes,
                        elapsed,
                        hashrate: hash_rate(self.hashes, elapsed),
                        interval_hashrate: hash_rate(hashes, now - self.last_checkpoint),
                        last_hash: self.job.hash_nonce(end as u32).to_display_hex(),
                    };
                    self.last_checkpoint = now;
                    return BatchStatus::Running(progress);
                }

                SearchResult::Exhausted {
                    iterations: self.max_iterations,
                    elapsed,
                    hashrate: hash_rate(self.max_iterations as u64, elapsed),
                }
            }
        };

        log_result(&result);
        self.result = Some(result.clone());
        BatchStatus::Done(result)
    }
}

pub(crate) fn log_result(result: &SearchResult) {
    match result {
        SearchResult::Found {
            nonce,
            hash,
            elapsed,
            hashrate,
            ..
        } => info!(
            nonce,
            hash = %hash.to_display_hex(),
            elapsed,
            hashrate = %format_hashrate(*hashrate),
            "block header solved"
        ),
        SearchResult::Exhausted {
            iterations,
            elapsed,
            hashrate,
        } => info!(
            iterations,
            elapsed,
            hashrate = %format_hashrate(*hashrate),
            "nonce space exhausted"
        ),
    }
}

/// Fetch the previous block, build a job stamped with the current time, and
/// search it to completion, logging progress.
#[cfg(feature = "std")]
pub fn mine<B, S>(source: &B, txids: &[S], max_iterations: u32) -> Result<SearchResult>
where
    B: crate::source::BlockSource,
    B::Error: Into<crate::error::MinerError>,
    S: AsRef<str>,
{
    let previous = source.previous_block().map_err(Into::into)?;
    let job = MiningJob::new(&previous, txids, crate::block::current_timestamp())?;
    let config = SearchConfig::default().with_max_iterations(max_iterations);
    Ok(search(&job, &config, &SystemClock::new(), &mut LogProgress))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MinerError;
    use alloc::vec;
    use alloc::vec::Vec;
    use core::cell::Cell;

    const PREV: &str = "000000000000000000024bead8df69990852c202db0e0097c1a12ea637d7e96d";

    /// Clock that never advances.
    struct FrozenClock;

    impl Clock for FrozenClock {
        fn now(&self) -> f64 {
            42.0
        }
    }

    /// Clock that advances one second per reading.
    struct TickClock(Cell<f64>);

    impl Clock for TickClock {
        fn now(&self) -> f64 {
            let t = self.0.get();
            self.0.set(t + 1.0);
            t
        }
    }

    fn job_with_target(target: Target) -> MiningJob {
        let previous = PreviousBlock::new(0x2000_0000, 0x1d00ffff, PREV);
        let txids = [hex::encode([0x11u8; 32]), hex::encode([0x22u8; 32])];
        let job = MiningJob::new(&previous, &txids, 1_700_000_000).unwrap();
        MiningJob::with_target(*job.header(), target)
    }

    fn config(max_iterations: u32) -> SearchConfig {
        SearchConfig::default().with_max_iterations(max_iterations)
    }

    #[test]
    fn test_job_rejects_bad_txid_before_bits() {
        // Both inputs are bad; the txid is reported
        let previous = PreviousBlock::new(1, 0x01000000, PREV);
        let err = MiningJob::new(&previous, &["nope"], 0).unwrap_err();
        assert!(matches!(err, MinerError::MalformedTransactionId { index: 0, .. }));
    }

    #[test]
    fn test_job_rejects_bad_bits() {
        let previous = PreviousBlock::new(1, 0x02ffffff, PREV);
        let txids: [&str; 0] = [];
        let err = MiningJob::new(&previous, &txids, 0).unwrap_err();
        assert!(matches!(err, MinerError::InvalidDifficultyBits { .. }));
    }

    #[test]
    fn test_job_template_matches_header() {
        let job = job_with_target(Target::ZERO);
        assert_eq!(job.template(), &job.header().serialize());
        assert_eq!(job.header().nonce, 0);

        let mut header = *job.header();
        header.nonce = 9;
        assert_eq!(job.hash_nonce(9), header.hash());
    }

    #[test]
    fn test_immediate_success_at_nonce_zero() {
        let job = job_with_target(Target::MAX);
        let result = search(&job, &config(1_000), &FrozenClock, &mut NoProgress);

        match result {
            SearchResult::Found {
                nonce,
                hash,
                iterations,
                hashrate,
                elapsed,
            } => {
                assert_eq!(nonce, 0);
                assert_eq!(iterations, 0);
                assert_eq!(hash, job.hash_nonce(0));
                assert_eq!(elapsed, 0.0);
                assert_eq!(hashrate, 0.0);
            }
            other => panic!("expected Found, got {:?}", other),
        }
    }

    #[test]
    fn test_zero_width_search_space() {
        let job = job_with_target(Target::ZERO);
        let result = search(&job, &config(0), &FrozenClock, &mut NoProgress);

        assert_eq!(
            result,
            SearchResult::Exhausted {
                iterations: 0,
                elapsed: 0.0,
                hashrate: 0.0,
            }
        );
    }

    #[test]
    fn test_finds_first_nonce_below_target() {
        let probe = job_with_target(Target::ZERO);
        let max = 200u32;

        // Use the digest of nonce 150 as the target; the search must stop at
        // the first nonce whose digest is strictly smaller.
        let target = Target::from_be_bytes(probe.hash_nonce(150).to_bytes());
        let expected = (0..=max).find(|n| target.is_met_by(&probe.hash_nonce(*n)));

        let job = MiningJob::with_target(*probe.header(), target);
        let result = search(&job, &config(max), &FrozenClock, &mut NoProgress);

        match expected {
            Some(nonce) => {
                assert!(result.is_found());
                assert_eq!(result.iterations(), nonce);
                let expected_hash = probe.hash_nonce(nonce).to_display_hex();
                assert_eq!(result.display_hash(), Some(expected_hash));
            }
            None => assert!(!result.is_found()),
        }
    }

    #[test]
    fn test_found_hash_meets_target() {
        // Regtest-style bits: roughly half of all digests qualify
        let previous = PreviousBlock::new(0x2000_0000, 0x207fffff, PREV);
        let txids = [hex::encode([0x33u8; 32])];
        let job = MiningJob::new(&previous, &txids, 1_700_000_000).unwrap();

        let result = search(&job, &config(1_000), &FrozenClock, &mut NoProgress);
        let SearchResult::Found { nonce, hash, .. } = result else {
            panic!("expected a solution within 1000 nonces");
        };

        assert!(job.target().is_met_by(&hash));
        assert_eq!(hash, job.hash_nonce(nonce));
    }

    #[test]
    fn test_progress_cadence_and_rates() {
        let job = job_with_target(Target::ZERO);
        let clock = TickClock(Cell::new(0.0));
        let mut events: Vec<Progress> = Vec::new();
        let mut record = |p: &Progress| events.push(p.clone());

        let cfg = config(99).with_progress_interval(10);
        let result = search(&job, &cfg, &clock, &mut record);

        // 100 nonces hashed, one report per 10
        assert_eq!(events.len(), 10);
        assert_eq!(events[0].nonce, 9);
        assert_eq!(events[0].hashes, 10);
        assert_eq!(events[9].hashes, 100);

        // Start reads t=0, each checkpoint reads the next tick
        assert_eq!(events[0].elapsed, 1.0);
        assert_eq!(events[0].hashrate, 10.0);
        assert_eq!(events[0].interval_hashrate, 10.0);
        assert_eq!(events[4].elapsed, 5.0);
        assert_eq!(events[4].hashrate, 10.0);
        assert_eq!(events[0].last_hash, job.hash_nonce(9).to_display_hex());

        // Reports are not counted as iterations
        assert_eq!(result.iterations(), 99);
        assert_eq!(result.elapsed(), 11.0);
        assert_eq!(result.hashrate(), 9.0);
    }

    #[test]
    fn test_progress_hash_prefix() {
        let mut progress = Progress {
            nonce: 0,
            hashes: 1,
            elapsed: 0.0,
            hashrate: 0.0,
            interval_hashrate: 0.0,
            last_hash: "00000000ab".repeat(7),
        };
        assert_eq!(progress.hash_prefix(), "00000000ab000000");

        progress.last_hash = "abc".into();
        assert_eq!(progress.hash_prefix(), "abc");
    }

    #[test]
    fn test_progress_disabled() {
        let job = job_with_target(Target::ZERO);
        let mut count = 0;
        let mut observer = |_: &Progress| count += 1;

        search(&job, &config(50).with_progress_interval(0), &FrozenClock, &mut observer);
        assert_eq!(count, 0);
    }

    #[test]
    fn test_search_is_deterministic() {
        let job = job_with_target(Target::from_be_bytes({
            let mut t = [0u8; 32];
            t[0] = 0x08;
            t
        }));

        let first = search(&job, &config(5_000), &FrozenClock, &mut NoProgress);
        let second = search(&job, &config(5_000), &FrozenClock, &mut NoProgress);
        assert_eq!(first, second);
    }

    fn run_batches(job: &MiningJob, max: u32, batch_size: u32) -> (Vec<Progress>, SearchResult) {
        let mut batches = BatchSearch::new(job.clone(), max, &FrozenClock);
        let mut events = Vec::new();
        loop {
            match batches.step(batch_size, &FrozenClock) {
                BatchStatus::Running(p) => events.push(p),
                BatchStatus::Done(result) => return (events, result),
            }
        }
    }

    #[test]
    fn test_batches_reach_same_solution() {
        let job = job_with_target(Target::from_be_bytes({
            let mut t = [0u8; 32];
            t[0] = 0x02;
            t
        }));
        let sequential = search(&job, &config(50_000), &FrozenClock, &mut NoProgress);
        assert!(sequential.is_found());

        for batch_size in [1, 7, 4_096, 100_000] {
            let (_, batched) = run_batches(&job, 50_000, batch_size);
            assert_eq!(batched, sequential, "batch size {}", batch_size);
        }
    }

    #[test]
    fn test_batches_exhaust_like_search() {
        let job = job_with_target(Target::ZERO);
        let (events, result) = run_batches(&job, 99, 30);

        let nonces: Vec<u32> = events.iter().map(|p| p.nonce).collect();
        assert_eq!(nonces, vec![29, 59, 89]);
        assert_eq!(events[2].hashes, 90);
        assert_eq!(events[0].last_hash, job.hash_nonce(29).to_display_hex());

        let sequential = search(&job, &config(99), &FrozenClock, &mut NoProgress);
        assert_eq!(result, sequential);
        assert_eq!(result.iterations(), 99);
    }

    #[test]
    fn test_finished_batches_stay_finished() {
        let job = job_with_target(Target::MAX);
        let mut batches = BatchSearch::new(job, 1_000, &FrozenClock);

        let first = batches.step(0, &FrozenClock);
        assert!(matches!(first, BatchStatus::Done(SearchResult::Found { nonce: 0, .. })));
        assert!(batches.is_done());
        assert_eq!(batches.hashes(), 1);
        assert_eq!(batches.step(10, &FrozenClock), first);
    }

    #[test]
    fn test_scan_honours_cancellation() {
        let job = job_with_target(Target::ZERO);
        let cancel = AtomicBool::new(true);

        let outcome = scan_range(
            &job,
            NonceRange::new(0, 100_000),
            0,
            &FrozenClock,
            0.0,
            &mut NoProgress,
            Some(&cancel),
        );
        assert_eq!(outcome, ScanOutcome::Cancelled { hashes: 0 });
    }

    #[test]
    fn test_scan_at_top_of_nonce_space() {
        let job = job_with_target(Target::ZERO);
        let outcome = scan_range(
            &job,
            NonceRange::new(u32::MAX - 2, u32::MAX),
            0,
            &FrozenClock,
            0.0,
            &mut NoProgress,
            None,
        );
        assert_eq!(outcome, ScanOutcome::Exhausted { hashes: 3 });
    }

    #[test]
    fn test_report_shapes() {
        let found = SearchResult::Found {
            nonce: 7,
            hash: Hash256::new([0xaa; 32]),
            elapsed: 2.0,
            hashrate: 3.5,
            iterations: 7,
        };
        let json = serde_json::to_value(found.report()).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["nonce"], 7);
        assert_eq!(json["hash"], "aa".repeat(32));
        assert_eq!(json["iterations"], 7);

        let exhausted = SearchResult::Exhausted {
            iterations: 10,
            elapsed: 1.0,
            hashrate: 10.0,
        };
        let json = serde_json::to_value(exhausted.report()).unwrap();
        assert_eq!(json["success"], false);
        assert!(json.get("nonce").is_none());
        assert!(json.get("hash").is_none());
        assert_eq!(json["time"], 1.0);
    }

    #[cfg(feature = "std")]
    #[test]
    fn test_mine_with_fixed_record() {
        let previous = PreviousBlock::new(0x2000_0000, 0x207fffff, PREV);
        let txids = [hex::encode([0x44u8; 32])];

        let result = mine(&previous, &txids, 1_000).unwrap();
        assert!(result.is_found());
    }
}
