//! Multi-threaded nonce search.
//!
//! The nonce space is cut into disjoint contiguous ranges, one per worker
//! thread. Workers share the job read-only and a single cancellation flag.
//! The first worker to report a solution raises the flag; the others notice
//! it at their next batch boundary and stop.

use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, info};

use crate::rate::hash_rate;
use crate::search::{
    log_result, scan_range, search, Clock, MiningJob, NonceRange, Progress, ScanOutcome,
    SearchConfig, SearchResult,
};

/// Split `0..=max_iterations` into at most `workers` contiguous ranges.
///
/// Earlier ranges take the remainder, so sizes differ by at most one.
pub fn partition(max_iterations: u32, workers: usize) -> Vec<NonceRange> {
    let total = max_iterations as u64 + 1;
    let workers = (workers.max(1) as u64).min(total);
    let base = total / workers;
    let extra = total % workers;

    let mut ranges = Vec::with_capacity(workers as usize);
    let mut start = 0u64;
    for i in 0..workers {
        let len = base + u64::from(i < extra);
        let end = start + len - 1;
        ranges.push(NonceRange::new(start as u32, end as u32));
        start = end + 1;
    }
    ranges
}

/// Search `0..=config.max_iterations` on `workers` threads.
///
/// One worker (or zero) runs the plain sequential search. The observer
/// receives the reporting worker's index with each event.
///
/// A `Found` reports the total hashes computed across workers before the
/// winner as its iterations; an `Exhausted` reports `max_iterations`, the
/// same as the sequential search.
pub fn mine_parallel<C, O>(
    job: &MiningJob,
    config: &SearchConfig,
    workers: usize,
    clock: &C,
    observer: &O,
) -> SearchResult
where
    C: Clock + Sync + ?Sized,
    O: Fn(usize, &Progress) + Sync + ?Sized,
{
    let ranges = partition(config.max_iterations, workers);
    if ranges.len() == 1 {
        let mut single = |p: &Progress| observer(0, p);
        return search(job, config, clock, &mut single);
    }

    info!(
        workers = ranges.len(),
        max_iterations = config.max_iterations,
        target = %job.target(),
        "starting parallel nonce search"
    );

    let cancel = AtomicBool::new(false);
    let started = clock.now();

    let outcomes: Vec<(ScanOutcome, bool)> = std::thread::scope(|scope| {
        let handles: Vec<_> = ranges
            .iter()
            .enumerate()
            .map(|(index, &range)| {
                let cancel = &cancel;
                scope.spawn(move || {
                    debug!(worker = index, start = range.start, end = range.end, "worker started");
                    let mut forward = |p: &Progress| observer(index, p);
                    let outcome = scan_range(
                        job,
                        range,
                        config.progress_interval,
                        clock,
                        started,
                        &mut forward,
                        Some(cancel),
                    );

                    // Only the first finder wins; later finders are just hashes
                    let won = matches!(outcome, ScanOutcome::Found { .. })
                        && cancel
                            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                            .is_ok();
                    debug!(worker = index, won, "worker finished");
                    (outcome, won)
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|handle| {
                handle
                    .join()
                    .unwrap_or_else(|panic| std::panic::resume_unwind(panic))
            })
            .collect()
    });

    let elapsed = clock.now() - started;
    let total_hashes: u64 = outcomes
        .iter()
        .map(|(outcome, _)| match outcome {
            ScanOutcome::Found { hashes, .. }
            | ScanOutcome::Exhausted { hashes }
            | ScanOutcome::Cancelled { hashes } => *hashes,
        })
        .sum();

    let winner = outcomes.iter().find_map(|(outcome, won)| match outcome {
        ScanOutcome::Found { nonce, hash, .. } if *won => Some((*nonce, *hash)),
        _ => None,
    });

    let result = match winner {
        Some((nonce, hash)) => {
            let iterations = (total_hashes - 1).min(u32::MAX as u64);
            SearchResult::Found {
                nonce,
                hash,
                elapsed,
                hashrate: hash_rate(iterations, elapsed),
                iterations: iterations as u32,
            }
        }
        None => SearchResult::Exhausted {
            iterations: config.max_iterations,
            elapsed,
            hashrate: hash_rate(config.max_iterations as u64, elapsed),
        },
    };

    log_result(&result);
    result
}
