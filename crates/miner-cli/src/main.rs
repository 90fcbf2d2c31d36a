//! Header Miner
//!
//! Builds a block header over the given transactions and searches its nonce
//! space for a hash below the network target.

mod config;
mod input;
mod logging;
mod report;

use anyhow::{Context, Result};
use clap::Parser;
use miner_core::difficulty::{bits_to_difficulty, format_difficulty};
use miner_core::{
    format_hashrate, mine_parallel, search, BlockSource, LogProgress, MiningJob, Progress,
    SystemClock,
};
use tracing::info;

use crate::config::{Args, Config};

fn main() -> Result<()> {
    let args = Args::parse();
    logging::init_logging(&args.log_level, args.log_format);

    let config = Config::from_args(args)?;
    let previous = config.block.previous_block()?;

    info!(
        "Starting header-miner v{} with {} transaction(s)",
        env!("CARGO_PKG_VERSION"),
        config.txids.len()
    );

    let job = MiningJob::new(&previous, &config.txids, config.timestamp)
        .context("preparing mining job")?;

    let difficulty = bits_to_difficulty(previous.bits)?;
    info!(
        merkle_root = %job.merkle_root(),
        target = %job.target(),
        bits = %format!("{:#010x}", previous.bits),
        difficulty = %format_difficulty(difficulty),
        max_iterations = config.search.max_iterations,
        workers = config.workers,
        "Header template ready"
    );

    let clock = SystemClock::new();
    let result = if config.workers > 1 {
        let observer = |worker: usize, p: &Progress| {
            info!(
                worker,
                nonce = p.nonce,
                hash = %p.hash_prefix(),
                elapsed = p.elapsed,
                hashrate = %format_hashrate(p.hashrate),
                interval = %format_hashrate(p.interval_hashrate),
                "mining progress"
            );
        };
        mine_parallel(&job, &config.search, config.workers, &clock, &observer)
    } else {
        search(&job, &config.search, &clock, &mut LogProgress)
    };

    if config.json {
        println!("{}", serde_json::to_string(&result.report())?);
    } else {
        print!("{}", report::summary(&result));
    }

    Ok(())
}
