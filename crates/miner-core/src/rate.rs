//! Hashrate arithmetic and formatting.

use alloc::format;
use alloc::string::String;

const UNITS: [&str; 7] = ["H/s", "KH/s", "MH/s", "GH/s", "TH/s", "PH/s", "EH/s"];

/// Hashes per second, or 0 when no time has elapsed.
#[inline]
pub fn hash_rate(hashes: u64, elapsed_secs: f64) -> f64 {
    if elapsed_secs > 0.0 {
        hashes as f64 / elapsed_secs
    } else {
        0.0
    }
}

/// Format hash rate for display.
pub fn format_hashrate(hashrate: f64) -> String {
    if hashrate == 0.0 {
        return String::from("0 H/s");
    }

    let mut value = hashrate;
    let mut unit = 0;
    while value >= 1000.0 && unit < UNITS.len() - 1 {
        value /= 1000.0;
        unit += 1;
    }

    format!("{:.2} {}", value, UNITS[unit])
}
