//! Difficulty target conversion and comparison.

use alloc::string::String;
use core::fmt;

use crate::error::{MinerError, Result};
use crate::hash::Hash256;

/// Compact bits of the difficulty-1 target.
pub const DIFFICULTY_ONE_BITS: u32 = 0x1d00ffff;

/// A 256-bit target, stored as 32 big-endian bytes.
///
/// Derived bytewise ordering matches numeric ordering.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Target([u8; 32]);

impl Target {
    /// The zero target. No digest is below it.
    pub const ZERO: Target = Target([0u8; 32]);

    /// The largest possible target. Every digest except all-ones is below it.
    pub const MAX: Target = Target([0xff; 32]);

    /// Build from 32 big-endian bytes.
    pub const fn from_be_bytes(bytes: [u8; 32]) -> Self {
        Target(bytes)
    }

    /// Big-endian bytes of the target.
    pub fn to_be_bytes(&self) -> [u8; 32] {
        self.0
    }

    /// Check if a digest meets this target.
    ///
    /// The digest is read as a big-endian 256-bit integer, in the byte order
    /// the hasher produced it, and must be strictly less than the target.
    #[inline]
    pub fn is_met_by(&self, hash: &Hash256) -> bool {
        hash_meets_target(hash.as_bytes(), &self.0)
    }

    /// Hex of the 32 big-endian bytes.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Target({})", self.to_hex())
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Convert compact "bits" representation to a 256-bit target.
///
/// The bits format is: [exponent (1 byte)][mantissa (3 bytes)]
/// Target = mantissa * 256^(exponent - 3)
///
/// All 24 mantissa bits are used as a magnitude. Exponents below 3 would
/// need a negative shift and are rejected, as is any encoding whose value
/// does not fit in 256 bits.
pub fn target_from_bits(bits: u32) -> Result<Target> {
    let exponent = bits >> 24;
    let mantissa = bits & 0x00ff_ffff;

    if exponent < 3 {
        return Err(MinerError::InvalidDifficultyBits {
            bits,
            reason: "exponent below 3 gives a fractional target",
        });
    }

    // Byte shift of the mantissa's least significant byte
    let shift = (exponent - 3) as usize;
    let mut target = [0u8; 32];

    for k in 0..3 {
        let byte = ((mantissa >> (8 * k)) & 0xff) as u8;
        let pos = shift + k;
        if pos < 32 {
            target[31 - pos] = byte;
        } else if byte != 0 {
            return Err(MinerError::InvalidDifficultyBits {
                bits,
                reason: "target exceeds 256 bits",
            });
        }
    }

    Ok(Target(target))
}

/// Check if a hash is below a target (valid proof of work).
///
/// Both are treated as 256-bit big-endian numbers.
/// The hash must be strictly less than the target.
#[inline]
pub fn hash_meets_target(hash: &[u8; 32], target: &[u8; 32]) -> bool {
    // Lexicographic order on equal-length arrays is big-endian numeric order
    hash < target
}

/// Calculate approximate difficulty from bits.
///
/// Difficulty = difficulty_one_target / current_target
pub fn bits_to_difficulty(bits: u32) -> Result<f64> {
    let current = target_to_f64(&target_from_bits(bits)?);
    let genesis = target_to_f64(&target_from_bits(DIFFICULTY_ONE_BITS)?);

    if current == 0.0 {
        return Ok(f64::INFINITY);
    }

    Ok(genesis / current)
}

/// Convert a 256-bit target to an approximate f64 value.
fn target_to_f64(target: &Target) -> f64 {
    target
        .0
        .iter()
        .fold(0.0f64, |acc, &byte| acc * 256.0 + byte as f64)
}

/// Format difficulty for display (e.g., "1.23T" for trillion).
pub fn format_difficulty(difficulty: f64) -> String {
    if difficulty >= 1e15 {
        alloc::format!("{:.2}P", difficulty / 1e15)
    } else if difficulty >= 1e12 {
        alloc::format!("{:.2}T", difficulty / 1e12)
    } else if difficulty >= 1e9 {
        alloc::format!("{:.2}G", difficulty / 1e9)
    } else if difficulty >= 1e6 {
        alloc::format!("{:.2}M", difficulty / 1e6)
    } else if difficulty >= 1e3 {
        alloc::format!("{:.2}K", difficulty / 1e3)
    } else {
        alloc::format!("{:.2}", difficulty)
    }
}
