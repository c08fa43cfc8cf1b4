//! Deterministic symbol-to-hypervector generation
//!
//! A symbol's vector is a pure function of `(namespace, symbol, D)`:
//!
//! 1. seed = first four bytes (big-endian) of `md5("<NS>::<symbol>")`
//! 2. a `ChaCha8Rng` seeded with that value emits `D` bits
//! 3. bits map `0 -> -1`, `1 -> +1`
//!
//! Nothing is shared between processes except the symbol string and `D`, so
//! training and inference runs on different machines agree on every vector
//! without exchanging a lookup table.

use super::vector::{Hypervector, TieBreak};
use crate::error::{HdcError, HdcResult};
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Seed of the tie-break vector. Must never change once models exist.
pub const TIE_BREAK_SEED: u64 = 0xC0FFEE;

/// Symbol categories, each with its own seed prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    Opcode,
    Method,
}

impl Namespace {
    pub fn prefix(&self) -> &'static str {
        match self {
            Namespace::Opcode => "OPC::",
            Namespace::Method => "MTH::",
        }
    }
}

/// Seed for a namespaced symbol
pub fn symbol_seed(namespace: Namespace, symbol: &str) -> u64 {
    let mut key = String::with_capacity(namespace.prefix().len() + symbol.len());
    key.push_str(namespace.prefix());
    key.push_str(symbol);
    let digest = md5::compute(key.as_bytes());
    u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]]) as u64
}

/// Draw a bipolar vector of dimension `dim` from `seed`
pub fn bipolar_from_seed(seed: u64, dim: usize) -> HdcResult<Hypervector> {
    if dim == 0 {
        return Err(HdcError::InvalidDimension(dim));
    }
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut word = 0u64;
    let bits = (0..dim).map(|i| {
        if i % 64 == 0 {
            word = rng.next_u64();
        }
        (word >> (i % 64)) & 1 == 1
    });
    Ok(Hypervector::from_bits(bits))
}

/// Generate the vector for `symbol` in `namespace`.
///
/// The empty string is a valid symbol.
pub fn generate(namespace: Namespace, symbol: &str, dim: usize) -> HdcResult<Hypervector> {
    bipolar_from_seed(symbol_seed(namespace, symbol), dim)
}

/// The tie-break vector for dimension `dim`
pub fn tie_break(dim: usize) -> HdcResult<TieBreak> {
    Ok(TieBreak::new(bipolar_from_seed(TIE_BREAK_SEED, dim)?))
}
