//! Per-application encoding
//!
//! Every opcode occurrence is bound to the vector of the method that
//! contains it, so the same opcode in two methods pushes the accumulator in
//! two different directions. The sum is collapsed with the shared sign rule.
//!
//! Methods are visited in discovery order (the insertion order of
//! [`MethodOpcodes`]). That order decides which opcodes survive when the
//! budget runs out, so it is part of the encoding.

use crate::error::HdcResult;
use crate::extract::MethodOpcodes;
use crate::hdc::{Accumulator, Codebook, Hypervector};

/// Default opcode budget per application
pub const DEFAULT_MAX_OPS: usize = 10_000;

/// Result of accumulating one application before bundling
#[derive(Debug, Clone)]
pub struct AppAccumulation {
    pub accumulator: Accumulator,
    /// Opcodes bound into the accumulator (never above the budget)
    pub ops_used: usize,
    /// Methods that contributed at least one opcode
    pub methods_used: usize,
}

/// Encodes opcode-per-method maps into application hypervectors
pub struct Encoder<'a> {
    codebook: &'a Codebook,
    max_ops: usize,
}

impl<'a> Encoder<'a> {
    pub fn new(codebook: &'a Codebook, max_ops: usize) -> Self {
        Self { codebook, max_ops }
    }

    pub fn dim(&self) -> usize {
        self.codebook.dim()
    }

    pub fn codebook(&self) -> &'a Codebook {
        self.codebook
    }

    pub fn max_ops(&self) -> usize {
        self.max_ops
    }

    /// Bind and sum opcodes until the budget is spent, stopping mid-method
    /// if necessary.
    pub fn accumulate(&self, methods: &MethodOpcodes) -> HdcResult<AppAccumulation> {
        let mut accumulator = Accumulator::zeros(self.codebook.dim());
        let mut ops_used = 0usize;
        let mut methods_used = 0usize;

        for (method, ops) in methods {
            let remaining = self.max_ops.saturating_sub(ops_used);
            if remaining == 0 {
                break;
            }
            if ops.is_empty() {
                continue;
            }

            let method_hv = self.codebook.method(method)?;
            for op in ops.iter().take(remaining) {
                let op_hv = self.codebook.opcode(op)?;
                accumulator.add_bound(&op_hv, &method_hv)?;
                ops_used += 1;
            }
            methods_used += 1;
        }

        Ok(AppAccumulation {
            accumulator,
            ops_used,
            methods_used,
        })
    }

    /// Encode one application. An empty map (or a zero budget) yields the
    /// tie-break vector.
    pub fn encode(&self, methods: &MethodOpcodes) -> HdcResult<Hypervector> {
        let acc = self.accumulate(methods)?;
        acc.accumulator.bundle(self.codebook.tie_break())
    }
}
