//! Bipolar hypervectors and the binding/bundling algebra
//!
//! A [`Hypervector`] holds `D` entries, each exactly -1 or +1. The two
//! operations that build every representation in this crate are:
//!
//! - **Binding** ([`Hypervector::bind`]): elementwise product. Self-inverse,
//!   so `v.bind(&v)` is the all-ones vector.
//! - **Bundling** ([`Accumulator::bundle`]): sum many vectors into a wide
//!   integer accumulator, then collapse back to ±1 by sign. Entries that sum
//!   to exactly zero take the value of the shared [`TieBreak`] vector.

use crate::error::{HdcError, HdcResult};

/// Fixed-length vector with every entry in {-1, +1}
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Hypervector {
    data: Vec<i8>,
}

impl Hypervector {
    /// Build from raw entries, rejecting empty input and anything not ±1
    pub fn from_bipolar(data: Vec<i8>) -> HdcResult<Self> {
        if data.is_empty() {
            return Err(HdcError::InvalidDimension(0));
        }
        if let Some((index, &value)) = data.iter().enumerate().find(|(_, &v)| v != 1 && v != -1) {
            return Err(HdcError::NonBipolar {
                index,
                value: value as i64,
            });
        }
        Ok(Self { data })
    }

    /// Build from integers of any width (interchange documents carry i64)
    pub fn from_integers(values: &[i64]) -> HdcResult<Self> {
        let mut data = Vec::with_capacity(values.len());
        for (index, &value) in values.iter().enumerate() {
            match value {
                1 => data.push(1),
                -1 => data.push(-1),
                _ => return Err(HdcError::NonBipolar { index, value }),
            }
        }
        Self::from_bipolar(data)
    }

    /// Map a bit stream to ±1: `false -> -1`, `true -> +1`
    pub(crate) fn from_bits(bits: impl Iterator<Item = bool>) -> Self {
        Self {
            data: bits.map(|b| if b { 1 } else { -1 }).collect(),
        }
    }

    /// The all-(+1) vector of dimension `dim`
    pub fn ones(dim: usize) -> HdcResult<Self> {
        Self::from_bipolar(vec![1; dim])
    }

    pub fn dim(&self) -> usize {
        self.data.len()
    }

    pub fn as_slice(&self) -> &[i8] {
        &self.data
    }

    /// Elementwise product. Result entries stay in {-1, +1}.
    pub fn bind(&self, other: &Hypervector) -> HdcResult<Hypervector> {
        check_dim(self.dim(), other.dim())?;
        Ok(Hypervector {
            data: self
                .data
                .iter()
                .zip(&other.data)
                .map(|(a, b)| a * b)
                .collect(),
        })
    }
}

/// The fixed vector resolving exactly-zero accumulator entries.
///
/// One instance per dimension, generated from a constant seed; training and
/// inference construct it the same way and so agree bit-for-bit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TieBreak(Hypervector);

impl TieBreak {
    pub fn new(vector: Hypervector) -> Self {
        Self(vector)
    }

    pub fn vector(&self) -> &Hypervector {
        &self.0
    }

    pub fn dim(&self) -> usize {
        self.0.dim()
    }
}

/// Wide integer sums used while bundling.
///
/// `i64` lanes: an application budget or a class sample count would have to
/// exceed 2^63 contributions before a lane could overflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Accumulator {
    sums: Vec<i64>,
}

impl Accumulator {
    /// Zero accumulator (the additive identity)
    pub fn zeros(dim: usize) -> Self {
        Self { sums: vec![0; dim] }
    }

    pub fn dim(&self) -> usize {
        self.sums.len()
    }

    pub fn sums(&self) -> &[i64] {
        &self.sums
    }

    /// Add a hypervector entrywise
    pub fn add(&mut self, hv: &Hypervector) -> HdcResult<()> {
        check_dim(self.dim(), hv.dim())?;
        for (sum, &v) in self.sums.iter_mut().zip(hv.as_slice()) {
            *sum += v as i64;
        }
        Ok(())
    }

    /// Add `a ⊗ b` without materialising the bound vector
    pub fn add_bound(&mut self, a: &Hypervector, b: &Hypervector) -> HdcResult<()> {
        check_dim(self.dim(), a.dim())?;
        check_dim(self.dim(), b.dim())?;
        for ((sum, &x), &y) in self.sums.iter_mut().zip(a.as_slice()).zip(b.as_slice()) {
            *sum += (x * y) as i64;
        }
        Ok(())
    }

    /// Sum two accumulators. Associative and commutative, so partial sums
    /// can be combined in any tree shape.
    pub fn merge(mut self, other: Accumulator) -> HdcResult<Accumulator> {
        check_dim(self.dim(), other.dim())?;
        for (sum, v) in self.sums.iter_mut().zip(other.sums) {
            *sum += v;
        }
        Ok(self)
    }

    /// Collapse to ±1 by sign; zero entries copy the tie-break vector
    pub fn bundle(&self, tie: &TieBreak) -> HdcResult<Hypervector> {
        check_dim(self.dim(), tie.dim())?;
        let data = self
            .sums
            .iter()
            .zip(tie.vector().as_slice())
            .map(|(&s, &t)| match s.signum() {
                1 => 1,
                -1 => -1,
                _ => t,
            })
            .collect();
        Ok(Hypervector { data })
    }
}

pub(crate) fn check_dim(expected: usize, found: usize) -> HdcResult<()> {
    if expected != found {
        return Err(HdcError::DimensionMismatch { expected, found });
    }
    Ok(())
}
