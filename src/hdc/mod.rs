//! Hyperdimensional computing primitives
//!
//! - [`vector`]: bipolar hypervectors, binding, accumulate-then-sign bundling
//! - [`generator`]: hash-seeded symbol vectors and the tie-break vector
//! - [`cache`]: per-namespace symbol caches and the [`Codebook`] that owns them

pub mod cache;
pub mod generator;
pub mod vector;

pub use cache::{Codebook, PreloadStats, SymbolCache};
pub use generator::{generate, symbol_seed, tie_break, Namespace, TIE_BREAK_SEED};
pub use vector::{Accumulator, Hypervector, TieBreak};

/// Default hypervector width
pub const DEFAULT_DIMENSION: usize = 2048;
