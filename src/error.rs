//! Error types for the encoding and classification engine

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the hypervector algebra, the vector store and the
/// interchange documents.
///
/// Extraction failures are deliberately absent: the bytecode boundary
/// converts them into an empty opcode map (see [`crate::extract`]).
#[derive(Error, Debug)]
pub enum HdcError {
    #[error("Invalid dimension {0}: hypervectors need at least one entry")]
    InvalidDimension(usize),

    #[error("Dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch { expected: usize, found: usize },

    #[error("Entry {index} is {value}, hypervector entries must be -1 or +1")]
    NonBipolar { index: usize, value: i64 },

    #[error("Missing {label} class vector at {path}. Run `apkhd train` first.")]
    MissingArtifact { label: String, path: PathBuf },

    #[error("Invalid artifact {path}: {reason}")]
    InvalidArtifact { path: PathBuf, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type HdcResult<T> = Result<T, HdcError>;
