//! Opcode extraction from compiled Android bytecode
//!
//! This is the boundary between file formats and the encoder: every
//! supported input turns into an ordered method -> opcodes map, and every
//! failure turns into an empty one.

pub mod apk;
pub mod dex;
pub mod dump;
pub mod opcodes;

use indexmap::IndexMap;
use std::path::Path;
use thiserror::Error;
use tracing::warn;

/// Method identifier -> opcode mnemonics, in method discovery order
pub type MethodOpcodes = IndexMap<String, Vec<String>>;

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Malformed dex at offset {offset:#x}: {reason}")]
    Dex { offset: usize, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("no dex")]
    NoBytecode,

    #[error("unsupported file type: {0}")]
    Unsupported(String),
}

/// Anything that can turn a sample file into opcodes.
///
/// Implementations must not fail: unreadable input yields an empty map.
pub trait OpcodeSource: Send + Sync {
    fn extract(&self, path: &Path, max_total_ops: usize) -> MethodOpcodes;
}

/// Dispatches on file extension to the APK, DEX or dump reader
#[derive(Debug, Clone, Copy, Default)]
pub struct FileExtractor;

impl OpcodeSource for FileExtractor {
    fn extract(&self, path: &Path, max_total_ops: usize) -> MethodOpcodes {
        extract_opcodes(path, max_total_ops)
    }
}

/// Read opcodes from `path`, with the format chosen by extension
pub fn try_extract(path: &Path, max_total_ops: usize) -> Result<MethodOpcodes, ExtractError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "apk" => apk::extract(path, max_total_ops),
        "dex" => {
            let data = std::fs::read(path)?;
            let mut out = MethodOpcodes::new();
            let mut budget = max_total_ops;
            dex::collect_opcodes(&data, &mut out, &mut budget)?;
            Ok(out)
        }
        "opcodes" | "txt" => dump::extract(path, max_total_ops),
        _ => Err(ExtractError::Unsupported(ext.clone())),
    }
}

/// Extract opcodes, absorbing every failure into an empty map.
///
/// Parse failures and empty results are reported per file; the caller
/// treats an empty map as "no contribution".
pub fn extract_opcodes(path: &Path, max_total_ops: usize) -> MethodOpcodes {
    match try_extract(path, max_total_ops) {
        Ok(map) => {
            if map.is_empty() && max_total_ops > 0 {
                warn!("[SKIP] {}: no opcodes extracted", path.display());
            }
            map
        }
        Err(e) => {
            warn!("[SKIP] {}: {}", path.display(), e);
            MethodOpcodes::new()
        }
    }
}

/// Total opcode count across all methods
pub fn total_ops(methods: &MethodOpcodes) -> usize {
    methods.values().map(Vec::len).sum()
}
