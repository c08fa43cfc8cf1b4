//! JSON interchange documents
//!
//! Class vectors export as `{"benign": [...], "malicious": [...]}`; the
//! opcode vocabulary as `{"opcodes": {"nop": [...], ...}}`. Both are plain
//! integer lists so any language can read them.

use crate::classifier::{ClassVectors, Label};
use crate::error::{HdcError, HdcResult};
use crate::hdc::{Codebook, Hypervector, PreloadStats, SymbolCache};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

fn to_ints(hv: &Hypervector) -> Vec<i64> {
    hv.as_slice().iter().map(|&v| v as i64).collect()
}

fn parse_vector(values: &[i64], dim: usize, what: &str, path: &Path) -> HdcResult<Hypervector> {
    let invalid = |reason: String| HdcError::InvalidArtifact {
        path: path.to_path_buf(),
        reason,
    };
    if values.len() != dim {
        return Err(invalid(format!(
            "{what} has {} values, expected {dim}",
            values.len()
        )));
    }
    Hypervector::from_integers(values).map_err(|e| invalid(format!("{what}: {e}")))
}

/// `{label: [D integers]}`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClassVectorDocument(pub BTreeMap<String, Vec<i64>>);

impl ClassVectorDocument {
    pub fn from_classes(classes: &ClassVectors) -> Self {
        Self(
            Label::ALL
                .iter()
                .map(|&label| (label.to_string(), to_ints(classes.get(label))))
                .collect(),
        )
    }

    /// Rebuild both class vectors; `path` names the source in errors
    pub fn to_classes(&self, path: &Path) -> HdcResult<ClassVectors> {
        let lookup = |label: Label| -> HdcResult<&Vec<i64>> {
            self.0.get(label.as_str()).ok_or_else(|| HdcError::InvalidArtifact {
                path: path.to_path_buf(),
                reason: format!("no {label} entry"),
            })
        };
        let benign = lookup(Label::Benign)?;
        let malicious = lookup(Label::Malicious)?;
        let dim = benign.len();
        ClassVectors::new(
            parse_vector(benign, dim, "benign", path)?,
            parse_vector(malicious, dim, "malicious", path)?,
        )
    }

    pub fn write(&self, path: &Path) -> HdcResult<()> {
        std::fs::write(path, serde_json::to_string(self)?)?;
        Ok(())
    }

    pub fn read(path: &Path) -> HdcResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

/// `{"opcodes": {symbol: [D integers]}}`, optionally with method vectors
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VocabularyDocument {
    #[serde(default)]
    pub opcodes: BTreeMap<String, Vec<i64>>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub methods: BTreeMap<String, Vec<i64>>,
}

impl VocabularyDocument {
    /// Every opcode currently held by `cache`, sorted by symbol
    pub fn from_opcode_cache(cache: &SymbolCache) -> Self {
        Self {
            opcodes: cache
                .snapshot()
                .into_iter()
                .map(|(symbol, hv)| (symbol, to_ints(&hv)))
                .collect(),
            methods: BTreeMap::new(),
        }
    }

    /// Add every method currently held by `cache`
    pub fn with_methods(mut self, cache: &SymbolCache) -> Self {
        self.methods = cache
            .snapshot()
            .into_iter()
            .map(|(symbol, hv)| (symbol, to_ints(&hv)))
            .collect();
        self
    }

    pub fn len(&self) -> usize {
        self.opcodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.opcodes.is_empty()
    }

    /// Validate the opcode entries as a lookup table of width `dim`
    pub fn opcode_table(&self, dim: usize, path: &Path) -> HdcResult<BTreeMap<String, Hypervector>> {
        lookup_table(&self.opcodes, dim, "opcode", path)
    }

    /// Validate the method entries as a lookup table of width `dim`
    pub fn method_table(&self, dim: usize, path: &Path) -> HdcResult<BTreeMap<String, Hypervector>> {
        lookup_table(&self.methods, dim, "method", path)
    }

    pub fn write(&self, path: &Path) -> HdcResult<()> {
        std::fs::write(path, serde_json::to_string(self)?)?;
        Ok(())
    }

    pub fn read(path: &Path) -> HdcResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

fn lookup_table(
    entries: &BTreeMap<String, Vec<i64>>,
    dim: usize,
    kind: &str,
    path: &Path,
) -> HdcResult<BTreeMap<String, Hypervector>> {
    entries
        .iter()
        .map(|(symbol, values)| -> HdcResult<(String, Hypervector)> {
            let hv = parse_vector(values, dim, &format!("{kind} {symbol:?}"), path)?;
            Ok((symbol.clone(), hv))
        })
        .collect()
}

/// Per-section result of [`preload_vocabulary`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VocabularyLoad {
    pub opcodes: PreloadStats,
    pub methods: PreloadStats,
}

/// Read a vocabulary document and preload both of its sections into
/// `codebook`. Every entry is validated before anything is inserted.
pub fn preload_vocabulary(codebook: &Codebook, path: &Path) -> HdcResult<VocabularyLoad> {
    let doc = VocabularyDocument::read(path)?;
    let opcodes = doc.opcode_table(codebook.dim(), path)?;
    let methods = doc.method_table(codebook.dim(), path)?;
    Ok(VocabularyLoad {
        opcodes: codebook.opcodes().preload(opcodes)?,
        methods: codebook.methods().preload(methods)?,
    })
}
