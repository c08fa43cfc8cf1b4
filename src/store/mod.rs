//! Persistence for class vectors
//!
//! Class vectors are stored one `.npy` file per label,
//! `<dir>/<label>_class_vector.npy`. The JSON documents in [`interchange`]
//! mirror them for other tools.

pub mod interchange;
pub mod npy;

pub use interchange::{
    preload_vocabulary, ClassVectorDocument, VocabularyDocument, VocabularyLoad,
};

use crate::classifier::{ClassVectors, Label};
use crate::error::{HdcError, HdcResult};
use crate::hdc::Hypervector;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Somewhere class vectors can be saved to and loaded from
pub trait VectorStore {
    fn save(&self, label: Label, hv: &Hypervector) -> HdcResult<()>;

    /// Load one class vector. A missing artifact is an error.
    fn load(&self, label: Label) -> HdcResult<Hypervector>;

    fn save_all(&self, classes: &ClassVectors) -> HdcResult<()> {
        for label in Label::ALL {
            self.save(label, classes.get(label))?;
        }
        Ok(())
    }

    fn load_all(&self) -> HdcResult<ClassVectors> {
        ClassVectors::new(self.load(Label::Benign)?, self.load(Label::Malicious)?)
    }
}

/// `.npy` files in one directory
#[derive(Debug, Clone)]
pub struct NpyStore {
    dir: PathBuf,
}

impl NpyStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, label: Label) -> PathBuf {
        self.dir.join(format!("{}_class_vector.npy", label.as_str()))
    }
}

impl VectorStore for NpyStore {
    fn save(&self, label: Label, hv: &Hypervector) -> HdcResult<()> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path_for(label);
        npy::write(&path, hv)?;
        debug!("Saved {} class vector to {}", label, path.display());
        Ok(())
    }

    fn load(&self, label: Label) -> HdcResult<Hypervector> {
        let path = self.path_for(label);
        if !path.is_file() {
            return Err(HdcError::MissingArtifact {
                label: label.to_string(),
                path,
            });
        }
        npy::read(&path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hdc::{generate, Namespace};

    #[test]
    fn test_save_and_load_all() {
        let dir = tempfile::tempdir().unwrap();
        let store = NpyStore::new(dir.path().join("model"));
        let classes = ClassVectors::new(
            generate(Namespace::Opcode, "benign", 128).unwrap(),
            generate(Namespace::Opcode, "malicious", 128).unwrap(),
        )
        .unwrap();

        store.save_all(&classes).unwrap();
        assert!(dir.path().join("model/benign_class_vector.npy").is_file());
        assert!(dir.path().join("model/malicious_class_vector.npy").is_file());
        assert_eq!(store.load_all().unwrap(), classes);
    }

    #[test]
    fn test_missing_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let store = NpyStore::new(dir.path());
        store
            .save(Label::Benign, &Hypervector::ones(8).unwrap())
            .unwrap();

        match store.load_all() {
            Err(HdcError::MissingArtifact { label, path }) => {
                assert_eq!(label, "malicious");
                assert_eq!(path, dir.path().join("malicious_class_vector.npy"));
            }
            other => panic!("expected MissingArtifact, got {other:?}"),
        }
    }

    #[test]
    fn test_mismatched_widths() {
        let dir = tempfile::tempdir().unwrap();
        let store = NpyStore::new(dir.path());
        store.save(Label::Benign, &Hypervector::ones(8).unwrap()).unwrap();
        store.save(Label::Malicious, &Hypervector::ones(16).unwrap()).unwrap();
        assert!(matches!(
            store.load_all(),
            Err(HdcError::DimensionMismatch { expected: 8, found: 16 })
        ));
    }
}
