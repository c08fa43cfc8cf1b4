//! Class vector construction
//!
//! Two-level aggregation: every application is first bundled on its own
//! (see [`crate::encoder`]), and only those ±1 application vectors are
//! summed per class before a second sign-bundle produces the class vector.
//! The per-class sum is a parallel tree reduce; integer addition makes the
//! result identical for any partition or order.

use super::{ClassVectors, Label};
use crate::encoder::Encoder;
use crate::error::HdcResult;
use crate::extract::{total_ops, OpcodeSource};
use crate::hdc::Accumulator;
use indicatif::ProgressBar;
use rayon::prelude::*;
use std::path::PathBuf;
use tracing::{debug, info};

/// Per-class counts from one training pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClassStats {
    /// Applications that contributed a vector
    pub encoded: usize,
    /// Applications that produced no opcodes and added nothing
    pub skipped: usize,
}

impl ClassStats {
    fn merge(self, other: ClassStats) -> ClassStats {
        ClassStats {
            encoded: self.encoded + other.encoded,
            skipped: self.skipped + other.skipped,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrainStats {
    pub pairs: usize,
    pub benign: ClassStats,
    pub malicious: ClassStats,
}

impl TrainStats {
    pub fn get(&self, label: Label) -> ClassStats {
        match label {
            Label::Benign => self.benign,
            Label::Malicious => self.malicious,
        }
    }
}

pub struct ClassVectorBuilder<'a, S: OpcodeSource> {
    encoder: Encoder<'a>,
    source: &'a S,
    progress: Option<ProgressBar>,
}

impl<'a, S: OpcodeSource> ClassVectorBuilder<'a, S> {
    pub fn new(encoder: Encoder<'a>, source: &'a S) -> Self {
        Self {
            encoder,
            source,
            progress: None,
        }
    }

    /// Tick `bar` once per processed application
    pub fn with_progress(mut self, bar: ProgressBar) -> Self {
        self.progress = Some(bar);
        self
    }

    /// Sum the application vectors of `files` into one class accumulator.
    ///
    /// Files that yield no opcodes add the zero vector.
    pub fn accumulate_class(&self, files: &[PathBuf]) -> HdcResult<(Accumulator, ClassStats)> {
        let dim = self.encoder.dim();
        files
            .par_iter()
            .map(|path| -> HdcResult<(Accumulator, ClassStats)> {
                let methods = self.source.extract(path, self.encoder.max_ops());
                if let Some(bar) = &self.progress {
                    bar.inc(1);
                }

                let mut acc = Accumulator::zeros(dim);
                if methods.is_empty() {
                    return Ok((acc, ClassStats { encoded: 0, skipped: 1 }));
                }
                let app = self.encoder.accumulate(&methods)?;
                acc.add(&app.accumulator.bundle(self.encoder.codebook().tie_break())?)?;
                debug!(
                    "Encoded {} ({} of {} methods, {} of {} opcodes)",
                    path.display(),
                    app.methods_used,
                    methods.len(),
                    app.ops_used,
                    total_ops(&methods)
                );
                Ok((acc, ClassStats { encoded: 1, skipped: 0 }))
            })
            .try_reduce(
                || (Accumulator::zeros(dim), ClassStats::default()),
                |(a, sa), (b, sb)| Ok((a.merge(b)?, sa.merge(sb))),
            )
    }

    /// Build both class vectors from positionally paired samples
    pub fn build(&self, pairs: &[(PathBuf, PathBuf)]) -> HdcResult<(ClassVectors, TrainStats)> {
        let (benign_files, malicious_files): (Vec<PathBuf>, Vec<PathBuf>) =
            pairs.iter().cloned().unzip();
        info!(
            "Building class vectors from {} pairs (D={}, max_ops={})",
            pairs.len(),
            self.encoder.dim(),
            self.encoder.max_ops()
        );

        let (benign_acc, benign) = self.accumulate_class(&benign_files)?;
        let (malicious_acc, malicious) = self.accumulate_class(&malicious_files)?;

        let tie = self.encoder.codebook().tie_break();
        let classes = ClassVectors::new(benign_acc.bundle(tie)?, malicious_acc.bundle(tie)?)?;
        Ok((
            classes,
            TrainStats {
                pairs: pairs.len(),
                benign,
                malicious,
            },
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::MethodOpcodes;
    use crate::hdc::{generate, Codebook, Hypervector, Namespace};
    use std::collections::HashMap;
    use std::path::Path;

    /// Sequential sum of application vectors into a class accumulator
    fn fold_app_vectors(dim: usize, apps: &[Hypervector]) -> HdcResult<Accumulator> {
        apps.iter().try_fold(Accumulator::zeros(dim), |mut acc, app| -> HdcResult<Accumulator> {
            acc.add(app)?;
            Ok(acc)
        })
    }

    /// Serves canned opcode maps by file name
    struct FakeSource(HashMap<String, MethodOpcodes>);

    impl OpcodeSource for FakeSource {
        fn extract(&self, path: &Path, _max_total_ops: usize) -> MethodOpcodes {
            let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
            self.0.get(name).cloned().unwrap_or_default()
        }
    }

    fn app(method: &str, ops: &[&str]) -> MethodOpcodes {
        let mut map = MethodOpcodes::new();
        map.insert(method.into(), ops.iter().map(|s| s.to_string()).collect());
        map
    }

    fn source() -> FakeSource {
        let mut apps = HashMap::new();
        apps.insert("b1".to_string(), app("LB;->a", &["const/4", "return-void"]));
        apps.insert("b2".to_string(), app("LB;->b", &["nop", "return-void"]));
        apps.insert("m1".to_string(), app("LM;->x", &["invoke-static", "move-result"]));
        apps.insert("m2".to_string(), app("LM;->y", &["sget-object", "throw"]));
        FakeSource(apps)
    }

    #[test]
    fn test_order_independent_accumulation() {
        let apps: Vec<Hypervector> = (0..7)
            .map(|i| generate(Namespace::Method, &format!("app{i}"), 512).unwrap())
            .collect();
        let forward = fold_app_vectors(512, &apps).unwrap();

        let mut reversed = apps.clone();
        reversed.reverse();
        assert_eq!(fold_app_vectors(512, &reversed).unwrap(), forward);

        let mut rotated = apps.clone();
        rotated.rotate_left(3);
        assert_eq!(fold_app_vectors(512, &rotated).unwrap(), forward);

        let (left, right) = apps.split_at(4);
        let split = fold_app_vectors(512, left)
            .unwrap()
            .merge(fold_app_vectors(512, right).unwrap())
            .unwrap();
        assert_eq!(split, forward);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let book = Codebook::new(256).unwrap();
        let src = source();
        let builder = ClassVectorBuilder::new(Encoder::new(&book, 100), &src);
        let files = vec![PathBuf::from("b1"), PathBuf::from("b2"), PathBuf::from("m1")];
        let (acc, stats) = builder.accumulate_class(&files).unwrap();
        assert_eq!(stats, ClassStats { encoded: 3, skipped: 0 });

        let encoder = Encoder::new(&book, 100);
        let apps: Vec<Hypervector> = ["b1", "b2", "m1"]
            .iter()
            .map(|n| encoder.encode(&src.0[*n]).unwrap())
            .collect();
        assert_eq!(acc, fold_app_vectors(256, &apps).unwrap());
    }

    #[test]
    fn test_unreadable_samples_add_nothing() {
        let book = Codebook::new(256).unwrap();
        let src = source();
        let builder = ClassVectorBuilder::new(Encoder::new(&book, 100), &src);

        let (clean, _) = builder
            .accumulate_class(&[PathBuf::from("b1"), PathBuf::from("b2")])
            .unwrap();
        let (with_broken, stats) = builder
            .accumulate_class(&[
                PathBuf::from("b1"),
                PathBuf::from("broken"),
                PathBuf::from("b2"),
            ])
            .unwrap();
        assert_eq!(clean, with_broken);
        assert_eq!(stats, ClassStats { encoded: 2, skipped: 1 });
    }

    #[test]
    fn test_build_pairs() {
        let book = Codebook::new(256).unwrap();
        let src = source();
        let builder = ClassVectorBuilder::new(Encoder::new(&book, 100), &src);
        let pairs = vec![
            (PathBuf::from("b1"), PathBuf::from("m1")),
            (PathBuf::from("b2"), PathBuf::from("m2")),
        ];
        let (classes, stats) = builder.build(&pairs).unwrap();
        assert_eq!(stats.pairs, 2);
        assert_eq!(stats.get(Label::Benign).encoded, 2);
        assert_eq!(stats.get(Label::Malicious).encoded, 2);
        assert_eq!(classes.dim(), 256);
        assert_ne!(classes.get(Label::Benign), classes.get(Label::Malicious));
    }

    #[test]
    fn test_no_pairs_yield_tie_break_classes() {
        let book = Codebook::new(64).unwrap();
        let src = source();
        let builder = ClassVectorBuilder::new(Encoder::new(&book, 100), &src);
        let (classes, stats) = builder.build(&[]).unwrap();
        assert_eq!(stats, TrainStats::default());
        assert_eq!(classes.get(Label::Benign), book.tie_break().vector());
        assert_eq!(classes.get(Label::Malicious), book.tie_break().vector());
    }
}
