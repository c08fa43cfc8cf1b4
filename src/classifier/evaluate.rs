//! Held-out evaluation

use super::{classify, ClassVectors, Decision, Label};
use crate::encoder::Encoder;
use crate::error::HdcResult;
use crate::extract::OpcodeSource;
use indicatif::ProgressBar;
use rayon::prelude::*;
use serde::Serialize;
use std::path::PathBuf;

/// Decision for one file of known label
#[derive(Debug, Clone, Serialize)]
pub struct Prediction {
    pub file: String,
    pub expected: Label,
    pub decision: Decision,
    pub correct: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct EvaluationReport {
    pub predictions: Vec<Prediction>,
    pub correct: usize,
    pub total: usize,
    /// `correct / total`, or 0 when nothing was evaluated
    pub accuracy: f64,
}

impl EvaluationReport {
    pub fn from_predictions(predictions: Vec<Prediction>) -> Self {
        let total = predictions.len();
        let correct = predictions.iter().filter(|p| p.correct).count();
        let accuracy = if total > 0 {
            correct as f64 / total as f64
        } else {
            0.0
        };
        Self {
            predictions,
            correct,
            total,
            accuracy,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }
}

/// Encode and classify every sample. Output keeps the input order.
///
/// Samples that fail extraction are still classified, as the tie-break
/// vector their empty opcode map encodes to.
pub fn evaluate<S: OpcodeSource>(
    encoder: &Encoder<'_>,
    source: &S,
    classes: &ClassVectors,
    samples: &[(PathBuf, Label)],
    progress: Option<&ProgressBar>,
) -> HdcResult<EvaluationReport> {
    let predictions = samples
        .par_iter()
        .map(|(path, expected)| -> HdcResult<Prediction> {
            let methods = source.extract(path, encoder.max_ops());
            let vector = encoder.encode(&methods)?;
            let decision = classify(&vector, classes)?;
            if let Some(bar) = progress {
                bar.inc(1);
            }
            Ok(Prediction {
                file: path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string()),
                expected: *expected,
                correct: decision.label == *expected,
                decision,
            })
        })
        .collect::<HdcResult<Vec<_>>>()?;
    Ok(EvaluationReport::from_predictions(predictions))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::MethodOpcodes;
    use crate::hdc::Codebook;
    use std::path::Path;

    struct OneMethod;

    impl OpcodeSource for OneMethod {
        fn extract(&self, path: &Path, _max_total_ops: usize) -> MethodOpcodes {
            let mut map = MethodOpcodes::new();
            let name = path.to_string_lossy().to_string();
            if name != "empty" {
                map.insert(name, vec!["nop".to_string()]);
            }
            map
        }
    }

    #[test]
    fn test_report_counts_and_order() {
        let book = Codebook::new(512).unwrap();
        let encoder = Encoder::new(&book, 10);
        let src = OneMethod;

        let mut a = MethodOpcodes::new();
        a.insert("a".to_string(), vec!["nop".to_string()]);
        let mut b = MethodOpcodes::new();
        b.insert("b".to_string(), vec!["nop".to_string()]);
        let classes =
            ClassVectors::new(encoder.encode(&a).unwrap(), encoder.encode(&b).unwrap()).unwrap();

        let samples = vec![
            (PathBuf::from("a"), Label::Benign),
            (PathBuf::from("b"), Label::Benign),
            (PathBuf::from("b"), Label::Malicious),
            (PathBuf::from("empty"), Label::Malicious),
        ];
        let report = evaluate(&encoder, &src, &classes, &samples, None).unwrap();

        assert_eq!(report.total, 4);
        let files: Vec<&str> = report.predictions.iter().map(|p| p.file.as_str()).collect();
        assert_eq!(files, vec!["a", "b", "b", "empty"]);
        assert!(report.predictions[0].correct);
        assert!(!report.predictions[1].correct);
        assert!(report.predictions[2].correct);
        assert_eq!(report.correct, report.predictions.iter().filter(|p| p.correct).count());
        assert_eq!(report.accuracy, report.correct as f64 / 4.0);
    }

    #[test]
    fn test_empty_report() {
        let report = EvaluationReport::from_predictions(Vec::new());
        assert!(report.is_empty());
        assert_eq!(report.accuracy, 0.0);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["total"], 0);
        assert!(json["predictions"].as_array().unwrap().is_empty());
    }
}
