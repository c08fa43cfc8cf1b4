//! Similarity-based binary classifier
//!
//! One bundled class vector per label. A sample is encoded exactly like the
//! training applications and assigned to the class it points towards,
//! measured by cosine similarity.

pub mod builder;
pub mod evaluate;

pub use builder::{ClassStats, ClassVectorBuilder, TrainStats};
pub use evaluate::{evaluate, EvaluationReport, Prediction};

use crate::error::HdcResult;
use crate::hdc::vector::check_dim;
use crate::hdc::Hypervector;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Class label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Label {
    Benign,
    Malicious,
}

impl Label {
    pub const ALL: [Label; 2] = [Label::Benign, Label::Malicious];

    pub fn as_str(&self) -> &'static str {
        match self {
            Label::Benign => "benign",
            Label::Malicious => "malicious",
        }
    }

}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Label chosen when both similarities are exactly equal.
///
/// Only a strictly greater benign similarity selects benign.
pub const EQUAL_SIMILARITY_LABEL: Label = Label::Malicious;

/// The benign and malicious class vectors, guaranteed to share a width
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassVectors {
    benign: Hypervector,
    malicious: Hypervector,
}

impl ClassVectors {
    pub fn new(benign: Hypervector, malicious: Hypervector) -> HdcResult<Self> {
        check_dim(benign.dim(), malicious.dim())?;
        Ok(Self { benign, malicious })
    }

    pub fn dim(&self) -> usize {
        self.benign.dim()
    }

    pub fn get(&self, label: Label) -> &Hypervector {
        match label {
            Label::Benign => &self.benign,
            Label::Malicious => &self.malicious,
        }
    }
}

/// Outcome of classifying one sample
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Decision {
    pub label: Label,
    pub benign_similarity: f64,
    pub malicious_similarity: f64,
    /// `benign_similarity` mapped to [0, 1]
    pub benign_score: f64,
    /// `malicious_similarity` mapped to [0, 1]
    pub malicious_score: f64,
    /// Benign minus malicious similarity
    pub margin: f64,
}

/// Cosine similarity in `f64`; 0 when either vector has zero norm.
///
/// The norms are multiplied before the single square root, so identical
/// bipolar vectors score exactly 1.0.
pub fn cosine_similarity(a: &Hypervector, b: &Hypervector) -> HdcResult<f64> {
    check_dim(a.dim(), b.dim())?;
    let (mut dot, mut na, mut nb) = (0.0f64, 0.0f64, 0.0f64);
    for (&x, &y) in a.as_slice().iter().zip(b.as_slice()) {
        let (x, y) = (x as f64, y as f64);
        dot += x * y;
        na += x * x;
        nb += y * y;
    }
    if na == 0.0 || nb == 0.0 {
        return Ok(0.0);
    }
    Ok(dot / (na * nb).sqrt())
}

/// Map a similarity in [-1, 1] onto [0, 1]
pub fn rescale(similarity: f64) -> f64 {
    (similarity + 1.0) / 2.0
}

/// Compare an encoded sample against both class vectors
pub fn classify(sample: &Hypervector, classes: &ClassVectors) -> HdcResult<Decision> {
    let benign = cosine_similarity(sample, classes.get(Label::Benign))?;
    let malicious = cosine_similarity(sample, classes.get(Label::Malicious))?;

    let label = match benign.partial_cmp(&malicious) {
        Some(Ordering::Greater) => Label::Benign,
        Some(Ordering::Less) => Label::Malicious,
        _ => EQUAL_SIMILARITY_LABEL,
    };

    Ok(Decision {
        label,
        benign_similarity: benign,
        malicious_similarity: malicious,
        benign_score: rescale(benign),
        malicious_score: rescale(malicious),
        margin: benign - malicious,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::Encoder;
    use crate::error::HdcError;
    use crate::extract::MethodOpcodes;
    use crate::hdc::{generate, Codebook, Namespace};

    fn hv(data: &[i8]) -> Hypervector {
        Hypervector::from_bipolar(data.to_vec()).unwrap()
    }

    #[test]
    fn test_identical_vector_is_selected() {
        let v = generate(Namespace::Opcode, "v", 256).unwrap();
        let w = generate(Namespace::Opcode, "w", 256).unwrap();
        let classes = ClassVectors::new(v.clone(), w).unwrap();
        let d = classify(&v, &classes).unwrap();
        assert_eq!(d.label, Label::Benign);
        assert_eq!(d.benign_similarity, 1.0);
        assert!(d.malicious_similarity < 1.0);
        assert_eq!(d.benign_score, 1.0);
        assert!(d.margin > 0.0);
    }

    #[test]
    fn test_self_similarity_is_exactly_one() {
        for dim in [8, 1000, 2048, 10_000] {
            let v = generate(Namespace::Method, "self", dim).unwrap();
            assert_eq!(cosine_similarity(&v, &v).unwrap(), 1.0, "D={dim}");
        }
    }

    #[test]
    fn test_equal_similarity_uses_policy_label() {
        let sample = hv(&[1, 1, 1, 1]);
        let classes = ClassVectors::new(hv(&[1, 1, -1, -1]), hv(&[-1, -1, 1, 1])).unwrap();
        let d = classify(&sample, &classes).unwrap();
        assert_eq!(d.benign_similarity, d.malicious_similarity);
        assert_eq!(d.margin, 0.0);
        assert_eq!(d.label, EQUAL_SIMILARITY_LABEL);
        assert_eq!(d.label, Label::Malicious);
    }

    #[test]
    fn test_cosine_bounds_and_rescale() {
        let a = hv(&[1, -1, 1, -1]);
        let neg = hv(&[-1, 1, -1, 1]);
        assert_eq!(cosine_similarity(&a, &a).unwrap(), 1.0);
        assert_eq!(cosine_similarity(&a, &neg).unwrap(), -1.0);
        assert_eq!(rescale(-1.0), 0.0);
        assert_eq!(rescale(0.0), 0.5);
        assert_eq!(rescale(1.0), 1.0);
    }

    #[test]
    fn test_mismatched_widths_rejected() {
        assert!(matches!(
            ClassVectors::new(hv(&[1, 1]), hv(&[1, 1, 1])),
            Err(HdcError::DimensionMismatch { expected: 2, found: 3 })
        ));
        let classes = ClassVectors::new(hv(&[1, 1]), hv(&[1, -1])).unwrap();
        assert!(classify(&hv(&[1, 1, 1]), &classes).is_err());
    }

    #[test]
    fn test_label_names() {
        assert_eq!(Label::Benign.to_string(), "benign");
        assert_eq!(serde_json::to_string(&Label::Malicious).unwrap(), "\"malicious\"");
        let back: Label = serde_json::from_str("\"benign\"").unwrap();
        assert_eq!(back, Label::Benign);
        assert!(serde_json::from_str::<Label>("\"malware\"").is_err());
    }

    fn single_method(ops: &[&str]) -> MethodOpcodes {
        let mut map = MethodOpcodes::new();
        map.insert(
            "LApp;->main".to_string(),
            ops.iter().map(|s| s.to_string()).collect(),
        );
        map
    }

    #[test]
    fn test_two_app_round_trip_at_dimension_eight() {
        let app1 = single_method(&["X", "Y"]);
        let app2 = single_method(&["Y", "Z"]);
        let golden1 = hv(&[1, -1, 1, 1, 1, 1, -1, -1]);
        let golden2 = hv(&[1, 1, 1, 1, 1, 1, -1, -1]);

        let book = Codebook::new(8).unwrap();
        let encoder = Encoder::new(&book, 10);
        let v1 = encoder.encode(&app1).unwrap();
        let v2 = encoder.encode(&app2).unwrap();
        assert_eq!(v1, golden1);
        assert_eq!(v2, golden2);

        let classes = ClassVectors::new(v1.clone(), v2.clone()).unwrap();
        let d1 = classify(&v1, &classes).unwrap();
        assert_eq!(d1.label, Label::Benign);
        assert_eq!(d1.benign_similarity, 1.0);
        assert_eq!(d1.malicious_similarity, 0.75);

        let d2 = classify(&v2, &classes).unwrap();
        assert_eq!(d2.label, Label::Malicious);
        assert_eq!(d2.malicious_similarity, 1.0);
        assert_eq!(d2.benign_similarity, 0.75);
    }
}
