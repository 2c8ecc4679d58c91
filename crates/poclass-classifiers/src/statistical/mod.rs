//! Statistical classifier
//!
//! Three independent per-level probability models over a shared text
//! vectorization. The combined confidence is the minimum of the three arg-max
//! probabilities, so a prediction is only emitted when every level is
//! individually confident; otherwise the classifier abstains.

pub mod artifact;

pub use artifact::{LinearClassifier, ModelArtifact, TfidfVectorizer};

use poclass_core::{Result, Triple};
use std::path::Path;
use tracing::{debug, info, warn};

/// Sparse feature vector as (feature index, value) pairs
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureVector {
    pub entries: Vec<(usize, f64)>,
}

impl FeatureVector {
    /// Create a vector from (index, value) pairs
    pub fn new(entries: Vec<(usize, f64)>) -> Self {
        Self { entries }
    }

    /// Dot product with a dense weight row; out-of-range indices contribute nothing
    pub fn dot(&self, weights: &[f64]) -> f64 {
        self.entries
            .iter()
            .filter_map(|&(index, value)| weights.get(index).map(|w| w * value))
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Turns text into features
pub trait Vectorizer: Send + Sync {
    fn transform(&self, text: &str) -> FeatureVector;
}

/// Multi-class model producing a probability per class
pub trait ProbabilisticClassifier: Send + Sync {
    /// Class labels, in the order of `predict_proba`'s output
    fn classes(&self) -> &[String];

    /// Probability distribution over `classes()`
    fn predict_proba(&self, features: &FeatureVector) -> Vec<f64>;
}

/// Vectorizer plus one classifier per taxonomy level
///
/// Loaded once at startup and read-only afterwards.
pub struct ModelBundle {
    vectorizer: Box<dyn Vectorizer>,
    l1: Box<dyn ProbabilisticClassifier>,
    l2: Box<dyn ProbabilisticClassifier>,
    l3: Box<dyn ProbabilisticClassifier>,
}

impl ModelBundle {
    /// Assemble a bundle from its parts
    pub fn new(
        vectorizer: Box<dyn Vectorizer>,
        l1: Box<dyn ProbabilisticClassifier>,
        l2: Box<dyn ProbabilisticClassifier>,
        l3: Box<dyn ProbabilisticClassifier>,
    ) -> Self {
        Self {
            vectorizer,
            l1,
            l2,
            l3,
        }
    }

    /// Load a bundle artifact
    ///
    /// A missing file is a valid state and yields `Ok(None)`; an unreadable or
    /// inconsistent artifact is a configuration error.
    pub fn load(path: impl AsRef<Path>) -> Result<Option<Self>> {
        let path = path.as_ref();
        if !path.exists() {
            info!("No model artifact at {}, statistical stage disabled", path.display());
            return Ok(None);
        }

        let artifact = ModelArtifact::from_file(path)?;
        info!(
            l1_classes = artifact.l1.classes.len(),
            l2_classes = artifact.l2.classes.len(),
            l3_classes = artifact.l3.classes.len(),
            "Loaded model artifact from {}",
            path.display()
        );
        Ok(Some(artifact.into_bundle()))
    }
}

/// A confident statistical prediction
#[derive(Debug, Clone, PartialEq)]
pub struct ModelPrediction {
    pub triple: Triple,

    /// Minimum of the per-level probabilities
    pub confidence: f64,

    /// Arg-max probability per level (L1, L2, L3)
    pub level_confidences: [f64; 3],
}

/// Text fed to the vectorizer: the description, plus a supplier line when one is given
pub fn build_text(description: &str, supplier: &str) -> String {
    let supplier = supplier.trim();
    if supplier.is_empty() {
        description.to_string()
    } else {
        format!("{}\nSupplier: {}", description, supplier)
    }
}

/// Predict a triple, abstaining unless all three levels reach `min_confidence`
pub fn predict(
    bundle: &ModelBundle,
    description: &str,
    supplier: &str,
    min_confidence: f64,
) -> Option<ModelPrediction> {
    let text = build_text(description, supplier);
    let features = bundle.vectorizer.transform(&text);

    let (l1, p1) = best_class(bundle.l1.as_ref(), &features, "L1")?;
    let (l2, p2) = best_class(bundle.l2.as_ref(), &features, "L2")?;
    let (l3, p3) = best_class(bundle.l3.as_ref(), &features, "L3")?;

    let confidence = p1.min(p2).min(p3);
    if confidence < min_confidence {
        debug!(
            confidence,
            min_confidence, "Statistical model abstained below threshold"
        );
        return None;
    }

    Some(ModelPrediction {
        triple: Triple::new(l1, l2, l3),
        confidence,
        level_confidences: [p1, p2, p3],
    })
}

/// Arg-max class and its probability; first maximum wins on ties
fn best_class(
    classifier: &dyn ProbabilisticClassifier,
    features: &FeatureVector,
    level: &str,
) -> Option<(String, f64)> {
    let classes = classifier.classes();
    let probs = classifier.predict_proba(features);

    if probs.is_empty() || probs.len() != classes.len() {
        warn!(
            level,
            classes = classes.len(),
            probabilities = probs.len(),
            "Model returned a malformed distribution"
        );
        return None;
    }

    let (index, prob) = probs
        .iter()
        .map(|&p| if p.is_finite() { p } else { 0.0 })
        .enumerate()
        .fold((0, f64::NEG_INFINITY), |best, (i, p)| if p > best.1 { (i, p) } else { best });

    Some((classes[index].clone(), prob))
}
