//! Loadable model artifact
//!
//! A JSON document holding a TF-IDF vectorizer and three multinomial linear
//! models, as exported from a fitted text-classification pipeline:
//!
//! ```json
//! {
//!   "vectorizer": { "vocabulary": {"laptop": 0}, "idf": [1.0], "ngram_range": [1, 2] },
//!   "l1": { "classes": ["IT", "T&E"], "coef": [[0.4], [-0.4]], "intercept": [0.0, 0.0] },
//!   "l2": { ... },
//!   "l3": { ... }
//! }
//! ```

use super::{FeatureVector, ModelBundle, ProbabilisticClassifier, Vectorizer};
use poclass_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Serialized model bundle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub vectorizer: TfidfVectorizer,
    pub l1: LinearClassifier,
    pub l2: LinearClassifier,
    pub l3: LinearClassifier,
}

impl ModelArtifact {
    /// Parse and validate an artifact from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        let artifact: Self = serde_json::from_str(json)
            .map_err(|e| Error::config(format!("malformed model artifact: {}", e)))?;
        artifact.validate()?;
        Ok(artifact)
    }

    /// Load an artifact from a file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("failed to read model artifact {}: {}", path.display(), e))
        })?;
        Self::from_json(&content)
    }

    /// Check that all dimensions agree
    pub fn validate(&self) -> Result<()> {
        let dim = self.vectorizer.validate()?;
        for (level, classifier) in [("l1", &self.l1), ("l2", &self.l2), ("l3", &self.l3)] {
            classifier
                .validate(dim)
                .map_err(|e| Error::config(format!("model level {}: {}", level, e)))?;
        }
        Ok(())
    }

    /// Turn the artifact into a runnable bundle
    pub fn into_bundle(self) -> ModelBundle {
        ModelBundle::new(
            Box::new(self.vectorizer),
            Box::new(self.l1),
            Box::new(self.l2),
            Box::new(self.l3),
        )
    }
}

/// TF-IDF vectorizer over word n-grams
///
/// Tokens are lowercase runs of two or more alphanumeric (or `_`) characters.
/// Term counts are weighted by `idf` and the vector is L2-normalised.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TfidfVectorizer {
    /// Term to feature index
    pub vocabulary: HashMap<String, usize>,

    /// Inverse document frequency per feature index
    pub idf: Vec<f64>,

    /// Inclusive (min, max) n-gram lengths
    #[serde(default = "default_ngram_range")]
    pub ngram_range: (usize, usize),

    /// Use 1 + ln(tf) instead of raw counts
    #[serde(default)]
    pub sublinear_tf: bool,
}

fn default_ngram_range() -> (usize, usize) {
    (1, 1)
}

impl TfidfVectorizer {
    fn validate(&self) -> Result<usize> {
        let dim = self.idf.len();
        if dim == 0 {
            return Err(Error::config("vectorizer has an empty vocabulary"));
        }
        let (min_n, max_n) = self.ngram_range;
        if min_n == 0 || min_n > max_n {
            return Err(Error::config(format!(
                "invalid ngram_range ({}, {})",
                min_n, max_n
            )));
        }
        if let Some((term, index)) = self.vocabulary.iter().find(|(_, index)| **index >= dim) {
            return Err(Error::config(format!(
                "vocabulary term '{}' maps to index {} beyond {} features",
                term, index, dim
            )));
        }
        Ok(dim)
    }

    fn tokenize(text: &str) -> Vec<String> {
        text.to_lowercase()
            .split(|c: char| !(c.is_alphanumeric() || c == '_'))
            .filter(|token| token.chars().count() >= 2)
            .map(str::to_string)
            .collect()
    }
}

impl Vectorizer for TfidfVectorizer {
    fn transform(&self, text: &str) -> FeatureVector {
        let tokens = Self::tokenize(text);
        let (min_n, max_n) = self.ngram_range;

        let mut counts: HashMap<usize, f64> = HashMap::new();
        for n in min_n..=max_n {
            for window in tokens.windows(n) {
                if let Some(&index) = self.vocabulary.get(&window.join(" ")) {
                    *counts.entry(index).or_insert(0.0) += 1.0;
                }
            }
        }

        let mut entries: Vec<(usize, f64)> = counts
            .into_iter()
            .map(|(index, tf)| {
                let tf = if self.sublinear_tf { 1.0 + tf.ln() } else { tf };
                (index, tf * self.idf[index])
            })
            .collect();
        entries.sort_by_key(|&(index, _)| index);

        let norm = entries.iter().map(|(_, v)| v * v).sum::<f64>().sqrt();
        if norm > 0.0 {
            for (_, value) in &mut entries {
                *value /= norm;
            }
        }

        FeatureVector::new(entries)
    }
}

/// Multinomial logistic-regression model
///
/// With two classes and a single coefficient row the model is treated as
/// binary: the row scores the second class.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearClassifier {
    pub classes: Vec<String>,
    pub coef: Vec<Vec<f64>>,
    pub intercept: Vec<f64>,
}

impl LinearClassifier {
    fn is_binary(&self) -> bool {
        self.classes.len() == 2 && self.coef.len() == 1
    }

    fn validate(&self, dim: usize) -> Result<()> {
        if self.classes.is_empty() {
            return Err(Error::config("no classes"));
        }
        if !self.is_binary() && self.coef.len() != self.classes.len() {
            return Err(Error::config(format!(
                "{} coefficient rows for {} classes",
                self.coef.len(),
                self.classes.len()
            )));
        }
        if self.intercept.len() != self.coef.len() {
            return Err(Error::config(format!(
                "{} intercepts for {} coefficient rows",
                self.intercept.len(),
                self.coef.len()
            )));
        }
        if let Some(row) = self.coef.iter().find(|row| row.len() != dim) {
            return Err(Error::config(format!(
                "coefficient row has {} weights, expected {}",
                row.len(),
                dim
            )));
        }
        Ok(())
    }
}

impl ProbabilisticClassifier for LinearClassifier {
    fn classes(&self) -> &[String] {
        &self.classes
    }

    fn predict_proba(&self, features: &FeatureVector) -> Vec<f64> {
        let scores: Vec<f64> = self
            .coef
            .iter()
            .zip(&self.intercept)
            .map(|(row, bias)| features.dot(row) + bias)
            .collect();

        if self.is_binary() {
            let positive = 1.0 / (1.0 + (-scores[0]).exp());
            return vec![1.0 - positive, positive];
        }

        softmax(&scores)
    }
}

fn softmax(scores: &[f64]) -> Vec<f64> {
    let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = scores.iter().map(|s| (s - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}
