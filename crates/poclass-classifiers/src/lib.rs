//! poclass Classifiers
//!
//! The stages of the purchase-order classification cascade and the cascade
//! itself. Stages are ordered from cheapest and most authoritative to most
//! expensive:
//! - Keyword rules and supplier knowledge: deterministic, in-process lookups
//! - Statistical model: local per-level probability models
//! - Language model: network-bound, validated and retried
//!
//! [`ClassificationCascade`] composes them and always returns a well-formed
//! classification.

pub mod cascade;
pub mod llm;
pub mod rules;
pub mod statistical;
pub mod supplier;

pub use cascade::{CascadeBuilder, CascadeConfig, CascadeResult, ClassificationCascade};
pub use llm::{
    AttemptFailure, LlmClassifier, LlmClient, LlmConfig, LlmOutcome, OpenAiCompatClient,
    ValidationError,
};
pub use rules::{Rule, RuleEngine, RuleMatch};
pub use statistical::{
    FeatureVector, ModelArtifact, ModelBundle, ModelPrediction, ProbabilisticClassifier,
    Vectorizer,
};
pub use supplier::{SupplierHint, SupplierKnowledge, SupplierMatch};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::cascade::{CascadeConfig, ClassificationCascade};
    pub use crate::llm::{LlmClient, LlmConfig};
    pub use crate::rules::RuleEngine;
    pub use crate::statistical::ModelBundle;
    pub use crate::supplier::SupplierKnowledge;
}
