//! Core types for poclass

use serde::{Deserialize, Serialize};
use std::fmt;

/// Sentinel usable at any taxonomy level when no confident category exists
pub const NOT_SURE: &str = "Not sure";

/// Supplier value used when the caller does not supply one
pub const NOT_PROVIDED: &str = "Not provided";

/// A category path through the three-level taxonomy
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Triple {
    pub l1: String,
    pub l2: String,
    pub l3: String,
}

impl Triple {
    /// Create a new triple
    pub fn new(l1: impl Into<String>, l2: impl Into<String>, l3: impl Into<String>) -> Self {
        Self {
            l1: l1.into(),
            l2: l2.into(),
            l3: l3.into(),
        }
    }

    /// The all-"Not sure" triple
    pub fn not_sure() -> Self {
        Self::new(NOT_SURE, NOT_SURE, NOT_SURE)
    }

    /// Whether any level carries the "Not sure" sentinel
    pub fn contains_not_sure(&self) -> bool {
        [&self.l1, &self.l2, &self.l3]
            .iter()
            .any(|level| level.as_str() == NOT_SURE)
    }

    /// Whether every level is the sentinel
    pub fn is_not_sure(&self) -> bool {
        self.l1 == NOT_SURE && self.l2 == NOT_SURE && self.l3 == NOT_SURE
    }
}

impl fmt::Display for Triple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} > {} > {}", self.l1, self.l2, self.l3)
    }
}

/// Classification of a single purchase-order description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    /// The description that was classified
    pub po_description: String,

    /// Level 1 category
    #[serde(rename = "L1")]
    pub l1: String,

    /// Level 2 category
    #[serde(rename = "L2")]
    pub l2: String,

    /// Level 3 category
    #[serde(rename = "L3")]
    pub l3: String,

    /// Confidence score (0.0-1.0)
    pub confidence: f64,

    /// Short rationale for the decision
    pub reason: String,

    /// Version of the taxonomy the result was produced against
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub taxonomy_version: Option<String>,
}

impl Classification {
    /// Create a new classification; confidence is clamped into [0, 1]
    pub fn new(
        po_description: impl Into<String>,
        triple: Triple,
        confidence: f64,
        reason: impl Into<String>,
    ) -> Self {
        let confidence = if confidence.is_finite() {
            confidence.clamp(0.0, 1.0)
        } else {
            0.0
        };

        Self {
            po_description: po_description.into(),
            l1: triple.l1,
            l2: triple.l2,
            l3: triple.l3,
            confidence,
            reason: reason.into(),
            taxonomy_version: None,
        }
    }

    /// Terminal result used when no cascade stage produced a valid answer
    pub fn fallback(po_description: impl Into<String>) -> Self {
        Self::new(
            po_description,
            Triple::not_sure(),
            0.0,
            "Rules, supplier knowledge, and the model all failed to produce a valid classification",
        )
    }

    /// Stamp the taxonomy version
    pub fn with_taxonomy_version(mut self, version: impl Into<String>) -> Self {
        self.taxonomy_version = Some(version.into());
        self
    }

    /// The (L1, L2, L3) triple of this classification
    pub fn triple(&self) -> Triple {
        Triple::new(&self.l1, &self.l2, &self.l3)
    }

    /// Whether this is the all-"Not sure" result
    pub fn is_not_sure(&self) -> bool {
        self.triple().is_not_sure()
    }
}

/// Cascade stage that produced a classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// Keyword rule engine
    Rules,
    /// Supplier knowledge lookup
    Supplier,
    /// Result cache hit
    Cache,
    /// Statistical model
    Model,
    /// Language model
    Llm,
    /// Terminal "Not sure" result
    Fallback,
}

impl Stage {
    /// Stable lowercase name, used for metrics labels
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rules => "rules",
            Self::Supplier => "supplier",
            Self::Cache => "cache",
            Self::Model => "model",
            Self::Llm => "llm",
            Self::Fallback => "fallback",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A chat message sent to the language model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role of the message sender (system, user, assistant)
    pub role: String,

    /// Content of the message
    pub content: String,
}

impl ChatMessage {
    /// Create a new chat message
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }

    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self::new("user", content)
    }

    /// Create a system message
    pub fn system(content: impl Into<String>) -> Self {
        Self::new("system", content)
    }
}
