//! Supplier knowledge
//!
//! Maps known supplier-name fragments to a category. Fragments are matched as
//! case-insensitive substrings of the supplier name, and priority is the
//! declaration order of the list: when a name contains several fragments the
//! earliest declared one wins.

use aho_corasick::AhoCorasick;
use poclass_core::{Error, Result, Triple, NOT_SURE};
use serde::{Deserialize, Serialize};

/// Confidence reported for every supplier hint
pub const SUPPLIER_HINT_CONFIDENCE: f64 = 0.9;

/// A supplier-name fragment and the category it implies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupplierHint {
    /// Case-insensitive name fragment
    pub fragment: String,

    /// Category implied by the fragment
    pub result: Triple,
}

impl SupplierHint {
    /// Create a new hint
    pub fn new(fragment: impl Into<String>, result: Triple) -> Self {
        Self {
            fragment: fragment.into(),
            result,
        }
    }
}

/// Result of a supplier lookup
#[derive(Debug, Clone, PartialEq)]
pub struct SupplierMatch {
    pub triple: Triple,
    pub confidence: f64,
    pub reason: String,
}

/// Ordered supplier hint lookup
pub struct SupplierKnowledge {
    hints: Vec<SupplierHint>,
    matcher: Option<AhoCorasick>,
}

impl SupplierKnowledge {
    /// Create the lookup; `hints` are in priority order
    pub fn new(hints: Vec<SupplierHint>) -> Result<Self> {
        if let Some(hint) = hints.iter().find(|h| h.fragment.trim().is_empty()) {
            return Err(Error::config(format!(
                "supplier hint for {} has an empty fragment",
                hint.result
            )));
        }

        let matcher = if hints.is_empty() {
            None
        } else {
            let fragments: Vec<String> = hints.iter().map(|h| h.fragment.to_lowercase()).collect();
            Some(AhoCorasick::new(&fragments).map_err(|e| {
                Error::config(format!("Failed to build supplier matcher: {}", e))
            })?)
        };

        Ok(Self { hints, matcher })
    }

    /// Look up a hint for the supplier name
    pub fn hint_for(&self, supplier: &str) -> Option<SupplierMatch> {
        if supplier.trim().is_empty() {
            return None;
        }

        let matcher = self.matcher.as_ref()?;
        let name = supplier.to_lowercase();

        let index = matcher
            .find_overlapping_iter(&name)
            .map(|m| m.pattern().as_usize())
            .min()?;

        Some(SupplierMatch {
            triple: self.hints[index].result.clone(),
            confidence: SUPPLIER_HINT_CONFIDENCE,
            reason: format!("Supplier '{}' strongly associated with this category", name),
        })
    }

    /// Hints in priority order
    pub fn hints(&self) -> &[SupplierHint] {
        &self.hints
    }
}

impl Default for SupplierKnowledge {
    fn default() -> Self {
        Self::new(default_hints()).expect("built-in supplier hints are valid")
    }
}

/// Built-in supplier hints, in priority order
pub fn default_hints() -> Vec<SupplierHint> {
    let subscription = Triple::new("IT", "Software", "Subscription");
    let laptop = Triple::new("IT", "Hardware", "Laptop");
    let air = Triple::new("T&E", "Air", NOT_SURE);

    vec![
        SupplierHint::new("microsoft", subscription.clone()),
        SupplierHint::new("google", subscription.clone()),
        SupplierHint::new("amazon web services", subscription.clone()),
        SupplierHint::new("aws", subscription),
        SupplierHint::new("dell", laptop.clone()),
        SupplierHint::new("hp", laptop),
        SupplierHint::new("indigo", air.clone()),
        SupplierHint::new("air india", air),
        SupplierHint::new("taj hotels", Triple::new("T&E", "Hotel", NOT_SURE)),
        SupplierHint::new(
            "deloitte",
            Triple::new("Professional Services", "Consulting Services", NOT_SURE),
        ),
    ]
}
