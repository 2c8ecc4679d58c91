//! poclass Core
//!
//! Core types, traits, and utilities shared across poclass components.
//!
//! This crate provides:
//! - The `Classification` result type and the L1/L2/L3 `Triple`
//! - Error types and result handling
//! - The taxonomy store used to validate category triples
//! - Cache key derivation and the `ClassificationCache` seam

pub mod cache;
pub mod error;
pub mod taxonomy;
pub mod types;

pub use cache::{cache_key, ClassificationCache, CACHE_KEY_SEPARATOR};
pub use error::{Error, Result};
pub use taxonomy::Taxonomy;
pub use types::{ChatMessage, Classification, Stage, Triple, NOT_PROVIDED, NOT_SURE};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::cache::{cache_key, ClassificationCache};
    pub use crate::error::{Error, Result};
    pub use crate::taxonomy::Taxonomy;
    pub use crate::types::{ChatMessage, Classification, Stage, Triple, NOT_SURE};
}
