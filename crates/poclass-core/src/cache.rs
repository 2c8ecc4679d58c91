//! Result cache contract and key derivation

use crate::{Classification, Result};
use sha2::{Digest, Sha256};

/// Separator placed between the normalized description and supplier
pub const CACHE_KEY_SEPARATOR: &str = "::";

/// Derive the cache key for a (description, supplier) pair
///
/// Both inputs are lowercased and joined with [`CACHE_KEY_SEPARATOR`]; the
/// key is the lowercase hex SHA-256 digest of the result.
pub fn cache_key(description: &str, supplier: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(description.to_lowercase().as_bytes());
    hasher.update(CACHE_KEY_SEPARATOR.as_bytes());
    hasher.update(supplier.to_lowercase().as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Content-addressed store of previous classifications
///
/// Entries never expire; only an explicit `set` overwrites one. Implementations
/// must make `set` an atomic per-key upsert.
pub trait ClassificationCache: Send + Sync {
    /// Look up a previous classification
    fn get(&self, description: &str, supplier: &str) -> Result<Option<Classification>>;

    /// Store a classification, replacing any previous entry for the key
    fn set(&self, description: &str, supplier: &str, result: &Classification) -> Result<()>;
}
