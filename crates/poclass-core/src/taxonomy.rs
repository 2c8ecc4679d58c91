//! Taxonomy store
//!
//! Holds the valid (L1, L2, L3) triples and the taxonomy version. The store is
//! loaded once and is read-only afterwards; a missing or malformed definition
//! is a fatal configuration error.
//!
//! ```yaml
//! version: "2025.1"
//! categories:
//!   - { l1: IT, l2: Hardware, l3: Laptop }
//!   - { l1: IT, l2: Software, l3: Subscription }
//! ```

use crate::{Error, Result, Triple};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use tracing::info;

/// Set of valid category triples plus a version identifier
#[derive(Debug, Clone)]
pub struct Taxonomy {
    version: String,
    triples: Vec<Triple>,
    index: HashSet<Triple>,
}

#[derive(Debug, Deserialize)]
struct TaxonomyDocument {
    version: String,
    categories: Vec<Triple>,
}

impl Taxonomy {
    /// Build a taxonomy from a version and its triples
    pub fn new(version: impl Into<String>, triples: impl IntoIterator<Item = Triple>) -> Result<Self> {
        let version = version.into();
        if version.trim().is_empty() {
            return Err(Error::config("taxonomy version must not be empty"));
        }

        let mut ordered = Vec::new();
        let mut index = HashSet::new();
        for triple in triples {
            if [&triple.l1, &triple.l2, &triple.l3]
                .iter()
                .any(|level| level.trim().is_empty())
            {
                return Err(Error::config(format!(
                    "taxonomy entry has an empty level: {}",
                    triple
                )));
            }
            if index.insert(triple.clone()) {
                ordered.push(triple);
            }
        }

        if ordered.is_empty() {
            return Err(Error::config("taxonomy defines no categories"));
        }

        Ok(Self {
            version,
            triples: ordered,
            index,
        })
    }

    /// Load a taxonomy from a YAML (or JSON) string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let doc: TaxonomyDocument = serde_yaml::from_str(yaml)
            .map_err(|e| Error::config(format!("malformed taxonomy: {}", e)))?;
        Self::new(doc.version, doc.categories)
    }

    /// Load a taxonomy from a file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("failed to read taxonomy {}: {}", path.display(), e))
        })?;

        let taxonomy = Self::from_yaml(&content)?;
        info!(
            version = %taxonomy.version,
            categories = taxonomy.len(),
            "Loaded taxonomy from {}",
            path.display()
        );
        Ok(taxonomy)
    }

    /// Whether the exact triple is a member of the taxonomy
    pub fn is_valid(&self, l1: &str, l2: &str, l3: &str) -> bool {
        self.index.contains(&Triple::new(l1, l2, l3))
    }

    /// Whether the triple is a member of the taxonomy
    pub fn contains(&self, triple: &Triple) -> bool {
        self.index.contains(triple)
    }

    /// Taxonomy version identifier
    pub fn version(&self) -> &str {
        &self.version
    }

    /// All triples in declaration order
    pub fn triples(&self) -> &[Triple] {
        &self.triples
    }

    /// Number of distinct triples
    pub fn len(&self) -> usize {
        self.triples.len()
    }

    /// Always false for a successfully loaded taxonomy
    pub fn is_empty(&self) -> bool {
        self.triples.is_empty()
    }

    /// Render the distinct values per level, in first-seen order
    pub fn describe(&self) -> String {
        let mut levels: [Vec<&str>; 3] = [Vec::new(), Vec::new(), Vec::new()];
        for triple in &self.triples {
            for (values, value) in levels
                .iter_mut()
                .zip([&triple.l1, &triple.l2, &triple.l3])
            {
                if !values.contains(&value.as_str()) {
                    values.push(value);
                }
            }
        }

        format!(
            "L1: {}\nL2: {}\nL3: {}",
            levels[0].join(", "),
            levels[1].join(", "),
            levels[2].join(", ")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const YAML: &str = r#"
version: "2025.1"
categories:
  - { l1: IT, l2: Hardware, l3: Laptop }
  - { l1: IT, l2: Software, l3: Subscription }
  - { l1: T&E, l2: Air, l3: Not sure }
"#;

    #[test]
    fn test_membership() {
        let taxonomy = Taxonomy::from_yaml(YAML).unwrap();
        assert_eq!(taxonomy.version(), "2025.1");
        assert_eq!(taxonomy.len(), 3);
        assert!(taxonomy.is_valid("IT", "Hardware", "Laptop"));
        assert!(!taxonomy.is_valid("IT", "Hardware", "Printer"));
        assert!(!taxonomy.is_valid("it", "hardware", "laptop"));
    }

    #[test]
    fn test_describe_lists_levels_in_order() {
        let taxonomy = Taxonomy::from_yaml(YAML).unwrap();
        assert_eq!(
            taxonomy.describe(),
            "L1: IT, T&E\nL2: Hardware, Software, Air\nL3: Laptop, Subscription, Not sure"
        );
    }

    #[test]
    fn test_malformed_is_config_error() {
        let err = Taxonomy::from_yaml("version: [").unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let err = Taxonomy::from_yaml("version: \"1\"\ncategories: []").unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let err = Taxonomy::from_yaml("version: \"\"\ncategories:\n  - { l1: a, l2: b, l3: c }")
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let err = Taxonomy::from_file("/nonexistent/taxonomy.yaml").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(YAML.as_bytes()).unwrap();

        let taxonomy = Taxonomy::from_file(file.path()).unwrap();
        assert!(taxonomy.contains(&Triple::new("T&E", "Air", "Not sure")));
    }

    #[test]
    fn test_duplicates_are_collapsed() {
        let taxonomy = Taxonomy::new(
            "v",
            vec![Triple::new("a", "b", "c"), Triple::new("a", "b", "c")],
        )
        .unwrap();
        assert_eq!(taxonomy.len(), 1);
    }
}
