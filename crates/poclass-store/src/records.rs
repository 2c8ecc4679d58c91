//! Persisted classification records
//!
//! Append-only log of reviewed classifications, one JSON object per line.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use poclass_core::{Classification, Result};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// What the reviewer did with a classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReviewAction {
    Approved,
    Overridden,
}

/// A reviewed classification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationRecord {
    /// Unique record ID
    pub id: String,

    pub timestamp: DateTime<Utc>,

    pub po_description: String,

    pub supplier: String,

    #[serde(rename = "L1")]
    pub l1: String,

    #[serde(rename = "L2")]
    pub l2: String,

    #[serde(rename = "L3")]
    pub l3: String,

    pub confidence: f64,

    pub taxonomy_version: String,

    pub action: ReviewAction,
}

impl ClassificationRecord {
    /// Record a classification as reviewed now
    pub fn from_classification(
        classification: &Classification,
        supplier: impl Into<String>,
        action: ReviewAction,
    ) -> Self {
        Self {
            id: format!("rec_{}", uuid::Uuid::new_v4()),
            timestamp: Utc::now(),
            po_description: classification.po_description.clone(),
            supplier: supplier.into(),
            l1: classification.l1.clone(),
            l2: classification.l2.clone(),
            l3: classification.l3.clone(),
            confidence: classification.confidence,
            taxonomy_version: classification.taxonomy_version.clone().unwrap_or_default(),
            action,
        }
    }
}

/// Append-only store of classification records
pub trait RecordStore: Send + Sync {
    fn append(&self, record: &ClassificationRecord) -> Result<()>;

    fn load_all(&self) -> Result<Vec<ClassificationRecord>>;
}

/// Records kept as JSON lines in a single file
pub struct JsonlRecordStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonlRecordStore {
    /// Use (and create on first append) the file at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        info!("Classification records at {}", path.display());
        Self {
            path,
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RecordStore for JsonlRecordStore {
    fn append(&self, record: &ClassificationRecord) -> Result<()> {
        let line = format!("{}\n", serde_json::to_string(record)?);

        let _guard = self.write_lock.lock();
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        file.write_all(line.as_bytes())?;
        file.flush()?;

        debug!(id = %record.id, action = ?record.action, "Appended classification record");
        Ok(())
    }

    fn load_all(&self) -> Result<Vec<ClassificationRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let reader = BufReader::new(File::open(&self.path)?);
        let mut records = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }

            match serde_json::from_str::<ClassificationRecord>(&line) {
                Ok(record) => records.push(record),
                Err(e) => {
                    debug!("Failed to parse classification record: {}", e);
                    continue;
                }
            }
        }

        Ok(records)
    }
}
