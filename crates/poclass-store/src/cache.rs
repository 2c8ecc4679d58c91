//! Result cache implementations
//!
//! Both caches keep their entries in a lock-guarded map so that every `set` is
//! an atomic per-key upsert. [`FileCache`] additionally persists the whole map
//! as one JSON document (hex key to classification); the document is rewritten
//! while the lock is held, via a temporary file and a rename, so concurrent
//! writers in the process never lose each other's updates.

use parking_lot::{Mutex, RwLock};
use poclass_core::{cache_key, Classification, ClassificationCache, Error, Result};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// In-process cache with no persistence
#[derive(Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, Classification>>,
}

impl MemoryCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cached entries
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl ClassificationCache for MemoryCache {
    fn get(&self, description: &str, supplier: &str) -> Result<Option<Classification>> {
        Ok(self.entries.read().get(&cache_key(description, supplier)).cloned())
    }

    fn set(&self, description: &str, supplier: &str, result: &Classification) -> Result<()> {
        self.entries
            .write()
            .insert(cache_key(description, supplier), result.clone());
        Ok(())
    }
}

/// Cache persisted as a single JSON document
pub struct FileCache {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, Classification>>,
}

impl FileCache {
    /// Open the cache document, starting empty when the file does not exist
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let entries = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            if content.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&content).map_err(|e| {
                    Error::cache(format!("corrupt cache file {}: {}", path.display(), e))
                })?
            }
        } else {
            BTreeMap::new()
        };

        info!(entries = entries.len(), "Opened result cache at {}", path.display());
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    /// Location of the cache document
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of cached entries
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Rewrite the document; callers hold the entries lock
    fn persist(&self, entries: &BTreeMap<String, Classification>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        std::fs::write(&tmp, serde_json::to_vec_pretty(entries)?)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl ClassificationCache for FileCache {
    fn get(&self, description: &str, supplier: &str) -> Result<Option<Classification>> {
        Ok(self.entries.lock().get(&cache_key(description, supplier)).cloned())
    }

    fn set(&self, description: &str, supplier: &str, result: &Classification) -> Result<()> {
        let key = cache_key(description, supplier);
        let mut entries = self.entries.lock();
        let previous = entries.insert(key.clone(), result.clone());

        // memory only reflects what reached disk
        if let Err(e) = self.persist(&entries) {
            match previous {
                Some(previous) => entries.insert(key, previous),
                None => entries.remove(&key),
            };
            return Err(e);
        }

        debug!(key = %key, "Cached classification");
        Ok(())
    }
}
