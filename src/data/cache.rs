use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use crate::config::SourceConfig;

use super::error::{LoadError, Result};
use super::loader::load_source;
use super::model::Dataset;

/// Identity of one version of a source file: where it is, how long it is and
/// when it was last written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSignature {
    pub path: PathBuf,
    pub len: u64,
    pub modified: Option<SystemTime>,
}

impl SourceSignature {
    pub fn of(path: &Path) -> Result<Self> {
        let meta = std::fs::metadata(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => LoadError::SourceNotFound(path.to_path_buf()),
            _ => LoadError::Io(e),
        })?;
        Ok(SourceSignature {
            path: std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf()),
            len: meta.len(),
            modified: meta.modified().ok(),
        })
    }
}

#[derive(Debug)]
struct CacheEntry {
    signature: SourceSignature,
    source: SourceConfig,
    dataset: Arc<Dataset>,
}

/// Holds the last loaded dataset and hands out shared read-only references
/// to it until the source changes or the cache is invalidated.
#[derive(Debug, Default)]
pub struct DatasetCache {
    entry: Option<CacheEntry>,
}

impl DatasetCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached dataset if the file and loader settings are
    /// unchanged, otherwise load it again. Failed loads are never cached.
    pub fn get_or_load(&mut self, source: &SourceConfig) -> Result<Arc<Dataset>> {
        let signature = SourceSignature::of(&source.path)?;

        if let Some(entry) = &self.entry {
            if entry.signature == signature && entry.source == *source {
                log::debug!("Cache hit for {}", source.path.display());
                return Ok(Arc::clone(&entry.dataset));
            }
        }

        self.entry = None;
        let dataset = Arc::new(load_source(source)?);
        self.entry = Some(CacheEntry {
            signature,
            source: source.clone(),
            dataset: Arc::clone(&dataset),
        });
        Ok(dataset)
    }

    /// Drop the cached dataset; the next request reloads from disk.
    pub fn invalidate(&mut self) {
        if let Some(entry) = self.entry.take() {
            log::debug!("Invalidated cached dataset {}", entry.signature.path.display());
        }
    }
}
