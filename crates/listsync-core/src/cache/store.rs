//! Contact cache persistence.
//!
//! The whole cache is one JSON document, written and read in a single
//! operation. There is no format versioning: when [`Contact`] changes shape,
//! rebuild the cache with a full sync.
//!
//! [`Contact`]: crate::api::Contact

use std::path::{Path, PathBuf};

use super::ContactCache;
use crate::error::CacheError;

/// Cache file at a fixed location.
#[derive(Debug, Clone)]
pub struct CacheStore {
    path: PathBuf,
}

impl CacheStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Overwrite the cache file with `cache`.
    ///
    /// A failed write may leave a truncated file behind; a later full sync
    /// replaces it.
    pub fn save(&self, cache: &ContactCache) -> Result<(), CacheError> {
        let content = serde_json::to_vec_pretty(cache).map_err(CacheError::Encode)?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| CacheError::Write {
                path: self.path.clone(),
                source,
            })?;
        }
        std::fs::write(&self.path, content).map_err(|source| CacheError::Write {
            path: self.path.clone(),
            source,
        })
    }

    /// Read the whole cache.
    pub fn load(&self) -> Result<ContactCache, CacheError> {
        let content = std::fs::read(&self.path).map_err(|source| CacheError::Read {
            path: self.path.clone(),
            source,
        })?;
        serde_json::from_slice(&content).map_err(|source| CacheError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }
}
