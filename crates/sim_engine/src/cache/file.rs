//! Shared cache tier: a directory of JSON entry files.
//!
//! Each entry records its absolute expiry so several processes can share
//! one directory. Writes go through a temporary file and a rename.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;
use uuid::Uuid;

use super::CacheBackend;
use crate::error::CacheError;

#[derive(Serialize, Deserialize)]
struct StoredEntry {
    /// Unix milliseconds after which the entry is stale
    expires_at_ms: i64,
    value: String,
}

/// File-backed cache tier.
#[derive(Debug, Clone)]
pub struct FileCache {
    dir: PathBuf,
}

impl FileCache {
    /// Cache rooted at `dir`; the directory is created on first ping or write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Root directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn entry_path(&self, key: &str) -> Result<PathBuf, CacheError> {
        if key.is_empty() || !key.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(CacheError::Corrupt(format!("invalid cache key: {:?}", key)));
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }

    /// Deletes every expired entry and returns how many were removed.
    pub fn purge_expired(&self) -> Result<usize, CacheError> {
        let now = Utc::now().timestamp_millis();
        let mut removed = 0;
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let stale = match fs::read_to_string(&path)
                .ok()
                .and_then(|text| serde_json::from_str::<StoredEntry>(&text).ok())
            {
                Some(stored) => stored.expires_at_ms <= now,
                None => true,
            };
            if stale && fs::remove_file(&path).is_ok() {
                removed += 1;
            }
        }
        Ok(removed)
    }
}

impl CacheBackend for FileCache {
    fn name(&self) -> &str {
        "file"
    }

    fn ping(&self) -> Result<(), CacheError> {
        fs::create_dir_all(&self.dir).map_err(|e| CacheError::Unavailable {
            backend: self.name().to_string(),
            reason: format!("{}: {}", self.dir.display(), e),
        })?;
        if fs::metadata(&self.dir)?.permissions().readonly() {
            return Err(CacheError::Unavailable {
                backend: self.name().to_string(),
                reason: format!("{} is read-only", self.dir.display()),
            });
        }
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let path = self.entry_path(key)?;
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let stored: StoredEntry =
            serde_json::from_str(&text).map_err(|e| CacheError::Corrupt(e.to_string()))?;

        if stored.expires_at_ms <= Utc::now().timestamp_millis() {
            // Another process may already have removed it.
            let _ = fs::remove_file(&path);
            return Ok(None);
        }
        Ok(Some(stored.value))
    }

    fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let path = self.entry_path(key)?;
        let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
        let stored = StoredEntry {
            expires_at_ms: Utc::now().timestamp_millis().saturating_add(ttl_ms),
            value: value.to_string(),
        };
        let text = serde_json::to_string(&stored).map_err(|e| CacheError::Corrupt(e.to_string()))?;

        fs::create_dir_all(&self.dir)?;
        let tmp = self.dir.join(format!(".{}.{}.tmp", key, Uuid::new_v4().simple()));
        fs::write(&tmp, text)?;
        fs::rename(&tmp, &path).map_err(|e| {
            let _ = fs::remove_file(&tmp);
            CacheError::from(e)
        })
    }
}
