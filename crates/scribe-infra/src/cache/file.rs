//! Durable snapshot store: one JSON file per key in a directory.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use scribe_core::ports::{Cache, CacheError};

/// Default directory for durable snapshots.
pub const DEFAULT_CACHE_DIR: &str = ".scribe-cache";

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredValue {
    value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    expires_at: Option<DateTime<Utc>>,
}

/// Survives process restarts. Writes go through a temp file and a rename so a
/// crash never leaves a half-written snapshot behind.
pub struct FileCache {
    dir: PathBuf,
}

impl FileCache {
    /// Open (and create if needed) the cache directory.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self, CacheError> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| CacheError::Connection(format!("{}: {e}", dir.display())))?;
        tracing::info!(dir = %dir.display(), "File cache ready");
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", encode_key(key)))
    }
}

/// Map a key to a file stem. ASCII alphanumerics and `-` pass through; every
/// other byte becomes `_xx`, so distinct keys never share a file.
fn encode_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for byte in key.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' {
            out.push(byte as char);
        } else {
            out.push_str(&format!("_{byte:02x}"));
        }
    }
    out
}

#[async_trait]
impl Cache for FileCache {
    async fn get(&self, key: &str) -> Option<String> {
        let path = self.path_for(key);
        let raw = match tokio::fs::read(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Cache read failed");
                return None;
            }
        };

        let stored: StoredValue = match serde_json::from_slice(&raw) {
            Ok(stored) => stored,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Discarding unreadable cache file");
                let _ = tokio::fs::remove_file(&path).await;
                return None;
            }
        };

        if stored.expires_at.is_some_and(|at| at < Utc::now()) {
            let _ = tokio::fs::remove_file(&path).await;
            return None;
        }
        Some(stored.value)
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), CacheError> {
        let expires_at = match ttl {
            Some(ttl) => Some(
                Utc::now()
                    + chrono::Duration::from_std(ttl)
                        .map_err(|e| CacheError::Operation(e.to_string()))?,
            ),
            None => None,
        };
        let stored = StoredValue {
            value: value.to_string(),
            expires_at,
        };
        let bytes =
            serde_json::to_vec(&stored).map_err(|e| CacheError::Serialization(e.to_string()))?;

        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &bytes)
            .await
            .map_err(|e| CacheError::Operation(e.to_string()))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| CacheError::Operation(e.to_string()))?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        match tokio::fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CacheError::Operation(e.to_string())),
        }
    }
}
