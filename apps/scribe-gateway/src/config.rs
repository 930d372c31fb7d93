//! Gateway configuration loaded from environment variables.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::Context;

use scribe_core::services::{DEFAULT_AUTHOR_TTL, DEFAULT_LISTING_TTL};
use scribe_infra::BackendConfig;
use scribe_infra::cache::DEFAULT_CACHE_DIR;

/// Largest accepted image upload.
const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Cap on images streamed through multipart forms, registered as app data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadLimit(pub usize);

impl Default for UploadLimit {
    fn default() -> Self {
        Self(DEFAULT_MAX_UPLOAD_BYTES)
    }
}

/// Where listing snapshots are persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheBackend {
    File,
    Memory,
    Redis,
}

impl FromStr for CacheBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "file" => Ok(Self::File),
            "memory" => Ok(Self::Memory),
            "redis" => Ok(Self::Redis),
            other => anyhow::bail!("unknown CACHE_BACKEND '{other}' (expected file, memory or redis)"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
    pub listing_ttl: Duration,
    pub author_ttl: Duration,
    pub cache_backend: CacheBackend,
    pub cache_dir: PathBuf,
    pub max_upload_bytes: usize,
    /// `None` runs the gateway on the in-memory backend.
    pub backend: Option<BackendConfig>,
}

impl GatewayConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let backend = BackendConfig::from_env().context("invalid backend configuration")?;
        let cache_backend = match env::var("CACHE_BACKEND") {
            Ok(raw) => raw.parse()?,
            Err(_) => CacheBackend::File,
        };

        Ok(Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: parsed("PORT")?.unwrap_or(8080),
            listing_ttl: parsed("LISTING_CACHE_TTL_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_LISTING_TTL),
            author_ttl: parsed("AUTHOR_CACHE_TTL_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_AUTHOR_TTL),
            cache_backend,
            cache_dir: env::var("LISTING_CACHE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_CACHE_DIR)),
            max_upload_bytes: parsed("MAX_UPLOAD_BYTES")?.unwrap_or(DEFAULT_MAX_UPLOAD_BYTES),
            backend,
        })
    }
}

/// Read and parse an optional variable. Unset is `None`; unparsable is an error.
fn parsed<T>(name: &str) -> anyhow::Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .with_context(|| format!("invalid value for {name}: {raw}")),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_backend_names() {
        assert_eq!("file".parse::<CacheBackend>().unwrap(), CacheBackend::File);
        assert_eq!("Memory".parse::<CacheBackend>().unwrap(), CacheBackend::Memory);
        assert_eq!("REDIS".parse::<CacheBackend>().unwrap(), CacheBackend::Redis);
        assert!("sqlite".parse::<CacheBackend>().is_err());
    }
}
