//! Backend connection settings.

use std::env;
use std::time::Duration;

/// Default per-request deadline.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default page size for list queries.
pub const DEFAULT_LIST_LIMIT: u32 = 100;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required setting {0}")]
    Missing(&'static str),

    #[error("invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Where the document store, bucket and user-lookup function live.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// API root, e.g. `https://cloud.example.com/v1`.
    pub endpoint: String,
    pub project_id: String,
    /// Server API key. Mutually usable with `jwt`; the key wins when both are set.
    pub api_key: Option<String>,
    /// Session JWT of the signed-in user.
    pub jwt: Option<String>,
    pub database_id: String,
    pub posts_collection_id: String,
    pub comments_collection_id: String,
    pub bucket_id: String,
    pub author_function_id: String,
    pub timeout: Duration,
    pub list_limit: u32,
}

impl BackendConfig {
    /// Load from `BACKEND_*` environment variables.
    ///
    /// Returns `Ok(None)` when `BACKEND_URL` is unset, so callers can fall back
    /// to the in-memory backend.
    pub fn from_env() -> Result<Option<Self>, ConfigError> {
        let Ok(endpoint) = env::var("BACKEND_URL") else {
            return Ok(None);
        };

        let required = |name: &'static str| env::var(name).map_err(|_| ConfigError::Missing(name));

        let timeout = match env::var("BACKEND_TIMEOUT_SECS") {
            Ok(raw) => Duration::from_secs(raw.parse().map_err(|_| ConfigError::Invalid {
                name: "BACKEND_TIMEOUT_SECS",
                value: raw.clone(),
            })?),
            Err(_) => DEFAULT_TIMEOUT,
        };

        Ok(Some(Self {
            endpoint,
            project_id: required("BACKEND_PROJECT_ID")?,
            api_key: env::var("BACKEND_API_KEY").ok().filter(|v| !v.is_empty()),
            jwt: env::var("BACKEND_JWT").ok().filter(|v| !v.is_empty()),
            database_id: required("BACKEND_DATABASE_ID")?,
            posts_collection_id: required("BACKEND_POSTS_COLLECTION_ID")?,
            comments_collection_id: required("BACKEND_COMMENTS_COLLECTION_ID")?,
            bucket_id: required("BACKEND_BUCKET_ID")?,
            author_function_id: required("BACKEND_AUTHOR_FUNCTION_ID")?,
            timeout,
            list_limit: env::var("BACKEND_LIST_LIMIT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_LIST_LIMIT),
        }))
    }

    /// Settings pointing at `endpoint` with placeholder ids; handy for tests.
    pub fn for_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            project_id: "scribe".to_string(),
            api_key: None,
            jwt: None,
            database_id: "blog".to_string(),
            posts_collection_id: "posts".to_string(),
            comments_collection_id: "comments".to_string(),
            bucket_id: "images".to_string(),
            author_function_id: "get-author".to_string(),
            timeout: DEFAULT_TIMEOUT,
            list_limit: DEFAULT_LIST_LIMIT,
        }
    }

    pub fn endpoint(&self) -> &str {
        self.endpoint.trim_end_matches('/')
    }
}
