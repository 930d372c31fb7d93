//! Shared HTTP transport for the backend adapters.

use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use scribe_core::error::RepoError;

use super::config::BackendConfig;

const PROJECT_HEADER: &str = "X-Appwrite-Project";
const KEY_HEADER: &str = "X-Appwrite-Key";
const JWT_HEADER: &str = "X-Appwrite-JWT";

/// Error body the backend sends with non-2xx responses.
#[derive(Debug, Default, Deserialize)]
struct BackendFault {
    #[serde(default)]
    message: String,
    #[serde(default, rename = "type")]
    kind: String,
}

/// Configured handle to the remote document store, bucket and functions.
///
/// Every request carries the project header and the caller's credentials and
/// is bounded by the configured timeout.
#[derive(Debug, Clone)]
pub struct BackendClient {
    http: Client,
    config: BackendConfig,
}

impl BackendClient {
    pub fn new(config: BackendConfig) -> Result<Self, RepoError> {
        let mut headers = HeaderMap::new();
        headers.insert(PROJECT_HEADER, header_value(&config.project_id)?);
        if let Some(key) = &config.api_key {
            headers.insert(KEY_HEADER, header_value(key)?);
        } else if let Some(jwt) = &config.jwt {
            headers.insert(JWT_HEADER, header_value(jwt)?);
        }

        let http = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .user_agent(concat!("scribe/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| RepoError::Transport(e.to_string()))?;

        tracing::info!(endpoint = %config.endpoint(), project = %config.project_id, "Backend client ready");
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    pub fn http(&self) -> &Client {
        &self.http
    }

    /// Absolute URL for an API path.
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.endpoint(), path.trim_start_matches('/'))
    }

    /// Absolute URL for an API path followed by caller-supplied ids.
    ///
    /// Each id becomes exactly one escaped path segment. Empty, dot and
    /// pre-escaped segments address no resource and are reported as not found.
    pub fn resource_url(&self, path: &str, segments: &[&str]) -> Result<Url, RepoError> {
        let mut url = Url::parse(&self.url(path))
            .map_err(|e| RepoError::Transport(format!("invalid backend url: {e}")))?;
        {
            let mut parts = url
                .path_segments_mut()
                .map_err(|()| RepoError::Transport("backend url cannot take a path".to_string()))?;
            for segment in segments {
                if segment.is_empty() || matches!(*segment, "." | "..") || segment.contains('%') {
                    return Err(RepoError::NotFound);
                }
                parts.push(segment);
            }
        }
        Ok(url)
    }

    /// Send and require a success status.
    pub async fn send(&self, request: RequestBuilder) -> Result<Response, RepoError> {
        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let fault: BackendFault = serde_json::from_str(&body).unwrap_or_default();
        tracing::debug!(status = %status, kind = %fault.kind, message = %fault.message, "Backend rejected request");
        Err(status_error(status, fault.message))
    }

    /// Send and decode a JSON body.
    pub async fn json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, RepoError> {
        let bytes = self
            .send(request)
            .await?
            .bytes()
            .await
            .map_err(transport_error)?;
        serde_json::from_slice(&bytes).map_err(|e| RepoError::Malformed(e.to_string()))
    }

    /// Send and return the body untouched.
    pub async fn text(&self, request: RequestBuilder) -> Result<String, RepoError> {
        self.send(request)
            .await?
            .text()
            .await
            .map_err(transport_error)
    }
}

fn header_value(value: &str) -> Result<HeaderValue, RepoError> {
    HeaderValue::from_str(value)
        .map_err(|e| RepoError::Transport(format!("invalid header value: {e}")))
}

fn transport_error(err: reqwest::Error) -> RepoError {
    if err.is_timeout() {
        RepoError::Timeout
    } else {
        RepoError::Transport(err.to_string())
    }
}

fn status_error(status: StatusCode, message: String) -> RepoError {
    let message = if message.is_empty() {
        status.to_string()
    } else {
        message
    };
    match status {
        StatusCode::NOT_FOUND => RepoError::NotFound,
        StatusCode::CONFLICT => RepoError::Conflict(message),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => RepoError::Permission(message),
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => RepoError::Timeout,
        _ => RepoError::Transport(format!("{status}: {message}")),
    }
}
