//! Error types for each layer.

use thiserror::Error;

/// Domain errors - business logic failures surfaced to callers.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound { entity_type: &'static str, id: String },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Duplicate entity: {0}")]
    Duplicate(String),

    #[error("Unauthorized access")]
    Unauthorized,

    #[error("Backend failure: {0}")]
    Backend(RepoError),
}

impl From<RepoError> for DomainError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::Conflict(msg) => DomainError::Duplicate(msg),
            other => DomainError::Backend(other),
        }
    }
}

/// Backend-facing errors, one variant per failure kind the remote store produces.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RepoError {
    /// Backend unreachable or answered with a server fault.
    #[error("Transport failure: {0}")]
    Transport(String),

    /// Round trip exceeded the configured deadline.
    #[error("Request timed out")]
    Timeout,

    #[error("Entity not found")]
    NotFound,

    /// Backend answered with data that does not match the expected shape.
    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error("Permission denied: {0}")]
    Permission(String),

    /// Unique key already taken (duplicate slug).
    #[error("Conflict: {0}")]
    Conflict(String),
}

impl RepoError {
    /// Transport-class failures: worth retrying, never a semantic answer.
    pub fn is_transport(&self) -> bool {
        matches!(self, RepoError::Transport(_) | RepoError::Timeout)
    }
}

/// Reasons an author lookup produced no profile.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("user id is empty")]
    EmptyUserId,

    #[error("function invocation failed: {0}")]
    Invocation(RepoError),

    #[error("execution envelope is not valid JSON: {0}")]
    InvalidEnvelope(String),

    #[error("execution envelope has no response body")]
    MissingBody,

    #[error("response body is not valid JSON: {0}")]
    InvalidBody(String),

    #[error("function reported failure: {0}")]
    Rejected(String),

    #[error("function reply has no usable user record")]
    MissingUser,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_maps_to_duplicate() {
        let err: DomainError = RepoError::Conflict("slug taken".into()).into();
        assert!(matches!(err, DomainError::Duplicate(msg) if msg == "slug taken"));
    }

    #[test]
    fn timeout_is_transport_not_not_found() {
        assert!(RepoError::Timeout.is_transport());
        assert!(!RepoError::NotFound.is_transport());
        let err: DomainError = RepoError::Timeout.into();
        assert!(matches!(err, DomainError::Backend(RepoError::Timeout)));
    }
}
