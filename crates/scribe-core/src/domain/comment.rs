use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Display name stored when the commenter has none.
pub const ANONYMOUS: &str = "Anonymous";

/// Comment entity - a reader's note attached to a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub post_id: String,
    pub user_id: String,
    /// Denormalized at write time; later profile renames do not touch it.
    pub user_name: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// The signed-in user posting a comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commenter {
    pub id: String,
    pub name: Option<String>,
}

impl Commenter {
    pub fn new(id: impl Into<String>, name: Option<String>) -> Self {
        Self {
            id: id.into(),
            name,
        }
    }
}

/// Comment ready to be written; `created_at` is stamped by the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewComment {
    pub post_id: String,
    pub user_id: String,
    pub user_name: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl NewComment {
    /// Build a comment from raw form input.
    pub fn compose(
        post_id: &str,
        commenter: &Commenter,
        content: &str,
        now: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(DomainError::Validation("comment is empty".to_string()));
        }
        if post_id.is_empty() {
            return Err(DomainError::Validation("postId is required".to_string()));
        }
        if commenter.id.is_empty() {
            return Err(DomainError::Unauthorized);
        }

        let user_name = commenter
            .name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(ANONYMOUS)
            .to_string();

        Ok(Self {
            post_id: post_id.to_string(),
            user_id: commenter.id.clone(),
            user_name,
            content: content.to_string(),
            created_at: now,
        })
    }
}
