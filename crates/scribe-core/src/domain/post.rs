use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Longest id the backend accepts for documents, files and users.
pub const MAX_SLUG_LEN: usize = 36;

const SUMMARY_WORDS: usize = 20;
const WORDS_PER_MINUTE: usize = 200;

/// Publication state of a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    Draft,
    Active,
}

impl PostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostStatus::Draft => "draft",
            PostStatus::Active => "active",
        }
    }
}

impl fmt::Display for PostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PostStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(PostStatus::Draft),
            "active" => Ok(PostStatus::Active),
            other => Err(DomainError::Validation(format!("unknown post status '{other}'"))),
        }
    }
}

/// Post entity - a blog article addressed by its slug.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub slug: String,
    pub title: String,
    /// Rich HTML body.
    pub content: String,
    /// Object id of the featured image, if one was uploaded.
    pub featured_image: Option<String>,
    pub status: PostStatus,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Post {
    /// First words of the content with markup removed, for cards.
    pub fn summary(&self) -> String {
        strip_tags(&self.content)
            .split_whitespace()
            .take(SUMMARY_WORDS)
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Estimated reading time in whole minutes, never less than one.
    pub fn read_time_minutes(&self) -> usize {
        let words = strip_tags(&self.content).split_whitespace().count();
        words.div_ceil(WORDS_PER_MINUTE).max(1)
    }

    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.user_id == user_id
    }
}

/// Input for creating a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPost {
    pub slug: String,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub featured_image: Option<String>,
    pub status: PostStatus,
    pub user_id: String,
}

impl NewPost {
    /// Check required fields and the slug shape before any round trip.
    pub fn validate(&self) -> Result<(), DomainError> {
        validate_slug(&self.slug)?;
        if let Some(image) = &self.featured_image {
            validate_object_id(image)?;
        }
        if self.title.trim().is_empty() {
            return Err(DomainError::Validation("title is required".to_string()));
        }
        if self.content.trim().is_empty() {
            return Err(DomainError::Validation("content is required".to_string()));
        }
        if self.user_id.trim().is_empty() {
            return Err(DomainError::Validation("userId is required".to_string()));
        }
        Ok(())
    }
}

/// Partial update. Owner and creation time are not representable here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// `Some(None)` clears the image; serialized as `null`.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "::serde_with::rust::double_option"
    )]
    pub featured_image: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<PostStatus>,
}

impl PostPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.content.is_none()
            && self.featured_image.is_none()
            && self.status.is_none()
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.is_empty() {
            return Err(DomainError::Validation("update has no fields".to_string()));
        }
        if matches!(&self.title, Some(t) if t.trim().is_empty()) {
            return Err(DomainError::Validation("title cannot be blank".to_string()));
        }
        if matches!(&self.content, Some(c) if c.trim().is_empty()) {
            return Err(DomainError::Validation("content cannot be blank".to_string()));
        }
        if let Some(Some(image)) = &self.featured_image {
            validate_object_id(image)?;
        }
        Ok(())
    }

    /// Apply onto an existing post (used by stores that patch locally).
    pub fn apply_to(&self, post: &mut Post) {
        if let Some(title) = &self.title {
            post.title = title.clone();
        }
        if let Some(content) = &self.content {
            post.content = content.clone();
        }
        if let Some(image) = &self.featured_image {
            post.featured_image = image.clone();
        }
        if let Some(status) = self.status {
            post.status = status;
        }
    }
}

/// Listing filter. Defaults to active posts from every author.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostFilter {
    pub status: Option<PostStatus>,
    pub user_id: Option<String>,
}

impl Default for PostFilter {
    fn default() -> Self {
        Self {
            status: Some(PostStatus::Active),
            user_id: None,
        }
    }
}

impl PostFilter {
    /// No constraints at all, drafts included.
    pub fn all() -> Self {
        Self {
            status: None,
            user_id: None,
        }
    }

    pub fn by_author(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn matches(&self, post: &Post) -> bool {
        self.status.is_none_or(|s| post.status == s)
            && self.user_id.as_deref().is_none_or(|u| post.user_id == u)
    }

    /// Stable textual key identifying this filter, used for cache slots.
    ///
    /// `*` stands for "any"; an author id is escaped so no id renders as `*`
    /// or smuggles in a separator.
    pub fn signature(&self) -> String {
        format!(
            "status={};author={}",
            self.status.map(|s| s.as_str()).unwrap_or("*"),
            self.user_id
                .as_deref()
                .map(escape_signature_part)
                .unwrap_or_else(|| "*".to_string()),
        )
    }
}

fn escape_signature_part(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '%' => out.push_str("%25"),
            '*' => out.push_str("%2A"),
            ';' => out.push_str("%3B"),
            '=' => out.push_str("%3D"),
            _ => out.push(c),
        }
    }
    out
}

/// Slugs double as document keys: 1-36 chars of `[A-Za-z0-9._-]`,
/// not starting with a special character.
pub fn validate_slug(slug: &str) -> Result<(), DomainError> {
    validate_key("slug", slug)
}

/// Object ids follow the document key rules; they end up in URL paths.
pub fn validate_object_id(id: &str) -> Result<(), DomainError> {
    validate_key("object id", id)
}

/// User ids follow the document key rules.
pub fn validate_user_id(id: &str) -> Result<(), DomainError> {
    validate_key("user id", id)
}

fn validate_key(kind: &str, key: &str) -> Result<(), DomainError> {
    if key.is_empty() {
        return Err(DomainError::Validation(format!("{kind} is required")));
    }
    if key.len() > MAX_SLUG_LEN {
        return Err(DomainError::Validation(format!(
            "{kind} must be at most {MAX_SLUG_LEN} characters"
        )));
    }
    if key.starts_with(['.', '-', '_']) {
        return Err(DomainError::Validation(format!(
            "{kind} cannot start with a special character"
        )));
    }
    if !key
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
    {
        return Err(DomainError::Validation(format!(
            "{kind} '{key}' contains invalid characters"
        )));
    }
    Ok(())
}

/// Order posts newest first. Ties fall back to slug so output is deterministic.
pub fn sort_by_recency(posts: &mut [Post]) {
    posts.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| a.slug.cmp(&b.slug))
    });
}

fn strip_tags(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => {
                in_tag = true;
                out.push(' ');
            }
            '>' if in_tag => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}
