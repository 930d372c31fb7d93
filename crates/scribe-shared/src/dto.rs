//! Data Transfer Objects - request/response types for the gateway API.
//!
//! Field names are camelCase on the wire to match the stored documents.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Request to publish a post. The slug becomes the document id.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostRequest {
    pub slug: String,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub featured_image: Option<String>,
    /// `draft` or `active`; defaults to `active`.
    #[serde(default)]
    pub status: Option<String>,
}

/// Partial update. Absent fields are left untouched; a `null` image clears it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePostRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "::serde_with::rust::double_option"
    )]
    pub featured_image: Option<Option<String>>,
    #[serde(default)]
    pub status: Option<String>,
}

/// Query string of the listing endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListPostsQuery {
    /// `draft`, `active` or `all`; defaults to `active`.
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
}

/// Full post as shown on the post page.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostResponse {
    pub slug: String,
    pub title: String,
    pub content: String,
    pub featured_image: Option<String>,
    pub featured_image_url: Option<String>,
    pub status: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub read_time_minutes: usize,
}

/// One entry of the listing view.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostCardResponse {
    pub slug: String,
    pub title: String,
    pub summary: String,
    pub featured_image_url: Option<String>,
    pub status: String,
    pub author_id: String,
    pub author_name: String,
    pub created_at: DateTime<Utc>,
    pub read_time_minutes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingResponse {
    pub items: Vec<PostCardResponse>,
    /// When the served snapshot was fetched; `None` when nothing was cached.
    pub fetched_at: Option<DateTime<Utc>>,
    /// `fresh`, `stale` (a refresh is under way) or `empty`.
    pub cache: String,
}

/// Result of deleting a post and its featured image.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletePostResponse {
    pub slug: String,
    /// `none`, `released` or `orphaned`.
    pub attachment: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCommentRequest {
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentResponse {
    pub id: String,
    pub post_id: String,
    pub user_id: String,
    pub user_name: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorResponse {
    pub user_id: String,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileUrlsResponse {
    pub preview: String,
    pub view: String,
    pub download: String,
}

/// Uploaded featured image.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileResponse {
    pub id: String,
    pub name: String,
    pub mime_type: Option<String>,
    pub size: u64,
    pub urls: FileUrlsResponse,
}
