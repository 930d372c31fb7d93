use async_trait::async_trait;

use crate::domain::{Comment, NewComment, NewPost, Post, PostFilter, PostPatch};
use crate::error::RepoError;

/// Post documents keyed by slug.
///
/// Implementations report every failure kind faithfully; the degrade-to-empty
/// policy for reads belongs to the services above this port.
#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Create a post under its slug. A taken slug is `RepoError::Conflict`.
    async fn create(&self, post: NewPost) -> Result<Post, RepoError>;

    /// Fetch a post. Absence is `Ok(None)`, not an error.
    async fn get(&self, slug: &str) -> Result<Option<Post>, RepoError>;

    /// Apply a partial update and return the stored result.
    async fn update(&self, slug: &str, patch: PostPatch) -> Result<Post, RepoError>;

    /// Delete the document only. Attachments are the caller's concern.
    async fn delete(&self, slug: &str) -> Result<(), RepoError>;

    /// Posts matching `filter`, in no particular order.
    async fn list(&self, filter: &PostFilter) -> Result<Vec<Post>, RepoError>;
}

/// Comments scoped to a post.
#[async_trait]
pub trait CommentRepository: Send + Sync {
    async fn create(&self, comment: NewComment) -> Result<Comment, RepoError>;

    async fn list_for_post(&self, post_id: &str) -> Result<Vec<Comment>, RepoError>;
}
