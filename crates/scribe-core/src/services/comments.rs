//! Comments attached to a post.

use std::sync::Arc;

use crate::domain::{Comment, Commenter, NewComment};
use crate::error::DomainError;
use crate::ports::{Clock, CommentRepository};

pub struct CommentService {
    comments: Arc<dyn CommentRepository>,
    clock: Arc<dyn Clock>,
}

impl CommentService {
    pub fn new(comments: Arc<dyn CommentRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { comments, clock }
    }

    /// Comments for a post, newest first. Failures degrade to an empty list.
    pub async fn list(&self, post_id: &str) -> Vec<Comment> {
        match self.comments.list_for_post(post_id).await {
            Ok(mut comments) => {
                comments.sort_by(|a, b| b.created_at.cmp(&a.created_at));
                comments
            }
            Err(e) => {
                tracing::warn!(post_id = %post_id, error = %e, "Failed to list comments");
                Vec::new()
            }
        }
    }

    /// Write a comment stamped with the current time.
    pub async fn add(
        &self,
        post_id: &str,
        commenter: &Commenter,
        content: &str,
    ) -> Result<Comment, DomainError> {
        let comment = NewComment::compose(post_id, commenter, content, self.clock.now())?;
        let created = self.comments.create(comment).await.map_err(|e| {
            tracing::warn!(post_id = %post_id, error = %e, "Failed to create comment");
            DomainError::from(e)
        })?;
        tracing::info!(post_id = %post_id, comment_id = %created.id, "Comment added");
        Ok(created)
    }
}

/// In-memory comment list for one post view.
#[derive(Debug, Clone, Default)]
pub struct CommentThread {
    post_id: String,
    comments: Vec<Comment>,
}

impl CommentThread {
    pub async fn load(service: &CommentService, post_id: &str) -> Self {
        Self {
            post_id: post_id.to_string(),
            comments: service.list(post_id).await,
        }
    }

    pub fn post_id(&self) -> &str {
        &self.post_id
    }

    pub fn comments(&self) -> &[Comment] {
        &self.comments
    }

    /// Submit a comment; on confirmed success it goes to the head of the
    /// list, on failure the list is left untouched.
    pub async fn submit(
        &mut self,
        service: &CommentService,
        commenter: &Commenter,
        content: &str,
    ) -> Result<&Comment, DomainError> {
        let created = service.add(&self.post_id, commenter, content).await?;
        self.comments.insert(0, created);
        Ok(&self.comments[0])
    }
}
