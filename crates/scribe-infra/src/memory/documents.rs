//! Process-local post and comment collections.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use scribe_core::domain::{Comment, NewComment, NewPost, Post, PostFilter, PostPatch};
use scribe_core::error::RepoError;
use scribe_core::ports::{CommentRepository, PostRepository};

/// Posts keyed by slug. Used when no backend is configured.
#[derive(Default)]
pub struct InMemoryPostRepository {
    posts: RwLock<HashMap<String, Post>>,
}

impl InMemoryPostRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PostRepository for InMemoryPostRepository {
    async fn create(&self, post: NewPost) -> Result<Post, RepoError> {
        let mut posts = self.posts.write().await;
        if posts.contains_key(&post.slug) {
            return Err(RepoError::Conflict(format!(
                "document '{}' already exists",
                post.slug
            )));
        }
        let stored = Post {
            slug: post.slug,
            title: post.title,
            content: post.content,
            featured_image: post.featured_image,
            status: post.status,
            user_id: post.user_id,
            created_at: Utc::now(),
            updated_at: None,
        };
        posts.insert(stored.slug.clone(), stored.clone());
        Ok(stored)
    }

    async fn get(&self, slug: &str) -> Result<Option<Post>, RepoError> {
        Ok(self.posts.read().await.get(slug).cloned())
    }

    async fn update(&self, slug: &str, patch: PostPatch) -> Result<Post, RepoError> {
        let mut posts = self.posts.write().await;
        let post = posts.get_mut(slug).ok_or(RepoError::NotFound)?;
        patch.apply_to(post);
        post.updated_at = Some(Utc::now());
        Ok(post.clone())
    }

    async fn delete(&self, slug: &str) -> Result<(), RepoError> {
        self.posts
            .write()
            .await
            .remove(slug)
            .map(|_| ())
            .ok_or(RepoError::NotFound)
    }

    async fn list(&self, filter: &PostFilter) -> Result<Vec<Post>, RepoError> {
        Ok(self
            .posts
            .read()
            .await
            .values()
            .filter(|post| filter.matches(post))
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub struct InMemoryCommentRepository {
    comments: RwLock<Vec<Comment>>,
}

impl InMemoryCommentRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CommentRepository for InMemoryCommentRepository {
    async fn create(&self, comment: NewComment) -> Result<Comment, RepoError> {
        let stored = Comment {
            id: uuid::Uuid::new_v4().simple().to_string(),
            post_id: comment.post_id,
            user_id: comment.user_id,
            user_name: comment.user_name,
            content: comment.content,
            created_at: comment.created_at,
        };
        self.comments.write().await.push(stored.clone());
        Ok(stored)
    }

    async fn list_for_post(&self, post_id: &str) -> Result<Vec<Comment>, RepoError> {
        Ok(self
            .comments
            .read()
            .await
            .iter()
            .filter(|c| c.post_id == post_id)
            .cloned()
            .collect())
    }
}
