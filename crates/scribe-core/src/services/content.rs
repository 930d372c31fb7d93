//! Post lifecycle: reads with graceful degradation, typed results for writes,
//! and the two-step delete that also releases the featured image.

use std::sync::Arc;

use serde::Serialize;

use crate::domain::{NewPost, ObjectUpload, Post, PostPatch, validate_slug};
use crate::error::{DomainError, RepoError};
use crate::ports::PostRepository;

use super::listing::ListingCache;
use super::media::MediaLibrary;

/// What happened to a deleted post's image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "objectId", rename_all = "camelCase")]
pub enum AttachmentCleanup {
    NoAttachment,
    Released(String),
    /// Document is gone but the object delete failed; nothing retries it.
    Orphaned(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteOutcome {
    pub slug: String,
    pub attachment: AttachmentCleanup,
}

pub struct ContentService {
    posts: Arc<dyn PostRepository>,
    media: Arc<MediaLibrary>,
    listing: Option<Arc<ListingCache>>,
}

impl ContentService {
    pub fn new(posts: Arc<dyn PostRepository>, media: Arc<MediaLibrary>) -> Self {
        Self {
            posts,
            media,
            listing: None,
        }
    }

    /// Invalidate this listing cache after every successful mutation.
    pub fn with_listing(mut self, listing: Arc<ListingCache>) -> Self {
        self.listing = Some(listing);
        self
    }

    pub fn media(&self) -> &MediaLibrary {
        &self.media
    }

    /// Fetch a post. Not-found, a malformed slug and every backend failure
    /// yield `None`.
    pub async fn get_post(&self, slug: &str) -> Option<Post> {
        if validate_slug(slug).is_err() {
            tracing::debug!(slug = %slug, "Ignoring lookup of malformed slug");
            return None;
        }
        match self.posts.get(slug).await {
            Ok(post) => post,
            Err(e) => {
                tracing::warn!(slug = %slug, error = %e, "Failed to fetch post");
                None
            }
        }
    }

    pub async fn create_post(&self, post: NewPost) -> Result<Post, DomainError> {
        post.validate()?;
        let slug = post.slug.clone();
        let created = self.posts.create(post).await.map_err(|e| {
            tracing::warn!(slug = %slug, error = %e, "Failed to create post");
            DomainError::from(e)
        })?;
        tracing::info!(slug = %created.slug, "Post created");
        self.after_mutation().await;
        Ok(created)
    }

    /// Upload the image first, then create the post referencing it. A failed
    /// upload aborts before any document exists; a failed create tries to
    /// release the freshly uploaded image.
    pub async fn publish(
        &self,
        mut post: NewPost,
        image: Option<ObjectUpload>,
    ) -> Result<Post, DomainError> {
        post.validate()?;
        let Some(image) = image else {
            return self.create_post(post).await;
        };

        let object = self.media.upload(image).await.ok_or_else(|| {
            DomainError::Backend(RepoError::Transport("image upload failed".to_string()))
        })?;
        post.featured_image = Some(object.id.clone());

        match self.create_post(post).await {
            Ok(created) => Ok(created),
            Err(e) => {
                if !self.media.delete(&object.id).await {
                    tracing::warn!(object_id = %object.id, "Image left orphaned by failed publish");
                }
                Err(e)
            }
        }
    }

    /// Update a post owned by `actor`. An image replaced or cleared by the
    /// patch is released once the document update succeeded.
    pub async fn update_post(
        &self,
        slug: &str,
        actor: &str,
        patch: PostPatch,
    ) -> Result<Post, DomainError> {
        patch.validate()?;
        let current = self.owned_post(slug, actor).await?;
        let replaced = match (&patch.featured_image, current.featured_image) {
            (Some(next), Some(old)) if next.as_deref() != Some(old.as_str()) => Some(old),
            _ => None,
        };

        let updated = self.posts.update(slug, patch).await.map_err(|e| {
            tracing::warn!(slug = %slug, error = %e, "Failed to update post");
            match e {
                RepoError::NotFound => not_found(slug),
                other => DomainError::from(other),
            }
        })?;
        tracing::info!(slug = %slug, "Post updated");
        self.after_mutation().await;

        if let Some(object_id) = replaced {
            if !self.media.delete(&object_id).await {
                tracing::warn!(slug = %slug, object_id = %object_id, "Replaced image remains");
            }
        }
        Ok(updated)
    }

    /// Delete the document, then, only once that succeeded, its image.
    ///
    /// The two remote calls are not atomic. An image delete failure does not
    /// undo the document delete; it is reported as [`AttachmentCleanup::Orphaned`].
    pub async fn delete_post(&self, slug: &str, actor: &str) -> Result<DeleteOutcome, DomainError> {
        let post = self.owned_post(slug, actor).await?;

        self.posts.delete(slug).await.map_err(|e| {
            tracing::warn!(slug = %slug, error = %e, "Failed to delete post");
            match e {
                RepoError::NotFound => not_found(slug),
                other => DomainError::from(other),
            }
        })?;
        tracing::info!(slug = %slug, "Post deleted");
        self.after_mutation().await;

        let attachment = match post.featured_image {
            None => AttachmentCleanup::NoAttachment,
            Some(object_id) => {
                if self.media.delete(&object_id).await {
                    AttachmentCleanup::Released(object_id)
                } else {
                    tracing::warn!(slug = %slug, object_id = %object_id, "Post deleted but image remains");
                    AttachmentCleanup::Orphaned(object_id)
                }
            }
        };

        Ok(DeleteOutcome {
            slug: slug.to_string(),
            attachment,
        })
    }

    async fn owned_post(&self, slug: &str, actor: &str) -> Result<Post, DomainError> {
        validate_slug(slug).map_err(|_| not_found(slug))?;
        let post = self
            .posts
            .get(slug)
            .await
            .map_err(DomainError::from)?
            .ok_or_else(|| not_found(slug))?;
        if !post.is_owned_by(actor) {
            tracing::warn!(slug = %slug, actor = %actor, "Rejected mutation by non-owner");
            return Err(DomainError::Unauthorized);
        }
        Ok(post)
    }

    async fn after_mutation(&self) {
        if let Some(listing) = &self.listing {
            listing.invalidate_all().await;
        }
    }
}

fn not_found(slug: &str) -> DomainError {
    DomainError::NotFound {
        entity_type: "post",
        id: slug.to_string(),
    }
}
