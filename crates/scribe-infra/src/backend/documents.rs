//! Post and comment repositories over the remote document store.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use scribe_core::domain::{Comment, NewComment, NewPost, Post, PostFilter, PostPatch, PostStatus};
use scribe_core::error::RepoError;
use scribe_core::ports::{CommentRepository, PostRepository};

use super::client::BackendClient;

/// Id mode asking the server to issue a unique id.
pub(crate) const UNIQUE_ID: &str = "unique()";

/// Page of documents as returned by list calls.
#[derive(Debug, Deserialize)]
struct DocumentList<T> {
    #[serde(default)]
    total: u64,
    documents: Vec<T>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateDocument<'a, T> {
    document_id: &'a str,
    data: T,
}

#[derive(Debug, Serialize)]
struct UpdateDocument<T> {
    data: T,
}

/// Stored shape of a post document.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PostDocument {
    #[serde(rename = "$id")]
    id: String,
    #[serde(rename = "$createdAt")]
    created_at: DateTime<Utc>,
    #[serde(rename = "$updatedAt", default)]
    updated_at: Option<DateTime<Utc>>,
    title: String,
    content: String,
    #[serde(default)]
    featured_image: Option<String>,
    status: PostStatus,
    user_id: String,
}

impl From<PostDocument> for Post {
    fn from(doc: PostDocument) -> Self {
        Self {
            slug: doc.id,
            title: doc.title,
            content: doc.content,
            featured_image: doc.featured_image.filter(|id| !id.is_empty()),
            status: doc.status,
            user_id: doc.user_id,
            created_at: doc.created_at,
            updated_at: doc.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PostFields<'a> {
    title: &'a str,
    content: &'a str,
    featured_image: Option<&'a str>,
    status: PostStatus,
    user_id: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommentDocument {
    #[serde(rename = "$id")]
    id: String,
    post_id: String,
    user_id: String,
    #[serde(default)]
    user_name: String,
    content: String,
    /// Client-stamped; falls back to the server timestamp for legacy rows.
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
    #[serde(rename = "$createdAt")]
    server_created_at: DateTime<Utc>,
}

impl From<CommentDocument> for Comment {
    fn from(doc: CommentDocument) -> Self {
        Self {
            id: doc.id,
            post_id: doc.post_id,
            user_id: doc.user_id,
            user_name: doc.user_name,
            content: doc.content,
            created_at: doc.created_at.unwrap_or(doc.server_created_at),
        }
    }
}

fn equal(attribute: &str, value: &str) -> String {
    json!({ "method": "equal", "attribute": attribute, "values": [value] }).to_string()
}

fn limit(n: u32) -> String {
    json!({ "method": "limit", "values": [n] }).to_string()
}

fn documents_path(client: &BackendClient, collection_id: &str) -> String {
    let config = client.config();
    format!(
        "databases/{}/collections/{}/documents",
        config.database_id, collection_id
    )
}

/// Posts collection; the slug is the document id.
pub struct DocumentPostRepository {
    client: Arc<BackendClient>,
    path: String,
}

impl DocumentPostRepository {
    pub fn new(client: Arc<BackendClient>) -> Self {
        let path = documents_path(&client, &client.config().posts_collection_id);
        Self { client, path }
    }

    fn document_url(&self, slug: &str) -> Result<reqwest::Url, RepoError> {
        self.client.resource_url(&self.path, &[slug])
    }
}

#[async_trait]
impl PostRepository for DocumentPostRepository {
    async fn create(&self, post: NewPost) -> Result<Post, RepoError> {
        let body = CreateDocument {
            document_id: &post.slug,
            data: PostFields {
                title: &post.title,
                content: &post.content,
                featured_image: post.featured_image.as_deref(),
                status: post.status,
                user_id: &post.user_id,
            },
        };
        let request = self
            .client
            .http()
            .post(self.client.url(&self.path))
            .json(&body);
        let doc: PostDocument = self.client.json(request).await?;
        Ok(doc.into())
    }

    async fn get(&self, slug: &str) -> Result<Option<Post>, RepoError> {
        let request = self.client.http().get(self.document_url(slug)?);
        match self.client.json::<PostDocument>(request).await {
            Ok(doc) => Ok(Some(doc.into())),
            Err(RepoError::NotFound) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn update(&self, slug: &str, patch: PostPatch) -> Result<Post, RepoError> {
        let request = self
            .client
            .http()
            .patch(self.document_url(slug)?)
            .json(&UpdateDocument { data: &patch });
        let doc: PostDocument = self.client.json(request).await?;
        Ok(doc.into())
    }

    async fn delete(&self, slug: &str) -> Result<(), RepoError> {
        let request = self.client.http().delete(self.document_url(slug)?);
        self.client.send(request).await?;
        Ok(())
    }

    async fn list(&self, filter: &PostFilter) -> Result<Vec<Post>, RepoError> {
        let mut queries = Vec::new();
        if let Some(status) = filter.status {
            queries.push(("queries[]", equal("status", status.as_str())));
        }
        if let Some(user_id) = &filter.user_id {
            queries.push(("queries[]", equal("userId", user_id)));
        }
        queries.push(("queries[]", limit(self.client.config().list_limit)));

        let request = self
            .client
            .http()
            .get(self.client.url(&self.path))
            .query(&queries);
        let page: DocumentList<PostDocument> = self.client.json(request).await?;
        tracing::debug!(filter = %filter.signature(), total = page.total, "Listed posts");
        Ok(page.documents.into_iter().map(Into::into).collect())
    }
}

/// Comments collection; ids are issued by the server.
pub struct DocumentCommentRepository {
    client: Arc<BackendClient>,
    path: String,
}

impl DocumentCommentRepository {
    pub fn new(client: Arc<BackendClient>) -> Self {
        let path = documents_path(&client, &client.config().comments_collection_id);
        Self { client, path }
    }
}

#[async_trait]
impl CommentRepository for DocumentCommentRepository {
    async fn create(&self, comment: NewComment) -> Result<Comment, RepoError> {
        let request = self
            .client
            .http()
            .post(self.client.url(&self.path))
            .json(&CreateDocument {
                document_id: UNIQUE_ID,
                data: &comment,
            });
        let doc: CommentDocument = self.client.json(request).await?;
        Ok(doc.into())
    }

    async fn list_for_post(&self, post_id: &str) -> Result<Vec<Comment>, RepoError> {
        let queries = [
            ("queries[]", equal("postId", post_id)),
            ("queries[]", limit(self.client.config().list_limit)),
        ];
        let request = self
            .client
            .http()
            .get(self.client.url(&self.path))
            .query(&queries);
        let page: DocumentList<CommentDocument> = self.client.json(request).await?;
        Ok(page.documents.into_iter().map(Into::into).collect())
    }
}
