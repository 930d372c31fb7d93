//! Featured images in a remote storage bucket.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;

use scribe_core::domain::{ObjectUpload, StoredObject};
use scribe_core::error::RepoError;
use scribe_core::ports::ObjectStore;

use super::client::BackendClient;
use super::documents::UNIQUE_ID;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileDocument {
    #[serde(rename = "$id")]
    id: String,
    name: String,
    #[serde(default)]
    mime_type: Option<String>,
    #[serde(default)]
    size_original: u64,
}

impl From<FileDocument> for StoredObject {
    fn from(file: FileDocument) -> Self {
        Self {
            id: file.id,
            name: file.name,
            mime_type: file.mime_type.filter(|m| !m.is_empty()),
            size: file.size_original,
        }
    }
}

pub struct BucketObjectStore {
    client: Arc<BackendClient>,
    path: String,
}

impl BucketObjectStore {
    pub fn new(client: Arc<BackendClient>) -> Self {
        let path = format!("storage/buckets/{}/files", client.config().bucket_id);
        Self { client, path }
    }

    /// Public file URL; the project id rides in the query so the link works
    /// without request headers. Empty for an id that cannot name a file.
    fn file_url(&self, object_id: &str, action: &str) -> String {
        match self.client.resource_url(&self.path, &[object_id, action]) {
            Ok(mut url) => {
                url.query_pairs_mut()
                    .append_pair("project", &self.client.config().project_id);
                url.into()
            }
            Err(e) => {
                tracing::debug!(object_id = %object_id, error = %e, "No URL for object id");
                String::new()
            }
        }
    }
}

#[async_trait]
impl ObjectStore for BucketObjectStore {
    async fn upload(&self, upload: ObjectUpload) -> Result<StoredObject, RepoError> {
        let mut part = Part::bytes(upload.bytes).file_name(upload.file_name);
        if let Some(mime) = upload.mime_type.as_deref() {
            part = part
                .mime_str(mime)
                .map_err(|e| RepoError::Transport(format!("invalid mime type {mime}: {e}")))?;
        }
        let form = Form::new().text("fileId", UNIQUE_ID).part("file", part);

        let request = self
            .client
            .http()
            .post(self.client.url(&self.path))
            .multipart(form);
        let file: FileDocument = self.client.json(request).await?;
        Ok(file.into())
    }

    async fn delete(&self, object_id: &str) -> Result<(), RepoError> {
        let url = self.client.resource_url(&self.path, &[object_id])?;
        self.client.send(self.client.http().delete(url)).await?;
        Ok(())
    }

    fn preview_url(&self, object_id: &str) -> String {
        self.file_url(object_id, "preview")
    }

    fn view_url(&self, object_id: &str) -> String {
        self.file_url(object_id, "view")
    }

    fn download_url(&self, object_id: &str) -> String {
        self.file_url(object_id, "download")
    }
}
