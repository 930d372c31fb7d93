use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use scribe_core::domain::{ObjectUpload, StoredObject};
use scribe_core::error::RepoError;
use scribe_core::ports::ObjectStore;

/// Object bytes held in memory. URLs point under `base_url`.
pub struct InMemoryObjectStore {
    base_url: String,
    objects: RwLock<HashMap<String, (StoredObject, Vec<u8>)>>,
}

impl InMemoryObjectStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            objects: RwLock::new(HashMap::new()),
        }
    }

    /// Stored bytes, if the object exists.
    pub async fn bytes(&self, object_id: &str) -> Option<Vec<u8>> {
        self.objects
            .read()
            .await
            .get(object_id)
            .map(|(_, bytes)| bytes.clone())
    }

    fn url(&self, object_id: &str, action: &str) -> String {
        format!("{}/{}/{}", self.base_url, object_id, action)
    }
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn upload(&self, upload: ObjectUpload) -> Result<StoredObject, RepoError> {
        let object = StoredObject {
            id: uuid::Uuid::new_v4().simple().to_string(),
            name: upload.file_name,
            mime_type: upload.mime_type,
            size: upload.bytes.len() as u64,
        };
        self.objects
            .write()
            .await
            .insert(object.id.clone(), (object.clone(), upload.bytes));
        Ok(object)
    }

    async fn delete(&self, object_id: &str) -> Result<(), RepoError> {
        self.objects
            .write()
            .await
            .remove(object_id)
            .map(|_| ())
            .ok_or(RepoError::NotFound)
    }

    fn preview_url(&self, object_id: &str) -> String {
        self.url(object_id, "preview")
    }

    fn view_url(&self, object_id: &str) -> String {
        self.url(object_id, "view")
    }

    fn download_url(&self, object_id: &str) -> String {
        self.url(object_id, "download")
    }
}
