use async_trait::async_trait;

use crate::domain::{ObjectUpload, StoredObject};
use crate::error::RepoError;

/// Binary object storage for featured images.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store the payload under a server-issued id.
    async fn upload(&self, upload: ObjectUpload) -> Result<StoredObject, RepoError>;

    async fn delete(&self, object_id: &str) -> Result<(), RepoError>;

    /// Pure URL derivations. No network, no error path.
    fn preview_url(&self, object_id: &str) -> String;
    fn view_url(&self, object_id: &str) -> String;
    fn download_url(&self, object_id: &str) -> String;
}
