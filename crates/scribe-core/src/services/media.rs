//! Featured image storage facade.

use std::sync::Arc;

use crate::domain::{ObjectUpload, ObjectUrls, StoredObject, validate_object_id};
use crate::ports::ObjectStore;

pub struct MediaLibrary {
    store: Arc<dyn ObjectStore>,
}

impl MediaLibrary {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    /// Upload an image. `None` means nothing was stored and no post may
    /// reference it.
    pub async fn upload(&self, upload: ObjectUpload) -> Option<StoredObject> {
        let file_name = upload.file_name.clone();
        match self.store.upload(upload).await {
            Ok(object) => {
                tracing::info!(object_id = %object.id, size = object.size, "Image uploaded");
                Some(object)
            }
            Err(e) => {
                tracing::warn!(file_name = %file_name, error = %e, "Image upload failed");
                None
            }
        }
    }

    /// Delete an image. Failure is reported as `false`, never raised.
    pub async fn delete(&self, object_id: &str) -> bool {
        if let Err(e) = validate_object_id(object_id) {
            tracing::warn!(object_id = %object_id, error = %e, "Refusing to delete malformed object id");
            return false;
        }
        match self.store.delete(object_id).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(object_id = %object_id, error = %e, "Image delete failed");
                false
            }
        }
    }

    pub fn preview_url(&self, object_id: &str) -> String {
        self.store.preview_url(object_id)
    }

    /// Public URLs of an object, `None` for an id no object can have.
    pub fn urls(&self, object_id: &str) -> Option<ObjectUrls> {
        validate_object_id(object_id).ok()?;
        Some(ObjectUrls {
            preview: self.store.preview_url(object_id),
            view: self.store.view_url(object_id),
            download: self.store.download_url(object_id),
        })
    }
}
