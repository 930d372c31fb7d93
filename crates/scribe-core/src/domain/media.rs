use serde::{Deserialize, Serialize};

/// Binary payload for a featured image upload.
#[derive(Debug, Clone)]
pub struct ObjectUpload {
    pub file_name: String,
    pub mime_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Object record issued by the store after upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredObject {
    /// Server-issued id; callers never choose it.
    pub id: String,
    pub name: String,
    pub mime_type: Option<String>,
    pub size: u64,
}

/// Fetchable addresses for an object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectUrls {
    pub preview: String,
    pub view: String,
    pub download: String,
}
