//! Blob store for item images
//!
//! Objects live under a per-user prefix (`<user_id>/<uuid>.<ext>`) and are
//! readable through a public URL.

pub mod local;

pub use local::LocalBlobStore;

use async_trait::async_trait;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("unsupported content type: {0}")]
    UnsupportedContentType(String),

    #[error("invalid object key: {0}")]
    InvalidKey(String),

    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Where an uploaded object ended up
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct StoredObject {
    pub path: String,
    pub public_url: String,
}

/// Storage backend abstraction
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `data` at `key`, overwriting any existing object.
    async fn put(&self, key: &str, data: &[u8]) -> Result<StoredObject, StorageError>;

    /// Delete the object at `key`; deleting a missing object succeeds.
    async fn delete(&self, key: &str) -> Result<(), StorageError>;

    /// Public URL for `key`.
    fn public_url(&self, key: &str) -> String;

    /// Key of the object this store publishes at `url`, if it is one of ours.
    fn key_for_url(&self, url: &str) -> Option<String>;
}

/// File extension for an accepted image content type.
pub fn image_extension(content_type: &str) -> Result<&'static str, StorageError> {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    match essence.as_str() {
        "image/png" => Ok("png"),
        "image/jpeg" | "image/jpg" => Ok("jpg"),
        "image/webp" => Ok("webp"),
        "image/gif" => Ok("gif"),
        _ => Err(StorageError::UnsupportedContentType(content_type.to_string())),
    }
}

/// Fresh object key under the user's prefix.
pub fn user_object_key(user_id: Uuid, content_type: &str) -> Result<String, StorageError> {
    let ext = image_extension(content_type)?;
    Ok(format!("{}/{}.{}", user_id, Uuid::new_v4(), ext))
}

/// Whether `key` sits under `user_id`'s prefix.
pub fn is_user_key(key: &str, user_id: Uuid) -> bool {
    key.strip_prefix(&user_id.to_string())
        .is_some_and(|rest| rest.starts_with('/'))
}

/// Reject keys that could escape the store root.
pub fn validate_key(key: &str) -> Result<(), StorageError> {
    let bad = key.is_empty()
        || key.starts_with('/')
        || key.contains('\\')
        || key.split('/').any(|seg| seg.is_empty() || seg == "." || seg == "..");
    if bad {
        return Err(StorageError::InvalidKey(key.to_string()));
    }
    Ok(())
}
