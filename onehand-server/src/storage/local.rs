use std::path::PathBuf;

use async_trait::async_trait;

use super::{validate_key, BlobStore, StorageError, StoredObject};

/// Filesystem-backed blob store; the HTTP layer serves `root` under `/public`.
pub struct LocalBlobStore {
    root: PathBuf,
    public_base_url: String,
}

impl LocalBlobStore {
    pub fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn put(&self, key: &str, data: &[u8]) -> Result<StoredObject, StorageError> {
        validate_key(key)?;
        let path = self.root.join(key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, data).await?;

        tracing::info!(key, bytes = data.len(), "blob stored");
        Ok(StoredObject {
            path: key.to_string(),
            public_url: self.public_url(key),
        })
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        validate_key(key)?;
        match tokio::fs::remove_file(self.root.join(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_base_url, key)
    }

    fn key_for_url(&self, url: &str) -> Option<String> {
        let key = url
            .strip_prefix(self.public_base_url.as_str())?
            .strip_prefix('/')?;
        validate_key(key).ok()?;
        Some(key.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_writes_under_root() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalBlobStore::new(dir.path(), "http://localhost:3030/public/");

        let stored = store.put("u1/photo.png", b"\x89PNG").await.unwrap();
        assert_eq!(stored.path, "u1/photo.png");
        assert_eq!(stored.public_url, "http://localhost:3030/public/u1/photo.png");

        let on_disk = tokio::fs::read(dir.path().join("u1/photo.png")).await.unwrap();
        assert_eq!(on_disk, b"\x89PNG");
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalBlobStore::new(dir.path(), "http://x/public");

        store.put("u1/a.jpg", b"jpeg").await.unwrap();
        store.delete("u1/a.jpg").await.unwrap();
        store.delete("u1/a.jpg").await.unwrap();
        assert!(!dir.path().join("u1/a.jpg").exists());
    }

    #[tokio::test]
    async fn key_for_url_inverts_public_url() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalBlobStore::new(dir.path(), "http://x/public/");

        let stored = store.put("u1/b.png", b"png").await.unwrap();
        assert_eq!(store.key_for_url(&stored.public_url).as_deref(), Some("u1/b.png"));
        assert_eq!(store.key_for_url("http://elsewhere/public/u1/b.png"), None);
        assert_eq!(store.key_for_url("http://x/public/../b.png"), None);
        assert_eq!(store.key_for_url("http://x/publicity/b.png"), None);
    }

    #[tokio::test]
    async fn rejects_escaping_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalBlobStore::new(dir.path(), "http://x/public");
        assert!(matches!(
            store.put("../outside.png", b"x").await,
            Err(StorageError::InvalidKey(_))
        ));
    }
}
