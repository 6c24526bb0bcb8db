use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use crate::app::{NotehubError, Result};
use crate::storage::ObjectStore;

/// Bucket backed by a directory on the local filesystem.
pub struct LocalObjectStore {
    root: PathBuf,
}

impl LocalObjectStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    fn resolve(&self, key: &str) -> Result<PathBuf> {
        let relative = Path::new(key);
        let is_plain = !key.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !is_plain {
            return Err(NotehubError::Storage(format!("Invalid object key: {}", key)));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<String> {
        let path = self.resolve(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::AlreadyExists => {
                    NotehubError::Storage(format!("Object already exists: {}", key))
                }
                _ => NotehubError::Io(e),
            })?;
        file.write_all(&bytes).await?;
        file.flush().await?;

        tracing::debug!(key = %key, content_type = %content_type, size = bytes.len(), "Stored object");
        Ok(key.to_string())
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>> {
        let path = self.resolve(key)?;
        tokio::fs::read(&path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => NotehubError::Storage(format!("Object not found: {}", key)),
            _ => NotehubError::Io(e),
        })
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let path = self.resolve(key)?;
        Ok(tokio::fs::try_exists(&path).await?)
    }

    fn local_path(&self, key: &str) -> Option<PathBuf> {
        self.resolve(key).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_and_get() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalObjectStore::new(dir.path().join("bucket")).unwrap();

        let key = store
            .put("pdfs/alice/1-calc.pdf", b"%PDF-1.7".to_vec(), "application/pdf")
            .await
            .unwrap();
        assert_eq!(key, "pdfs/alice/1-calc.pdf");
        assert!(store.exists(&key).await.unwrap());
        assert_eq!(store.get(&key).await.unwrap(), b"%PDF-1.7");
        assert_eq!(
            store.local_path(&key).unwrap(),
            dir.path().join("bucket/pdfs/alice/1-calc.pdf")
        );
    }

    #[tokio::test]
    async fn test_put_never_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalObjectStore::new(dir.path()).unwrap();

        store.put("a/b.pdf", b"one".to_vec(), "application/pdf").await.unwrap();
        let second = store.put("a/b.pdf", b"two".to_vec(), "application/pdf").await;
        assert!(matches!(second, Err(NotehubError::Storage(_))));
        assert_eq!(store.get("a/b.pdf").await.unwrap(), b"one");
    }

    #[tokio::test]
    async fn test_rejects_escaping_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalObjectStore::new(dir.path()).unwrap();

        for key in ["../outside.pdf", "/etc/passwd", "", "./a.pdf", "a/../../b.pdf"] {
            let result = store.put(key, Vec::new(), "application/pdf").await;
            assert!(matches!(result, Err(NotehubError::Storage(_))), "key {:?}", key);
        }
        assert!(store.local_path("../x").is_none());
    }

    #[tokio::test]
    async fn test_missing_object() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalObjectStore::new(dir.path()).unwrap();

        assert!(!store.exists("pdfs/none.pdf").await.unwrap());
        assert!(matches!(
            store.get("pdfs/none.pdf").await,
            Err(NotehubError::Storage(_))
        ));
    }
}
