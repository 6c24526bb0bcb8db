pub mod local;

use std::path::PathBuf;

use async_trait::async_trait;

use crate::app::Result;

pub use local::LocalObjectStore;

#[async_trait]
pub trait ObjectStore {
    /// Store `bytes` under `key`. Existing objects are never overwritten.
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<String>;
    async fn get(&self, key: &str) -> Result<Vec<u8>>;
    async fn exists(&self, key: &str) -> Result<bool>;
    /// Filesystem path of the object, for stores that have one.
    fn local_path(&self, key: &str) -> Option<PathBuf>;
}

/// Build an object key of the form `<prefix>/<uid>/<timestamp_ms>-<safe_name>`.
pub fn object_key(prefix: &str, uid: &str, filename: &str, timestamp_ms: i64) -> String {
    format!("{}/{}/{}-{}", prefix, uid, timestamp_ms, safe_name(filename))
}

/// Lowercase, dash-separated file name restricted to `[a-z0-9._-]`.
pub fn safe_name(filename: &str) -> String {
    let mut name = String::with_capacity(filename.len());
    let mut in_space = false;

    for c in filename.chars() {
        if c.is_whitespace() {
            if !in_space {
                name.push('-');
                in_space = true;
            }
            continue;
        }
        in_space = false;
        if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
            name.push(c.to_ascii_lowercase());
        }
    }

    if name.is_empty() {
        "file".to_string()
    } else {
        name
    }
}
