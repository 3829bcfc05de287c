//! Keyed image storage. The queue only ever sees the URL a blob is reachable at.

use std::path::PathBuf;

use async_trait::async_trait;

use crate::error::{QueueError, QueueResult};

#[derive(Debug, Clone)]
pub struct BlobObject {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store the bytes under `key` and return the URL they can be fetched from.
    async fn put(&self, key: &str, content_type: Option<&str>, bytes: Vec<u8>)
        -> QueueResult<String>;

    async fn get(&self, key: &str) -> QueueResult<Option<BlobObject>>;

    async fn delete(&self, key: &str) -> QueueResult<()>;
}

/// Blobs as files in one directory, served back under `<public_base_url>/blobs/<key>`.
#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    root: PathBuf,
    public_base_url: String,
}

impl LocalBlobStore {
    pub fn new(root: impl Into<PathBuf>, public_base_url: &str) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn url_for(&self, key: &str) -> String {
        format!("{}/blobs/{}", self.public_base_url, key)
    }

    fn path_for(&self, key: &str) -> QueueResult<PathBuf> {
        validate_key(key)?;
        Ok(self.root.join(key))
    }
}

fn validate_key(key: &str) -> QueueResult<()> {
    if key.is_empty() || key.contains('/') || key.contains('\\') || key.contains("..") {
        return Err(QueueError::Blob(format!("invalid blob key: {key:?}")));
    }
    Ok(())
}

/// Turn an uploaded file name into something safe to use inside a blob key.
pub fn sanitize_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or("");
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.replace("..", "_");
    if cleaned.trim_matches(['.', '_']).is_empty() {
        "image".to_string()
    } else {
        cleaned
    }
}

fn blob_err(key: &str, e: std::io::Error) -> QueueError {
    QueueError::Blob(format!("{key}: {e}"))
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn put(
        &self,
        key: &str,
        _content_type: Option<&str>,
        bytes: Vec<u8>,
    ) -> QueueResult<String> {
        let path = self.path_for(key)?;
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| blob_err(key, e))?;
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| blob_err(key, e))?;
        Ok(self.url_for(key))
    }

    async fn get(&self, key: &str) -> QueueResult<Option<BlobObject>> {
        let path = self.path_for(key)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(BlobObject {
                content_type: mime_guess::from_path(&path)
                    .first_or_octet_stream()
                    .to_string(),
                bytes,
            })),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(blob_err(key, e)),
        }
    }

    async fn delete(&self, key: &str) -> QueueResult<()> {
        let path = self.path_for(key)?;
        tokio::fs::remove_file(&path)
            .await
            .map_err(|e| blob_err(key, e))
    }
}
