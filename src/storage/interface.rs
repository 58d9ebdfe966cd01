use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Address of a single object in a bucket
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileHandle {
    pub bucket: String,
    pub name: String,
}

impl FileHandle {
    pub fn new(bucket: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            name: name.into(),
        }
    }

    /// `gs://bucket/name` form understood by the detection service
    pub fn uri(&self) -> String {
        format!("gs://{}/{}", self.bucket, self.name)
    }
}

impl std::fmt::Display for FileHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.bucket, self.name)
    }
}

/// Durable object storage
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Resolve a handle; does not touch the store
    fn file(&self, bucket: &str, name: &str) -> FileHandle {
        FileHandle::new(bucket, name)
    }

    /// Write `content` as the whole object, replacing any previous version
    async fn save(&self, file: &FileHandle, content: &str) -> Result<(), anyhow::Error>;
}
