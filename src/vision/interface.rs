use async_trait::async_trait;

use crate::storage::FileHandle;

/// Text detection on a stored image
#[async_trait]
pub trait TextDetector: Send + Sync {
    /// Full text found in the image; empty when the image holds none
    async fn detect(&self, file: &FileHandle) -> Result<String, anyhow::Error>;
}
