use async_trait::async_trait;
use anyhow::Context;
use tracing::debug;

use super::interface::{BlobStore, FileHandle};
use crate::google_api::{Credentials, GoogleApiClient};

const TEXT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

/// Blob store backed by the Cloud Storage JSON API
pub struct CloudStorageClient {
    api: GoogleApiClient,
}

impl CloudStorageClient {
    pub fn new(endpoint: &str, access_token: &str) -> Self {
        Self {
            api: GoogleApiClient::new(endpoint, Credentials::bearer(access_token)),
        }
    }
}

#[async_trait]
impl BlobStore for CloudStorageClient {
    async fn save(&self, file: &FileHandle, content: &str) -> Result<(), anyhow::Error> {
        let path = format!("upload/storage/v1/b/{}/o", file.bucket);
        self.api
            .post_body(
                &path,
                &[("uploadType", "media"), ("name", file.name.as_str())],
                TEXT_CONTENT_TYPE,
                content.to_string(),
            )
            .await
            .with_context(|| format!("Failed to upload {}", file))?;
        debug!("Uploaded {} ({} bytes)", file, content.len());
        Ok(())
    }
}
