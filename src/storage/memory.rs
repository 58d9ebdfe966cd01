use async_trait::async_trait;
use dashmap::DashMap;

use super::interface::{BlobStore, FileHandle};

/// In-process blob store for the local transport
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    objects: DashMap<FileHandle, String>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn get(&self, bucket: &str, name: &str) -> Option<String> {
        self.objects
            .get(&FileHandle::new(bucket, name))
            .map(|e| e.value().clone())
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Object names in `bucket`, sorted
    #[cfg(test)]
    pub fn names(&self, bucket: &str) -> Vec<String> {
        let mut names: Vec<String> = self
            .objects
            .iter()
            .filter(|e| e.key().bucket == bucket)
            .map(|e| e.key().name.clone())
            .collect();
        names.sort();
        names
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn save(&self, file: &FileHandle, content: &str) -> Result<(), anyhow::Error> {
        self.objects.insert(file.clone(), content.to_string());
        Ok(())
    }
}
