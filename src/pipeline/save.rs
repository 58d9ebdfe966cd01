use std::sync::Arc;

use tracing::{error, info};

use super::messages::{require, TranslationResult};
use super::StageOutcome;
use crate::error::{PipelineError, StageResult};
use crate::storage::BlobStore;

const STAGE: &str = "save";

/// Name of the saved text file: the final extension becomes `_to_{lang}.txt`
pub fn rename_for_save(filename: &str, lang: &str) -> String {
    let stem = match filename.rfind('.') {
        Some(idx) if idx + 1 < filename.len() && !filename[idx + 1..].contains('/') => &filename[..idx],
        _ => filename,
    };
    format!("{}_to_{}.txt", stem, lang)
}

/// Writes translated text to the result bucket
pub struct SaveStage {
    store: Arc<dyn BlobStore>,
    result_bucket: String,
}

impl SaveStage {
    pub fn new(store: Arc<dyn BlobStore>, result_bucket: String) -> Self {
        Self {
            store,
            result_bucket,
        }
    }

    pub async fn handle(&self, result: TranslationResult) -> StageResult<StageOutcome> {
        let text = require(STAGE, "text", &result.text)?;
        let filename = require(STAGE, "filename", &result.filename)?;
        let lang = require(STAGE, "lang", &result.lang)?;

        let file = self
            .store
            .file(&self.result_bucket, &rename_for_save(filename, lang));
        info!(file = %file, "Saving translated text");

        self.store.save(&file, text).await.map_err(|e| {
            error!(file = %file, "Failed to save translation: {:#}", e);
            PipelineError::Storage(e)
        })?;

        info!(file = %file, "File saved");
        Ok(StageOutcome::Saved(file))
    }
}
