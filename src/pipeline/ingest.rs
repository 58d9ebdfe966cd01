use std::sync::Arc;

use tracing::{error, info};

use super::fanout::FanOutStage;
use super::messages::{require, ObjectNotification};
use super::StageOutcome;
use crate::error::{PipelineError, StageResult};
use crate::storage::BlobStore;
use crate::vision::TextDetector;

const STAGE: &str = "ingest";

/// Entry point for new-object notifications: detect text, then fan out
pub struct IngestionStage {
    detector: Arc<dyn TextDetector>,
    store: Arc<dyn BlobStore>,
    fanout: FanOutStage,
}

impl IngestionStage {
    pub fn new(detector: Arc<dyn TextDetector>, store: Arc<dyn BlobStore>, fanout: FanOutStage) -> Self {
        Self {
            detector,
            store,
            fanout,
        }
    }

    pub async fn handle(&self, event: ObjectNotification) -> StageResult<StageOutcome> {
        if event.is_deletion() {
            info!(name = ?event.name, "Object deleted, nothing to do");
            return Ok(StageOutcome::Skipped("object deleted"));
        }

        let bucket = require(STAGE, "bucket", &event.bucket)?;
        let name = require(STAGE, "name", &event.name)?;
        let file = self.store.file(bucket, name);
        info!(file = %file, "Looking for text in image");

        let text = self.detector.detect(&file).await.map_err(|e| {
            error!(file = %file, "Text detection failed: {:#}", e);
            PipelineError::Detection(e)
        })?;

        info!(file = %file, chars = text.chars().count(), "Extracted text");

        self.fanout.handle(&text, &file.name).await
    }
}
