//! The three message-driven stages and the glue between them.
//!
//! Object notification -> [`IngestionStage`] (text detection, then [`FanOutStage`] in the same
//! invocation) -> translate topic -> [`TranslationStage`] -> result topic -> [`SaveStage`].
//! Every stage is stateless and returns a [`StageResult`]; the hosting surface turns that into
//! whatever completion signal its transport expects.

pub mod fanout;
pub mod ingest;
pub mod messages;
pub mod publisher;
pub mod save;
pub mod translate;

pub use fanout::FanOutStage;
pub use ingest::IngestionStage;
pub use messages::{ObjectNotification, ResourceState, TranslationResult, TranslationTask};
pub use publisher::ResultPublisher;
pub use save::SaveStage;
pub use translate::TranslationStage;

use crate::capabilities::Capabilities;
use crate::error::StageResult;
use crate::settings::Settings;
use crate::storage::FileHandle;

/// What a successful invocation did
#[derive(Debug, Clone, PartialEq)]
pub enum StageOutcome {
    /// Nothing to do for this input
    Skipped(&'static str),
    /// Message ids of everything published
    Published(Vec<String>),
    Saved(FileHandle),
}

impl StageOutcome {
    #[cfg(test)]
    pub fn published(&self) -> usize {
        match self {
            Self::Published(ids) => ids.len(),
            _ => 0,
        }
    }
}

/// All stages, wired to one capability set
pub struct Pipeline {
    ingestion: IngestionStage,
    translation: TranslationStage,
    save: SaveStage,
}

impl Pipeline {
    pub fn new(settings: &Settings, capabilities: &Capabilities) -> Self {
        let publisher = ResultPublisher::new(capabilities.broker.clone());
        let fanout = FanOutStage::new(
            capabilities.translator.clone(),
            publisher.clone(),
            settings.to_lang.clone(),
            settings.translate_topic.clone(),
            settings.result_topic.clone(),
        );

        Self {
            ingestion: IngestionStage::new(
                capabilities.detector.clone(),
                capabilities.store.clone(),
                fanout,
            ),
            translation: TranslationStage::new(
                capabilities.translator.clone(),
                publisher,
                settings.result_topic.clone(),
            ),
            save: SaveStage::new(capabilities.store.clone(), settings.result_bucket.clone()),
        }
    }

    pub async fn ingest(&self, event: ObjectNotification) -> StageResult<StageOutcome> {
        self.ingestion.handle(event).await
    }

    pub async fn translate(&self, task: TranslationTask) -> StageResult<StageOutcome> {
        self.translation.handle(task).await
    }

    pub async fn save(&self, result: TranslationResult) -> StageResult<StageOutcome> {
        self.save.handle(result).await
    }
}
