use std::sync::Arc;

use futures::future::try_join_all;
use tracing::{error, info};

use super::messages::{DetectedText, TranslationResult, TranslationTask};
use super::publisher::ResultPublisher;
use super::StageOutcome;
use crate::error::{PipelineError, StageResult};
use crate::translate::Translator;

/// Detects the source language and emits one message per target language
pub struct FanOutStage {
    translator: Arc<dyn Translator>,
    publisher: ResultPublisher,
    targets: Vec<String>,
    translate_topic: String,
    result_topic: String,
}

impl FanOutStage {
    pub fn new(
        translator: Arc<dyn Translator>,
        publisher: ResultPublisher,
        targets: Vec<String>,
        translate_topic: String,
        result_topic: String,
    ) -> Self {
        Self {
            translator,
            publisher,
            targets,
            translate_topic,
            result_topic,
        }
    }

    pub async fn handle(&self, text: &str, filename: &str) -> StageResult<StageOutcome> {
        let source_language = self.translator.detect_language(text).await.map_err(|e| {
            error!(file = %filename, "Language detection failed: {:#}", e);
            PipelineError::Translation(e)
        })?;
        info!(file = %filename, source = %source_language, "Detected language");

        let detected = DetectedText {
            text: text.to_string(),
            source_language,
        };

        // All publishes run concurrently; the first failure fails the invocation
        let publishes = self
            .targets
            .iter()
            .map(|lang| self.dispatch(&detected, filename, lang));
        let message_ids = try_join_all(publishes).await?;

        info!(file = %filename, messages = message_ids.len(), "Fan-out complete");
        Ok(StageOutcome::Published(message_ids))
    }

    async fn dispatch(&self, detected: &DetectedText, filename: &str, lang: &str) -> StageResult<String> {
        if lang.eq_ignore_ascii_case(&detected.source_language) {
            // Already in the target language; the result payload carries no `from`
            let result = TranslationResult::new(&detected.text, filename, lang);
            return self.publisher.publish(&self.result_topic, &result).await;
        }

        let task = TranslationTask {
            text: Some(detected.text.clone()),
            filename: Some(filename.to_string()),
            lang: Some(lang.to_string()),
            from: Some(detected.source_language.clone()),
        };
        self.publisher.publish(&self.translate_topic, &task).await
    }
}
