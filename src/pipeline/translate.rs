use std::sync::Arc;

use tracing::{error, info};

use super::messages::{require, TranslationResult, TranslationTask};
use super::publisher::ResultPublisher;
use super::StageOutcome;
use crate::error::{PipelineError, StageResult};
use crate::translate::Translator;

const STAGE: &str = "translate";

/// Consumes translation tasks and publishes the translated text as a result
pub struct TranslationStage {
    translator: Arc<dyn Translator>,
    publisher: ResultPublisher,
    result_topic: String,
}

impl TranslationStage {
    pub fn new(translator: Arc<dyn Translator>, publisher: ResultPublisher, result_topic: String) -> Self {
        Self {
            translator,
            publisher,
            result_topic,
        }
    }

    pub async fn handle(&self, task: TranslationTask) -> StageResult<StageOutcome> {
        let text = require(STAGE, "text", &task.text)?;
        let filename = require(STAGE, "filename", &task.filename)?;
        let lang = require(STAGE, "lang", &task.lang)?;
        let from = task.from.as_deref().filter(|f| !f.is_empty());

        info!(file = %filename, from = ?from, to = %lang, "Translating text");
        let translated = self
            .translator
            .translate(text, from, lang)
            .await
            .map_err(|e| {
                error!(file = %filename, to = %lang, "Translation failed: {:#}", e);
                PipelineError::Translation(e)
            })?;

        let result = TranslationResult::new(&translated, filename, lang);
        let message_id = self.publisher.publish(&self.result_topic, &result).await?;
        info!(file = %filename, to = %lang, "Translation published");
        Ok(StageOutcome::Published(vec![message_id]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messaging::MemoryBroker;
    use crate::test_support::{EchoTranslator, FailingBroker};

    fn task(text: Option<&str>, filename: Option<&str>, lang: Option<&str>) -> TranslationTask {
        TranslationTask {
            text: text.map(String::from),
            filename: filename.map(String::from),
            lang: lang.map(String::from),
            from: Some("en".to_string()),
        }
    }

    #[tokio::test]
    async fn translated_text_goes_to_result_topic() {
        let broker = Arc::new(MemoryBroker::new());
        let translator = Arc::new(EchoTranslator::detecting("en"));
        let stage = TranslationStage::new(
            translator.clone(),
            ResultPublisher::new(broker.clone()),
            "result".to_string(),
        );

        stage
            .handle(task(Some("Hello"), Some("photo.png"), Some("fr")))
            .await
            .unwrap();

        let published = broker.published("result");
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].payload, serde_json::json!({
            "text": "[fr] Hello", "filename": "photo.png", "lang": "fr"
        }));
        assert_eq!(translator.translations(), vec![(Some("en".to_string()), "fr".to_string())]);
    }

    #[tokio::test]
    async fn missing_fields_fail_without_side_effects() {
        let broker = Arc::new(MemoryBroker::new());
        let translator = Arc::new(EchoTranslator::detecting("en"));
        let stage = TranslationStage::new(
            translator.clone(),
            ResultPublisher::new(broker.clone()),
            "result".to_string(),
        );

        for bad in [
            task(None, Some("a.png"), Some("fr")),
            task(Some("Hello"), None, Some("fr")),
            task(Some("Hello"), Some("a.png"), None),
        ] {
            let err = stage.handle(bad).await.unwrap_err();
            assert!(err.is_permanent());
        }

        assert!(translator.translations().is_empty());
        assert!(!broker.has_topic("result"));
    }

    #[tokio::test]
    async fn translation_error_is_reported() {
        let broker = Arc::new(MemoryBroker::new());
        let stage = TranslationStage::new(
            Arc::new(EchoTranslator::failing()),
            ResultPublisher::new(broker.clone()),
            "result".to_string(),
        );

        let err = stage
            .handle(task(Some("Hello"), Some("a.png"), Some("fr")))
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Translation(_)));
        assert!(broker.published("result").is_empty());
    }

    #[tokio::test]
    async fn publish_error_is_reported() {
        let stage = TranslationStage::new(
            Arc::new(EchoTranslator::detecting("en")),
            ResultPublisher::new(Arc::new(FailingBroker::failing_topic("result"))),
            "result".to_string(),
        );

        let err = stage
            .handle(task(Some("Hello"), Some("a.png"), Some("fr")))
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Messaging(_)));
    }

    #[tokio::test]
    async fn missing_source_lets_the_service_detect() {
        let translator = Arc::new(EchoTranslator::detecting("en"));
        let stage = TranslationStage::new(
            translator.clone(),
            ResultPublisher::new(Arc::new(MemoryBroker::new())),
            "result".to_string(),
        );

        let mut t = task(Some("Hello"), Some("a.png"), Some("de"));
        t.from = None;
        stage.handle(t).await.unwrap();

        assert_eq!(translator.translations(), vec![(None, "de".to_string())]);
    }
}
