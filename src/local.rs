use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::envelope::decode_payload;
use crate::error::StageResult;
use crate::messaging::{MemoryBroker, PublishedMessage};
use crate::pipeline::{Pipeline, StageOutcome};

/// Which stage consumes a subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Translate,
    Save,
}

/// Runs stage subscriptions against the in-process broker, redelivering failed messages
pub struct LocalDispatcher {
    broker: Arc<MemoryBroker>,
    pipeline: Arc<Pipeline>,
    max_attempts: u32,
    base_delay: Duration,
}

impl LocalDispatcher {
    pub fn new(broker: Arc<MemoryBroker>, pipeline: Arc<Pipeline>, max_attempts: u32) -> Self {
        Self {
            broker,
            pipeline,
            max_attempts: max_attempts.max(1),
            base_delay: Duration::from_millis(200),
        }
    }

    #[cfg(test)]
    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    /// Subscribe the translation and save stages; one task per subscription
    pub fn start(self, translate_topic: &str, result_topic: &str) -> Vec<JoinHandle<()>> {
        let this = Arc::new(self);
        vec![
            this.clone().subscribe(translate_topic, Route::Translate),
            this.subscribe(result_topic, Route::Save),
        ]
    }

    fn subscribe(self: Arc<Self>, topic: &str, route: Route) -> JoinHandle<()> {
        let mut rx = self.broker.subscribe(topic);
        info!("Subscribed {:?} stage to topic {}", route, topic);

        tokio::spawn(async move {
            while let Some(message) = rx.recv().await {
                let this = self.clone();
                tokio::spawn(async move { this.deliver(route, message).await });
            }
        })
    }

    async fn deliver(&self, route: Route, message: PublishedMessage) {
        let mut attempt = 1;
        loop {
            match self.invoke(route, &message).await {
                Ok(outcome) => {
                    let latency = Utc::now() - message.publish_time;
                    debug!(
                        message_id = %message.id,
                        topic = %message.topic,
                        latency_ms = latency.num_milliseconds(),
                        "{:?} stage completed: {:?}", route, outcome
                    );
                    return;
                }
                Err(e) if e.is_permanent() => {
                    error!(
                        message_id = %message.id,
                        topic = %message.topic,
                        "{:?} stage rejected message: {}", route, e
                    );
                    return;
                }
                Err(e) if attempt >= self.max_attempts => {
                    error!(
                        message_id = %message.id,
                        "{:?} stage gave up after {} attempts: {}", route, attempt, e
                    );
                    return;
                }
                Err(e) => {
                    let delay = self.base_delay * 2u32.saturating_pow(attempt - 1);
                    warn!(
                        message_id = %message.id,
                        "{:?} stage failed (attempt {}), redelivering in {:?}: {}", route, attempt, delay, e
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }

    async fn invoke(&self, route: Route, message: &PublishedMessage) -> StageResult<StageOutcome> {
        match route {
            Route::Translate => self.pipeline.translate(decode_payload(&message.payload)?).await,
            Route::Save => self.pipeline.save(decode_payload(&message.payload)?).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use crate::capabilities::Capabilities;
    use crate::messaging::MessageBroker;
    use crate::pipeline::ObjectNotification;
    use crate::settings::Settings;
    use crate::storage::{BlobStore, FileHandle, MemoryBlobStore};
    use crate::test_support::{EchoTranslator, FixedDetector};

    fn settings(targets: &str) -> Settings {
        let mut env = HashMap::new();
        env.insert("TRANSPORT".to_string(), "local".to_string());
        env.insert("TO_LANG".to_string(), targets.to_string());
        env.insert("RESULT_BUCKET".to_string(), "results".to_string());
        Settings::from_layers(None, env).unwrap()
    }

    async fn wait_for_files(store: &MemoryBlobStore, count: usize) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while store.len() < count {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("files were not saved in time");
    }

    #[tokio::test]
    async fn photo_with_english_text_is_saved_in_every_target() {
        let settings = settings("en,fr");
        let broker = Arc::new(MemoryBroker::new());
        let store = Arc::new(MemoryBlobStore::new());
        let translator = Arc::new(EchoTranslator::detecting("en"));
        let capabilities = Capabilities {
            detector: Arc::new(FixedDetector::new("Hello world")),
            translator: translator.clone(),
            store: store.clone(),
            broker: broker.clone(),
            local_broker: Some(broker.clone()),
        };
        let pipeline = Arc::new(Pipeline::new(&settings, &capabilities));
        LocalDispatcher::new(broker.clone(), pipeline.clone(), 3)
            .start(&settings.translate_topic, &settings.result_topic);

        let event = ObjectNotification {
            bucket: Some("images".into()),
            name: Some("photo.png".into()),
            resource_state: None,
        };
        let outcome = pipeline.ingest(event).await.unwrap();
        assert_eq!(outcome.published(), 2);

        wait_for_files(&store, 2).await;

        assert_eq!(store.names("results"), vec!["photo_to_en.txt", "photo_to_fr.txt"]);
        assert_eq!(store.get("results", "photo_to_en.txt").as_deref(), Some("Hello world"));
        assert_eq!(store.get("results", "photo_to_fr.txt").as_deref(), Some("[fr] Hello world"));

        // one direct result (en), one task (fr), one translated result (fr)
        let tasks = broker.published("translate");
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].payload["lang"], "fr");
        assert_eq!(broker.published("result").len(), 2);
        assert_eq!(translator.translations().len(), 1);
    }

    /// Fails the first `failures` writes, then stores normally
    struct FlakyStore {
        inner: MemoryBlobStore,
        failures: AtomicUsize,
    }

    #[async_trait]
    impl BlobStore for FlakyStore {
        async fn save(&self, file: &FileHandle, content: &str) -> Result<(), anyhow::Error> {
            if self
                .failures
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
            {
                return Err(anyhow::anyhow!("transient storage error"));
            }
            self.inner.save(file, content).await
        }
    }

    #[tokio::test]
    async fn transient_failures_are_redelivered() {
        let settings = settings("fr");
        let broker = Arc::new(MemoryBroker::new());
        let store = Arc::new(FlakyStore {
            inner: MemoryBlobStore::new(),
            failures: AtomicUsize::new(2),
        });
        let capabilities = Capabilities {
            detector: Arc::new(FixedDetector::new("Hello")),
            translator: Arc::new(EchoTranslator::detecting("en")),
            store: store.clone(),
            broker: broker.clone(),
            local_broker: Some(broker.clone()),
        };
        let pipeline = Arc::new(Pipeline::new(&settings, &capabilities));
        LocalDispatcher::new(broker.clone(), pipeline, 5)
            .with_base_delay(Duration::from_millis(1))
            .start(&settings.translate_topic, &settings.result_topic);

        broker.ensure_topic("result").await.unwrap();
        broker
            .publish("result", &serde_json::json!({"text": "Bonjour", "filename": "a.png", "lang": "fr"}))
            .await
            .unwrap();

        wait_for_files(&store.inner, 1).await;
        assert_eq!(store.inner.get("results", "a_to_fr.txt").as_deref(), Some("Bonjour"));
    }

    #[tokio::test]
    async fn permanent_failures_are_not_retried() {
        let settings = settings("fr");
        let broker = Arc::new(MemoryBroker::new());
        let translator = Arc::new(EchoTranslator::detecting("en"));
        let capabilities = Capabilities {
            detector: Arc::new(FixedDetector::new("Hello")),
            translator: translator.clone(),
            store: Arc::new(MemoryBlobStore::new()),
            broker: broker.clone(),
            local_broker: Some(broker.clone()),
        };
        let pipeline = Arc::new(Pipeline::new(&settings, &capabilities));
        LocalDispatcher::new(broker.clone(), pipeline, 5)
            .with_base_delay(Duration::from_millis(1))
            .start(&settings.translate_topic, &settings.result_topic);

        broker.ensure_topic("translate").await.unwrap();
        broker
            .publish("translate", &serde_json::json!({"text": "Hello", "filename": "a.png"}))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(translator.translations().is_empty());
        assert!(broker.published("result").is_empty());
    }
}
