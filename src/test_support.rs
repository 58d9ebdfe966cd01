//! Recording fakes for the capability traits.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use anyhow::anyhow;
use async_trait::async_trait;
use serde_json::Value;

use crate::messaging::{MemoryBroker, MessageBroker};
use crate::storage::{BlobStore, FileHandle};
use crate::translate::Translator;
use crate::vision::TextDetector;

pub fn targets(langs: &[&str]) -> Vec<String> {
    langs.iter().map(|l| l.to_string()).collect()
}

/// Returns the same text for every image
#[derive(Debug, Default)]
pub struct FixedDetector {
    text: Option<String>,
    calls: AtomicUsize,
    last_file: Mutex<Option<FileHandle>>,
}

impl FixedDetector {
    pub fn new(text: &str) -> Self {
        Self {
            text: Some(text.to_string()),
            ..Default::default()
        }
    }

    pub fn failing() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_file(&self) -> Option<FileHandle> {
        self.last_file.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextDetector for FixedDetector {
    async fn detect(&self, file: &FileHandle) -> Result<String, anyhow::Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_file.lock().unwrap() = Some(file.clone());
        self.text
            .clone()
            .ok_or_else(|| anyhow!("vision unavailable"))
    }
}

/// Detects a fixed language and translates to `[lang] text`
#[derive(Debug, Default)]
pub struct EchoTranslator {
    language: Option<String>,
    translations: Mutex<Vec<(Option<String>, String)>>,
}

impl EchoTranslator {
    pub fn detecting(language: &str) -> Self {
        Self {
            language: Some(language.to_string()),
            ..Default::default()
        }
    }

    pub fn failing() -> Self {
        Self::default()
    }

    /// `(from, to)` of every translate call
    pub fn translations(&self) -> Vec<(Option<String>, String)> {
        self.translations.lock().unwrap().clone()
    }
}

#[async_trait]
impl Translator for EchoTranslator {
    async fn detect_language(&self, _text: &str) -> Result<String, anyhow::Error> {
        self.language
            .clone()
            .ok_or_else(|| anyhow!("translation api unavailable"))
    }

    async fn translate(
        &self,
        text: &str,
        from: Option<&str>,
        to: &str,
    ) -> Result<String, anyhow::Error> {
        if self.language.is_none() {
            return Err(anyhow!("translation api unavailable"));
        }
        self.translations
            .lock()
            .unwrap()
            .push((from.map(String::from), to.to_string()));
        Ok(format!("[{}] {}", to, text))
    }
}

/// Memory broker that rejects publishes to one topic
#[derive(Debug)]
pub struct FailingBroker {
    inner: MemoryBroker,
    topic: String,
}

impl FailingBroker {
    pub fn failing_topic(topic: &str) -> Self {
        Self {
            inner: MemoryBroker::new(),
            topic: topic.to_string(),
        }
    }
}

#[async_trait]
impl MessageBroker for FailingBroker {
    async fn ensure_topic(&self, topic: &str) -> Result<(), anyhow::Error> {
        self.inner.ensure_topic(topic).await
    }

    async fn publish(&self, topic: &str, payload: &Value) -> Result<String, anyhow::Error> {
        if topic == self.topic {
            return Err(anyhow!("publish to {} rejected", topic));
        }
        self.inner.publish(topic, payload).await
    }
}

/// Blob store whose writes always fail
#[derive(Debug)]
pub struct FailingStore;

#[async_trait]
impl BlobStore for FailingStore {
    async fn save(&self, file: &FileHandle, _content: &str) -> Result<(), anyhow::Error> {
        Err(anyhow!("bucket {} unavailable", file.bucket))
    }
}
