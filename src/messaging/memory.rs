use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde_json::Value;
use tokio::sync::mpsc;
use uuid::Uuid;

use super::interface::MessageBroker;

/// A message as recorded by the in-process broker
#[derive(Debug, Clone)]
pub struct PublishedMessage {
    pub id: String,
    pub topic: String,
    pub payload: Value,
    pub publish_time: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct Topic {
    subscribers: Vec<mpsc::UnboundedSender<PublishedMessage>>,
    #[cfg(test)]
    history: Vec<PublishedMessage>,
}

/// In-process broker: topics must exist before publishing, every subscriber gets every message
#[derive(Debug, Default)]
pub struct MemoryBroker {
    topics: DashMap<String, Topic>,
}

impl MemoryBroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a subscriber; the topic is created if needed
    pub fn subscribe(&self, topic: &str) -> mpsc::UnboundedReceiver<PublishedMessage> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.topics.entry(topic.to_string()).or_default().subscribers.push(tx);
        rx
    }

    #[cfg(test)]
    pub fn has_topic(&self, topic: &str) -> bool {
        self.topics.contains_key(topic)
    }

    /// Every message published to `topic`, oldest first
    #[cfg(test)]
    pub fn published(&self, topic: &str) -> Vec<PublishedMessage> {
        self.topics
            .get(topic)
            .map(|t| t.history.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl MessageBroker for MemoryBroker {
    async fn ensure_topic(&self, topic: &str) -> Result<(), anyhow::Error> {
        self.topics.entry(topic.to_string()).or_default();
        Ok(())
    }

    async fn publish(&self, topic: &str, payload: &Value) -> Result<String, anyhow::Error> {
        let mut entry = self
            .topics
            .get_mut(topic)
            .ok_or_else(|| anyhow!("Topic not found: {}", topic))?;

        let message = PublishedMessage {
            id: Uuid::new_v4().to_string(),
            topic: topic.to_string(),
            payload: payload.clone(),
            publish_time: Utc::now(),
        };
        entry.subscribers.retain(|tx| tx.send(message.clone()).is_ok());
        #[cfg(test)]
        entry.history.push(message.clone());
        Ok(message.id)
    }
}
