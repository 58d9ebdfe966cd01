use async_trait::async_trait;

/// Topic-based message transport with at-least-once delivery
#[async_trait]
pub trait MessageBroker: Send + Sync {
    /// Create the topic unless it already exists
    async fn ensure_topic(&self, topic: &str) -> Result<(), anyhow::Error>;

    /// Publish a JSON message; returns the broker-assigned message id
    async fn publish(
        &self,
        topic: &str,
        payload: &serde_json::Value,
    ) -> Result<String, anyhow::Error>;
}
