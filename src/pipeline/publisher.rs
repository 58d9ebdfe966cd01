use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, error};

use crate::error::{PipelineError, StageResult};
use crate::messaging::MessageBroker;

/// Publishes stage output to a named topic, creating the topic on first use
#[derive(Clone)]
pub struct ResultPublisher {
    broker: Arc<dyn MessageBroker>,
}

impl ResultPublisher {
    pub fn new(broker: Arc<dyn MessageBroker>) -> Self {
        Self { broker }
    }

    /// No retry here; the caller's invocation fails instead
    pub async fn publish<T>(&self, topic: &str, payload: &T) -> StageResult<String>
    where
        T: Serialize + Sync,
    {
        let body = serde_json::to_value(payload)?;

        self.broker.ensure_topic(topic).await.map_err(|e| {
            error!(topic = %topic, "Failed to get or create topic: {:#}", e);
            PipelineError::Messaging(e)
        })?;

        let message_id = self.broker.publish(topic, &body).await.map_err(|e| {
            error!(topic = %topic, "Failed to publish message: {:#}", e);
            PipelineError::Messaging(e)
        })?;

        debug!(topic = %topic, message_id = %message_id, "Published message");
        Ok(message_id)
    }
}
