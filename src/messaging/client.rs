use anyhow::{anyhow, Context};
use async_trait::async_trait;
use base64::Engine;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use super::interface::MessageBroker;
use crate::google_api::{Credentials, GoogleApiClient};

#[derive(Debug, Serialize)]
struct PublishRequest {
    messages: Vec<OutgoingMessage>,
}

#[derive(Debug, Serialize)]
struct OutgoingMessage {
    data: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PublishResponse {
    #[serde(default)]
    message_ids: Vec<String>,
}

/// Message broker backed by the Pub/Sub REST API
pub struct PubSubClient {
    api: GoogleApiClient,
    project_id: String,
}

impl PubSubClient {
    pub fn new(endpoint: &str, project_id: &str, access_token: &str) -> Self {
        Self {
            api: GoogleApiClient::new(endpoint, Credentials::bearer(access_token)),
            project_id: project_id.to_string(),
        }
    }

    fn topic_path(&self, topic: &str) -> String {
        format!("v1/projects/{}/topics/{}", self.project_id, topic)
    }
}

#[async_trait]
impl MessageBroker for PubSubClient {
    async fn ensure_topic(&self, topic: &str) -> Result<(), anyhow::Error> {
        let status = self
            .api
            .put_json(&self.topic_path(topic), &json!({}), &[StatusCode::CONFLICT])
            .await
            .with_context(|| format!("Failed to get or create topic {}", topic))?;
        if status == StatusCode::CONFLICT {
            debug!("Topic {} already exists", topic);
        } else {
            debug!("Created topic {}", topic);
        }
        Ok(())
    }

    async fn publish(
        &self,
        topic: &str,
        payload: &serde_json::Value,
    ) -> Result<String, anyhow::Error> {
        let data = base64::engine::general_purpose::STANDARD.encode(serde_json::to_vec(payload)?);
        let request = PublishRequest {
            messages: vec![OutgoingMessage { data }],
        };
        let path = format!("{}:publish", self.topic_path(topic));
        let response: PublishResponse = self
            .api
            .post_json(&path, &request)
            .await
            .with_context(|| format!("Failed to publish to topic {}", topic))?;
        response
            .message_ids
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("Publish to {} returned no message id", topic))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topic_path_is_project_scoped() {
        let client = PubSubClient::new("https://pubsub.example", "proj", "");
        assert_eq!(client.topic_path("result"), "v1/projects/proj/topics/result");
    }

    #[test]
    fn publish_response_reads_message_ids() {
        let response: PublishResponse =
            serde_json::from_str(r#"{"messageIds": ["42"]}"#).unwrap();
        assert_eq!(response.message_ids, vec!["42"]);
    }
}
