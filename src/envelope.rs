//! Decoding of push deliveries.
//!
//! A push request body is either the bare JSON payload or an envelope of the form
//! `{"message": {"data": "<base64 json>", "attributes": {...}, "messageId": "..."}, "subscription": "..."}`.

use std::collections::HashMap;

use base64::Engine;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::error::{PipelineError, StageResult};
use crate::pipeline::{ObjectNotification, ResourceState};

#[derive(Debug, Deserialize)]
pub struct PushEnvelope {
    pub message: PushMessage,
    #[serde(default)]
    pub subscription: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushMessage {
    #[serde(default)]
    pub data: Option<String>,
    #[serde(default)]
    pub attributes: HashMap<String, String>,
    #[serde(default)]
    pub message_id: Option<String>,
}

impl PushMessage {
    /// Decoded `data`, or `None` when the message has no body
    pub fn json(&self) -> StageResult<Option<Value>> {
        let data = match self.data.as_deref() {
            Some(data) if !data.is_empty() => data,
            _ => return Ok(None),
        };
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(data)
            .map_err(|e| PipelineError::InvalidPayload(format!("message data is not base64: {}", e)))?;
        Ok(Some(serde_json::from_slice(&bytes)?))
    }
}

fn envelope(body: &Value) -> StageResult<Option<PushEnvelope>> {
    if body.get("message").map_or(false, Value::is_object) {
        Ok(Some(PushEnvelope::deserialize(body)?))
    } else {
        Ok(None)
    }
}

/// Payload of a stage message, enveloped or bare
pub fn decode_payload<T: DeserializeOwned>(body: &Value) -> StageResult<T> {
    match envelope(body)? {
        Some(envelope) => {
            debug!(
                message_id = ?envelope.message.message_id,
                subscription = ?envelope.subscription,
                "Decoding push message"
            );
            let data = envelope
                .message
                .json()?
                .ok_or_else(|| PipelineError::InvalidPayload("push message has no data".into()))?;
            Ok(serde_json::from_value(data)?)
        }
        None => Ok(T::deserialize(body)?),
    }
}

/// Object notification from a bare event or a storage notification pushed through a topic
pub fn decode_object_notification(body: &Value) -> StageResult<ObjectNotification> {
    let envelope = match envelope(body)? {
        Some(envelope) => envelope,
        None => return Ok(ObjectNotification::deserialize(body)?),
    };

    let message = envelope.message;
    let mut notification = match message.json()? {
        Some(data) => ObjectNotification::deserialize(&data)?,
        None => ObjectNotification::default(),
    };

    let attr = |key: &str| message.attributes.get(key).cloned();
    if notification.bucket.is_none() {
        notification.bucket = attr("bucketId");
    }
    if notification.name.is_none() {
        notification.name = attr("objectId");
    }
    if notification.resource_state.is_none() {
        notification.resource_state = match attr("eventType").as_deref() {
            Some("OBJECT_DELETE") => Some(ResourceState::NotExists),
            Some(_) => Some(ResourceState::Exists),
            None => None,
        };
    }
    Ok(notification)
}
