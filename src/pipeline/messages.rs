use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, StageResult};

/// Whether the notified object is present in its bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ResourceState {
    #[default]
    Exists,
    NotExists,
}

/// Object-change notification as delivered by the storage trigger
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectNotification {
    #[serde(default)]
    pub bucket: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub resource_state: Option<ResourceState>,
}

impl ObjectNotification {
    pub fn is_deletion(&self) -> bool {
        self.resource_state == Some(ResourceState::NotExists)
    }
}

/// Text extracted from an image together with its detected language
#[derive(Debug, Clone, PartialEq)]
pub struct DetectedText {
    pub text: String,
    pub source_language: String,
}

/// One translation job: `lang` is the target, `from` the detected source
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TranslationTask {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
}

/// Text ready to be saved in language `lang`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TranslationResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
}

impl TranslationResult {
    pub fn new(text: &str, filename: &str, lang: &str) -> Self {
        Self {
            text: Some(text.to_string()),
            filename: Some(filename.to_string()),
            lang: Some(lang.to_string()),
        }
    }
}

/// Empty strings count as missing
pub fn require<'a>(
    stage: &'static str,
    field: &'static str,
    value: &'a Option<String>,
) -> StageResult<&'a str> {
    match value.as_deref() {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(PipelineError::missing(stage, field)),
    }
}
