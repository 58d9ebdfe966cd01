use anyhow::{anyhow, Context};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::interface::Translator;
use crate::google_api::{Credentials, GoogleApiClient};

#[derive(Debug, Serialize)]
pub struct TranslateRequest<'a> {
    pub q: &'a str,
    pub target: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<&'a str>,
    pub format: &'static str,
}

#[derive(Debug, Serialize)]
pub struct DetectRequest<'a> {
    pub q: &'a str,
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct TranslationsData {
    #[serde(default)]
    translations: Vec<Translation>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Translation {
    translated_text: String,
}

#[derive(Debug, Deserialize)]
struct DetectionsData {
    #[serde(default)]
    detections: Vec<Vec<Detection>>,
}

#[derive(Debug, Deserialize)]
struct Detection {
    language: String,
    #[serde(default)]
    confidence: f64,
}

/// Translator backed by the Cloud Translation v2 REST API
pub struct TranslateClient {
    api: GoogleApiClient,
}

impl TranslateClient {
    pub fn new(endpoint: &str, api_key: &str) -> Self {
        Self {
            api: GoogleApiClient::new(endpoint, Credentials::api_key(api_key)),
        }
    }
}

fn best_detection(data: DetectionsData) -> Option<String> {
    data.detections
        .into_iter()
        .flatten()
        .max_by(|a, b| a.confidence.total_cmp(&b.confidence))
        .map(|d| d.language)
}

#[async_trait]
impl Translator for TranslateClient {
    async fn detect_language(&self, text: &str) -> Result<String, anyhow::Error> {
        let response: Envelope<DetectionsData> = self
            .api
            .post_json("language/translate/v2/detect", &DetectRequest { q: text })
            .await
            .context("Language detection request failed")?;
        let lang = best_detection(response.data)
            .ok_or_else(|| anyhow!("Language detection returned no result"))?;
        debug!("Detected language: {}", lang);
        Ok(lang)
    }

    async fn translate(
        &self,
        text: &str,
        from: Option<&str>,
        to: &str,
    ) -> Result<String, anyhow::Error> {
        let request = TranslateRequest {
            q: text,
            target: to,
            source: from,
            format: "text",
        };
        let response: Envelope<TranslationsData> = self
            .api
            .post_json("language/translate/v2", &request)
            .await
            .with_context(|| format!("Translation into {} failed", to))?;
        response
            .data
            .translations
            .into_iter()
            .next()
            .map(|t| t.translated_text)
            .ok_or_else(|| anyhow!("Translation into {} returned no text", to))
    }
}
