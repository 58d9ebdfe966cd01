use anyhow::{anyhow, Context};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::interface::TextDetector;
use crate::google_api::{Credentials, GoogleApiClient};
use crate::storage::FileHandle;

#[derive(Debug, Serialize)]
struct AnnotateRequest {
    requests: Vec<ImageRequest>,
}

#[derive(Debug, Serialize)]
struct ImageRequest {
    image: Image,
    features: Vec<Feature>,
}

#[derive(Debug, Serialize)]
struct Image {
    source: ImageSource,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ImageSource {
    image_uri: String,
}

#[derive(Debug, Serialize)]
struct Feature {
    #[serde(rename = "type")]
    feature_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct AnnotateResponse {
    #[serde(default)]
    responses: Vec<ImageResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImageResponse {
    #[serde(default)]
    text_annotations: Vec<TextAnnotation>,
    error: Option<Status>,
}

#[derive(Debug, Deserialize)]
struct TextAnnotation {
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct Status {
    #[serde(default)]
    code: i32,
    #[serde(default)]
    message: String,
}

/// Text detector backed by the Cloud Vision REST API
pub struct VisionClient {
    api: GoogleApiClient,
}

impl VisionClient {
    pub fn new(endpoint: &str, api_key: &str) -> Self {
        Self {
            api: GoogleApiClient::new(endpoint, Credentials::api_key(api_key)),
        }
    }
}

/// The first annotation carries the whole detected text block
fn extract_text(response: AnnotateResponse) -> Result<String, anyhow::Error> {
    let image = match response.responses.into_iter().next() {
        Some(image) => image,
        None => return Ok(String::new()),
    };
    if let Some(status) = image.error {
        return Err(anyhow!("Vision error {}: {}", status.code, status.message));
    }
    Ok(image
        .text_annotations
        .into_iter()
        .next()
        .map(|a| a.description)
        .unwrap_or_default())
}

#[async_trait]
impl TextDetector for VisionClient {
    async fn detect(&self, file: &FileHandle) -> Result<String, anyhow::Error> {
        debug!("Looking for text in image {}", file);
        let request = AnnotateRequest {
            requests: vec![ImageRequest {
                image: Image {
                    source: ImageSource { image_uri: file.uri() },
                },
                features: vec![Feature {
                    feature_type: "TEXT_DETECTION",
                }],
            }],
        };
        let response: AnnotateResponse = self
            .api
            .post_json("v1/images:annotate", &request)
            .await
            .with_context(|| format!("Text detection request for {} failed", file))?;
        extract_text(response)
    }
}
