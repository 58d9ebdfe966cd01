use anyhow::{anyhow, Context, Result};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::error;

/// Credentials attached to every request of a client
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    /// Sent as the `key` query parameter
    pub api_key: Option<String>,
    /// Sent as a bearer token
    pub access_token: Option<String>,
}

impl Credentials {
    pub fn api_key(key: &str) -> Self {
        Self {
            api_key: non_empty(key),
            access_token: None,
        }
    }

    pub fn bearer(token: &str) -> Self {
        Self {
            api_key: None,
            access_token: non_empty(token),
        }
    }
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Thin JSON-over-HTTP client shared by the cloud capability adapters
#[derive(Debug, Clone)]
pub struct GoogleApiClient {
    client: Client,
    base_url: String,
    credentials: Credentials,
}

impl GoogleApiClient {
    pub fn new(base_url: &str, credentials: Credentials) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(60))
                .build()
                .unwrap_or_default(),
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let request = match &self.credentials.api_key {
            Some(key) => request.query(&[("key", key)]),
            None => request,
        };
        match &self.credentials.access_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// POST a JSON body and decode a JSON response
    pub async fn post_json<B, R>(&self, path: &str, body: &B) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = self.url(path);
        let response = self
            .authorize(self.client.post(&url))
            .json(body)
            .send()
            .await
            .with_context(|| format!("Failed to send request to {}", url))?;
        let response = ensure_success(response, &url).await?;
        response
            .json::<R>()
            .await
            .with_context(|| format!("Failed to parse response from {}", url))
    }

    /// PUT a JSON body; `tolerated` statuses count as success alongside 2xx
    pub async fn put_json<B>(&self, path: &str, body: &B, tolerated: &[StatusCode]) -> Result<StatusCode>
    where
        B: Serialize + ?Sized,
    {
        let url = self.url(path);
        let response = self
            .authorize(self.client.put(&url))
            .json(body)
            .send()
            .await
            .with_context(|| format!("Failed to send request to {}", url))?;
        let status = response.status();
        if tolerated.contains(&status) {
            return Ok(status);
        }
        ensure_success(response, &url).await?;
        Ok(status)
    }

    /// POST a raw body with extra query parameters
    pub async fn post_body(
        &self,
        path: &str,
        query: &[(&str, &str)],
        content_type: &str,
        body: String,
    ) -> Result<()> {
        let url = self.url(path);
        let response = self
            .authorize(self.client.post(&url))
            .query(query)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(body)
            .send()
            .await
            .with_context(|| format!("Failed to send request to {}", url))?;
        ensure_success(response, &url).await?;
        Ok(())
    }
}

async fn ensure_success(response: Response, url: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let error_text = response
        .text()
        .await
        .unwrap_or_else(|_| "Failed to get error response text".to_string());
    error!("API error from {} ({}): {}", url, status, error_text);
    Err(anyhow!("API error ({}): {}", status, error_text))
}
