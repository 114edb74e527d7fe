use std::time::Duration;

use async_trait::async_trait;
use log::{debug, error};
use reqwest::{Client, StatusCode};
use serde_json::Value;

use crate::errors::ProviderError;
use crate::providers::ChunkEndpoint;

/// Tag recorded in the metrics of results produced through this endpoint
pub const GTX_SOURCE_TAG: &str = "google-gtx-direct";

/// Public endpoint used when nothing else is configured
pub const DEFAULT_GTX_ENDPOINT: &str = "https://translate.googleapis.com/translate_a/single";

/// Client for the keyless `translate_a/single` endpoint
#[derive(Debug, Clone)]
pub struct GoogleGtx {
    /// Full endpoint URL, without query string
    endpoint: String,
    /// HTTP client with the per-call timeout applied
    client: Client,
}

impl GoogleGtx {
    /// Create a client for `endpoint` with a per-request timeout
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Self {
        Self {
            endpoint: endpoint.into(),
            client: Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl Default for GoogleGtx {
    fn default() -> Self {
        Self::new(DEFAULT_GTX_ENDPOINT, Duration::from_secs(30))
    }
}

#[async_trait]
impl ChunkEndpoint for GoogleGtx {
    async fn translate_text(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
    ) -> Result<String, ProviderError> {
        debug!("Requesting translation of {} chars into {}", text.chars().count(), target_language);

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("client", "gtx"),
                ("sl", source_language),
                ("tl", target_language),
                ("dt", "t"),
                ("q", text),
            ])
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(ProviderError::RateLimitExceeded(format!("HTTP {}", status.as_u16())));
        }

        let body = response.text().await?;
        if !status.is_success() {
            error!("Translation endpoint error ({}): {}", status, body);
            return Err(ProviderError::ApiError {
                status_code: status.as_u16(),
                message: body,
            });
        }

        parse_envelope(&body)
    }

    fn source_tag(&self) -> &str {
        GTX_SOURCE_TAG
    }
}

/// Concatenate the translated segments of a `translate_a/single` response.
///
/// The envelope is an array whose first element is an array of segment
/// tuples; the first member of each tuple is the translated text.
pub fn parse_envelope(body: &str) -> Result<String, ProviderError> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| ProviderError::ParseError(format!("invalid JSON: {}", e)))?;

    let segments = value
        .get(0)
        .and_then(Value::as_array)
        .ok_or_else(|| ProviderError::ParseError("missing segment list".to_string()))?;

    let parts: Vec<&str> = segments
        .iter()
        .filter_map(|segment| segment.get(0).and_then(Value::as_str))
        .collect();

    if parts.is_empty() {
        return Err(ProviderError::ParseError("no translated segments".to_string()));
    }

    Ok(parts.concat())
}
