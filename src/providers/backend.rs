use std::time::Duration;

use async_trait::async_trait;
use log::{debug, error, warn};
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::document::Document;
use crate::errors::{ErrorCode, ProviderError};
use crate::providers::DocumentBackend;
use crate::translation::model::{Metrics, lenient};

/// Timeout for the health endpoint, independent of the submission timeout
const HEALTH_CHECK_TIMEOUT: Duration = Duration::from_secs(5);

/// Text wrapper used by the backend envelope
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BackendText {
    #[serde(default)]
    pub text: String,
}

/// One error entry in the backend envelope
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BackendError {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Response of `POST /translate-document`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendEnvelope {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub translation: Option<BackendText>,
    #[serde(default)]
    pub original: Option<BackendText>,
    #[serde(default, deserialize_with = "lenient")]
    pub metrics: Option<Metrics>,
    #[serde(default)]
    pub errors: Vec<BackendError>,
}

impl BackendEnvelope {
    pub fn translated_text(&self) -> &str {
        self.translation.as_ref().map(|t| t.text.as_str()).unwrap_or_default()
    }

    pub fn original_text(&self) -> &str {
        self.original.as_ref().map(|t| t.text.as_str()).unwrap_or_default()
    }

    fn first_error(&self) -> (Option<&str>, Option<&str>) {
        match self.errors.first() {
            Some(e) => (e.code.as_deref(), e.message.as_deref()),
            None => (None, None),
        }
    }
}

/// Parse a body into an envelope, unwrapping a one-element array
fn parse_envelope_body(body: &str) -> Option<BackendEnvelope> {
    let value: Value = serde_json::from_str(body).ok()?;
    let value = match value {
        Value::Array(mut items) if !items.is_empty() => items.swap_remove(0),
        Value::Array(_) => return None,
        other => other,
    };
    serde_json::from_value(value).ok()
}

/// Turn a status and body from the backend into an envelope or an error.
///
/// - 2xx with `success: true` is the only success.
/// - 2xx with `success: false` fails with the first reported error.
/// - non-2xx fails with the first reported error when the body parses, else `HTTP <status>`.
pub fn parse_backend_response(status: u16, body: &str) -> Result<BackendEnvelope, ProviderError> {
    let envelope = parse_envelope_body(body);

    if (200..300).contains(&status) {
        let envelope = envelope
            .ok_or_else(|| ProviderError::ParseError("Invalid response format".to_string()))?;
        if envelope.success {
            return Ok(envelope);
        }
        let (code, message) = envelope.first_error();
        return Err(ProviderError::Rejected {
            code: code.unwrap_or(ErrorCode::TranslationError.as_str()).to_string(),
            message: message.unwrap_or("Translation failed").to_string(),
        });
    }

    let fallback_message = format!("HTTP {}", status);
    let (code, message) = envelope
        .as_ref()
        .map(BackendEnvelope::first_error)
        .unwrap_or((None, None));

    Err(ProviderError::Rejected {
        code: code.unwrap_or("HTTP_ERROR").to_string(),
        message: message.unwrap_or(fallback_message.as_str()).to_string(),
    })
}

/// Client for the secondary document translation server
#[derive(Debug, Clone)]
pub struct HttpDocumentBackend {
    /// Base URL of the API, e.g. `http://localhost:3000/api`
    base_url: String,
    client: Client,
}

impl HttpDocumentBackend {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            client: Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl DocumentBackend for HttpDocumentBackend {
    async fn submit_document(
        &self,
        document: &Document,
        target_language: &str,
    ) -> Result<BackendEnvelope, ProviderError> {
        let url = format!("{}/translate-document", self.base_url);
        debug!("Submitting {} ({} bytes) to {}", document.name(), document.size_bytes(), url);

        let file = Part::bytes(document.raw_bytes().to_vec())
            .file_name(document.name().to_string())
            .mime_str(document.content_type())?;
        let form = Form::new()
            .part("file", file)
            .text("targetLanguage", target_language.to_string());

        let response = self.client.post(&url).multipart(form).send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        parse_backend_response(status, &body).inspect_err(|e| {
            error!("Document backend rejected {}: {}", document.name(), e);
        })
    }

    async fn health_check(&self) -> bool {
        let url = format!("{}/health", self.base_url);
        match self.client.get(&url).timeout(HEALTH_CHECK_TIMEOUT).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                warn!("Health check against {} failed: {}", url, e);
                false
            }
        }
    }
}
