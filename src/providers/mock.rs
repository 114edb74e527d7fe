/*!
 * Mock endpoint and backend implementations for testing.
 *
 * This module provides in-process doubles that simulate different behaviors:
 * - `MockEndpoint::working()` - Always succeeds with `[<lang>] <text>`
 * - `MockEndpoint::rate_limited()` - Always answers HTTP 429
 * - `MockEndpoint::fail_times(n)` - Fails the first `n` calls, then succeeds
 * - `MockBackend::succeeding(..)` / `MockBackend::failing(..)` for the fallback path
 */

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::document::Document;
use crate::errors::ProviderError;
use crate::providers::backend::{BackendEnvelope, BackendText};
use crate::providers::{ChunkEndpoint, DocumentBackend};
use crate::translation::model::Metrics;

/// Behavior mode for the mock endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockBehavior {
    /// Always succeeds with a tagged translation
    Working,
    /// Always fails with a server error
    Failing,
    /// Always answers with HTTP 429
    RateLimited,
    /// Answers 200 with a body that is not a translation envelope
    Malformed,
    /// Fails every Nth request
    Intermittent { fail_every: usize },
    /// Fails the first `n` requests, then succeeds
    FailTimes(usize),
}

/// One recorded call to the mock endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub text: String,
    pub source_language: String,
    pub target_language: String,
}

/// Mock chunk endpoint for testing translation behavior
#[derive(Debug)]
pub struct MockEndpoint {
    behavior: MockBehavior,
    request_count: Arc<AtomicUsize>,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
    custom_response: Option<fn(&str, &str) -> String>,
    /// Texts that always fail, regardless of behavior
    failing_texts: Vec<String>,
}

impl MockEndpoint {
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            request_count: Arc::new(AtomicUsize::new(0)),
            calls: Arc::new(Mutex::new(Vec::new())),
            custom_response: None,
            failing_texts: Vec::new(),
        }
    }

    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    pub fn rate_limited() -> Self {
        Self::new(MockBehavior::RateLimited)
    }

    pub fn malformed() -> Self {
        Self::new(MockBehavior::Malformed)
    }

    pub fn intermittent(fail_every: usize) -> Self {
        Self::new(MockBehavior::Intermittent { fail_every: fail_every.max(1) })
    }

    pub fn fail_times(n: usize) -> Self {
        Self::new(MockBehavior::FailTimes(n))
    }

    /// Set a custom translation generator, called with `(text, target_language)`
    pub fn with_custom_response(mut self, generator: fn(&str, &str) -> String) -> Self {
        self.custom_response = Some(generator);
        self
    }

    /// Answer HTTP 429 whenever the request text contains `needle`
    pub fn rate_limit_text(mut self, needle: impl Into<String>) -> Self {
        self.failing_texts.push(needle.into());
        self
    }

    /// Number of requests received so far
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Every request received so far, in order
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    fn translate(&self, text: &str, target_language: &str) -> String {
        match self.custom_response {
            Some(generator) => generator(text, target_language),
            None => format!("[{}] {}", target_language, text),
        }
    }
}

impl Clone for MockEndpoint {
    fn clone(&self) -> Self {
        Self {
            behavior: self.behavior,
            request_count: Arc::clone(&self.request_count),
            calls: Arc::clone(&self.calls),
            custom_response: self.custom_response,
            failing_texts: self.failing_texts.clone(),
        }
    }
}

#[async_trait]
impl ChunkEndpoint for MockEndpoint {
    async fn translate_text(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
    ) -> Result<String, ProviderError> {
        let count = self.request_count.fetch_add(1, Ordering::SeqCst);
        self.calls.lock().push(RecordedCall {
            text: text.to_string(),
            source_language: source_language.to_string(),
            target_language: target_language.to_string(),
        });

        if self.failing_texts.iter().any(|needle| text.contains(needle.as_str())) {
            return Err(ProviderError::RateLimitExceeded("HTTP 429".to_string()));
        }

        match self.behavior {
            MockBehavior::Working => Ok(self.translate(text, target_language)),

            MockBehavior::Failing => Err(ProviderError::ApiError {
                status_code: 500,
                message: "Simulated endpoint failure".to_string(),
            }),

            MockBehavior::RateLimited => Err(ProviderError::RateLimitExceeded("HTTP 429".to_string())),

            MockBehavior::Malformed => Err(ProviderError::ParseError("missing segment list".to_string())),

            MockBehavior::Intermittent { fail_every } => {
                if count % fail_every == fail_every - 1 {
                    Err(ProviderError::ApiError {
                        status_code: 503,
                        message: format!("Simulated intermittent failure (request #{})", count + 1),
                    })
                } else {
                    Ok(self.translate(text, target_language))
                }
            }

            MockBehavior::FailTimes(n) => {
                if count < n {
                    Err(ProviderError::ConnectionError(format!("Simulated connection reset (request #{})", count + 1)))
                } else {
                    Ok(self.translate(text, target_language))
                }
            }
        }
    }

    fn source_tag(&self) -> &str {
        "mock-endpoint"
    }
}

/// Mock document backend for the fallback path
#[derive(Debug, Clone)]
pub struct MockBackend {
    response: Result<BackendEnvelope, ProviderError>,
    healthy: bool,
    submissions: Arc<Mutex<Vec<(String, String)>>>,
}

impl MockBackend {
    /// Backend answering every submission with a successful envelope
    pub fn succeeding(translated: impl Into<String>, original: impl Into<String>) -> Self {
        Self::with_envelope(BackendEnvelope {
            success: true,
            translation: Some(BackendText { text: translated.into() }),
            original: Some(BackendText { text: original.into() }),
            metrics: Some(Metrics {
                average_confidence: 0.87,
                translated_word_count: 0,
                translation_sources: vec!["mock-backend".to_string()],
            }),
            errors: Vec::new(),
        })
    }

    pub fn with_envelope(envelope: BackendEnvelope) -> Self {
        Self {
            response: Ok(envelope),
            healthy: true,
            submissions: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Backend rejecting every submission with `error`
    pub fn failing(error: ProviderError) -> Self {
        Self {
            response: Err(error),
            healthy: false,
            submissions: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Number of documents submitted so far
    pub fn submission_count(&self) -> usize {
        self.submissions.lock().len()
    }

    /// `(document name, target language)` of every submission
    pub fn submissions(&self) -> Vec<(String, String)> {
        self.submissions.lock().clone()
    }
}

#[async_trait]
impl DocumentBackend for MockBackend {
    async fn submit_document(
        &self,
        document: &Document,
        target_language: &str,
    ) -> Result<BackendEnvelope, ProviderError> {
        self.submissions
            .lock()
            .push((document.name().to_string(), target_language.to_string()));
        self.response.clone()
    }

    async fn health_check(&self) -> bool {
        self.healthy
    }
}
