/*!
 * Per-chunk translation with bounded retry.
 *
 * A chunk that cannot be translated within the retry budget keeps its
 * original text, so a run never loses content because of one bad chunk.
 * Cancellation is the only failure that leaves this module.
 */

use std::sync::Arc;

use log::{debug, error};
use tokio_util::sync::CancellationToken;

use crate::errors::PipelineError;
use crate::providers::ChunkEndpoint;
use crate::translation::clock::{Sleeper, TokioSleeper};
use crate::translation::model::ChunkResult;
use crate::translation::retry::{RetryOutcome, RetryPolicy};
use crate::translation::segmenter::Chunk;

/// Drives the chunk endpoint for one chunk at a time
#[derive(Debug, Clone)]
pub struct ChunkTranslator {
    endpoint: Arc<dyn ChunkEndpoint>,
    policy: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
    source_language: String,
}

impl ChunkTranslator {
    pub fn new(endpoint: Arc<dyn ChunkEndpoint>, policy: RetryPolicy) -> Self {
        Self {
            endpoint,
            policy,
            sleeper: Arc::new(TokioSleeper),
            source_language: "auto".to_string(),
        }
    }

    /// Replace the sleeper used for retry delays
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn with_source_language(mut self, source_language: impl Into<String>) -> Self {
        self.source_language = source_language.into();
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Label of the underlying endpoint
    pub fn source_tag(&self) -> &str {
        self.endpoint.source_tag()
    }

    /// Translate one chunk, substituting the original text when every attempt fails
    pub async fn translate_chunk(
        &self,
        chunk: &Chunk,
        target_language: &str,
        cancel: &CancellationToken,
    ) -> Result<ChunkResult, PipelineError> {
        let endpoint = &self.endpoint;
        let text = chunk.text.as_str();
        let source_language = self.source_language.as_str();

        let outcome = self
            .policy
            .execute(self.sleeper.as_ref(), cancel, |attempt| async move {
                debug!("Chunk {} attempt {}/{}", chunk.index, attempt, self.policy.max_attempts());
                endpoint.translate_text(text, source_language, target_language).await
            })
            .await;

        match outcome {
            RetryOutcome::Succeeded { value, attempts } => Ok(ChunkResult {
                index: chunk.index,
                translated_text: value,
                used_fallback_original: false,
                attempts,
            }),
            RetryOutcome::Exhausted { attempts, last_error } => {
                error!(
                    "Chunk {} not translated after {} attempts, keeping original text: {}",
                    chunk.index, attempts, last_error
                );
                Ok(ChunkResult {
                    index: chunk.index,
                    translated_text: chunk.text.clone(),
                    used_fallback_original: true,
                    attempts,
                })
            }
            RetryOutcome::Cancelled { .. } => Err(PipelineError::Cancelled),
        }
    }
}
