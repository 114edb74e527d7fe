/*!
 * Two-tier translation pipeline.
 *
 * A run first tries the local path: extract text, segment it, translate the
 * chunks one after another and reassemble them. Failures that make the local
 * path impossible (nothing extracted, no chunks) hand the whole document to
 * the secondary backend. Only a failing fallback rejects the run.
 */

use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, info, warn};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::app_config::Config;
use crate::document::Document;
use crate::errors::PipelineError;
use crate::extraction::{Extractor, LocalExtractor};
use crate::file_utils::format_file_size;
use crate::language_utils::validate_target_language;
use crate::providers::{ChunkEndpoint, DocumentBackend, GoogleGtx, HttpDocumentBackend};
use crate::translation::chunk_translator::ChunkTranslator;
use crate::translation::model::{
    ChunkResult, Metrics, RunOutcome, TranslationResult, Warning, WarningKind, word_count,
};
use crate::translation::progress::{
    ProgressCallback, ProgressProfile, ProgressTracker, Stage, chunk_progress,
};
use crate::translation::retry::RetryPolicy;
use crate::translation::segmenter::{Segmenter, reassemble};

/// State of one run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunState {
    Idle,
    Extracting,
    Chunking,
    Translating,
    Reassembling,
    Done,
    FallbackSubmitting,
    FallbackDone,
    Failed,
}

impl RunState {
    /// Whether the run has finished, successfully or not
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::FallbackDone | Self::Failed)
    }

    pub fn can_transition_to(&self, next: RunState) -> bool {
        use RunState::*;

        match (self, next) {
            (Idle, Extracting) => true,
            (Extracting, Chunking) | (Chunking, Translating) | (Translating, Reassembling) => true,
            (Reassembling, Done) => true,
            (Extracting | Chunking | Translating, FallbackSubmitting) => true,
            (FallbackSubmitting, FallbackDone) => true,
            (current, Failed) => !current.is_terminal(),
            _ => false,
        }
    }
}

/// Observer notified on every state change
pub type StateObserver = Arc<dyn Fn(RunState) + Send + Sync>;

/// Mutable context of one run; never shared between runs
pub struct TranslationRun {
    pub id: Uuid,
    state: RunState,
    pub completed_chunks: usize,
    pub total_chunks: usize,
    pub results: Vec<ChunkResult>,
    pub errors: Vec<PipelineError>,
    observer: Option<StateObserver>,
}

impl TranslationRun {
    fn new(observer: Option<StateObserver>) -> Self {
        Self {
            id: Uuid::new_v4(),
            state: RunState::Idle,
            completed_chunks: 0,
            total_chunks: 0,
            results: Vec::new(),
            errors: Vec::new(),
            observer,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    fn transition(&mut self, next: RunState) {
        if !self.state.can_transition_to(next) {
            error!("[{}] Illegal state transition {:?} -> {:?}", self.id, self.state, next);
            return;
        }
        debug!("[{}] {:?} -> {:?}", self.id, self.state, next);
        self.state = next;
        if let Some(observer) = &self.observer {
            observer(next);
        }
    }

    fn fail(&mut self, error: &PipelineError) {
        self.errors.push(error.clone());
        self.transition(RunState::Failed);
    }
}

/// Per-run inputs supplied by the caller
#[derive(Clone, Default)]
pub struct RunContext {
    /// Cancels in-flight requests and pending delays of this run
    pub cancel: CancellationToken,
    pub progress: Option<ProgressCallback>,
    pub state_observer: Option<StateObserver>,
}

impl RunContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_progress(mut self, progress: ProgressCallback) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn with_state_observer(mut self, observer: StateObserver) -> Self {
        self.state_observer = Some(observer);
        self
    }
}

/// Extraction, segmentation, chunk translation and fallback wired together
#[derive(Debug, Clone)]
pub struct TranslationPipeline {
    extractor: Arc<dyn Extractor>,
    segmenter: Segmenter,
    translator: ChunkTranslator,
    backend: Option<Arc<dyn DocumentBackend>>,
    max_file_size: u64,
}

impl TranslationPipeline {
    pub fn new(
        extractor: Arc<dyn Extractor>,
        segmenter: Segmenter,
        translator: ChunkTranslator,
        backend: Option<Arc<dyn DocumentBackend>>,
    ) -> Self {
        Self {
            extractor,
            segmenter,
            translator,
            backend,
            max_file_size: crate::document::MAX_FILE_SIZE_BYTES,
        }
    }

    pub fn with_max_file_size(mut self, max_file_size: u64) -> Self {
        self.max_file_size = max_file_size;
        self
    }

    /// Build the production pipeline described by `config`
    pub fn from_config(config: &Config) -> Self {
        let primary = &config.translation.primary;
        let endpoint: Arc<dyn ChunkEndpoint> = Arc::new(GoogleGtx::new(
            primary.endpoint.clone(),
            Duration::from_secs(primary.timeout_secs),
        ));
        let translator = ChunkTranslator::new(endpoint, RetryPolicy::from_config(&config.translation.retry))
            .with_source_language(primary.source_language.clone());

        let fallback = &config.translation.fallback;
        let backend: Option<Arc<dyn DocumentBackend>> = if fallback.enabled {
            Some(Arc::new(HttpDocumentBackend::new(
                fallback.base_url.clone(),
                Duration::from_secs(fallback.timeout_secs),
            )))
        } else {
            None
        };

        Self::new(
            Arc::new(LocalExtractor::new()),
            Segmenter::new(config.translation.segmentation),
            translator,
            backend,
        )
        .with_max_file_size(config.files.max_size_bytes)
    }

    pub fn backend(&self) -> Option<&Arc<dyn DocumentBackend>> {
        self.backend.as_ref()
    }

    /// Translate `document` into `target_language`
    pub async fn run(
        &self,
        document: &Document,
        target_language: &str,
        context: RunContext,
    ) -> Result<RunOutcome, PipelineError> {
        let mut run = TranslationRun::new(context.state_observer.clone());
        let progress = ProgressTracker::new(context.progress.clone());
        let cancel = &context.cancel;

        info!(
            "[{}] Translating {} ({}) into {}",
            run.id,
            document.name(),
            format_file_size(document.size_bytes()),
            target_language
        );

        let target = match self.validate(document, target_language) {
            Ok(code) => code,
            Err(e) => {
                warn!("[{}] Rejected input: {}", run.id, e);
                run.fail(&e);
                return Err(e);
            }
        };
        progress.set(Stage::Uploading, ProgressProfile::Local.band(Stage::Uploading).1);

        match self.run_local(&mut run, document, target, &progress, cancel).await {
            Ok(result) => {
                run.transition(RunState::Done);
                progress.set(Stage::Finalizing, 100);
                info!(
                    "[{}] Done: {} chunks, {} words",
                    run.id, run.total_chunks, result.metrics.translated_word_count
                );
                Ok(RunOutcome::Local(result))
            }
            Err(e) if e.escalates_to_fallback() => {
                warn!("[{}] Local translation failed ({}), using server fallback", run.id, e);
                run.errors.push(e);
                self.run_fallback(&mut run, document, target, &progress, cancel).await
            }
            Err(e) => {
                error!("[{}] Translation failed: {}", run.id, e);
                run.fail(&e);
                Err(e)
            }
        }
    }

    /// Fail-fast input checks; returns the normalized target code
    fn validate(&self, document: &Document, target_language: &str) -> Result<&'static str, PipelineError> {
        document.validate(self.max_file_size)?;
        let language = validate_target_language(target_language)?;
        Ok(language.code)
    }

    async fn run_local(
        &self,
        run: &mut TranslationRun,
        document: &Document,
        target_language: &str,
        progress: &ProgressTracker,
        cancel: &CancellationToken,
    ) -> Result<TranslationResult, PipelineError> {
        run.transition(RunState::Extracting);
        progress.set(Stage::Extracting, ProgressProfile::Local.band(Stage::Extracting).0);

        let extracted = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(PipelineError::Cancelled),
            extracted = self.extractor.extract(document) => extracted?,
        };
        if extracted.is_blank() {
            return Err(PipelineError::NoTextExtracted);
        }
        progress.set(Stage::Extracting, ProgressProfile::Local.band(Stage::Extracting).1);

        run.transition(RunState::Chunking);
        let chunks = self.segmenter.segment(&extracted.content);
        if chunks.is_empty() {
            return Err(PipelineError::SegmentationDegenerate {
                length: extracted.content.chars().count(),
            });
        }
        debug!(
            "[{}] {} chars split into {} chunks (ceiling {})",
            run.id,
            extracted.content.chars().count(),
            chunks.len(),
            self.segmenter.policy().ceiling_for(extracted.content.chars().count())
        );

        run.transition(RunState::Translating);
        run.total_chunks = chunks.len();
        for chunk in &chunks {
            let result = self.translator.translate_chunk(chunk, target_language, cancel).await?;
            run.results.push(result);
            run.completed_chunks += 1;
            progress.set(Stage::Translating, chunk_progress(run.completed_chunks, run.total_chunks));
        }

        run.transition(RunState::Reassembling);
        progress.set(Stage::Building, ProgressProfile::Local.band(Stage::Building).1);

        let translated_text = reassemble(run.results.iter().map(|r| r.translated_text.as_str()));
        let warnings = chunk_warnings(&run.results);

        Ok(TranslationResult {
            success: true,
            metrics: Metrics {
                average_confidence: 1.0,
                translated_word_count: word_count(&translated_text),
                translation_sources: vec![self.translator.source_tag().to_string()],
            },
            translated_text,
            original_text: extracted.content,
            warnings,
        })
    }

    async fn run_fallback(
        &self,
        run: &mut TranslationRun,
        document: &Document,
        target_language: &str,
        progress: &ProgressTracker,
        cancel: &CancellationToken,
    ) -> Result<RunOutcome, PipelineError> {
        let Some(backend) = &self.backend else {
            let cause = run
                .errors
                .last()
                .map(|e| e.to_string())
                .unwrap_or_else(|| "unknown error".to_string());
            let e = PipelineError::FallbackUnavailable(cause);
            error!("[{}] {}", run.id, e);
            run.fail(&e);
            return Err(e);
        };

        run.transition(RunState::FallbackSubmitting);
        progress.set_stage(ProgressProfile::Fallback, Stage::Uploading, 100.0);

        let submitted = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(PipelineError::Cancelled),
            submitted = backend.submit_document(document, target_language) => {
                submitted.map_err(PipelineError::from)
            }
        };

        match submitted {
            Ok(envelope) => {
                run.transition(RunState::FallbackDone);
                progress.set(Stage::Finalizing, 100);
                info!("[{}] Done through server fallback", run.id);

                Ok(RunOutcome::Fallback(TranslationResult {
                    success: true,
                    translated_text: envelope.translated_text().to_string(),
                    original_text: envelope.original_text().to_string(),
                    metrics: envelope.metrics.clone().unwrap_or_default(),
                    warnings: vec![Warning::fallback()],
                }))
            }
            Err(e) => {
                error!("[{}] Server fallback failed: {}", run.id, e);
                run.fail(&e);
                Err(e)
            }
        }
    }
}

/// One warning per chunk that kept its original text, plus a summary
fn chunk_warnings(results: &[ChunkResult]) -> Vec<Warning> {
    let mut warnings: Vec<Warning> = results
        .iter()
        .filter(|r| r.used_fallback_original)
        .map(|r| {
            Warning::new(
                WarningKind::ChunkTranslationExhausted,
                format!(
                    "Section {} kept its original text after {} attempts",
                    r.index + 1,
                    r.attempts
                ),
            )
        })
        .collect();

    if !warnings.is_empty() {
        let summary = Warning::new(
            WarningKind::PartialTranslation,
            format!(
                "{} of {} sections could not be translated",
                warnings.len(),
                results.len()
            ),
        )
        .with_recommendation("Review the translated document");
        warnings.push(summary);
    }

    warnings
}
