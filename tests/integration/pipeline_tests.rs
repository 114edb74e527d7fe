/*!
 * End-to-end pipeline runs against in-process endpoint and backend doubles
 */

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use doctranslate::errors::ErrorCode;
use doctranslate::providers::ChunkEndpoint;
use doctranslate::providers::mock::{MockBackend, MockEndpoint};
use doctranslate::translation::{
    ChunkSizePolicy, ChunkTranslator, OutcomeKind, RecordingSleeper, RetryPolicy, RunState, Segmenter, WarningKind,
};
use doctranslate::extraction::LocalExtractor;
use doctranslate::{Document, PipelineError, ProviderError, RunContext, RunOutcome, TranslationPipeline, ValidationError};

use crate::common::{self, ProgressRecorder, StateRecorder, TestPipeline};

fn backend() -> MockBackend {
    MockBackend::succeeding("Texto traducido por el servidor", "Server side original")
}

#[tokio::test]
async fn test_whitespace_document_should_go_to_fallback_without_chunk_calls() {
    common::init_logging();
    let test = TestPipeline::new(MockEndpoint::working(), Some(backend()));
    let states = StateRecorder::default();

    let outcome = test
        .pipeline
        .run(
            &common::text_document("blank.txt", "   \n\n \t "),
            "es",
            RunContext::new().with_state_observer(states.observer()),
        )
        .await
        .unwrap();

    assert_eq!(outcome.kind(), OutcomeKind::Fallback);
    let result = outcome.into_result();
    assert!(result.success);
    assert_eq!(result.translated_text, "Texto traducido por el servidor");
    assert_eq!(result.original_text, "Server side original");
    assert_eq!(result.metrics.average_confidence, 0.87);
    assert_eq!(result.warnings.len(), 1);
    assert_eq!(result.warnings[0].kind, WarningKind::Fallback);
    assert_eq!(result.warnings[0].message, "Used server fallback");

    assert_eq!(test.endpoint.request_count(), 0);
    assert_eq!(
        test.backend.unwrap().submissions(),
        vec![("blank.txt".to_string(), "es".to_string())]
    );
    assert_eq!(
        states.states(),
        vec![RunState::Extracting, RunState::FallbackSubmitting, RunState::FallbackDone]
    );
}

#[tokio::test]
async fn test_single_sentence_should_need_one_chunk_call() {
    common::init_logging();
    let test = TestPipeline::new(MockEndpoint::working(), Some(backend()));
    let text = "The quick brown fox jumps over the lazy dog today.";
    assert_eq!(text.chars().count(), 50);

    let outcome = test
        .pipeline
        .run(&common::text_document("fox.txt", text), "es", RunContext::new())
        .await
        .unwrap();

    let RunOutcome::Local(result) = outcome else {
        panic!("expected a local outcome");
    };
    assert_eq!(result.translated_text, format!("[es] {}", text));
    assert_eq!(result.original_text, text);
    assert_eq!(result.metrics.average_confidence, 1.0);
    assert_eq!(result.metrics.translated_word_count, 11);
    assert_eq!(result.metrics.translation_sources, vec!["mock-endpoint".to_string()]);
    assert!(result.warnings.is_empty());

    assert_eq!(test.endpoint.request_count(), 1);
    assert_eq!(test.backend.unwrap().submission_count(), 0);
    assert_eq!(test.sleeper.recorded(), vec![Duration::from_millis(300)]);
}

#[tokio::test]
async fn test_large_document_should_be_split_into_bounded_chunks() {
    common::init_logging();
    let test = TestPipeline::new(MockEndpoint::working(), None);
    let text = common::long_paragraph(120);

    let result = test
        .pipeline
        .run(&common::text_document("long.txt", &text), "ja", RunContext::new())
        .await
        .unwrap()
        .into_result();

    let calls = test.endpoint.calls();
    // 7 sentences of 42 characters fit under the 300 character ceiling
    assert_eq!(calls.len(), 18);
    assert!(calls.iter().all(|c| c.text.chars().count() <= 300));
    assert!(calls.iter().all(|c| c.target_language == "ja" && c.source_language == "auto"));

    let parts: Vec<&str> = result.translated_text.split("\n\n").collect();
    assert_eq!(parts.len(), calls.len());
    for (part, call) in parts.iter().zip(&calls) {
        assert_eq!(*part, format!("[ja] {}", call.text));
    }
}

#[tokio::test]
async fn test_rate_limited_chunk_should_keep_original_and_warn() {
    common::init_logging();
    let endpoint = MockEndpoint::working().rate_limit_text("number 0007");
    let test = TestPipeline::new(endpoint, Some(backend()));
    let text = common::long_paragraph(60);

    let outcome = test
        .pipeline
        .run(&common::text_document("report.txt", &text), "hi", RunContext::new())
        .await
        .unwrap();

    assert_eq!(outcome.kind(), OutcomeKind::Local);
    let result = outcome.into_result();
    assert!(result.success);
    assert!(result.has_untranslated_sections());

    let parts: Vec<&str> = result.translated_text.split("\n\n").collect();
    assert_eq!(parts.len(), 9);
    assert!(parts[1].starts_with("This is sentence number 0007"));
    assert!(parts.iter().enumerate().all(|(i, p)| i == 1 || p.starts_with("[hi] ")));

    let kinds: Vec<WarningKind> = result.warnings.iter().map(|w| w.kind).collect();
    assert_eq!(kinds, vec![WarningKind::ChunkTranslationExhausted, WarningKind::PartialTranslation]);
    assert_eq!(result.warnings[0].message, "Section 2 kept its original text after 3 attempts");
    assert_eq!(result.warnings[1].message, "1 of 9 sections could not be translated");

    // 8 chunks on the first attempt, 3 attempts for the throttled one
    assert_eq!(test.endpoint.request_count(), 11);
    assert_eq!(test.backend.unwrap().submission_count(), 0);
    assert_eq!(test.sleeper.total(), Duration::from_millis(9 * 300 + 4000 + 5000));
}

#[tokio::test]
async fn test_corrupt_docx_should_skip_segmentation_and_use_fallback() {
    common::init_logging();
    let test = TestPipeline::new(MockEndpoint::working(), Some(backend()));
    let states = StateRecorder::default();
    let document = Document::new("broken.docx", b"PK\x03\x04 truncated".to_vec(), None);

    let outcome = test
        .pipeline
        .run(&document, "ru", RunContext::new().with_state_observer(states.observer()))
        .await
        .unwrap();

    assert_eq!(outcome.kind(), OutcomeKind::Fallback);
    assert_eq!(test.endpoint.request_count(), 0);
    assert!(!states.states().contains(&RunState::Chunking));
}

#[tokio::test]
async fn test_failing_fallback_should_reject_with_one_error() {
    common::init_logging();
    let failing = MockBackend::failing(ProviderError::Rejected {
        code: "SERVER_ERROR".to_string(),
        message: "Backend exploded".to_string(),
    });
    let test = TestPipeline::new(MockEndpoint::working(), Some(failing));
    let states = StateRecorder::default();
    let document = Document::new("scan.pdf", b"%PDF-1.7".to_vec(), None);

    let error = test
        .pipeline
        .run(&document, "es", RunContext::new().with_state_observer(states.observer()))
        .await
        .unwrap_err();

    assert_eq!(
        error,
        PipelineError::FallbackSubmissionFailed {
            code: "SERVER_ERROR".to_string(),
            message: "Backend exploded".to_string(),
        }
    );
    assert_eq!(error.code(), ErrorCode::ServerError);
    assert_eq!(error.user_message(), "Server Error: Backend exploded");
    assert_eq!(
        states.states(),
        vec![RunState::Extracting, RunState::FallbackSubmitting, RunState::Failed]
    );
}

#[tokio::test]
async fn test_missing_backend_should_report_fallback_unavailable() {
    common::init_logging();
    let test = TestPipeline::new(MockEndpoint::working(), None);

    let error = test
        .pipeline
        .run(&common::text_document("blank.txt", "  "), "es", RunContext::new())
        .await
        .unwrap_err();

    match error {
        PipelineError::FallbackUnavailable(cause) => assert_eq!(cause, "No text extracted from file"),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_validation_should_fail_before_any_network_call() {
    common::init_logging();
    let test = TestPipeline::new(MockEndpoint::working(), Some(backend()));
    let states = StateRecorder::default();
    let context = RunContext::new().with_state_observer(states.observer());

    let unsupported = test
        .pipeline
        .run(&common::text_document("a.txt", "Hello."), "fr", context.clone())
        .await;
    assert!(matches!(
        unsupported,
        Err(PipelineError::Validation(ValidationError::LanguageUnsupported { .. }))
    ));

    let empty = test.pipeline.run(&common::text_document("a.txt", ""), "es", context.clone()).await;
    assert_eq!(empty.unwrap_err(), PipelineError::Validation(ValidationError::FileEmpty));

    let image = Document::new("photo.png", b"\x89PNG".to_vec(), None);
    let wrong_type = test.pipeline.run(&image, "es", context).await;
    assert!(matches!(
        wrong_type,
        Err(PipelineError::Validation(ValidationError::InvalidFileType { .. }))
    ));

    assert_eq!(test.endpoint.request_count(), 0);
    assert_eq!(test.backend.unwrap().submission_count(), 0);
    assert_eq!(states.states(), vec![RunState::Failed; 3]);
}

#[tokio::test]
async fn test_document_over_size_limit_should_be_rejected() {
    let test = TestPipeline::new(MockEndpoint::working(), Some(backend()));
    let pipeline = test.pipeline.with_max_file_size(16);

    let result = pipeline
        .run(&common::text_document("big.txt", "This text is longer than sixteen bytes."), "es", RunContext::new())
        .await;

    assert!(matches!(
        result,
        Err(PipelineError::Validation(ValidationError::FileTooLarge { .. }))
    ));
    assert_eq!(test.endpoint.request_count(), 0);
}

#[tokio::test]
async fn test_progress_should_be_monotonic_and_end_at_100() {
    let test = TestPipeline::new(MockEndpoint::working(), None);
    let progress = ProgressRecorder::default();

    test.pipeline
        .run(
            &common::text_document("long.txt", &common::long_paragraph(60)),
            "ta",
            RunContext::new().with_progress(progress.callback()),
        )
        .await
        .unwrap();

    let percents = progress.percents();
    assert!(percents.windows(2).all(|w| w[0] <= w[1]), "{:?}", percents);
    assert_eq!(percents.first(), Some(&5));
    assert_eq!(percents.last(), Some(&100));
    assert!(percents.contains(&15));
    assert!(percents.contains(&90));
    assert!(percents.contains(&95));
}

#[tokio::test]
async fn test_fallback_progress_should_jump_to_upload_band_end() {
    let test = TestPipeline::new(MockEndpoint::working(), Some(backend()));
    let progress = ProgressRecorder::default();

    test.pipeline
        .run(
            &common::text_document("blank.txt", " "),
            "es",
            RunContext::new().with_progress(progress.callback()),
        )
        .await
        .unwrap();

    let percents = progress.percents();
    assert!(percents.windows(2).all(|w| w[0] <= w[1]), "{:?}", percents);
    assert!(percents.contains(&30));
    assert_eq!(percents.last(), Some(&100));
}

#[tokio::test]
async fn test_successful_run_should_walk_every_local_state() {
    let test = TestPipeline::new(MockEndpoint::working(), None);
    let states = StateRecorder::default();

    test.pipeline
        .run(
            &common::text_document("a.txt", "One.\n\nTwo."),
            "es",
            RunContext::new().with_state_observer(states.observer()),
        )
        .await
        .unwrap();

    assert_eq!(
        states.states(),
        vec![
            RunState::Extracting,
            RunState::Chunking,
            RunState::Translating,
            RunState::Reassembling,
            RunState::Done,
        ]
    );
}

#[tokio::test]
async fn test_cancelled_before_start_should_not_call_anything() {
    let test = TestPipeline::new(MockEndpoint::working(), Some(backend()));
    let cancel = CancellationToken::new();
    cancel.cancel();

    let result = test
        .pipeline
        .run(&common::text_document("a.txt", "Hello."), "es", RunContext::new().with_cancel(cancel))
        .await;

    assert_eq!(result.unwrap_err(), PipelineError::Cancelled);
    assert_eq!(test.endpoint.request_count(), 0);
    assert_eq!(test.backend.unwrap().submission_count(), 0);
}

/// Endpoint that cancels its run on the Nth request
#[derive(Debug)]
struct CancellingEndpoint {
    cancel: CancellationToken,
    cancel_on: usize,
    requests: AtomicUsize,
}

#[async_trait]
impl ChunkEndpoint for CancellingEndpoint {
    async fn translate_text(&self, text: &str, _source: &str, target: &str) -> Result<String, ProviderError> {
        let count = self.requests.fetch_add(1, Ordering::SeqCst) + 1;
        if count == self.cancel_on {
            self.cancel.cancel();
        }
        Ok(format!("[{}] {}", target, text))
    }

    fn source_tag(&self) -> &str {
        "cancelling"
    }
}

#[tokio::test]
async fn test_cancellation_mid_run_should_stop_remaining_chunks() {
    let cancel = CancellationToken::new();
    let endpoint = Arc::new(CancellingEndpoint {
        cancel: cancel.clone(),
        cancel_on: 2,
        requests: AtomicUsize::new(0),
    });
    let translator = ChunkTranslator::new(endpoint.clone(), RetryPolicy::default())
        .with_sleeper(Arc::new(RecordingSleeper::new()));
    let pipeline = TranslationPipeline::new(
        Arc::new(LocalExtractor::new()),
        Segmenter::new(ChunkSizePolicy::default()),
        translator,
        None,
    );
    let states = StateRecorder::default();

    let result = pipeline
        .run(
            &common::text_document("long.txt", &common::long_paragraph(120)),
            "es",
            RunContext::new().with_cancel(cancel).with_state_observer(states.observer()),
        )
        .await;

    assert_eq!(result.unwrap_err(), PipelineError::Cancelled);
    assert_eq!(endpoint.requests.load(Ordering::SeqCst), 2);
    assert_eq!(states.states().last(), Some(&RunState::Failed));
}
