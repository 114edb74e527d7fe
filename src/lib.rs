/*!
 * # doctranslate - Chunked document translation
 *
 * A Rust library for translating documents through a size-limited,
 * rate-limited text translation endpoint, with a whole-document server
 * fallback.
 *
 * ## Features
 *
 * - Input validation (size, type, target language) before any network call
 * - Local text extraction for plain text and DOCX files
 * - Adaptive segmentation that keeps paragraphs together where possible
 * - Sequential per-chunk translation with bounded retry and backoff
 * - Monotonic 0-100 progress reporting across stages
 * - Server fallback when the local path cannot produce text
 * - Text, Markdown, HTML and JSON output
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `app_controller`: File and folder workflow used by the CLI
 * - `document`: Input document model and validation rules
 * - `extraction`: Text extraction from uploaded files
 * - `translation`: The translation run:
 *   - `translation::segmenter`: Chunking of extracted text
 *   - `translation::chunk_translator`: Per-chunk requests with retry
 *   - `translation::progress`: Progress aggregation
 *   - `translation::pipeline`: Run orchestration and fallback
 * - `providers`: Clients for the external services:
 *   - `providers::google`: Primary per-chunk endpoint
 *   - `providers::backend`: Secondary document backend
 * - `render`: Output document rendering
 * - `file_utils`: File system operations
 * - `language_utils`: Supported target languages
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod document;
pub mod errors;
pub mod extraction;
pub mod file_utils;
pub mod language_utils;
pub mod providers;
pub mod render;
pub mod translation;

// Re-export main types for easier usage
pub use app_config::Config;
pub use document::{Document, ExtractedText, SourceFormat};
pub use errors::{ErrorCode, PipelineError, ProviderError, ValidationError};
pub use language_utils::{SUPPORTED_LANGUAGES, SupportedLanguage, validate_target_language};
pub use render::{OutputFormat, RenderMeta, render};
pub use translation::{RunContext, RunOutcome, TranslationPipeline, TranslationResult};
