/*!
 * Clients for the external translation services.
 *
 * - `google`: the primary per-chunk text endpoint
 * - `backend`: the secondary whole-document backend used as fallback
 * - `mock`: in-process doubles of both for tests
 */

use async_trait::async_trait;
use std::fmt::Debug;

use crate::document::Document;
use crate::errors::ProviderError;

pub use self::backend::{BackendEnvelope, BackendError, BackendText, HttpDocumentBackend};
pub use self::google::{GTX_SOURCE_TAG, GoogleGtx};

/// Primary endpoint translating one chunk of text per request
///
/// Implementations perform exactly one network call per invocation and never
/// retry on their own; retrying belongs to the chunk translator.
#[async_trait]
pub trait ChunkEndpoint: Send + Sync + Debug {
    /// Translate `text` from `source_language` (or `auto`) into `target_language`
    async fn translate_text(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
    ) -> Result<String, ProviderError>;

    /// Label reported in `metrics.translation_sources`
    fn source_tag(&self) -> &str;
}

/// Secondary backend translating a whole document in one request
#[async_trait]
pub trait DocumentBackend: Send + Sync + Debug {
    /// Submit the original document; a success envelope is the only `Ok` value
    async fn submit_document(
        &self,
        document: &Document,
        target_language: &str,
    ) -> Result<BackendEnvelope, ProviderError>;

    /// Whether the backend answers its health endpoint
    async fn health_check(&self) -> bool;
}

pub mod backend;
pub mod google;
pub mod mock;
