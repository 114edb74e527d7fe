/*!
 * Chunked document translation.
 *
 * This module contains the core of a translation run. It is split into
 * several submodules:
 *
 * - `segmenter`: Splitting extracted text into bounded-size chunks
 * - `retry`: Retry policy with injectable backoff
 * - `clock`: Sleeping abstraction used by the retry policy
 * - `chunk_translator`: One chunk through the primary endpoint, with retries
 * - `progress`: Stage bands and monotonic progress reporting
 * - `model`: Result types shared by the pipeline and renderers
 * - `pipeline`: The run state machine with its server fallback
 */

// Re-export main types for easier usage
pub use self::chunk_translator::ChunkTranslator;
pub use self::clock::{RecordingSleeper, Sleeper, TokioSleeper};
pub use self::model::{ChunkResult, Metrics, OutcomeKind, RunOutcome, TranslationResult, Warning, WarningKind};
pub use self::pipeline::{RunContext, RunState, TranslationPipeline};
pub use self::progress::{ProgressProfile, ProgressUpdate, Stage};
pub use self::retry::{RetryOutcome, RetryPolicy};
pub use self::segmenter::{Chunk, ChunkSizePolicy, Segmenter};

// Submodules
pub mod chunk_translator;
pub mod clock;
pub mod model;
pub mod pipeline;
pub mod progress;
pub mod retry;
pub mod segmenter;
