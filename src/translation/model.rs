/*!
 * Result types produced by a translation run.
 *
 * These are the values handed back to callers and serialized into JSON
 * output, so field names follow the camelCase wire format.
 */

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Outcome of translating one chunk
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkResult {
    pub index: usize,
    pub translated_text: String,
    /// The endpoint never succeeded and `translated_text` is the source chunk
    pub used_fallback_original: bool,
    pub attempts: u32,
}

/// Quality metrics attached to a result
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metrics {
    #[serde(default, deserialize_with = "lenient")]
    pub average_confidence: f64,
    #[serde(default, deserialize_with = "lenient")]
    pub translated_word_count: usize,
    #[serde(default, deserialize_with = "lenient")]
    pub translation_sources: Vec<String>,
}

/// Deserialize a field that a remote server may send as `null` or with the
/// wrong type; anything that does not fit becomes the default value
pub(crate) fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

/// Category of a non-fatal warning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WarningKind {
    /// The result came from the secondary backend
    Fallback,
    /// At least one chunk kept its original text
    PartialTranslation,
    /// One chunk exhausted its retry budget
    ChunkTranslationExhausted,
}

/// A recoverable problem surfaced alongside a successful result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warning {
    #[serde(rename = "type")]
    pub kind: WarningKind,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<String>,
}

impl Warning {
    pub fn new(kind: WarningKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            recommendation: None,
        }
    }

    pub fn with_recommendation(mut self, recommendation: impl Into<String>) -> Self {
        self.recommendation = Some(recommendation.into());
        self
    }

    pub fn fallback() -> Self {
        Self::new(WarningKind::Fallback, "Used server fallback")
    }
}

/// Terminal result handed back to the caller
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationResult {
    pub success: bool,
    pub translated_text: String,
    pub original_text: String,
    pub metrics: Metrics,
    pub warnings: Vec<Warning>,
}

impl TranslationResult {
    /// Chunks that kept their original text, if any
    pub fn has_untranslated_sections(&self) -> bool {
        self.warnings
            .iter()
            .any(|w| w.kind == WarningKind::PartialTranslation)
    }
}

/// Which path produced a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeKind {
    Local,
    Fallback,
}

/// Result of a successful run, tagged with the path that produced it
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    Local(TranslationResult),
    Fallback(TranslationResult),
}

impl RunOutcome {
    pub fn kind(&self) -> OutcomeKind {
        match self {
            Self::Local(_) => OutcomeKind::Local,
            Self::Fallback(_) => OutcomeKind::Fallback,
        }
    }

    pub fn result(&self) -> &TranslationResult {
        match self {
            Self::Local(result) | Self::Fallback(result) => result,
        }
    }

    pub fn into_result(self) -> TranslationResult {
        match self {
            Self::Local(result) | Self::Fallback(result) => result,
        }
    }
}

/// Number of whitespace-separated words
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}
