/*!
 * Input document model.
 *
 * A `Document` is the immutable input of one translation run: the raw bytes
 * of an uploaded file together with its name and an optional MIME hint.
 * `ExtractedText` is what an extractor produces from it.
 */

use std::path::Path;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::errors::ValidationError;

/// Default upload size limit (10 MiB)
pub const MAX_FILE_SIZE_BYTES: u64 = 10 * 1024 * 1024;

/// MIME types accepted for upload
pub const ALLOWED_MIME_TYPES: [&str; 5] = [
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "text/plain",
    "application/rtf",
];

/// File extensions accepted for upload when the MIME type is unknown
pub const ALLOWED_EXTENSIONS: [&str; 5] = ["pdf", "doc", "docx", "txt", "rtf"];

/// Format the text was extracted from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    Txt,
    Pdf,
    Docx,
}

/// Text produced by an extractor; consumed once by the segmenter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedText {
    pub content: String,
    pub source_format: SourceFormat,
}

impl ExtractedText {
    pub fn new(content: impl Into<String>, source_format: SourceFormat) -> Self {
        Self {
            content: content.into(),
            source_format,
        }
    }

    /// Whether there is anything to translate
    pub fn is_blank(&self) -> bool {
        self.content.trim().is_empty()
    }
}

/// MIME type for a known document extension
pub fn mime_for_extension(extension: &str) -> Option<&'static str> {
    match extension.to_lowercase().as_str() {
        "pdf" => Some("application/pdf"),
        "doc" => Some("application/msword"),
        "docx" => Some("application/vnd.openxmlformats-officedocument.wordprocessingml.document"),
        "txt" => Some("text/plain"),
        "rtf" => Some("application/rtf"),
        _ => None,
    }
}

/// An uploaded file, owned by the caller for the duration of one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    raw_bytes: Bytes,
    mime_hint: Option<String>,
    name: String,
}

impl Document {
    /// Create a document from in-memory bytes
    pub fn new(name: impl Into<String>, raw_bytes: impl Into<Bytes>, mime_hint: Option<String>) -> Self {
        Self {
            raw_bytes: raw_bytes.into(),
            mime_hint,
            name: name.into(),
        }
    }

    /// Read a document from disk, guessing the MIME type from its extension
    pub async fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ValidationError> {
        let path = path.as_ref();
        let raw_bytes = tokio::fs::read(path)
            .await
            .map_err(|e| ValidationError::FileMissing(format!("{}: {}", path.display(), e)))?;

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());

        let mime_hint = path
            .extension()
            .and_then(|ext| mime_for_extension(&ext.to_string_lossy()))
            .map(str::to_string);

        Ok(Self::new(name, raw_bytes, mime_hint))
    }

    pub fn raw_bytes(&self) -> &Bytes {
        &self.raw_bytes
    }

    pub fn mime_hint(&self) -> Option<&str> {
        self.mime_hint.as_deref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size_bytes(&self) -> u64 {
        self.raw_bytes.len() as u64
    }

    /// Lowercase extension of the file name, if any
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.name)
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
    }

    /// MIME type used when uploading the document
    pub fn content_type(&self) -> &str {
        self.mime_hint
            .as_deref()
            .or_else(|| self.extension().and_then(|ext| mime_for_extension(&ext)))
            .unwrap_or("application/octet-stream")
    }

    /// Check size and type limits; the first failing rule wins
    pub fn validate(&self, max_size_bytes: u64) -> Result<(), ValidationError> {
        if self.raw_bytes.is_empty() {
            return Err(ValidationError::FileEmpty);
        }

        if self.size_bytes() > max_size_bytes {
            return Err(ValidationError::FileTooLarge {
                size_mb: self.size_bytes() as f64 / 1024.0 / 1024.0,
                limit_mb: max_size_bytes / 1024 / 1024,
            });
        }

        let mime_allowed = self
            .mime_hint
            .as_deref()
            .is_some_and(|mime| ALLOWED_MIME_TYPES.contains(&mime));
        let extension_allowed = self
            .extension()
            .is_some_and(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()));

        if !mime_allowed && !extension_allowed {
            return Err(ValidationError::InvalidFileType {
                allowed: ALLOWED_EXTENSIONS.join(", "),
            });
        }

        Ok(())
    }
}
