/*!
 * Error types for the doctranslate library.
 *
 * This module contains custom error types for the different layers of a
 * translation run, using the thiserror crate for ergonomic error definitions:
 * - `ProviderError`: one request to the chunk endpoint or the document backend
 * - `ValidationError`: fail-fast input checks, raised before any network activity
 * - `ExtractionError`: local text extraction from the uploaded bytes
 * - `PipelineError`: a whole run, the only error type a caller ever sees
 * - `RenderError`: output document rendering
 *
 * Every user-facing error maps to a stable `ErrorCode` with a title, a message
 * and a suggested action.
 */

use std::fmt;

use thiserror::Error;

/// Stable, user-facing error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    FileMissing,
    FileEmpty,
    FileTooLarge,
    InvalidFileType,
    LanguageMissing,
    LanguageUnsupported,
    ExtractionError,
    TranslationError,
    PartialTranslation,
    NetworkError,
    Timeout,
    ServerError,
    ServiceUnavailable,
    UnknownError,
}

/// Human-readable description of an error code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorInfo {
    pub title: &'static str,
    pub message: &'static str,
    pub action: &'static str,
}

impl ErrorCode {
    /// The wire representation of the code (e.g. `FILE_TOO_LARGE`)
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FileMissing => "FILE_MISSING",
            Self::FileEmpty => "FILE_EMPTY",
            Self::FileTooLarge => "FILE_TOO_LARGE",
            Self::InvalidFileType => "INVALID_FILE_TYPE",
            Self::LanguageMissing => "LANGUAGE_MISSING",
            Self::LanguageUnsupported => "LANGUAGE_UNSUPPORTED",
            Self::ExtractionError => "EXTRACTION_ERROR",
            Self::TranslationError => "TRANSLATION_ERROR",
            Self::PartialTranslation => "PARTIAL_TRANSLATION",
            Self::NetworkError => "NETWORK_ERROR",
            Self::Timeout => "TIMEOUT",
            Self::ServerError => "SERVER_ERROR",
            Self::ServiceUnavailable => "SERVICE_UNAVAILABLE",
            Self::UnknownError => "UNKNOWN_ERROR",
        }
    }

    /// Parse a wire code, falling back to `UnknownError`
    pub fn from_code(code: &str) -> Self {
        match code {
            "FILE_MISSING" => Self::FileMissing,
            "FILE_EMPTY" => Self::FileEmpty,
            "FILE_TOO_LARGE" => Self::FileTooLarge,
            "INVALID_FILE_TYPE" => Self::InvalidFileType,
            "LANGUAGE_MISSING" => Self::LanguageMissing,
            "LANGUAGE_UNSUPPORTED" => Self::LanguageUnsupported,
            "EXTRACTION_ERROR" => Self::ExtractionError,
            "TRANSLATION_ERROR" => Self::TranslationError,
            "PARTIAL_TRANSLATION" => Self::PartialTranslation,
            "NETWORK_ERROR" => Self::NetworkError,
            "TIMEOUT" => Self::Timeout,
            "SERVER_ERROR" => Self::ServerError,
            "SERVICE_UNAVAILABLE" => Self::ServiceUnavailable,
            _ => Self::UnknownError,
        }
    }

    /// Title, message and suggested action for this code
    pub fn info(&self) -> ErrorInfo {
        let (title, message, action) = match self {
            Self::FileMissing => ("No File Selected", "Please select a document to translate.", "Select a file"),
            Self::FileEmpty => ("Empty File", "The selected file appears to be empty.", "Choose a different file"),
            Self::FileTooLarge => ("File Too Large", "The file exceeds the maximum size limit of 10MB.", "Choose a smaller file"),
            Self::InvalidFileType => ("Unsupported Format", "This file format is not supported.", "Use PDF, DOCX, DOC, TXT, or RTF"),
            Self::LanguageMissing => ("Language Not Selected", "Please select a target language for translation.", "Select a language"),
            Self::LanguageUnsupported => ("Unsupported Language", "The selected language is not currently supported.", "Choose a different language"),
            Self::ExtractionError => ("Text Extraction Failed", "Could not extract text from the document.", "Try a different file format"),
            Self::TranslationError => ("Translation Failed", "An error occurred during translation.", "Please try again"),
            Self::PartialTranslation => ("Partial Translation", "Some sections could not be translated.", "Review the translated document"),
            Self::NetworkError => ("Network Error", "Could not connect to the translation service.", "Check your internet connection"),
            Self::Timeout => ("Request Timeout", "The translation is taking too long.", "Try a smaller document"),
            Self::ServerError => ("Server Error", "The translation service encountered an error.", "Please try again later"),
            Self::ServiceUnavailable => ("Service Unavailable", "The translation service is temporarily unavailable.", "Please try again later"),
            Self::UnknownError => ("Unexpected Error", "Something went wrong.", "Please try again"),
        };
        ErrorInfo { title, message, action }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Render an error as `"<title>: <message>"`, using the code's default message
/// when none is given
pub fn format_error_message(code: ErrorCode, message: Option<&str>) -> String {
    let info = code.info();
    let message = message.filter(|m| !m.trim().is_empty()).unwrap_or(info.message);
    format!("{}: {}", info.title, message)
}

/// Errors that can occur when calling the chunk endpoint or the document backend
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Non-success status returned by the API
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// The backend answered but reported a failure in its envelope
    #[error("{message}")]
    Rejected {
        /// Error code from the backend envelope
        code: String,
        /// Error message from the backend envelope
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// HTTP 429 from the endpoint
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// The request did not complete within the configured timeout
    #[error("Request timeout: {0}")]
    Timeout(String),

    /// The run owning the request was cancelled
    #[error("Request cancelled")]
    Cancelled,
}

impl ProviderError {
    /// Whether the endpoint asked us to slow down
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimitExceeded(_))
    }

    /// The code reported to the caller when this error ends a run
    pub fn code(&self) -> String {
        match self {
            Self::Rejected { code, .. } => code.clone(),
            Self::ParseError(_) => "PARSE_ERROR".to_string(),
            Self::ApiError { .. } | Self::RateLimitExceeded(_) => "HTTP_ERROR".to_string(),
            Self::ConnectionError(_) | Self::RequestFailed(_) => ErrorCode::NetworkError.to_string(),
            Self::Timeout(_) => ErrorCode::Timeout.to_string(),
            Self::Cancelled => ErrorCode::UnknownError.to_string(),
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout(error.to_string())
        } else if error.is_connect() {
            Self::ConnectionError(error.to_string())
        } else {
            Self::RequestFailed(error.to_string())
        }
    }
}

/// Fail-fast input validation errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("No file provided: {0}")]
    FileMissing(String),

    #[error("File is empty")]
    FileEmpty,

    #[error("File size ({size_mb:.2}MB) exceeds limit of {limit_mb}MB")]
    FileTooLarge { size_mb: f64, limit_mb: u64 },

    #[error("File type not supported. Allowed: {allowed}")]
    InvalidFileType { allowed: String },

    #[error("Target language not specified")]
    LanguageMissing,

    #[error("Language '{code}' not supported. Available: {available}")]
    LanguageUnsupported { code: String, available: String },
}

impl ValidationError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::FileMissing(_) => ErrorCode::FileMissing,
            Self::FileEmpty => ErrorCode::FileEmpty,
            Self::FileTooLarge { .. } => ErrorCode::FileTooLarge,
            Self::InvalidFileType { .. } => ErrorCode::InvalidFileType,
            Self::LanguageMissing => ErrorCode::LanguageMissing,
            Self::LanguageUnsupported { .. } => ErrorCode::LanguageUnsupported,
        }
    }
}

/// Errors raised by a text extractor
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    /// The format is recognised but cannot be read locally
    #[error("Unsupported file type: .{0}")]
    Unsupported(String),

    /// The bytes could not be parsed as the declared format
    #[error("Failed to read file: {0}")]
    Corrupt(String),
}

/// Errors that end (or redirect) a translation run
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    /// Input rejected before any network activity
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The extractor could not read the document
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    /// Extraction produced empty or whitespace-only text
    #[error("No text extracted from file")]
    NoTextExtracted,

    /// Non-empty text produced zero chunks
    #[error("Segmentation produced no chunks from {length} characters of text")]
    SegmentationDegenerate { length: usize },

    /// The secondary backend failed; terminal
    #[error("{message}")]
    FallbackSubmissionFailed { code: String, message: String },

    /// The local path failed and no secondary backend is configured
    #[error("Local translation failed and server fallback is disabled: {0}")]
    FallbackUnavailable(String),

    /// The caller abandoned the run
    #[error("Translation run cancelled")]
    Cancelled,
}

impl PipelineError {
    /// Whether the local path should hand this failure to the secondary backend
    pub fn escalates_to_fallback(&self) -> bool {
        matches!(
            self,
            Self::Extraction(_) | Self::NoTextExtracted | Self::SegmentationDegenerate { .. }
        )
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Validation(e) => e.code(),
            Self::Extraction(_) | Self::NoTextExtracted => ErrorCode::ExtractionError,
            Self::SegmentationDegenerate { .. } | Self::FallbackUnavailable(_) => ErrorCode::TranslationError,
            Self::FallbackSubmissionFailed { code, .. } => match ErrorCode::from_code(code) {
                ErrorCode::UnknownError => ErrorCode::TranslationError,
                known => known,
            },
            Self::Cancelled => ErrorCode::UnknownError,
        }
    }

    /// One consolidated, human-readable line for the caller
    pub fn user_message(&self) -> String {
        format_error_message(self.code(), Some(&self.to_string()))
    }
}

impl From<ProviderError> for PipelineError {
    fn from(error: ProviderError) -> Self {
        match error {
            ProviderError::Cancelled => Self::Cancelled,
            other => Self::FallbackSubmissionFailed {
                code: other.code(),
                message: other.to_string(),
            },
        }
    }
}

/// Errors that can occur while rendering an output document
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Failed to serialize output: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Failed to package document: {0}")]
    Packaging(String),
}
