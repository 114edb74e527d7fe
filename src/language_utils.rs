/*!
 * Language utilities for target language handling.
 *
 * The translation pipeline accepts a fixed set of target languages. Codes are
 * given as ISO 639-1 (2-letter) codes; ISO 639-3 (3-letter) codes are
 * normalized to their 2-letter form before lookup.
 */

use isolang::Language;

use crate::errors::ValidationError;

/// A target language the pipeline can translate into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SupportedLanguage {
    /// ISO 639-1 code sent to the endpoints
    pub code: &'static str,
    /// English name
    pub name: &'static str,
    /// Name in the language itself
    pub native: &'static str,
    /// Writing system
    pub script: &'static str,
    /// Whether the script is written right-to-left
    pub rtl: bool,
}

/// Every language the pipeline accepts as a target
pub const SUPPORTED_LANGUAGES: [SupportedLanguage; 5] = [
    SupportedLanguage { code: "ta", name: "Tamil", native: "தமிழ்", script: "Tamil", rtl: false },
    SupportedLanguage { code: "hi", name: "Hindi", native: "हिन्दी", script: "Devanagari", rtl: false },
    SupportedLanguage { code: "ru", name: "Russian", native: "Русский", script: "Cyrillic", rtl: false },
    SupportedLanguage { code: "ja", name: "Japanese", native: "日本語", script: "Kanji/Hiragana", rtl: false },
    SupportedLanguage { code: "es", name: "Spanish", native: "Español", script: "Latin", rtl: false },
];

/// Comma-separated list of supported codes, for error messages
pub fn supported_codes() -> String {
    SUPPORTED_LANGUAGES
        .iter()
        .map(|l| l.code)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Normalize a language code to ISO 639-1 (2-letter) format if possible
pub fn normalize_to_part1(code: &str) -> Option<String> {
    let normalized_code = code.trim().to_lowercase();

    match normalized_code.len() {
        2 => Language::from_639_1(&normalized_code).map(|_| normalized_code),
        3 => Language::from_639_3(&normalized_code)
            .and_then(|lang| lang.to_639_1())
            .map(|c| c.to_string()),
        _ => None,
    }
}

/// Look up a supported target language by code
pub fn find_supported_language(code: &str) -> Option<&'static SupportedLanguage> {
    let part1 = normalize_to_part1(code)?;
    SUPPORTED_LANGUAGES.iter().find(|l| l.code == part1)
}

/// Validate a requested target language before any network activity
pub fn validate_target_language(code: &str) -> Result<&'static SupportedLanguage, ValidationError> {
    if code.trim().is_empty() {
        return Err(ValidationError::LanguageMissing);
    }

    find_supported_language(code).ok_or_else(|| ValidationError::LanguageUnsupported {
        code: code.to_string(),
        available: supported_codes(),
    })
}
