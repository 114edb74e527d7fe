/*!
 * Output document rendering.
 *
 * Turns a `TranslationResult` into the bytes of a downloadable document.
 * Text formats and DOCX are rendered here. PDF is recognised but left to
 * external tooling, since laying out Tamil, Devanagari or Japanese text
 * needs embedded fonts.
 */

use std::fmt;
use std::io::Cursor;
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use docx_rs::{AlignmentType, Docx, Paragraph, Run};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::errors::RenderError;
use crate::language_utils::SupportedLanguage;
use crate::translation::model::{Metrics, TranslationResult};

static PARAGRAPH_BREAK_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\n\s*\n").expect("valid paragraph regex")
});

/// Sentence punctuation followed by whitespace
static SENTENCE_BREAK_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[.!?]\s+").expect("valid sentence break regex")
});

/// Run sizes in half-points
const DOCX_TITLE_SIZE: usize = 32;
const DOCX_BODY_SIZE: usize = 24;
const DOCX_FOOTER_SIZE: usize = 16;

/// Output document format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputFormat {
    Txt,
    Md,
    Html,
    Json,
    Docx,
    Pdf,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Txt => "txt",
            Self::Md => "md",
            Self::Html => "html",
            Self::Json => "json",
            Self::Docx => "docx",
            Self::Pdf => "pdf",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Txt => "text/plain",
            Self::Md => "text/markdown",
            Self::Html => "text/html",
            Self::Json => "application/json",
            Self::Docx => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
            Self::Pdf => "application/pdf",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = RenderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().trim_start_matches('.').to_lowercase().as_str() {
            "txt" | "text" => Ok(Self::Txt),
            "md" | "markdown" => Ok(Self::Md),
            "html" | "htm" => Ok(Self::Html),
            "json" => Ok(Self::Json),
            "docx" => Ok(Self::Docx),
            "pdf" => Ok(Self::Pdf),
            other => Err(RenderError::UnsupportedFormat(other.to_string())),
        }
    }
}

/// Context of the rendered document
#[derive(Debug, Clone)]
pub struct RenderMeta {
    /// Name of the original upload
    pub file_name: String,
    pub language: &'static SupportedLanguage,
    pub generated_at: DateTime<Utc>,
}

impl RenderMeta {
    pub fn new(file_name: impl Into<String>, language: &'static SupportedLanguage) -> Self {
        Self {
            file_name: file_name.into(),
            language,
            generated_at: Utc::now(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonMetadata<'a> {
    original_file: &'a str,
    target_language: &'a str,
    generated_at: String,
    metrics: &'a Metrics,
}

#[derive(Serialize)]
struct JsonDocument<'a> {
    metadata: JsonMetadata<'a>,
    translation: &'a str,
}

/// Render `result` as `format`
pub fn render(format: OutputFormat, result: &TranslationResult, meta: &RenderMeta) -> Result<Vec<u8>, RenderError> {
    match format {
        OutputFormat::Txt => Ok(result.translated_text.clone().into_bytes()),
        OutputFormat::Md => Ok(render_markdown(result, meta).into_bytes()),
        OutputFormat::Html => Ok(render_html(result, meta).into_bytes()),
        OutputFormat::Json => render_json(result, meta),
        OutputFormat::Docx => render_docx(result, meta),
        OutputFormat::Pdf => Err(RenderError::UnsupportedFormat(format.to_string())),
    }
}

fn paragraphs(text: &str) -> impl Iterator<Item = &str> {
    PARAGRAPH_BREAK_REGEX
        .split(text)
        .map(str::trim)
        .filter(|p| !p.is_empty())
}

fn render_markdown(result: &TranslationResult, meta: &RenderMeta) -> String {
    let mut out = format!(
        "# {} Translation\n\n_Original: {}_\n\n",
        meta.language.name, meta.file_name
    );
    out.push_str(&paragraphs(&result.translated_text).collect::<Vec<_>>().join("\n\n"));
    out.push('\n');
    out
}

fn render_html(result: &TranslationResult, meta: &RenderMeta) -> String {
    let body = paragraphs(&result.translated_text)
        .map(|p| format!("  <p>{}</p>", escape_html(p)))
        .collect::<Vec<_>>()
        .join("\n");
    let file_name = escape_html(&meta.file_name);

    format!(
        r#"<!DOCTYPE html>
<html lang="{code}">
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <title>{file_name} - {name} Translation</title>
  <style>
    body {{ font-family: system-ui, sans-serif; padding: 2rem; max-width: 800px; margin: 0 auto; line-height: 1.6; }}
    h1 {{ text-align: center; }}
    .meta {{ text-align: center; color: #666; font-size: 0.9em; margin-bottom: 2rem; }}
    p {{ margin-bottom: 1em; text-align: justify; }}
  </style>
</head>
<body>
  <h1>{name} Translation</h1>
  <p class="meta">Original: {file_name}</p>
{body}
</body>
</html>
"#,
        code = meta.language.code,
        name = meta.language.name,
        file_name = file_name,
        body = body,
    )
}

fn render_json(result: &TranslationResult, meta: &RenderMeta) -> Result<Vec<u8>, RenderError> {
    let document = JsonDocument {
        metadata: JsonMetadata {
            original_file: &meta.file_name,
            target_language: meta.language.code,
            generated_at: meta.generated_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            metrics: &result.metrics,
        },
        translation: &result.translated_text,
    };
    Ok(serde_json::to_vec_pretty(&document)?)
}

/// One line per sentence; the punctuation stays, the whitespace after it goes
pub fn sentence_lines(text: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    let mut start = 0;
    for found in SENTENCE_BREAK_REGEX.find_iter(text) {
        lines.push(&text[start..found.start() + 1]);
        start = found.end();
    }
    lines.push(&text[start..]);

    lines.into_iter().map(str::trim).filter(|line| !line.is_empty()).collect()
}

fn render_docx(result: &TranslationResult, meta: &RenderMeta) -> Result<Vec<u8>, RenderError> {
    let title = Paragraph::new()
        .add_run(
            Run::new()
                .add_text(format!("{} Translation", meta.language.name))
                .bold()
                .size(DOCX_TITLE_SIZE),
        )
        .align(AlignmentType::Center);
    let source = Paragraph::new()
        .add_run(
            Run::new()
                .add_text(format!(
                    "Original File: {} \u{2022} Generated: {}",
                    meta.file_name,
                    meta.generated_at.format("%Y-%m-%d")
                ))
                .italic()
                .color("666666"),
        )
        .align(AlignmentType::Center);

    let mut docx = Docx::new().add_paragraph(title).add_paragraph(source);
    for line in sentence_lines(&result.translated_text) {
        docx = docx.add_paragraph(
            Paragraph::new()
                .add_run(Run::new().add_text(line).size(DOCX_BODY_SIZE))
                .align(AlignmentType::Both),
        );
    }
    docx = docx.add_paragraph(
        Paragraph::new()
            .add_run(
                Run::new()
                    .add_text(format!(
                        "Confidence: {:.1}%",
                        result.metrics.average_confidence * 100.0
                    ))
                    .size(DOCX_FOOTER_SIZE)
                    .color("888888"),
            )
            .align(AlignmentType::Center),
    );

    let mut buffer = Cursor::new(Vec::new());
    docx.build()
        .pack(&mut buffer)
        .map_err(|e| RenderError::Packaging(e.to_string()))?;
    Ok(buffer.into_inner())
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
