/*!
 * Text extraction from uploaded documents.
 *
 * The pipeline only depends on the `Extractor` trait. `LocalExtractor` reads
 * plain text, DOCX containers and PDF text layers; every other format raises
 * an `ExtractionError`, which routes the run to the server fallback.
 */

use std::fmt::Debug;
use std::io::{Cursor, Read};

use async_trait::async_trait;
use bytes::Bytes;
use log::debug;
use once_cell::sync::Lazy;
use quick_xml::Reader;
use quick_xml::events::Event;
use regex::Regex;

use crate::document::{Document, ExtractedText, SourceFormat};
use crate::errors::ExtractionError;

/// Blank lines or form feeds between paragraphs and pages of a PDF text layer
static PDF_PARAGRAPH_BREAK_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n[ \t\r]*\n|\x0c").expect("valid paragraph break regex"));

/// Common trait for document text extractors
#[async_trait]
pub trait Extractor: Send + Sync + Debug {
    /// Extract the text content of a document
    async fn extract(&self, document: &Document) -> Result<ExtractedText, ExtractionError>;
}

/// Extractor for the formats that can be read without external tooling
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalExtractor;

impl LocalExtractor {
    pub fn new() -> Self {
        Self
    }

    fn extract_txt(bytes: &[u8]) -> ExtractedText {
        let text = String::from_utf8_lossy(bytes);
        let text = text.strip_prefix('\u{feff}').unwrap_or(&*text);
        ExtractedText::new(text, SourceFormat::Txt)
    }

    fn extract_docx(bytes: &[u8]) -> Result<ExtractedText, ExtractionError> {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
            .map_err(|e| ExtractionError::Corrupt(format!("not a DOCX container: {}", e)))?;

        let mut xml = String::new();
        archive
            .by_name("word/document.xml")
            .map_err(|e| ExtractionError::Corrupt(format!("missing word/document.xml: {}", e)))?
            .read_to_string(&mut xml)
            .map_err(|e| ExtractionError::Corrupt(format!("unreadable word/document.xml: {}", e)))?;

        Ok(ExtractedText::new(docx_xml_to_text(&xml)?, SourceFormat::Docx))
    }

    /// Runs on the blocking pool; a parser panic surfaces as a join error
    async fn extract_pdf(bytes: Bytes) -> Result<ExtractedText, ExtractionError> {
        let raw = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
            .await
            .map_err(|e| ExtractionError::Corrupt(format!("PDF reader aborted: {}", e)))?
            .map_err(|e| ExtractionError::Corrupt(format!("unreadable PDF: {}", e)))?;

        debug!("PDF text layer: {} raw chars", raw.chars().count());
        Ok(ExtractedText::new(normalize_pdf_text(&raw), SourceFormat::Pdf))
    }
}

#[async_trait]
impl Extractor for LocalExtractor {
    async fn extract(&self, document: &Document) -> Result<ExtractedText, ExtractionError> {
        let extension = document.extension().unwrap_or_default();
        let bytes = document.raw_bytes();

        match (extension.as_str(), document.mime_hint()) {
            ("txt", _) | (_, Some("text/plain")) => Ok(Self::extract_txt(bytes)),
            ("docx", _) | (_, Some("application/vnd.openxmlformats-officedocument.wordprocessingml.document")) => {
                Self::extract_docx(bytes)
            }
            ("pdf", _) | (_, Some("application/pdf")) => Self::extract_pdf(bytes.clone()).await,
            ("", _) => Err(ExtractionError::Unsupported("unknown".to_string())),
            (other, _) => Err(ExtractionError::Unsupported(other.to_string())),
        }
    }
}

/// Flatten WordprocessingML into plain text; paragraphs become blank-line separated
pub fn docx_xml_to_text(xml: &str) -> Result<String, ExtractionError> {
    let mut reader = Reader::from_str(xml);
    // Runs carry significant spaces under xml:space="preserve"
    reader.trim_text(false);

    let mut text = String::new();
    let mut in_text_run = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) if e.name().as_ref() == b"w:t" => in_text_run = true,
            Ok(Event::Empty(e)) => match e.name().as_ref() {
                b"w:tab" => text.push('\t'),
                b"w:br" | b"w:cr" => text.push('\n'),
                b"w:p" => text.push_str("\n\n"),
                _ => {}
            },
            Ok(Event::Text(e)) if in_text_run => {
                let run = e
                    .unescape()
                    .map_err(|err| ExtractionError::Corrupt(format!("bad text in word/document.xml: {}", err)))?;
                text.push_str(&run);
            }
            Ok(Event::CData(e)) if in_text_run => text.push_str(&String::from_utf8_lossy(&e)),
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"w:t" => in_text_run = false,
                b"w:p" => text.push_str("\n\n"),
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(ExtractionError::Corrupt(format!(
                    "malformed word/document.xml at byte {}: {}",
                    reader.buffer_position(),
                    e
                )));
            }
            _ => {}
        }
    }

    Ok(text.trim().to_string())
}

/// Collapse the whitespace of a PDF text layer, keeping paragraph and page
/// breaks as blank lines
pub fn normalize_pdf_text(raw: &str) -> String {
    PDF_PARAGRAPH_BREAK_REGEX
        .split(raw)
        .map(|paragraph| paragraph.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|paragraph| !paragraph.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}
