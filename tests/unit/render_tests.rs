/*!
 * Tests for output document rendering
 */

use std::io::{Cursor, Read};

use chrono::{TimeZone, Utc};

use doctranslate::extraction::docx_xml_to_text;
use doctranslate::language_utils::find_supported_language;
use doctranslate::translation::{Metrics, TranslationResult};
use doctranslate::{OutputFormat, RenderMeta, render};

fn result(text: &str) -> TranslationResult {
    TranslationResult {
        success: true,
        translated_text: text.to_string(),
        original_text: "Original".to_string(),
        metrics: Metrics {
            average_confidence: 1.0,
            translated_word_count: 4,
            translation_sources: vec!["google-gtx-direct".to_string()],
        },
        warnings: Vec::new(),
    }
}

fn meta(code: &str) -> RenderMeta {
    let mut meta = RenderMeta::new("report.docx", find_supported_language(code).unwrap());
    meta.generated_at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap();
    meta
}

#[test]
fn test_render_txt_should_return_translation_verbatim() {
    let bytes = render(OutputFormat::Txt, &result("Привет\n\nмир"), &meta("ru")).unwrap();
    assert_eq!(String::from_utf8(bytes).unwrap(), "Привет\n\nмир");
}

#[test]
fn test_render_markdown_should_add_heading_and_source() {
    let bytes = render(OutputFormat::Md, &result("Uno\n\n\n\nDos"), &meta("es")).unwrap();
    let markdown = String::from_utf8(bytes).unwrap();

    assert_eq!(
        markdown,
        "# Spanish Translation\n\n_Original: report.docx_\n\nUno\n\nDos\n"
    );
}

#[test]
fn test_render_json_should_carry_metrics_and_timestamp() {
    let bytes = render(OutputFormat::Json, &result("こんにちは"), &meta("ja")).unwrap();
    let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

    assert_eq!(value["metadata"]["generatedAt"], "2024-03-01T12:30:00.000Z");
    assert_eq!(value["metadata"]["targetLanguage"], "ja");
    assert_eq!(value["metadata"]["metrics"]["averageConfidence"], 1.0);
    assert_eq!(value["metadata"]["metrics"]["translationSources"][0], "google-gtx-direct");
    assert_eq!(value["translation"], "こんにちは");
}

#[test]
fn test_output_format_should_expose_extension_and_mime() {
    assert_eq!(OutputFormat::Md.extension(), "md");
    assert_eq!(OutputFormat::Html.mime_type(), "text/html");
    assert_eq!(OutputFormat::Json.to_string(), "json");
    assert_eq!("TXT".parse::<OutputFormat>().unwrap(), OutputFormat::Txt);
}

#[test]
fn test_render_docx_should_write_title_and_one_paragraph_per_sentence() {
    let mut translated = result("Hola mundo. ¿Cómo estás?\n\nTom & Jerry!");
    translated.metrics.average_confidence = 0.875;
    let bytes = render(OutputFormat::Docx, &translated, &meta("es")).unwrap();

    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .unwrap()
        .read_to_string(&mut xml)
        .unwrap();

    assert!(xml.contains(r#"w:val="both""#), "body paragraphs should be justified");
    assert_eq!(
        docx_xml_to_text(&xml).unwrap(),
        "Spanish Translation\n\n\
         Original File: report.docx \u{2022} Generated: 2024-03-01\n\n\
         Hola mundo.\n\n\
         ¿Cómo estás?\n\n\
         Tom & Jerry!\n\n\
         Confidence: 87.5%"
    );
}

#[test]
fn test_render_pdf_should_be_unsupported() {
    let error = render(OutputFormat::Pdf, &result("Hola"), &meta("es")).unwrap_err();
    assert_eq!(error.to_string(), "Unsupported format: pdf");
}
