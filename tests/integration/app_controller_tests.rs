/*!
 * Controller runs on real files in a temporary directory
 */

use std::fs;

use anyhow::Result;

use doctranslate::app_config::Config;
use doctranslate::app_controller::{Controller, FolderSummary};
use doctranslate::document::Document;
use doctranslate::extraction::{Extractor, LocalExtractor};
use doctranslate::providers::mock::{MockBackend, MockEndpoint};
use doctranslate::OutputFormat;

use crate::common::{self, TestPipeline};

fn controller(test: TestPipeline, target_language: &str, format: OutputFormat) -> Result<Controller> {
    let config = Config {
        target_language: target_language.to_string(),
        ..Config::default()
    };
    Ok(Controller::with_pipeline(config, test.pipeline, format)?.without_progress())
}

#[tokio::test]
async fn test_run_should_write_translation_next_to_output_dir() -> Result<()> {
    common::init_logging();
    let dir = common::create_temp_dir()?;
    let input = common::create_test_file(dir.path(), "notes.txt", b"Good morning.\n\nSee you soon.")?;
    let output_dir = dir.path().join("out");

    let controller = controller(TestPipeline::new(MockEndpoint::working(), None), "es", OutputFormat::Txt)?;
    let written = controller.run(input, output_dir.clone(), false).await?;

    let expected = output_dir.join("notes.es.txt");
    assert_eq!(written, Some(expected.clone()));
    assert_eq!(fs::read_to_string(expected)?, "[es] Good morning.\n\nSee you soon.");
    Ok(())
}

#[tokio::test]
async fn test_run_should_skip_existing_output_unless_forced() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let input = common::create_test_file(dir.path(), "notes.txt", b"Hello.")?;
    let existing = common::create_test_file(dir.path(), "notes.ja.html", b"old")?;

    let test = TestPipeline::new(MockEndpoint::working(), None);
    let endpoint = test.endpoint.clone();
    let controller = controller(test, "ja", OutputFormat::Html)?;

    assert_eq!(controller.run(input.clone(), dir.path().to_path_buf(), false).await?, None);
    assert_eq!(fs::read_to_string(&existing)?, "old");
    assert_eq!(endpoint.request_count(), 0);

    controller.run(input, dir.path().to_path_buf(), true).await?;
    let html = fs::read_to_string(&existing)?;
    assert!(html.contains(r#"<html lang="ja">"#));
    assert!(html.contains("<p>[ja] Hello.</p>"));
    Ok(())
}

#[tokio::test]
async fn test_run_with_docx_output_should_write_readable_document() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let input = common::create_test_file(dir.path(), "memo.txt", b"Good morning. See you soon.")?;

    let controller = controller(TestPipeline::new(MockEndpoint::working(), None), "ja", OutputFormat::Docx)?;
    let written = controller.run(input, dir.path().to_path_buf(), false).await?.unwrap();
    assert_eq!(written.file_name().unwrap(), "memo.ja.docx");

    let document = Document::from_path(&written).await?;
    let extracted = LocalExtractor::new().extract(&document).await?;
    assert!(extracted.content.starts_with("Japanese Translation\n\n"));
    assert!(extracted.content.contains("\n\n[ja] Good morning.\n\nSee you soon.\n\n"));
    Ok(())
}

#[tokio::test]
async fn test_run_with_fallback_should_render_server_translation() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let input = common::create_test_file(dir.path(), "scan.pdf", b"%PDF-1.4")?;
    let backend = MockBackend::succeeding("Привет", "Hello");

    let controller = controller(
        TestPipeline::new(MockEndpoint::working(), Some(backend)),
        "ru",
        OutputFormat::Json,
    )?;
    let written = controller.run(input, dir.path().to_path_buf(), false).await?.unwrap();

    assert_eq!(written.file_name().unwrap(), "scan.ru.json");
    let value: serde_json::Value = serde_json::from_slice(&fs::read(written)?)?;
    assert_eq!(value["translation"], "Привет");
    assert_eq!(value["metadata"]["originalFile"], "scan.pdf");
    Ok(())
}

#[tokio::test]
async fn test_run_failure_should_return_user_message() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let input = common::create_test_file(dir.path(), "blank.txt", b"   ")?;

    let controller = controller(TestPipeline::new(MockEndpoint::working(), None), "es", OutputFormat::Txt)?;
    let error = controller.run(input, dir.path().to_path_buf(), false).await.unwrap_err();

    assert!(error.to_string().starts_with("Translation Failed: "), "{}", error);
    assert!(!dir.path().join("blank.es.txt").exists());
    Ok(())
}

#[tokio::test]
async fn test_run_folder_should_process_documents_and_count_outcomes() -> Result<()> {
    common::init_logging();
    let dir = common::create_temp_dir()?;
    common::create_test_file(dir.path(), "a.txt", b"First document.")?;
    common::create_test_file(dir.path(), "b.docx", &common::docx_bytes(&["Second document."]))?;
    common::create_test_file(dir.path(), "c.txt", b"Third document.")?;
    common::create_test_file(dir.path(), "c.hi.md", b"already done")?;
    common::create_test_file(dir.path(), "d.txt", b" \n ")?;
    common::create_test_file(dir.path(), "ignored.png", b"png")?;

    let controller = controller(TestPipeline::new(MockEndpoint::working(), None), "hi", OutputFormat::Md)?;
    let summary = controller.run_folder(dir.path().to_path_buf(), false).await?;

    assert_eq!(
        summary,
        FolderSummary {
            processed: 2,
            skipped: 1,
            failed: 1,
        }
    );
    let markdown = fs::read_to_string(dir.path().join("b.hi.md"))?;
    assert!(markdown.starts_with("# Hindi Translation\n\n_Original: b.docx_"));
    assert!(markdown.contains("[hi] Second document."));
    Ok(())
}

#[tokio::test]
async fn test_run_folder_after_cancel_should_process_nothing() -> Result<()> {
    let dir = common::create_temp_dir()?;
    common::create_test_file(dir.path(), "a.txt", b"First document.")?;

    let controller = controller(TestPipeline::new(MockEndpoint::working(), None), "es", OutputFormat::Txt)?;
    controller.cancel_token().cancel();
    let summary = controller.run_folder(dir.path().to_path_buf(), false).await?;

    assert_eq!(summary, FolderSummary::default());
    assert!(!dir.path().join("a.es.txt").exists());
    Ok(())
}

#[test]
fn test_with_pipeline_should_reject_unsupported_language() {
    let config = Config {
        target_language: "de".to_string(),
        ..Config::default()
    };
    let test = TestPipeline::new(MockEndpoint::working(), None);
    assert!(Controller::with_pipeline(config, test.pipeline, OutputFormat::Txt).is_err());
}
