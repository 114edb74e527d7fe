use anyhow::{Context, Result, anyhow};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use log::{error, info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::app_config::Config;
use crate::document::Document;
use crate::file_utils::{FileManager, format_file_size};
use crate::language_utils::{SupportedLanguage, validate_target_language};
use crate::render::{OutputFormat, RenderMeta, render};
use crate::translation::progress::ProgressUpdate;
use crate::translation::{RunContext, RunOutcome, TranslationPipeline};

// @module: Application controller for document translation

/// Counts reported after a folder run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FolderSummary {
    pub processed: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Main application controller for document translation
pub struct Controller {
    // @field: App configuration
    config: Config,
    // @field: Pipeline shared by every file of this invocation
    pipeline: TranslationPipeline,
    // @field: Target language resolved from the configured code
    language: &'static SupportedLanguage,
    // @field: Rendered output format
    format: OutputFormat,
    // @field: Cancels every run started by this controller
    cancel: CancellationToken,
    // @field: Draw progress bars (disabled in tests)
    show_progress: bool,
}

impl Controller {
    // @method: Create a new controller with the production pipeline for the given configuration
    pub fn with_config(config: Config, format: OutputFormat) -> Result<Self> {
        let pipeline = TranslationPipeline::from_config(&config);
        Self::with_pipeline(config, pipeline, format)
    }

    /// Create a controller around an already wired pipeline
    pub fn with_pipeline(config: Config, pipeline: TranslationPipeline, format: OutputFormat) -> Result<Self> {
        let language = validate_target_language(&config.target_language)?;
        if format == OutputFormat::Pdf {
            return Err(anyhow!("Output format '{}' is not supported by this build", format));
        }

        Ok(Self {
            config,
            pipeline,
            language,
            format,
            cancel: CancellationToken::new(),
            show_progress: true,
        })
    }

    /// Disable progress bar drawing
    pub fn without_progress(mut self) -> Self {
        self.show_progress = false;
        self
    }

    /// Token cancelling every run of this controller
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Where the translation of `input_file` is written
    pub fn output_path_for(&self, input_file: &Path, output_dir: &Path) -> PathBuf {
        FileManager::generate_output_path(
            input_file,
            output_dir,
            self.language.code,
            self.format.extension(),
        )
    }

    /// Translate one file; returns the written path, or `None` when skipped
    pub async fn run(&self, input_file: PathBuf, output_dir: PathBuf, force_overwrite: bool) -> Result<Option<PathBuf>> {
        let multi_progress = MultiProgress::new();
        self.run_with_progress(&input_file, &output_dir, &multi_progress, force_overwrite).await
    }

    async fn run_with_progress(
        &self,
        input_file: &Path,
        output_dir: &Path,
        multi_progress: &MultiProgress,
        force_overwrite: bool,
    ) -> Result<Option<PathBuf>> {
        let start_time = std::time::Instant::now();

        if !input_file.exists() {
            return Err(anyhow!("Input file does not exist: {:?}", input_file));
        }

        FileManager::ensure_dir(output_dir)?;

        let output_path = self.output_path_for(input_file, output_dir);
        if output_path.exists() && !force_overwrite {
            warn!("Skipping {:?}, translation already exists (use -f to force overwrite)", input_file);
            return Ok(None);
        }

        let document = Document::from_path(input_file).await?;
        info!(
            "Translating {} ({}) into {}",
            document.name(),
            format_file_size(document.size_bytes()),
            self.language.name
        );

        let progress_bar = self.progress_bar(multi_progress);
        let bar = progress_bar.clone();
        let context = RunContext::new()
            .with_cancel(self.cancel.child_token())
            .with_progress(Arc::new(move |update: ProgressUpdate| {
                bar.set_position(update.percent as u64);
                bar.set_message(update.stage.label());
            }));

        let outcome = match self
            .pipeline
            .run(&document, self.language.code, context)
            .await
        {
            Ok(outcome) => outcome,
            Err(e) => {
                progress_bar.abandon_with_message("Failed");
                return Err(anyhow!(e.user_message()));
            }
        };
        progress_bar.finish_with_message("Done");

        if let RunOutcome::Fallback(_) = outcome {
            info!("{} was translated by the server fallback", document.name());
        }
        let result = outcome.into_result();
        for warning in &result.warnings {
            match &warning.recommendation {
                Some(recommendation) => warn!("{} ({})", warning.message, recommendation),
                None => warn!("{}", warning.message),
            }
        }

        let bytes = render(self.format, &result, &RenderMeta::new(document.name(), self.language))
            .with_context(|| format!("Failed to render {} output", self.format))?;
        FileManager::write_bytes(&output_path, &bytes)?;

        info!(
            "Success: {:?} ({} words, {})",
            output_path,
            result.metrics.translated_word_count,
            Self::format_duration(start_time.elapsed())
        );

        Ok(Some(output_path))
    }

    /// Translate every supported document below `input_dir`, next to its source
    pub async fn run_folder(&self, input_dir: PathBuf, force_overwrite: bool) -> Result<FolderSummary> {
        if !input_dir.exists() {
            return Err(anyhow!("Input directory does not exist: {:?}", input_dir));
        }

        let documents = FileManager::find_documents(&input_dir)?;
        if documents.is_empty() {
            return Err(anyhow!("No supported documents found in directory: {:?}", input_dir));
        }

        let multi_progress = MultiProgress::new();
        let folder_pb = if self.show_progress {
            multi_progress.add(ProgressBar::new(documents.len() as u64))
        } else {
            ProgressBar::hidden()
        };
        folder_pb.set_style(Self::bar_style("files"));
        folder_pb.set_message("Processing files");

        let mut summary = FolderSummary::default();

        for document in &documents {
            if self.cancel.is_cancelled() {
                warn!("Cancelled, {} files left unprocessed", documents.len() - summary.processed - summary.skipped - summary.failed);
                break;
            }

            let file_name = document
                .file_name()
                .map(|f| f.to_string_lossy().to_string())
                .unwrap_or_else(|| "unknown".to_string());
            folder_pb.set_message(format!("Processing: {}", file_name));

            let output_dir = document.parent().map(Path::to_path_buf).unwrap_or_else(|| input_dir.clone());

            match self.run_with_progress(document, &output_dir, &multi_progress, force_overwrite).await {
                Ok(Some(_)) => summary.processed += 1,
                Ok(None) => summary.skipped += 1,
                Err(e) => {
                    error!("Error processing file {}: {}", file_name, e);
                    summary.failed += 1;
                }
            }

            folder_pb.inc(1);
        }

        folder_pb.finish_with_message("Folder processing complete");
        info!(
            "Folder processing completed: {} processed, {} skipped, {} errors",
            summary.processed, summary.skipped, summary.failed
        );

        Ok(summary)
    }

    fn progress_bar(&self, multi_progress: &MultiProgress) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let progress_bar = multi_progress.add(ProgressBar::new(100));
        progress_bar.set_style(Self::bar_style("%"));
        progress_bar.enable_steady_tick(Duration::from_millis(120));
        progress_bar
    }

    fn bar_style(unit: &str) -> ProgressStyle {
        ProgressStyle::default_bar()
            .template(&format!(
                "{{spinner:.green}} [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{pos}}/{{len}} {} {{msg}}",
                unit
            ))
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-")
    }

    /// Format a duration as `1m 5s` or `4.250s`
    fn format_duration(duration: Duration) -> String {
        let total_seconds = duration.as_secs();
        let minutes = total_seconds / 60;
        let seconds = total_seconds % 60;

        if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:03}s", seconds, duration.subsec_millis())
        }
    }
}
