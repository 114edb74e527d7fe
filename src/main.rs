// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result, anyhow};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, error, info, warn};
use std::io::Write;
use std::path::{Path, PathBuf};

use doctranslate::app_config::{self, Config};
use doctranslate::app_controller::Controller;
use doctranslate::render::OutputFormat;

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

/// CLI Wrapper for the output formats this build can render
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliOutputFormat {
    Txt,
    Md,
    Html,
    Json,
    Docx,
}

impl From<CliOutputFormat> for OutputFormat {
    fn from(cli_format: CliOutputFormat) -> Self {
        match cli_format {
            CliOutputFormat::Txt => OutputFormat::Txt,
            CliOutputFormat::Md => OutputFormat::Md,
            CliOutputFormat::Html => OutputFormat::Html,
            CliOutputFormat::Json => OutputFormat::Json,
            CliOutputFormat::Docx => OutputFormat::Docx,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Translate a document or every document in a directory (default command)
    #[command(alias = "tr")]
    Translate(TranslateArgs),

    /// Generate shell completions for doctranslate
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser, Debug, Clone)]
struct TranslateArgs {
    /// Input document or directory to process
    #[arg(value_name = "INPUT_PATH")]
    input_path: PathBuf,

    /// Force overwrite of existing output files
    #[arg(short, long)]
    force_overwrite: bool,

    /// Target language code (ta, hi, ru, ja, es)
    #[arg(short, long)]
    target_language: Option<String>,

    /// Output document format
    #[arg(short = 'F', long, value_enum, default_value = "txt")]
    format: CliOutputFormat,

    /// Directory for translated files (defaults to the input file's directory)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,

    /// Never hand failed local runs to the server fallback
    #[arg(long)]
    no_fallback: bool,
}

/// doctranslate - chunked document translation
///
/// Translates TXT and DOCX documents chunk by chunk through a public
/// translation endpoint, and hands anything it cannot read locally to a
/// document translation server.
#[derive(Parser, Debug)]
#[command(name = "doctranslate")]
#[command(version)]
#[command(about = "Chunked document translation with server fallback")]
#[command(long_about = "doctranslate extracts the text of a document, translates it chunk by chunk and writes the result next to the original.

EXAMPLES:
    doctranslate notes.txt                        # Translate using default config
    doctranslate -t ja report.docx                # Translate into Japanese
    doctranslate -F html -o out/ report.docx      # Write an HTML document into out/
    doctranslate --no-fallback scan.pdf           # Fail instead of using the server
    doctranslate --log-level debug /documents/    # Process an entire directory
    doctranslate completions bash > doctranslate.bash

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config-path. If the config file doesn't exist, a default one
    will be created automatically.

SUPPORTED LANGUAGES:
    ta (Tamil), hi (Hindi), ru (Russian), ja (Japanese), es (Spanish)")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Input document or directory to process
    #[arg(value_name = "INPUT_PATH")]
    input_path: Option<PathBuf>,

    /// Force overwrite of existing output files
    #[arg(short, long)]
    force_overwrite: bool,

    /// Target language code (ta, hi, ru, ja, es)
    #[arg(short, long)]
    target_language: Option<String>,

    /// Output document format
    #[arg(short = 'F', long, value_enum, default_value = "txt")]
    format: CliOutputFormat,

    /// Directory for translated files (defaults to the input file's directory)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,

    /// Never hand failed local runs to the server fallback
    #[arg(long)]
    no_fallback: bool,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI color and tag for a level
    fn style_for_level(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("\x1B[1;31m", "ERROR"),
            Level::Warn => ("\x1B[1;33m", "WARN "),
            Level::Info => ("\x1B[1;32m", "INFO "),
            Level::Debug => ("\x1B[1;36m", "DEBUG"),
            Level::Trace => ("\x1B[1;35m", "TRACE"),
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level && metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let (color, tag) = Self::style_for_level(record.level());

            let mut stderr = std::io::stderr();
            let _ = writeln!(stderr, "{}{} {} {}\x1B[0m", color, now, tag, record.args());
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // The logger accepts everything; the effective level is set through log::set_max_level
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    match cli.command {
        Some(Commands::Completions { shell }) => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "doctranslate", &mut std::io::stdout());
            Ok(())
        }
        Some(Commands::Translate(args)) => run_translate(args).await,
        None => {
            // Top-level args mirror the translate subcommand
            let input_path = cli.input_path.ok_or_else(|| {
                anyhow!("INPUT_PATH is required when no subcommand is specified")
            })?;

            let translate_args = TranslateArgs {
                input_path,
                force_overwrite: cli.force_overwrite,
                target_language: cli.target_language,
                format: cli.format,
                output_dir: cli.output_dir,
                config_path: cli.config_path,
                log_level: cli.log_level,
                no_fallback: cli.no_fallback,
            };
            run_translate(translate_args).await
        }
    }
}

async fn run_translate(options: TranslateArgs) -> Result<()> {
    if let Some(cmd_log_level) = &options.log_level {
        let level: app_config::LogLevel = cmd_log_level.clone().into();
        log::set_max_level(level.to_level_filter());
    }

    let mut config = Config::load_or_create(&options.config_path)?;

    if let Some(target_lang) = &options.target_language {
        config.target_language = target_lang.clone();
    }
    if options.no_fallback {
        config.translation.fallback.enabled = false;
    }
    if let Some(log_level) = &options.log_level {
        config.log_level = log_level.clone().into();
    } else {
        log::set_max_level(config.log_level.to_level_filter());
    }

    config.validate().context("Configuration validation failed")?;

    let controller = Controller::with_config(config, options.format.into())?;

    let cancel = controller.cancel_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling translation");
            cancel.cancel();
        }
    });

    if options.input_path.is_file() {
        let output_dir = options.output_dir.clone().unwrap_or_else(|| {
            options.input_path.parent().unwrap_or(Path::new(".")).to_path_buf()
        });
        if let Some(path) = controller
            .run(options.input_path.clone(), output_dir, options.force_overwrite)
            .await
            .inspect_err(|e| error!("{}", e))?
        {
            info!("Wrote {}", path.display());
        }
    } else if options.input_path.is_dir() {
        if options.output_dir.is_some() {
            warn!("--output-dir is ignored in folder mode; translations are written next to their sources");
        }
        let summary = controller
            .run_folder(options.input_path.clone(), options.force_overwrite)
            .await?;
        if summary.failed > 0 {
            return Err(anyhow!("{} of {} documents failed", summary.failed, summary.processed + summary.skipped + summary.failed));
        }
    } else {
        return Err(anyhow!("Input path does not exist: {:?}", options.input_path));
    }

    Ok(())
}
