// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result, anyhow};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use indicatif::{ProgressBar, ProgressStyle};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, error, info, warn};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use subforge::app_config::{self, Config};
use subforge::app_controller::Controller;
use subforge::formats::{self, SubtitleFormat};
use subforge::session::SessionNotice;
use subforge::subtitle_processor::SubtitleCollection;
use subforge::table_model::{Orientation, SecondaryMode, SubtitleTableModel, COLUMN_COUNT};
use subforge::translation::SubtitleOptimizer;
use subforge::translation::optimizer::OptimizerOptions;

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

/// CLI Wrapper for SubtitleFormat to implement ValueEnum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliFormat {
    Srt,
    Vtt,
    Ass,
    Json,
    Txt,
}

impl From<CliFormat> for SubtitleFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Srt => SubtitleFormat::Srt,
            CliFormat::Vtt => SubtitleFormat::Vtt,
            CliFormat::Ass => SubtitleFormat::Ass,
            CliFormat::Json => SubtitleFormat::Json,
            CliFormat::Txt => SubtitleFormat::Txt,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Clean up and/or translate a subtitle file with an LLM
    Optimize(OptimizeArgs),

    /// Convert a subtitle file to another format
    Convert {
        /// Subtitle file to read (srt, vtt, ass, json)
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Destination file
        #[arg(value_name = "OUTPUT")]
        output: PathBuf,

        /// Output format (defaults to the output file extension)
        #[arg(short, long, value_enum)]
        format: Option<CliFormat>,
    },

    /// Print a subtitle file as a table
    Show {
        /// Subtitle file to read
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Maximum number of rows to print
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Generate shell completions for subforge
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser, Debug)]
struct OptimizeArgs {
    /// Subtitle file to process
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Destination file (defaults to INPUT.optimized.<format> next to the input)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum)]
    format: Option<CliFormat>,

    /// Translate into the target language
    #[arg(long)]
    translate: bool,

    /// Rewrite the original text (on by default unless --translate is given)
    #[arg(long)]
    optimize: bool,

    /// Target language code or English name (e.g., 'fr', 'German')
    #[arg(short, long)]
    target_language: Option<String>,

    /// Model name
    #[arg(short, long)]
    model: Option<String>,

    /// API key for the chat endpoint
    #[arg(long, env = "SUBFORGE_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Configuration file path
    #[arg(short, long, default_value = "subforge.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

/// subforge - subtitle optimization and translation with LLMs
#[derive(Parser, Debug)]
#[command(name = "subforge")]
#[command(version)]
#[command(about = "LLM-assisted subtitle cleanup and translation")]
#[command(long_about = "subforge loads subtitle files, sends them through an OpenAI-compatible chat model to fix recognition errors or translate them, and writes the result.

EXAMPLES:
    subforge optimize talk.srt                        # Clean up using default config
    subforge optimize talk.vtt --translate -t fr      # Translate to French
    subforge optimize talk.srt -f ass -o out.ass      # Write ASS output
    subforge convert talk.vtt talk.srt                # Convert formats
    subforge show talk.srt --limit 20                 # Print the first rows
    subforge completions bash > subforge.bash         # Generate bash completions

CONFIGURATION:
    Configuration is stored in subforge.json by default. If the file doesn't exist,
    a default one is created. The API key can also be given with SUBFORGE_API_KEY.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,
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

    // @returns: Color and emoji for log level
    fn style_for_level(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("1;31", "❌ "),
            Level::Warn => ("1;33", "🚧 "),
            Level::Info => ("1;32", " "),
            Level::Debug => ("1;36", "🔍 "),
            Level::Trace => ("1;35", "📋 "),
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let (color, emoji) = Self::style_for_level(record.level());
            let _ = writeln!(
                std::io::stderr(),
                "\x1B[{}m{} {} {}\x1B[0m",
                color, now, emoji, record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Trace-level logger; the effective level is set through max_level later
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    match cli.command {
        Commands::Completions { shell } => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "subforge", &mut std::io::stdout());
            Ok(())
        }
        Commands::Optimize(args) => run_optimize(args).await,
        Commands::Convert { input, output, format } => run_convert(&input, &output, format),
        Commands::Show { input, limit } => run_show(&input, limit),
    }
}

fn load_config(options: &OptimizeArgs) -> Result<Config> {
    let mut config = Config::load_or_create(&options.config_path)?;

    // Override config with CLI options if provided
    if options.translate {
        config.optimization.need_translate = true;
        config.optimization.need_optimize = options.optimize;
    } else if options.optimize {
        config.optimization.need_optimize = true;
    }
    if let Some(language) = &options.target_language {
        config.optimization.target_language = language.clone();
    }
    if let Some(model) = &options.model {
        config.optimization.model = model.clone();
    }
    if let Some(api_key) = &options.api_key {
        config.optimization.api_key = api_key.clone();
    }
    if let Some(log_level) = &options.log_level {
        config.log_level = log_level.clone().into();
    }
    if let Some(format) = options.format {
        config.output_format = format.into();
    }

    config.validate().context("Configuration validation failed")?;
    Ok(config)
}

async fn run_optimize(options: OptimizeArgs) -> Result<()> {
    // Apply the command line level before the config is read
    if let Some(level) = &options.log_level {
        let level: app_config::LogLevel = level.clone().into();
        log::set_max_level(level.to_level_filter());
    }

    let config = load_config(&options)?;
    log::set_max_level(config.log_level.to_level_filter());

    let format = config.output_format;
    let worker_options = OptimizerOptions::from(&config.optimization);
    let mut controller = Controller::with_config(config);

    let count = controller.load_subtitle_file(&options.input)?;
    info!("🚀 subforge: {} subtitles from {}", count, options.input.display());

    controller.start(Arc::new(SubtitleOptimizer::new(worker_options)))?;

    let progress_bar = ProgressBar::new(100);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {percent}% {msg}")
        .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {percent}% {msg}"))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    progress_bar.set_style(style.progress_chars("█▓▒░"));

    let outcome = loop {
        let Some(notice) = controller.pump().await else {
            break Err(anyhow!("Optimization stopped unexpectedly"));
        };
        match notice {
            SessionNotice::Progress { percent, status } => {
                progress_bar.set_position(u64::from(percent));
                progress_bar.set_message(status);
            }
            SessionNotice::Completed(_) | SessionNotice::DownstreamReady(_) => break Ok(()),
            SessionNotice::Failed(message) => break Err(anyhow!(message)),
            SessionNotice::Updated(_) | SessionNotice::Relayout { .. } => {}
        }
    };

    match outcome {
        Ok(()) => progress_bar.finish_with_message("done"),
        Err(e) => {
            progress_bar.abandon_with_message("failed");
            error!("Optimization failed: {}", e);
            return Err(e);
        }
    }

    let output = match options.output {
        Some(path) => path,
        None => controller.default_save_path(format)?,
    };
    controller.save(&output, format)?;
    info!("Saved result to {}", output.display());
    Ok(())
}

fn run_convert(input: &Path, output: &Path, format: Option<CliFormat>) -> Result<()> {
    let format = match format {
        Some(format) => format.into(),
        None => SubtitleFormat::from_path(output)
            .with_context(|| format!("Cannot infer output format from {}", output.display()))?,
    };

    let entries = formats::from_subtitle_file(input)?;
    if output.exists() {
        warn!("Overwriting {}", output.display());
    }
    formats::write_subtitle_file(&entries, output, format)?;
    info!("Converted {} subtitles to {}", entries.len(), output.display());
    Ok(())
}

fn run_show(input: &Path, limit: Option<usize>) -> Result<()> {
    let entries = formats::from_subtitle_file(input)?;
    let model = SubtitleTableModel::with_collection(SubtitleCollection::from_entries(entries), SecondaryMode::default());

    let headers: Vec<String> = (0..COLUMN_COUNT)
        .filter_map(|col| model.header_data(col, Orientation::Horizontal))
        .collect();

    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "#\t{}", headers.join("\t"))?;

    let rows = limit.unwrap_or(usize::MAX).min(model.row_count());
    for row in 0..rows {
        let cells = (0..COLUMN_COUNT)
            .map(|col| model.get_cell(row, col).map(|cell| cell.replace('\n', " ")))
            .collect::<Result<Vec<_>, _>>()?;
        let label = model.header_data(row, Orientation::Vertical).unwrap_or_default();
        writeln!(stdout, "{}\t{}", label, cells.join("\t"))?;
    }

    if rows < model.row_count() {
        writeln!(stdout, "... {} more", model.row_count() - rows)?;
    }
    Ok(())
}
