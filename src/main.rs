// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{anyhow, Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use log::{warn, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::fs::File;
use std::io::BufReader;
use std::io::Write;
use std::path::{Path, PathBuf};

use annoconv::app_config::{self, Config};
use annoconv::formats::AnnotationFormat;
use annoconv::Controller;

/// CLI Wrapper for AnnotationFormat to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliAnnotationFormat {
    Textgrid,
    Eaf,
    Antx,
}

impl From<CliAnnotationFormat> for AnnotationFormat {
    fn from(cli_format: CliAnnotationFormat) -> Self {
        match cli_format {
            CliAnnotationFormat::Textgrid => AnnotationFormat::TextGrid,
            CliAnnotationFormat::Eaf => AnnotationFormat::Eaf,
            CliAnnotationFormat::Antx => AnnotationFormat::Antx,
        }
    }
}

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

#[derive(Subcommand, Debug)]
enum Commands {
    /// Convert annotation files (default command)
    Convert(ConvertArgs),

    /// Generate shell completions for annoconv
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser, Debug)]
struct ConvertArgs {
    /// Input annotation file or directory to process
    #[arg(value_name = "INPUT_PATH")]
    input_path: PathBuf,

    /// Target format
    #[arg(short, long, value_enum)]
    to: Option<CliAnnotationFormat>,

    /// Directory for converted files (defaults to the input's directory)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Force overwrite of existing output files
    #[arg(short, long)]
    force_overwrite: bool,

    /// Export intervals with empty text to EAF/ANTX
    #[arg(short = 'e', long)]
    include_empty: bool,

    /// Stretch point tiers into spans for EAF/ANTX instead of dropping them
    #[arg(short = 'p', long)]
    include_point: bool,

    /// Write XML without indentation
    #[arg(long)]
    compact: bool,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

/// annoconv - Annotation format converter
///
/// Converts time-aligned annotations between Praat, ELAN, Transcriber and
/// Annotation Pro files.
#[derive(Parser, Debug)]
#[command(name = "annoconv")]
#[command(version)]
#[command(about = "Convert annotation files between Praat, ELAN, Transcriber and Annotation Pro")]
#[command(long_about = "annoconv converts time-aligned annotations between tool formats.

EXAMPLES:
    annoconv interview.eaf                       # Convert to the default target (TextGrid)
    annoconv -t eaf interview.TextGrid           # Convert a TextGrid to ELAN
    annoconv -t antx -p session.TextGrid         # Keep point tiers as spans
    annoconv -t eaf -o out/ corpus/              # Convert a whole directory tree
    annoconv completions bash > annoconv.bash    # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config-path. If the config file doesn't exist, a default one
    will be created automatically.

SUPPORTED FORMATS:
    .TextGrid - Praat (read, write)
    .eaf      - ELAN (read, write)
    .trs      - Transcriber (read only)
    .antx     - Annotation Pro (read, write)")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Input annotation file or directory to process
    #[arg(value_name = "INPUT_PATH")]
    input_path: Option<PathBuf>,

    /// Target format
    #[arg(short, long, value_enum)]
    to: Option<CliAnnotationFormat>,

    /// Directory for converted files (defaults to the input's directory)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Force overwrite of existing output files
    #[arg(short, long)]
    force_overwrite: bool,

    /// Export intervals with empty text to EAF/ANTX
    #[arg(short = 'e', long)]
    include_empty: bool,

    /// Stretch point tiers into spans for EAF/ANTX instead of dropping them
    #[arg(short = 'p', long)]
    include_point: bool,

    /// Write XML without indentation
    #[arg(long)]
    compact: bool,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
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

    // @returns: Emoji for log level
    fn get_emoji_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "❌ ",
            Level::Warn => "🚧 ",
            Level::Info => " ",
            Level::Debug => "🔍 ",
            Level::Trace => "📋 ",
        }
    }

    // @returns: ANSI colour prefix for log level
    fn get_color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "\x1B[1;31m",
            Level::Warn => "\x1B[1;33m",
            Level::Info => "\x1B[1;32m",
            Level::Debug => "\x1B[1;36m",
            Level::Trace => "\x1B[1;35m",
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
            let level = record.level();

            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "{}{} {} {}\x1B[0m",
                Self::get_color_for_level(level),
                now,
                Self::get_emoji_for_level(level),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

fn level_filter(level: &app_config::LogLevel) -> LevelFilter {
    match level {
        app_config::LogLevel::Error => LevelFilter::Error,
        app_config::LogLevel::Warn => LevelFilter::Warn,
        app_config::LogLevel::Info => LevelFilter::Info,
        app_config::LogLevel::Debug => LevelFilter::Debug,
        app_config::LogLevel::Trace => LevelFilter::Trace,
    }
}

fn main() -> Result<()> {
    // Initialize with trace so set_max_level alone decides what is shown
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    // Parse command line arguments using clap
    let cli = CommandLineOptions::parse();

    match cli.command {
        Some(Commands::Completions { shell }) => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "annoconv", &mut std::io::stdout());
            Ok(())
        }
        Some(Commands::Convert(args)) => run_convert(args),
        None => {
            // Default behavior - top-level args mirror the convert subcommand
            let input_path = cli
                .input_path
                .ok_or_else(|| anyhow!("INPUT_PATH is required when no subcommand is specified"))?;

            run_convert(ConvertArgs {
                input_path,
                to: cli.to,
                output_dir: cli.output_dir,
                force_overwrite: cli.force_overwrite,
                include_empty: cli.include_empty,
                include_point: cli.include_point,
                compact: cli.compact,
                config_path: cli.config_path,
                log_level: cli.log_level,
            })
        }
    }
}

fn load_config(config_path: &str) -> Result<Config> {
    if Path::new(config_path).exists() {
        let file = File::open(config_path).context(format!("Failed to open config file: {}", config_path))?;
        let reader = BufReader::new(file);
        let config: Config = serde_json::from_reader(reader)
            .context(format!("Failed to parse config file: {}", config_path))?;
        Ok(config)
    } else {
        warn!("Config file not found at '{}', creating default config.", config_path);

        let config = Config::default();
        let config_json =
            serde_json::to_string_pretty(&config).context("Failed to serialize default config to JSON")?;
        std::fs::write(config_path, config_json)
            .context(format!("Failed to write default config to file: {}", config_path))?;

        Ok(config)
    }
}

fn run_convert(options: ConvertArgs) -> Result<()> {
    // If log level is set via command line, apply it immediately
    if let Some(cmd_log_level) = &options.log_level {
        let config_log_level: app_config::LogLevel = cmd_log_level.clone().into();
        log::set_max_level(level_filter(&config_log_level));
    }

    let mut config = load_config(&options.config_path)?;

    // Override config with CLI options if provided
    if options.include_empty {
        config.conversion.include_empty = true;
    }
    if options.include_point {
        config.conversion.include_point = true;
    }
    if options.compact {
        config.output.pretty_print = false;
    }
    if let Some(log_level) = &options.log_level {
        config.log_level = log_level.clone().into();
    }

    // Validate the configuration after loading and overriding
    config.validate().context("Configuration validation failed")?;

    if options.log_level.is_none() {
        log::set_max_level(level_filter(&config.log_level));
    }

    let target: AnnotationFormat = match options.to {
        Some(to) => to.into(),
        None => config.output.default_target,
    };

    let controller = Controller::with_config(config)?;

    if options.input_path.is_file() {
        let output_dir = match options.output_dir {
            Some(dir) => dir,
            None => options.input_path.parent().unwrap_or(Path::new(".")).to_path_buf(),
        };
        controller.convert_file(&options.input_path, &output_dir, target, options.force_overwrite)?;
    } else if options.input_path.is_dir() {
        let summary = controller.run_folder(
            &options.input_path,
            options.output_dir.as_deref(),
            target,
            options.force_overwrite,
        )?;
        if summary.failed > 0 {
            return Err(anyhow!("{} of {} file(s) failed to convert", summary.failed, summary.total()));
        }
    } else {
        return Err(anyhow!("Input path does not exist: {:?}", options.input_path));
    }

    Ok(())
}
