// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use log::{error, info, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use lietucoach_tts::app_config::{self, Config};
use lietucoach_tts::errors::{AppError, ConfigError};
use lietucoach_tts::{ContentTarget, Controller, RunOptions, RunStats};

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

/// Flags shared by both generators
#[derive(Args, Debug)]
struct RunArgs {
    /// Also generate the slow variant
    #[arg(long)]
    slow: bool,

    /// Regenerate even if the file exists
    #[arg(long)]
    force: bool,

    /// Show what would be generated without calling the API
    #[arg(long)]
    dry_run: bool,

    /// Directory relative content, pack and credential paths are resolved against
    #[arg(long, value_name = "DIR", default_value = ".")]
    base_dir: PathBuf,

    /// Override the content root (default: content)
    #[arg(long, value_name = "DIR")]
    content_root: Option<PathBuf>,

    /// Optional JSON configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Milliseconds to wait after each API call
    #[arg(long, value_name = "MS")]
    delay_ms: Option<u64>,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate audio for vocabulary units
    Units {
        /// Only process a specific unit (e.g., unit_01)
        #[arg(long, value_name = "UNIT_ID")]
        unit: Option<String>,

        #[command(flatten)]
        run: RunArgs,
    },

    /// Generate audio for a role-play pack
    Roles {
        /// Role pack JSON (default: assets/packs/roles/traveler_v1.json)
        #[arg(long, value_name = "FILE")]
        pack: Option<PathBuf>,

        /// Only process a specific scenario (e.g., airport)
        #[arg(long, value_name = "SCENARIO_ID")]
        scenario: Option<String>,

        #[command(flatten)]
        run: RunArgs,
    },

    /// Generate shell completions for lietucoach-tts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// LietuCoach TTS audio generator
#[derive(Parser, Debug)]
#[command(name = "lietucoach-tts")]
#[command(version)]
#[command(about = "Generate speech audio for LietuCoach content with Google Cloud Text-to-Speech")]
#[command(long_about = "Generates audio files for LietuCoach content packs using Google Cloud Text-to-Speech.
Files that already exist are skipped unless --force is given.

EXAMPLES:
    lietucoach-tts units                        # Normal-rate audio for every unit
    lietucoach-tts units --slow --unit unit_01  # Normal and slow audio for one unit
    lietucoach-tts units --dry-run              # Show what would be generated
    lietucoach-tts roles --scenario airport     # Role pack audio for one scenario
    lietucoach-tts completions bash > lietucoach-tts.bash

ENVIRONMENT:
    GOOGLE_APPLICATION_CREDENTIALS  Path to service account JSON
                                    (fallback: .secrets/gcp_service_account.json)
    GCLOUD_PROJECT_ID               Google Cloud project ID
    TTS_VOICE                       Voice name (default: lt-LT-Standard-A)
    TTS_SPEAKING_RATE_NORMAL        Normal speed (default: 1.0)
    TTS_SPEAKING_RATE_SLOW          Slow speed (default: 0.7)

EXIT CODES:
    0  Success
    1  Completed with errors
    2  Configuration error")]
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

    // @returns: ANSI color for log level
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
        metadata.level() <= self.level && metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "{}{} {} {}\x1B[0m",
                Self::get_color_for_level(record.level()),
                now,
                Self::get_emoji_for_level(record.level()),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // The logger accepts everything; the effective level is set via max_level
    if let Err(e) = CustomLogger::init(LevelFilter::Trace) {
        eprintln!("ERROR: Failed to initialize logger: {}", e);
        return ExitCode::from(2);
    }
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    let (target, args) = match cli.command {
        Commands::Completions { shell } => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "lietucoach-tts", &mut std::io::stdout());
            return ExitCode::SUCCESS;
        }
        Commands::Units { unit, run } => (ContentTarget::Units { unit }, run),
        Commands::Roles { pack, scenario, run } => (ContentTarget::Roles { pack, scenario }, run),
    };

    match run_generate(target, args).await {
        Ok(stats) => ExitCode::from(stats.exit_code()),
        Err(e) => {
            error!("{}", e);
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run_generate(target: ContentTarget, args: RunArgs) -> Result<RunStats, AppError> {
    let config = load_config(&args)?;
    log::set_max_level(config.log_level.to_level_filter());

    info!("╔════════════════════════════════════════════╗");
    info!("║     LietuCoach TTS Audio Generator         ║");
    info!("╚════════════════════════════════════════════╝");

    let options = RunOptions {
        slow: args.slow,
        force: args.force,
        dry_run: args.dry_run,
    };

    let controller = Controller::with_config(config, options)?
        .with_base_dir(args.base_dir)
        .with_progress(true);

    let stats = controller.run(&target).await?;
    controller.print_summary(&stats);
    Ok(stats)
}

/// Defaults, then the optional config file, then environment, then command line
fn load_config(args: &RunArgs) -> Result<Config, AppError> {
    let mut config = match &args.config {
        Some(path) => Config::from_file(path)
            .map_err(|e| ConfigError::Invalid(format!("{:#}", e)))?,
        None => Config::default(),
    };

    config.apply_process_env()?;

    if let Some(content_root) = &args.content_root {
        config.content.content_root = content_root.clone();
    }
    if let Some(delay_ms) = args.delay_ms {
        config.request_delay_ms = delay_ms;
    }
    if let Some(log_level) = &args.log_level {
        config.log_level = log_level.clone().into();
    }

    Ok(config)
}
