use indicatif::{ProgressBar, ProgressStyle};
use log::info;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::app_config::{Config, ENV_CREDENTIALS};
use crate::content::{roles, total_targets, units, ContentSource};
use crate::errors::AppError;
use crate::generator::{AudioGenerator, RunOptions, RunStats};
use crate::tts::auth::{self, CredentialSource, Credentials};
use crate::tts::google::GoogleTts;
use crate::tts::SpeechSynthesizer;

// @module: Application controller for batch audio generation

/// Which content layout to generate audio for
#[derive(Debug, Clone, PartialEq)]
pub enum ContentTarget {
    /// Vocabulary units, optionally a single one (e.g. "unit_01")
    Units { unit: Option<String> },
    /// A role-play pack (configured default when `pack` is None), optionally a single scenario
    Roles {
        pack: Option<PathBuf>,
        scenario: Option<String>,
    },
}

impl ContentTarget {
    fn kind(&self) -> &'static str {
        match self {
            Self::Units { .. } => "unit",
            Self::Roles { .. } => "scenario",
        }
    }
}

/// Main application controller: init, discover, iterate, summarize
pub struct Controller {
    // @field: Validated configuration
    config: Config,
    // @field: Run flags
    options: RunOptions,
    // @field: Directory relative content and credential paths are resolved against
    base_dir: PathBuf,
    // @field: gcloud application-default credentials, last credential fallback
    application_default: Option<PathBuf>,
    // @field: Draw a progress bar while generating
    show_progress: bool,
}

impl Controller {
    // @method: Create a new controller; the configuration is validated once here
    pub fn with_config(config: Config, options: RunOptions) -> Result<Self, AppError> {
        config.validate()?;

        Ok(Self {
            config,
            options,
            base_dir: PathBuf::from("."),
            application_default: auth::application_default_path(),
            show_progress: false,
        })
    }

    /// Resolve relative paths against `base_dir` instead of the working directory
    pub fn with_base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.base_dir = base_dir.into();
        self
    }

    /// Override (or disable) the application-default credentials location
    pub fn with_application_default(mut self, path: Option<PathBuf>) -> Self {
        self.application_default = path;
        self
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        self.base_dir.join(path)
    }

    /// Locate credentials and build the provider client. Dry runs need neither.
    pub fn connect(
        &self,
        env_credentials: Option<String>,
    ) -> Result<Option<Arc<dyn SpeechSynthesizer>>, AppError> {
        if self.options.dry_run {
            info!("🔍 DRY RUN MODE - no API calls will be made");
            return Ok(None);
        }

        let fallback = self.resolve(&self.config.tts.credentials_fallback);
        let location =
            auth::locate_credentials(env_credentials, &fallback, self.application_default.clone())?;
        if location.source != CredentialSource::Environment {
            info!("✓ Auto-detected credentials: {:?}", location.path);
        }

        let credentials = Credentials::from_file(&location.path)?;
        let principal = credentials.principal().to_string();
        let client = GoogleTts::new(&self.config.tts, credentials)?;

        info!("✓ Text-to-Speech client ready ({})", principal);
        info!("  Voice: {}", self.config.tts.voice);
        info!("  Normal rate: {}", self.config.tts.speaking_rate_normal);
        if self.options.slow {
            info!("  Slow rate: {}", self.config.tts.speaking_rate_slow);
        }
        if let Some(project) = client.project_id() {
            info!("  Project: {}", project);
        }

        let synthesizer: Arc<dyn SpeechSynthesizer> = Arc::new(client);
        Ok(Some(synthesizer))
    }

    /// Enumerate content sources for the target. A missing content root is an error.
    pub fn discover(&self, target: &ContentTarget) -> Result<Vec<ContentSource>, AppError> {
        let sources = match target {
            ContentTarget::Units { unit } => {
                let mut content = self.config.content.clone();
                content.content_root = self.resolve(&content.content_root);
                units::load_units(&content, unit.as_deref())?
            }
            ContentTarget::Roles { pack, scenario } => {
                let pack = pack.as_deref().unwrap_or(self.config.content.role_pack.as_path());
                roles::load_role_pack(&self.resolve(pack), &self.base_dir, scenario.as_deref())?
            }
        };
        Ok(sources)
    }

    /// Full run with credentials taken from the process environment
    pub async fn run(&self, target: &ContentTarget) -> Result<RunStats, AppError> {
        let synthesizer = self.connect(std::env::var(ENV_CREDENTIALS).ok())?;
        self.run_with(target, synthesizer).await
    }

    /// Discover and generate with an already prepared synthesizer
    pub async fn run_with(
        &self,
        target: &ContentTarget,
        synthesizer: Option<Arc<dyn SpeechSynthesizer>>,
    ) -> Result<RunStats, AppError> {
        let start_time = Instant::now();

        let sources = self.discover(target)?;
        if sources.is_empty() {
            info!("No {}s found to process", target.kind());
            return Ok(RunStats::default());
        }

        let total = total_targets(&sources, self.options.slow);
        info!(
            "Found {} {}(s) to process, {} audio file(s) to check",
            sources.len(),
            target.kind(),
            total
        );

        let generator = AudioGenerator::new(&self.config, self.options, synthesizer)?
            .with_progress(self.progress_bar(total as u64));
        let stats = generator.run(&sources).await;

        info!("Finished in {}", Self::format_duration(start_time.elapsed()));
        Ok(stats)
    }

    /// Print the human-readable summary block
    pub fn print_summary(&self, stats: &RunStats) {
        println!();
        println!("────────────────────────────────────────────");
        println!("Summary:");
        println!("  Generated: {}", stats.generated);
        println!("  Skipped:   {}", stats.skipped);
        println!("  Failed:    {}", stats.failed);
        if self.options.dry_run {
            println!("  Planned:   {}", stats.planned);
        }
        println!("────────────────────────────────────────────");

        if stats.has_failures() {
            println!("\n❌ Completed with errors");
        } else if self.options.dry_run {
            println!("\n✅ Dry run complete, nothing was written");
        } else {
            println!("\n✅ Audio generation complete!");
        }
    }

    fn progress_bar(&self, total: u64) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let progress_bar = ProgressBar::new(total);
        let template_result = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files ({percent}%) {msg} {eta}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress_bar.set_style(template_result.progress_chars("█▓▒░"));
        progress_bar
    }

    fn format_duration(duration: Duration) -> String {
        let total_seconds = duration.as_secs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:03}s", seconds, duration.subsec_millis())
        }
    }
}
