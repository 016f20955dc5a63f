/*!
 * Cache-checked audio generation.
 *
 * Walks content sources in order, skips targets that already exist, and
 * synthesizes the rest one request at a time with a fixed pause after every
 * live provider call.
 */

use indicatif::ProgressBar;
use log::{debug, info, warn};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::app_config::Config;
use crate::content::{items_without_slow, ContentItem, ContentSource, Variant};
use crate::errors::{AppError, ConfigError};
use crate::file_utils::FileManager;
use crate::tts::{AudioEncoding, SpeechSynthesizer, SynthesisRequest};

/// Flags that shape a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Also render the slow variant
    pub slow: bool,
    /// Regenerate targets that already exist
    pub force: bool,
    /// Report what would happen without calling the provider or writing files
    pub dry_run: bool,
}

/// What happened to one target file
#[derive(Debug, Clone, PartialEq)]
pub enum ItemOutcome {
    Generated,
    Skipped,
    Planned,
    Failed,
}

/// Counters for a run, returned once at the end
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub generated: usize,
    pub skipped: usize,
    pub failed: usize,
    /// Targets a dry run would have generated
    pub planned: usize,
}

impl RunStats {
    pub fn record(&mut self, outcome: &ItemOutcome) {
        match outcome {
            ItemOutcome::Generated => self.generated += 1,
            ItemOutcome::Skipped => self.skipped += 1,
            ItemOutcome::Planned => self.planned += 1,
            ItemOutcome::Failed => self.failed += 1,
        }
    }

    /// Number of targets considered
    pub fn total(&self) -> usize {
        self.generated + self.skipped + self.failed + self.planned
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }

    /// 0 for a clean run, 1 if any item failed
    pub fn exit_code(&self) -> u8 {
        if self.has_failures() { 1 } else { 0 }
    }
}

/// Voice parameters shared by every request of a run
#[derive(Debug, Clone, PartialEq)]
pub struct VoiceSettings {
    pub voice: String,
    pub language_code: String,
    pub rate_normal: f64,
    pub rate_slow: f64,
}

impl VoiceSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            voice: config.tts.voice.clone(),
            language_code: config.tts.language_code.clone(),
            rate_normal: config.tts.speaking_rate_normal,
            rate_slow: config.tts.speaking_rate_slow,
        }
    }

    pub fn rate_for(&self, variant: Variant) -> f64 {
        match variant {
            Variant::Normal => self.rate_normal,
            Variant::Slow => self.rate_slow,
        }
    }
}

/// Sequential generator for content sources
pub struct AudioGenerator {
    synthesizer: Option<Arc<dyn SpeechSynthesizer>>,
    voice: VoiceSettings,
    options: RunOptions,
    request_delay: Duration,
    progress: ProgressBar,
}

impl AudioGenerator {
    /// Create a generator. A live run needs a synthesizer; a dry run ignores it.
    pub fn new(
        config: &Config,
        options: RunOptions,
        synthesizer: Option<Arc<dyn SpeechSynthesizer>>,
    ) -> Result<Self, ConfigError> {
        if !options.dry_run && synthesizer.is_none() {
            return Err(ConfigError::Invalid(
                "a text-to-speech client is required unless running dry".to_string(),
            ));
        }

        Ok(Self {
            synthesizer: if options.dry_run { None } else { synthesizer },
            voice: VoiceSettings::from_config(config),
            options,
            request_delay: config.request_delay(),
            progress: ProgressBar::hidden(),
        })
    }

    /// Report progress on the given bar instead of a hidden one
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    /// Process every source in order and return the aggregate counts
    pub async fn run(&self, sources: &[ContentSource]) -> RunStats {
        if self.options.slow {
            let missing = items_without_slow(sources);
            if missing > 0 {
                self.log(|| {
                    warn!(
                        "--slow is set but {} item(s) have no slow audio path; only their normal audio is generated",
                        missing
                    )
                });
            }
        }

        let mut stats = RunStats::default();
        for source in sources {
            self.process_source(source, &mut stats).await;
        }
        self.progress.finish_and_clear();
        stats
    }

    /// Process all items of one unit or scenario
    pub async fn process_source(&self, source: &ContentSource, stats: &mut RunStats) {
        self.log(|| info!("Processing: {}", source.id));
        if source.items.is_empty() {
            self.log(|| info!("  No items found in {}", source.id));
            return;
        }
        for item in &source.items {
            self.process_item(item, stats).await;
        }
    }

    /// Normal variant always, slow variant when enabled and the item has a slow target
    pub async fn process_item(&self, item: &ContentItem, stats: &mut RunStats) {
        let outcome = self.process_variant(item, Variant::Normal, &item.normal_path).await;
        stats.record(&outcome);

        if self.options.slow {
            match &item.slow_path {
                Some(slow_path) => {
                    let outcome = self.process_variant(item, Variant::Slow, slow_path).await;
                    stats.record(&outcome);
                }
                None => self.log(|| debug!("  {} has no slow variant", item.id)),
            }
        }
    }

    async fn process_variant(&self, item: &ContentItem, variant: Variant, path: &Path) -> ItemOutcome {
        let name = FileManager::display_name(path);
        self.progress.set_message(name.clone());

        let outcome = if path.exists() && !self.options.force {
            self.log(|| info!("  → Skipping (exists): {}", name));
            ItemOutcome::Skipped
        } else if self.options.dry_run {
            self.log(|| info!("  [DRY-RUN] Would generate: {} ({})", name, variant));
            ItemOutcome::Planned
        } else {
            match self.synthesize_to(&item.text, path, self.voice.rate_for(variant)).await {
                Ok(bytes) => {
                    self.log(|| info!("  ✓ Generated: {} ({} bytes)", name, bytes));
                    ItemOutcome::Generated
                }
                Err(e) => {
                    self.log(|| warn!("  ✗ Failed: {} - {}", name, e));
                    ItemOutcome::Failed
                }
            }
        };

        self.progress.inc(1);
        outcome
    }

    /// Synthesize `text` at `rate` into `target`, encoding chosen by the target's extension.
    ///
    /// The audio is written atomically, so a failure never leaves a file at `target`.
    /// Every provider call, successful or not, is followed by the request delay.
    pub async fn synthesize_to(&self, text: &str, target: &Path, rate: f64) -> Result<usize, AppError> {
        if text.trim().is_empty() {
            return Err(AppError::Unknown("nothing to synthesize: empty text".to_string()));
        }
        if target.file_name().is_none() {
            return Err(AppError::File(format!("invalid target path: {:?}", target)));
        }
        let synthesizer = self
            .synthesizer
            .as_ref()
            .ok_or_else(|| AppError::Unknown("no text-to-speech client in dry run".to_string()))?;

        let request = SynthesisRequest {
            text: text.to_string(),
            voice: self.voice.voice.clone(),
            language_code: self.voice.language_code.clone(),
            speaking_rate: rate,
            encoding: AudioEncoding::from_path(target),
        };

        let result = synthesizer.synthesize(&request).await;
        self.pause().await;
        let audio = result?;

        FileManager::write_atomic(target, &audio).map_err(|e| AppError::File(format!("{:#}", e)))?;
        Ok(audio.len())
    }

    async fn pause(&self) {
        if !self.request_delay.is_zero() {
            tokio::time::sleep(self.request_delay).await;
        }
    }

    // Keep log lines from tearing the progress bar
    fn log<F: FnOnce()>(&self, f: F) {
        self.progress.suspend(f);
    }
}
