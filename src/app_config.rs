use anyhow::{Context, Result};
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::errors::ConfigError;

/// Application configuration module
/// This module handles the run configuration: built-in defaults, an optional
/// JSON file, environment overrides, and validation.

/// Environment variable naming the service account JSON file
pub const ENV_CREDENTIALS: &str = "GOOGLE_APPLICATION_CREDENTIALS";
/// Environment variable holding the Google Cloud project id
pub const ENV_PROJECT_ID: &str = "GCLOUD_PROJECT_ID";
/// Environment variable overriding the voice name
pub const ENV_VOICE: &str = "TTS_VOICE";
/// Environment variable overriding the normal speaking rate
pub const ENV_RATE_NORMAL: &str = "TTS_SPEAKING_RATE_NORMAL";
/// Environment variable overriding the slow speaking rate
pub const ENV_RATE_SLOW: &str = "TTS_SPEAKING_RATE_SLOW";

/// Lowest speaking rate the provider accepts
pub const MIN_SPEAKING_RATE: f64 = 0.25;
/// Highest speaking rate the provider accepts
pub const MAX_SPEAKING_RATE: f64 = 4.0;

/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Text-to-speech provider settings
    #[serde(default)]
    pub tts: TtsConfig,

    /// Content layout settings
    #[serde(default)]
    pub content: ContentConfig,

    /// Pause after every live provider call, in milliseconds
    #[serde(default = "default_request_delay_ms")]
    pub request_delay_ms: u64,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Text-to-speech provider configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TtsConfig {
    /// Voice name (e.g., "lt-LT-Standard-A")
    #[serde(default = "default_voice")]
    pub voice: String,

    /// BCP-47 language code of the voice
    #[serde(default = "default_language_code")]
    pub language_code: String,

    /// Speaking rate for the normal variant
    #[serde(default = "default_rate_normal")]
    pub speaking_rate_normal: f64,

    /// Speaking rate for the slow variant
    #[serde(default = "default_rate_slow")]
    pub speaking_rate_slow: f64,

    /// Service endpoint URL
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Google Cloud project billed for the requests (optional)
    #[serde(default)]
    pub project_id: Option<String>,

    /// Credentials file tried when the environment variable is not set,
    /// relative to the base directory
    #[serde(default = "default_credentials_fallback")]
    pub credentials_fallback: PathBuf,
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            voice: default_voice(),
            language_code: default_language_code(),
            speaking_rate_normal: default_rate_normal(),
            speaking_rate_slow: default_rate_slow(),
            endpoint: default_endpoint(),
            timeout_secs: default_timeout_secs(),
            project_id: None,
            credentials_fallback: default_credentials_fallback(),
        }
    }
}

/// Where content lives on disk
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ContentConfig {
    /// Root of the vocabulary content tree
    #[serde(default = "default_content_root")]
    pub content_root: PathBuf,

    /// Course level directory under the content root (e.g., "a1")
    #[serde(default = "default_level")]
    pub level: String,

    /// Prefix that marks a unit directory
    #[serde(default = "default_unit_prefix")]
    pub unit_prefix: String,

    /// Manifest file name inside each unit directory
    #[serde(default = "default_manifest_name")]
    pub manifest_name: String,

    /// Audio output directory name inside each unit directory
    #[serde(default = "default_audio_dir_name")]
    pub audio_dir_name: String,

    /// Role-play pack JSON file
    #[serde(default = "default_role_pack")]
    pub role_pack: PathBuf,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            content_root: default_content_root(),
            level: default_level(),
            unit_prefix: default_unit_prefix(),
            manifest_name: default_manifest_name(),
            audio_dir_name: default_audio_dir_name(),
            role_pack: default_role_pack(),
        }
    }
}

impl ContentConfig {
    /// Directory holding the unit directories
    pub fn units_root(&self) -> PathBuf {
        self.content_root.join(&self.level)
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(self) -> LevelFilter {
        match self {
            Self::Error => LevelFilter::Error,
            Self::Warn => LevelFilter::Warn,
            Self::Info => LevelFilter::Info,
            Self::Debug => LevelFilter::Debug,
            Self::Trace => LevelFilter::Trace,
        }
    }
}

fn default_request_delay_ms() -> u64 {
    500 // 500ms between provider calls
}

fn default_voice() -> String {
    "lt-LT-Standard-A".to_string()
}

fn default_language_code() -> String {
    "lt-LT".to_string()
}

fn default_rate_normal() -> f64 {
    1.0
}

fn default_rate_slow() -> f64 {
    0.7
}

fn default_endpoint() -> String {
    "https://texttospeech.googleapis.com".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_credentials_fallback() -> PathBuf {
    PathBuf::from(".secrets").join("gcp_service_account.json")
}

fn default_content_root() -> PathBuf {
    PathBuf::from("content")
}

fn default_level() -> String {
    "a1".to_string()
}

fn default_unit_prefix() -> String {
    "unit_".to_string()
}

fn default_manifest_name() -> String {
    "unit.json".to_string()
}

fn default_audio_dir_name() -> String {
    "audio".to_string()
}

fn default_role_pack() -> PathBuf {
    PathBuf::from("assets/packs/roles/traveler_v1.json")
}

impl Config {
    /// Load a configuration from a JSON file. Missing fields take their defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("Failed to open config file: {:?}", path))?;
        let reader = BufReader::new(file);
        let config = serde_json::from_reader(reader)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;
        Ok(config)
    }

    /// Apply the `TTS_*` and `GCLOUD_PROJECT_ID` overrides from the process environment
    pub fn apply_process_env(&mut self) -> Result<(), ConfigError> {
        self.apply_env_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides using the given variable lookup.
    ///
    /// Empty values are ignored. A rate that does not parse is an error.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(voice) = lookup(ENV_VOICE) {
            self.tts.voice = voice;
        }
        if let Some(rate) = lookup(ENV_RATE_NORMAL) {
            self.tts.speaking_rate_normal = parse_rate(ENV_RATE_NORMAL, &rate)?;
        }
        if let Some(rate) = lookup(ENV_RATE_SLOW) {
            self.tts.speaking_rate_slow = parse_rate(ENV_RATE_SLOW, &rate)?;
        }
        if let Some(project) = lookup(ENV_PROJECT_ID) {
            self.tts.project_id = Some(project);
        }
        Ok(())
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tts.voice.trim().is_empty() {
            return Err(ConfigError::Invalid("voice name must not be empty".to_string()));
        }
        if self.tts.language_code.trim().is_empty() {
            return Err(ConfigError::Invalid("language code must not be empty".to_string()));
        }
        check_rate("normal speaking rate", self.tts.speaking_rate_normal)?;
        check_rate("slow speaking rate", self.tts.speaking_rate_slow)?;
        if !self.tts.endpoint.starts_with("http") {
            return Err(ConfigError::Invalid(format!(
                "endpoint must be an http(s) URL, got '{}'",
                self.tts.endpoint
            )));
        }
        if self.tts.timeout_secs == 0 {
            return Err(ConfigError::Invalid("timeout_secs must be greater than 0".to_string()));
        }
        if self.content.manifest_name.is_empty() || self.content.audio_dir_name.is_empty() {
            return Err(ConfigError::Invalid(
                "manifest and audio directory names must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Pause inserted after each live provider call
    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            tts: TtsConfig::default(),
            content: ContentConfig::default(),
            request_delay_ms: default_request_delay_ms(),
            log_level: LogLevel::default(),
        }
    }
}

fn parse_rate(key: &str, value: &str) -> Result<f64, ConfigError> {
    value
        .parse::<f64>()
        .map_err(|_| ConfigError::Invalid(format!("{} is not a number: '{}'", key, value)))
}

fn check_rate(name: &str, rate: f64) -> Result<(), ConfigError> {
    if !(MIN_SPEAKING_RATE..=MAX_SPEAKING_RATE).contains(&rate) {
        return Err(ConfigError::Invalid(format!(
            "{} must be between {} and {}, got {}",
            name, MIN_SPEAKING_RATE, MAX_SPEAKING_RATE, rate
        )));
    }
    Ok(())
}
