/*!
 * Error types for the lietucoach-tts application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when talking to the text-to-speech provider
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    /// The provider answered successfully but without audio
    #[error("Provider returned no audio content")]
    EmptyAudio,
}

impl From<reqwest::Error> for ProviderError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_connect() || error.is_timeout() {
            Self::ConnectionError(error.to_string())
        } else if error.is_decode() {
            Self::ParseError(error.to_string())
        } else {
            Self::RequestFailed(error.to_string())
        }
    }
}

/// Errors raised while discovering and loading content packs
#[derive(Error, Debug)]
pub enum ContentError {
    /// The top-level content root is absent
    #[error("Content root not found: {0:?}")]
    MissingRoot(PathBuf),

    /// A unit directory has no manifest file
    #[error("Manifest not found: {0:?}")]
    MissingManifest(PathBuf),

    /// A content directory could not be listed
    #[error("Failed to scan {path:?}: {message}")]
    Scan { path: PathBuf, message: String },

    /// A content file could not be read
    #[error("Failed to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A content file is not valid JSON for its layout
    #[error("Failed to parse {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors in the run configuration, detected before any item is processed
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A configuration value is missing or out of range
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    /// Credentials could not be located or parsed
    #[error("Credentials error: {0}")]
    Credentials(String),
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from the provider
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error from content loading
    #[error("Content error: {0}")]
    Content(#[from] ContentError),

    /// Error from configuration or credentials
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl AppError {
    /// Process exit status for an error that stops the run before processing.
    ///
    /// Configuration and content-root problems map to 2, everything else to 1.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Config(_) | Self::Content(_) => 2,
            _ => 1,
        }
    }
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(format!("{:#}", error))
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
