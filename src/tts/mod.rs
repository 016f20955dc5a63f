/*!
 * Text-to-speech client.
 *
 * - `google`: Google Cloud Text-to-Speech REST client
 * - `auth`: credential discovery and OAuth access tokens
 *
 * The generator talks to the provider through [`SpeechSynthesizer`] so that
 * tests can substitute a recording fake for the network client.
 */

use async_trait::async_trait;
use serde::Serialize;
use std::fmt::Debug;
use std::path::Path;

use crate::errors::ProviderError;

pub mod auth;
pub mod google;

/// Audio container/codec requested from the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AudioEncoding {
    Mp3,
    OggOpus,
    Linear16,
}

impl AudioEncoding {
    /// Pick the encoding from the target file's extension.
    ///
    /// `.mp3` is MP3, `.wav` is LINEAR16, everything else is Opus in Ogg.
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "mp3" => Self::Mp3,
            "wav" => Self::Linear16,
            _ => Self::OggOpus,
        }
    }
}

impl std::fmt::Display for AudioEncoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Mp3 => "MP3",
            Self::OggOpus => "OGG_OPUS",
            Self::Linear16 => "LINEAR16",
        };
        write!(f, "{}", name)
    }
}

/// One synthesis call: what to say, with which voice, at which rate, in which format
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisRequest {
    pub text: String,
    pub voice: String,
    pub language_code: String,
    pub speaking_rate: f64,
    pub encoding: AudioEncoding,
}

/// A text-to-speech backend
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync + Debug {
    /// Synthesize the request and return the encoded audio bytes
    async fn synthesize(&self, request: &SynthesisRequest) -> Result<Vec<u8>, ProviderError>;
}
