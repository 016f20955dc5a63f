use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use log::debug;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::auth::{Credentials, TokenProvider};
use super::{AudioEncoding, SpeechSynthesizer, SynthesisRequest};
use crate::app_config::TtsConfig;
use crate::errors::{ConfigError, ProviderError};

/// Google Cloud Text-to-Speech client
#[derive(Debug)]
pub struct GoogleTts {
    /// HTTP client for API requests
    client: Client,
    /// API endpoint URL
    endpoint: String,
    /// Project billed for the requests
    project_id: Option<String>,
    /// Access token source
    auth: TokenProvider,
}

/// `text:synthesize` request body
#[derive(Debug, Serialize)]
pub struct GoogleSynthesizeRequest {
    pub input: SynthesisInput,
    pub voice: VoiceSelection,
    #[serde(rename = "audioConfig")]
    pub audio_config: AudioConfig,
}

#[derive(Debug, Serialize)]
pub struct SynthesisInput {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct VoiceSelection {
    #[serde(rename = "languageCode")]
    pub language_code: String,
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct AudioConfig {
    #[serde(rename = "audioEncoding")]
    pub audio_encoding: AudioEncoding,
    #[serde(rename = "speakingRate")]
    pub speaking_rate: f64,
}

/// `text:synthesize` response body
#[derive(Debug, Deserialize)]
pub struct GoogleSynthesizeResponse {
    /// Base64-encoded audio
    #[serde(rename = "audioContent", default)]
    pub audio_content: String,
}

#[derive(Debug, Deserialize)]
struct GoogleErrorEnvelope {
    error: GoogleErrorBody,
}

#[derive(Debug, Deserialize)]
struct GoogleErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
}

impl From<&SynthesisRequest> for GoogleSynthesizeRequest {
    fn from(request: &SynthesisRequest) -> Self {
        Self {
            input: SynthesisInput { text: request.text.clone() },
            voice: VoiceSelection {
                language_code: request.language_code.clone(),
                name: request.voice.clone(),
            },
            audio_config: AudioConfig {
                audio_encoding: request.encoding,
                speaking_rate: request.speaking_rate,
            },
        }
    }
}

impl GoogleSynthesizeResponse {
    /// Decode the audio payload. An empty payload is an error.
    pub fn into_audio(self) -> Result<Vec<u8>, ProviderError> {
        if self.audio_content.is_empty() {
            return Err(ProviderError::EmptyAudio);
        }
        let bytes = STANDARD
            .decode(self.audio_content.as_bytes())
            .map_err(|e| ProviderError::ParseError(format!("audioContent is not base64: {}", e)))?;
        if bytes.is_empty() {
            return Err(ProviderError::EmptyAudio);
        }
        Ok(bytes)
    }
}

/// Human-readable message from a Google error body, or the raw body
pub fn error_message(body: &str) -> String {
    match serde_json::from_str::<GoogleErrorEnvelope>(body) {
        Ok(envelope) => match envelope.error.status {
            Some(status) => format!("{} ({})", envelope.error.message, status),
            None => envelope.error.message,
        },
        Err(_) => body.trim().to_string(),
    }
}

impl GoogleTts {
    /// Create a client from the TTS settings and parsed credentials
    pub fn new(config: &TtsConfig, credentials: Credentials) -> Result<Self, ConfigError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ConfigError::Invalid(format!("Failed to initialize HTTP client: {}", e)))?;

        let project_id = config
            .project_id
            .clone()
            .or_else(|| credentials.quota_project_id().map(str::to_string));

        let auth = TokenProvider::new(client.clone(), credentials)?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            project_id,
            auth,
        })
    }

    /// URL of the synthesize method
    pub fn synthesize_url(&self) -> String {
        format!("{}/v1/text:synthesize", self.endpoint.trim_end_matches('/'))
    }

    /// Project sent as the quota project, if any
    pub fn project_id(&self) -> Option<&str> {
        self.project_id.as_deref()
    }
}

#[async_trait]
impl SpeechSynthesizer for GoogleTts {
    async fn synthesize(&self, request: &SynthesisRequest) -> Result<Vec<u8>, ProviderError> {
        let token = self.auth.access_token().await?;
        let body = GoogleSynthesizeRequest::from(request);

        debug!(
            "Synthesizing {} chars as {} at rate {}",
            request.text.chars().count(),
            request.encoding,
            request.speaking_rate
        );

        let mut builder = self
            .client
            .post(self.synthesize_url())
            .bearer_auth(token)
            .json(&body);
        if let Some(project) = &self.project_id {
            builder = builder.header("x-goog-user-project", project);
        }

        let response = builder.send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            let message = error_message(&error_text);
            debug!("Text-to-Speech API error ({}): {}", status, message);

            if status == StatusCode::UNAUTHORIZED {
                self.auth.invalidate();
                return Err(ProviderError::AuthenticationError(message));
            }
            return Err(ProviderError::ApiError {
                status_code: status.as_u16(),
                message,
            });
        }

        let parsed = response
            .json::<GoogleSynthesizeResponse>()
            .await
            .map_err(|e| ProviderError::ParseError(e.to_string()))?;

        parsed.into_audio()
    }
}
