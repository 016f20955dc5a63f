//! Google credentials: where to find them and how to turn them into access tokens.

use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use log::debug;
use parking_lot::Mutex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::errors::{ConfigError, ProviderError};

/// OAuth scope that covers Text-to-Speech
pub const CLOUD_PLATFORM_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";

const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;
// Tokens are refreshed this long before the provider would reject them
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// Where a credentials file was found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    /// `GOOGLE_APPLICATION_CREDENTIALS`
    Environment,
    /// The project-local secrets file
    Fallback,
    /// gcloud application-default credentials
    ApplicationDefault,
}

/// A credentials file that exists on disk
#[derive(Debug, Clone, PartialEq)]
pub struct CredentialsLocation {
    pub path: PathBuf,
    pub source: CredentialSource,
}

/// gcloud's application-default credentials file for the current user
pub fn application_default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("gcloud").join("application_default_credentials.json"))
}

/// Find the credentials file.
///
/// An explicitly set environment path must exist; otherwise the project fallback
/// and then application-default credentials are tried.
pub fn locate_credentials(
    env_value: Option<String>,
    fallback: &Path,
    application_default: Option<PathBuf>,
) -> Result<CredentialsLocation, ConfigError> {
    if let Some(value) = env_value.filter(|v| !v.trim().is_empty()) {
        let path = PathBuf::from(value.trim());
        if !path.is_file() {
            return Err(ConfigError::Credentials(format!(
                "Credentials file not found: {:?}",
                path
            )));
        }
        return Ok(CredentialsLocation { path, source: CredentialSource::Environment });
    }

    if fallback.is_file() {
        return Ok(CredentialsLocation {
            path: fallback.to_path_buf(),
            source: CredentialSource::Fallback,
        });
    }

    if let Some(path) = application_default.filter(|p| p.is_file()) {
        return Ok(CredentialsLocation { path, source: CredentialSource::ApplicationDefault });
    }

    Err(ConfigError::Credentials(format!(
        "GOOGLE_APPLICATION_CREDENTIALS not set and no credentials at {:?}; \
         set it to the path of your service account JSON file",
        fallback
    )))
}

/// Service account key as downloaded from the Cloud console
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default)]
    pub private_key_id: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    #[serde(default)]
    pub project_id: Option<String>,
}

/// User credentials written by `gcloud auth application-default login`
#[derive(Debug, Clone, Deserialize)]
pub struct AuthorizedUser {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
    #[serde(default)]
    pub quota_project_id: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

/// Parsed credentials file
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Credentials {
    ServiceAccount(ServiceAccountKey),
    AuthorizedUser(AuthorizedUser),
}

impl Credentials {
    /// Read and parse a credentials file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|e| {
            ConfigError::Credentials(format!("Failed to read credentials {:?}: {}", path, e))
        })?;
        serde_json::from_str(&raw).map_err(|e| {
            ConfigError::Credentials(format!("Unsupported or invalid credentials {:?}: {}", path, e))
        })
    }

    /// Quota project named by user credentials.
    ///
    /// A service account key's `project_id` is not a quota project: sending it needs
    /// `serviceusage.services.use`, which minimal TTS roles lack.
    pub fn quota_project_id(&self) -> Option<&str> {
        match self {
            Self::ServiceAccount(_) => None,
            Self::AuthorizedUser(user) => user.quota_project_id.as_deref(),
        }
    }

    /// Account name for log lines
    pub fn principal(&self) -> &str {
        match self {
            Self::ServiceAccount(key) => &key.client_email,
            Self::AuthorizedUser(user) => &user.client_id,
        }
    }
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}

fn default_expires_in() -> u64 {
    3600
}

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    refresh_at: Instant,
}

enum Grant {
    Jwt {
        key: ServiceAccountKey,
        signing_key: EncodingKey,
    },
    RefreshToken(AuthorizedUser),
}

/// Hands out bearer tokens, fetching a new one only when the cached one is about to expire
pub struct TokenProvider {
    client: Client,
    grant: Grant,
    cached: Mutex<Option<CachedToken>>,
}

impl std::fmt::Debug for TokenProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match &self.grant {
            Grant::Jwt { key, .. } => format!("service_account({})", key.client_email),
            Grant::RefreshToken(user) => format!("authorized_user({})", user.client_id),
        };
        f.debug_struct("TokenProvider").field("grant", &kind).finish()
    }
}

impl TokenProvider {
    /// Build a provider. A service account private key that is not valid RSA PEM fails here,
    /// before any content is processed.
    pub fn new(client: Client, credentials: Credentials) -> Result<Self, ConfigError> {
        let grant = match credentials {
            Credentials::ServiceAccount(key) => {
                let signing_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes()).map_err(|e| {
                    ConfigError::Credentials(format!("Invalid service account private key: {}", e))
                })?;
                Grant::Jwt { key, signing_key }
            }
            Credentials::AuthorizedUser(user) => Grant::RefreshToken(user),
        };

        Ok(Self {
            client,
            grant,
            cached: Mutex::new(None),
        })
    }

    /// A valid access token, from cache when possible
    pub async fn access_token(&self) -> Result<String, ProviderError> {
        let cached = self.cached.lock().clone();
        if let Some(token) = cached {
            if Instant::now() < token.refresh_at {
                return Ok(token.value);
            }
        }

        let response = self.fetch().await?;
        let lifetime = Duration::from_secs(response.expires_in).saturating_sub(EXPIRY_MARGIN);
        debug!("Obtained access token valid for {}s", response.expires_in);

        *self.cached.lock() = Some(CachedToken {
            value: response.access_token.clone(),
            refresh_at: Instant::now() + lifetime,
        });

        Ok(response.access_token)
    }

    /// Drop the cached token so the next call fetches a fresh one
    pub fn invalidate(&self) {
        *self.cached.lock() = None;
    }

    async fn fetch(&self) -> Result<TokenResponse, ProviderError> {
        let request = match &self.grant {
            Grant::Jwt { key, signing_key } => {
                let assertion = sign_assertion(key, signing_key)?;
                self.client
                    .post(&key.token_uri)
                    .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            }
            Grant::RefreshToken(user) => {
                debug!("Refreshing application-default user token");
                self.client.post(&user.token_uri).form(&[
                    ("grant_type", "refresh_token"),
                    ("client_id", user.client_id.as_str()),
                    ("client_secret", user.client_secret.as_str()),
                    ("refresh_token", user.refresh_token.as_str()),
                ])
            }
        };

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            return Err(ProviderError::AuthenticationError(format!(
                "token request rejected ({}): {}",
                status, body
            )));
        }

        response
            .json::<TokenResponse>()
            .await
            .map_err(|e| ProviderError::ParseError(format!("token response: {}", e)))
    }
}

/// Signed RS256 assertion for the JWT-bearer grant
fn sign_assertion(key: &ServiceAccountKey, signing_key: &EncodingKey) -> Result<String, ProviderError> {
    let now = chrono::Utc::now().timestamp();
    let claims = AssertionClaims {
        iss: &key.client_email,
        scope: CLOUD_PLATFORM_SCOPE,
        aud: &key.token_uri,
        iat: now,
        exp: now + ASSERTION_LIFETIME_SECS,
    };

    let mut header = Header::new(Algorithm::RS256);
    header.kid = key.private_key_id.clone();

    encode(&header, &claims, signing_key)
        .map_err(|e| ProviderError::AuthenticationError(format!("failed to sign assertion: {}", e)))
}
