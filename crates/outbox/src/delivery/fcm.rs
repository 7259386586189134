//! Firebase Cloud Messaging gateway (HTTP v1 API).
//!
//! Authenticates with a service-account key: a short-lived RS256 assertion
//! is exchanged for an OAuth access token, which is cached until shortly
//! before it expires. Each device token gets its own `messages:send` call;
//! the calls for one notification run concurrently.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use tasflou_core::push::{PushGateway, PushMessage, PushResult};
use tokio::sync::Mutex;

const MESSAGING_SCOPE: &str = "https://www.googleapis.com/auth/firebase.messaging";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const SEND_URL_BASE: &str = "https://fcm.googleapis.com/v1/projects";

/// Lifetime requested for the signed assertion.
const ASSERTION_TTL_SECS: i64 = 3600;

/// Refresh the cached access token this long before it expires.
const TOKEN_REFRESH_MARGIN_SECS: i64 = 60;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct FcmConfig {
    pub project_id: String,
    /// Path to the service-account JSON key.
    pub credentials_path: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
struct ServiceAccount {
    client_email: String,
    private_key: String,
    #[serde(default = "default_token_uri")]
    token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum FcmError {
    #[error("Failed to read FCM credentials: {0}")]
    Credentials(#[from] std::io::Error),

    #[error("Invalid FCM credentials: {0}")]
    InvalidCredentials(#[from] serde_json::Error),

    #[error("Failed to sign FCM assertion: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),

    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("FCM token endpoint returned HTTP {0}")]
    TokenStatus(u16),
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    status: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    details: Vec<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(rename = "errorCode", default)]
    error_code: Option<String>,
}

impl ErrorBody {
    /// The provider will never accept this token again.
    ///
    /// `INVALID_ARGUMENT` is not included: FCM also uses it for malformed
    /// payloads, which says nothing about the token.
    fn is_invalid_token(&self) -> bool {
        self.status == "NOT_FOUND"
            || self
                .details
                .iter()
                .any(|d| d.error_code.as_deref() == Some("UNREGISTERED"))
    }
}

struct CachedToken {
    value: String,
    expires_at: i64,
}

/// Result of sending to one device.
enum TokenOutcome {
    Delivered,
    Invalid(String),
    Failed(String),
}

// ---------------------------------------------------------------------------
// FcmGateway
// ---------------------------------------------------------------------------

pub struct FcmGateway {
    client: reqwest::Client,
    project_id: String,
    account: ServiceAccount,
    token: Mutex<Option<CachedToken>>,
}

impl FcmGateway {
    /// Load the service-account key and build the HTTP client.
    pub fn from_config(config: &FcmConfig, request_timeout: Duration) -> Result<Self, FcmError> {
        let raw = std::fs::read_to_string(&config.credentials_path)?;
        let account: ServiceAccount = serde_json::from_str(&raw)?;
        // Reject a malformed key now rather than on the first send.
        EncodingKey::from_rsa_pem(account.private_key.as_bytes())?;

        let client = reqwest::Client::builder().timeout(request_timeout).build()?;

        Ok(Self {
            client,
            project_id: config.project_id.clone(),
            account,
            token: Mutex::new(None),
        })
    }

    async fn access_token(&self) -> Result<String, FcmError> {
        let mut cached = self.token.lock().await;
        let now = Utc::now().timestamp();
        if let Some(token) = cached.as_ref() {
            if token.expires_at - TOKEN_REFRESH_MARGIN_SECS > now {
                return Ok(token.value.clone());
            }
        }

        let claims = AssertionClaims {
            iss: &self.account.client_email,
            scope: MESSAGING_SCOPE,
            aud: &self.account.token_uri,
            iat: now,
            exp: now + ASSERTION_TTL_SECS,
        };
        let key = EncodingKey::from_rsa_pem(self.account.private_key.as_bytes())?;
        let assertion = jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &key)?;

        let response = self
            .client
            .post(&self.account.token_uri)
            .form(&[
                ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
                ("assertion", assertion.as_str()),
            ])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(FcmError::TokenStatus(response.status().as_u16()));
        }
        let body: TokenResponse = response.json().await?;

        let value = body.access_token.clone();
        *cached = Some(CachedToken {
            value: body.access_token,
            expires_at: now + body.expires_in,
        });
        Ok(value)
    }

    async fn send_to(&self, access_token: &str, token: &str, message: &PushMessage) -> TokenOutcome {
        let url = format!("{SEND_URL_BASE}/{}/messages:send", self.project_id);
        let payload = serde_json::json!({
            "message": {
                "token": token,
                "notification": {
                    "title": message.title,
                    "body": message.body,
                },
                "data": message.data,
            }
        });

        let response = match self
            .client
            .post(&url)
            .bearer_auth(access_token)
            .json(&payload)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return TokenOutcome::Failed(format!("HTTP request failed: {e}")),
        };

        let status = response.status();
        if status.is_success() {
            return TokenOutcome::Delivered;
        }

        match response.json::<ErrorEnvelope>().await {
            Ok(envelope) if envelope.error.is_invalid_token() => {
                TokenOutcome::Invalid(envelope.error.message)
            }
            Ok(envelope) => TokenOutcome::Failed(format!(
                "FCM returned HTTP {}: {}",
                status.as_u16(),
                envelope.error.message
            )),
            Err(_) => TokenOutcome::Failed(format!("FCM returned HTTP {}", status.as_u16())),
        }
    }
}

#[async_trait]
impl PushGateway for FcmGateway {
    async fn send(&self, message: &PushMessage) -> PushResult {
        if message.tokens.is_empty() {
            return PushResult::all_failed(0, "no device tokens");
        }

        let access_token = match self.access_token().await {
            Ok(token) => token,
            Err(e) => {
                tracing::error!(error = %e, "Failed to obtain FCM access token");
                return PushResult::all_failed(message.tokens.len(), e.to_string());
            }
        };

        let outcomes = futures::future::join_all(
            message
                .tokens
                .iter()
                .map(|token| self.send_to(&access_token, token, message)),
        )
        .await;

        let mut result = PushResult::default();
        let mut last_error = None;
        for (token, outcome) in message.tokens.iter().zip(outcomes) {
            match outcome {
                TokenOutcome::Delivered => {
                    result.success_count += 1;
                    result.delivered_tokens.push(token.clone());
                }
                TokenOutcome::Invalid(reason) => {
                    tracing::debug!(reason = %reason, "FCM rejected device token");
                    result.failure_count += 1;
                    result.invalid_tokens.push(token.clone());
                }
                TokenOutcome::Failed(reason) => {
                    result.failure_count += 1;
                    last_error = Some(reason);
                }
            }
        }
        if result.success_count == 0 {
            result.error = last_error;
        }
        result
    }
}
