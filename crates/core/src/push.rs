//! Push delivery port.
//!
//! The sender receives a [`PushGateway`] handle at construction time; there
//! is no process-global push client. A gateway never returns an error: an
//! unreachable or unconfigured provider is reported as a [`PushResult`] with
//! zero successes so the caller can record it on the notification.

use std::collections::BTreeMap;

use async_trait::async_trait;

/// Message fanned out to every device token of one recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushMessage {
    pub tokens: Vec<String>,
    pub title: String,
    pub body: String,
    /// String key/value payload delivered alongside the visible message.
    pub data: BTreeMap<String, String>,
}

/// Per-send summary returned by a gateway.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PushResult {
    pub success_count: usize,
    pub failure_count: usize,
    pub error: Option<String>,
    /// Tokens the provider accepted.
    pub delivered_tokens: Vec<String>,
    /// Tokens the provider reported as permanently unregistered.
    pub invalid_tokens: Vec<String>,
}

impl PushResult {
    /// Every token failed for the same reason.
    pub fn all_failed(token_count: usize, error: impl Into<String>) -> Self {
        Self {
            success_count: 0,
            failure_count: token_count,
            error: Some(error.into()),
            ..Self::default()
        }
    }
}

#[async_trait]
pub trait PushGateway: Send + Sync {
    async fn send(&self, message: &PushMessage) -> PushResult;
}

/// Stand-in used when no push provider is configured.
///
/// Every send fails with an explanatory message instead of erroring out.
#[derive(Debug, Clone, Default)]
pub struct UnconfiguredGateway;

/// Error recorded for sends attempted without a configured provider.
pub const ERR_GATEWAY_NOT_CONFIGURED: &str = "push gateway not configured";

#[async_trait]
impl PushGateway for UnconfiguredGateway {
    async fn send(&self, _message: &PushMessage) -> PushResult {
        PushResult {
            error: Some(ERR_GATEWAY_NOT_CONFIGURED.to_string()),
            ..PushResult::default()
        }
    }
}
