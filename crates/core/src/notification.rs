//! Notification vocabulary and the delivery state machine.
//!
//! A notification starts `pending` and moves to `sent` or `failed` exactly
//! once. There is no path back to `pending`; a failed delivery stays failed.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::push::PushResult;

/// Error recorded when the recipient has no registered devices.
pub const ERR_NO_DEVICE_TOKENS: &str = "no device tokens registered for user";

/// Error recorded when the referenced task is gone.
pub const ERR_TASK_NOT_FOUND: &str = "task not found";

// ---------------------------------------------------------------------------
// NotificationType
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    DueDateApproaching,
    StaleTask,
}

impl NotificationType {
    pub fn as_str(self) -> &'static str {
        match self {
            NotificationType::DueDateApproaching => "due_date_approaching",
            NotificationType::StaleTask => "stale_task",
        }
    }
}

impl fmt::Display for NotificationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NotificationType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "due_date_approaching" => Ok(NotificationType::DueDateApproaching),
            "stale_task" => Ok(NotificationType::StaleTask),
            other => Err(CoreError::TemplateMissing(other.to_string())),
        }
    }
}

impl TryFrom<String> for NotificationType {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

// ---------------------------------------------------------------------------
// NotificationStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationStatus {
    Pending,
    Sent,
    Failed,
}

impl NotificationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            NotificationStatus::Pending => "pending",
            NotificationStatus::Sent => "sent",
            NotificationStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(self) -> bool {
        !matches!(self, NotificationStatus::Pending)
    }

    /// Only `pending -> sent` and `pending -> failed` are allowed.
    pub fn can_transition(self, to: NotificationStatus) -> bool {
        self == NotificationStatus::Pending && to.is_terminal()
    }
}

impl fmt::Display for NotificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NotificationStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(NotificationStatus::Pending),
            "sent" => Ok(NotificationStatus::Sent),
            "failed" => Ok(NotificationStatus::Failed),
            other => Err(CoreError::Validation(format!(
                "Unknown notification status '{other}'"
            ))),
        }
    }
}

impl TryFrom<String> for NotificationStatus {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

// ---------------------------------------------------------------------------
// ReadSource
// ---------------------------------------------------------------------------

/// Where the user acknowledged a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadSource {
    WebPush,
    WebClient,
}

impl ReadSource {
    pub fn as_str(self) -> &'static str {
        match self {
            ReadSource::WebPush => "web_push",
            ReadSource::WebClient => "web_client",
        }
    }
}

impl FromStr for ReadSource {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "web_push" => Ok(ReadSource::WebPush),
            "web_client" => Ok(ReadSource::WebClient),
            other => Err(CoreError::Validation(format!(
                "Unknown read source '{other}'"
            ))),
        }
    }
}

impl TryFrom<String> for ReadSource {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

// ---------------------------------------------------------------------------
// DeliveryOutcome
// ---------------------------------------------------------------------------

/// Terminal result of one delivery attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Sent,
    Failed(String),
}

impl DeliveryOutcome {
    /// Decide the outcome of a gateway call.
    ///
    /// One accepted device is enough for `Sent`. Otherwise the gateway's own
    /// error wins, falling back to a device count summary.
    pub fn from_push(result: &PushResult) -> Self {
        if result.success_count > 0 {
            return DeliveryOutcome::Sent;
        }
        let message = result
            .error
            .clone()
            .unwrap_or_else(|| format!("failed to send to {} devices", result.failure_count));
        DeliveryOutcome::Failed(message)
    }

    pub fn status(&self) -> NotificationStatus {
        match self {
            DeliveryOutcome::Sent => NotificationStatus::Sent,
            DeliveryOutcome::Failed(_) => NotificationStatus::Failed,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            DeliveryOutcome::Sent => None,
            DeliveryOutcome::Failed(msg) => Some(msg),
        }
    }

    pub fn is_sent(&self) -> bool {
        matches!(self, DeliveryOutcome::Sent)
    }
}
