//! Delivery of due pending notifications.
//!
//! One attempt per notification per run. Whatever happens during an
//! attempt, the row ends `sent` or `failed` with `sent_at` stamped, and the
//! rest of the batch still runs.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tasflou_core::notification::{DeliveryOutcome, ERR_NO_DEVICE_TOKENS, ERR_TASK_NOT_FOUND};
use tasflou_core::push::{PushGateway, PushMessage, PushResult};
use tasflou_core::quiet_hours::QuietHours;
use tasflou_core::templates;
use tasflou_core::types::Timestamp;
use tasflou_db::models::notification::Notification;

use crate::error::OutboxError;
use crate::store::OutboxStore;

/// Summary of a [`NotificationSender::send_all_pending`] run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SendReport {
    pub sent: usize,
    pub failed: usize,
    pub skipped_quiet_hours: bool,
}

impl SendReport {
    fn quiet() -> Self {
        Self {
            skipped_quiet_hours: true,
            ..Self::default()
        }
    }
}

pub struct NotificationSender {
    store: Arc<dyn OutboxStore>,
    gateway: Arc<dyn PushGateway>,
    quiet_hours: QuietHours,
    push_timeout: Duration,
}

impl NotificationSender {
    pub fn new(
        store: Arc<dyn OutboxStore>,
        gateway: Arc<dyn PushGateway>,
        quiet_hours: QuietHours,
        push_timeout: Duration,
    ) -> Self {
        Self {
            store,
            gateway,
            quiet_hours,
            push_timeout,
        }
    }

    pub fn is_quiet_hours(&self, now: Timestamp) -> bool {
        self.quiet_hours.contains(now)
    }

    /// Attempt every pending notification scheduled at or before `now`.
    ///
    /// Does nothing inside quiet hours. Only a failure to load the batch is
    /// returned as an error.
    pub async fn send_all_pending(&self, now: Timestamp) -> Result<SendReport, OutboxError> {
        if self.is_quiet_hours(now) {
            tracing::info!("Within quiet hours, skipping notification send");
            return Ok(SendReport::quiet());
        }

        let pending = self.store.due_pending(now).await?;
        let mut report = SendReport::default();

        for notification in &pending {
            if self.send_one(notification, now).await {
                report.sent += 1;
            } else {
                report.failed += 1;
            }
        }

        tracing::info!(
            sent = report.sent,
            failed = report.failed,
            "Notification send complete",
        );
        Ok(report)
    }

    /// Deliver one notification and record the outcome. Returns whether it
    /// was sent.
    pub async fn send_one(&self, notification: &Notification, now: Timestamp) -> bool {
        let outcome = match self.attempt(notification, now).await {
            Ok(outcome) => outcome,
            Err(e) => DeliveryOutcome::Failed(e.to_string()),
        };

        match &outcome {
            DeliveryOutcome::Sent => {
                tracing::info!(notification_id = notification.id, "Notification sent");
            }
            DeliveryOutcome::Failed(reason) => {
                tracing::error!(
                    notification_id = notification.id,
                    error = %reason,
                    "Notification failed",
                );
            }
        }

        match self.store.record_outcome(notification.id, &outcome, now).await {
            Ok(true) => {}
            Ok(false) => {
                tracing::warn!(
                    notification_id = notification.id,
                    "Notification was already finalised, outcome discarded",
                );
            }
            Err(e) => {
                tracing::error!(
                    notification_id = notification.id,
                    error = %e,
                    "Failed to record notification outcome",
                );
            }
        }

        outcome.is_sent()
    }

    async fn attempt(
        &self,
        notification: &Notification,
        now: Timestamp,
    ) -> Result<DeliveryOutcome, OutboxError> {
        let tokens = self.store.device_tokens(notification.user_id).await?;
        if tokens.is_empty() {
            return Ok(DeliveryOutcome::Failed(ERR_NO_DEVICE_TOKENS.to_string()));
        }

        let task = match notification.task_id {
            Some(task_id) => self.store.find_active_task(task_id).await?,
            None => None,
        };
        let Some(task) = task else {
            return Ok(DeliveryOutcome::Failed(ERR_TASK_NOT_FOUND.to_string()));
        };

        let rendered = templates::render(notification.kind, &task.snapshot(), now);
        let message = PushMessage {
            tokens,
            title: rendered.title,
            body: rendered.body,
            data: BTreeMap::from([("notification_id".to_string(), notification.id.to_string())]),
        };

        let result = match tokio::time::timeout(self.push_timeout, self.gateway.send(&message)).await
        {
            Ok(result) => result,
            Err(_) => PushResult::all_failed(
                message.tokens.len(),
                format!("push gateway timed out after {}s", self.push_timeout.as_secs()),
            ),
        };

        self.maintain_tokens(notification, &result, now).await;

        Ok(DeliveryOutcome::from_push(&result))
    }

    /// Drop tokens the provider rejected and stamp the ones it accepted.
    /// Bookkeeping failures are logged and never change the outcome.
    async fn maintain_tokens(&self, notification: &Notification, result: &PushResult, now: Timestamp) {
        if !result.invalid_tokens.is_empty() {
            match self.store.prune_tokens(&result.invalid_tokens).await {
                Ok(removed) => tracing::info!(
                    user_id = notification.user_id,
                    removed,
                    "Pruned invalid device tokens",
                ),
                Err(e) => tracing::warn!(error = %e, "Failed to prune invalid device tokens"),
            }
        }

        if !result.delivered_tokens.is_empty() {
            if let Err(e) = self
                .store
                .touch_tokens(notification.user_id, &result.delivered_tokens, now)
                .await
            {
                tracing::warn!(error = %e, "Failed to update device token usage");
            }
        }
    }
}
