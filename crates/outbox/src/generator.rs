//! Trigger scans that fill the outbox with pending notifications.
//!
//! Each scan selects candidate tasks and inserts one pending row per task.
//! The dedup check runs per task right before its insert, so a second scan
//! with no sends in between creates nothing. Two scans running at the same
//! moment can still both insert for the same task: nothing in the schema
//! forbids a duplicate pending row, and a duplicate only means one extra
//! push.

use std::sync::Arc;

use serde::Serialize;
use tasflou_core::notification::NotificationType;
use tasflou_core::types::Timestamp;
use tasflou_db::models::notification::NewNotification;
use tasflou_db::models::task::Task;

use crate::error::OutboxError;
use crate::store::OutboxStore;

/// Per-type count of notifications created by [`NotificationGenerator::generate_all`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GenerationReport {
    pub due_date_approaching: usize,
    pub stale_task: usize,
    pub total: usize,
}

pub struct NotificationGenerator {
    store: Arc<dyn OutboxStore>,
    due_date_lead: chrono::Duration,
    stale_after: chrono::Duration,
}

impl NotificationGenerator {
    pub fn new(
        store: Arc<dyn OutboxStore>,
        due_date_lead: chrono::Duration,
        stale_after: chrono::Duration,
    ) -> Self {
        Self {
            store,
            due_date_lead,
            stale_after,
        }
    }

    /// Queue reminders for unfinished tasks due in `(now, now + lead_time]`.
    pub async fn generate_due_date(
        &self,
        now: Timestamp,
        lead_time: chrono::Duration,
    ) -> Result<usize, OutboxError> {
        let tasks = self.store.tasks_due_between(now, now + lead_time).await?;
        self.enqueue(&tasks, NotificationType::DueDateApproaching, now)
            .await
    }

    /// Queue nudges for TODO tasks whose status has not changed for longer
    /// than `threshold`.
    pub async fn generate_stale(
        &self,
        now: Timestamp,
        threshold: chrono::Duration,
    ) -> Result<usize, OutboxError> {
        let tasks = self.store.stale_tasks(now - threshold).await?;
        self.enqueue(&tasks, NotificationType::StaleTask, now).await
    }

    /// Run both scans with the configured thresholds.
    pub async fn generate_all(&self, now: Timestamp) -> Result<GenerationReport, OutboxError> {
        let due_date_approaching = self.generate_due_date(now, self.due_date_lead).await?;
        let stale_task = self.generate_stale(now, self.stale_after).await?;

        let report = GenerationReport {
            due_date_approaching,
            stale_task,
            total: due_date_approaching + stale_task,
        };
        tracing::info!(
            due_date_approaching,
            stale_task,
            total = report.total,
            "Notification generation complete",
        );
        Ok(report)
    }

    async fn enqueue(
        &self,
        tasks: &[Task],
        kind: NotificationType,
        now: Timestamp,
    ) -> Result<usize, OutboxError> {
        let mut created = 0;
        for task in tasks {
            let input = NewNotification {
                user_id: task.user_id,
                task_id: Some(task.id),
                kind,
                scheduled_for: now,
            };
            if self.store.insert_pending_if_absent(&input).await? {
                tracing::debug!(task_id = task.id, kind = %kind, "Queued notification");
                created += 1;
            }
        }
        Ok(created)
    }
}
