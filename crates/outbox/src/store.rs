//! Storage seam for the outbox pipeline.

use async_trait::async_trait;
use tasflou_core::notification::DeliveryOutcome;
use tasflou_core::types::{DbId, Timestamp};
use tasflou_db::models::notification::{NewNotification, Notification};
use tasflou_db::models::task::Task;
use tasflou_db::repositories::{DeviceTokenRepo, NotificationRepo, TaskRepo};
use tasflou_db::DbPool;

use crate::error::OutboxError;

/// Everything the generator and the sender read or write.
#[async_trait]
pub trait OutboxStore: Send + Sync {
    /// Active, unfinished tasks due in `(after, until]` with no pending
    /// due-date notification.
    async fn tasks_due_between(
        &self,
        after: Timestamp,
        until: Timestamp,
    ) -> Result<Vec<Task>, OutboxError>;

    /// Active TODO tasks unchanged since before `changed_before` with no
    /// pending stale-task notification.
    async fn stale_tasks(&self, changed_before: Timestamp) -> Result<Vec<Task>, OutboxError>;

    /// Insert unless a pending row for the same task and type exists.
    /// Returns whether a row was inserted.
    async fn insert_pending_if_absent(&self, input: &NewNotification) -> Result<bool, OutboxError>;

    /// Pending notifications with `scheduled_for <= now`.
    async fn due_pending(&self, now: Timestamp) -> Result<Vec<Notification>, OutboxError>;

    async fn device_tokens(&self, user_id: DbId) -> Result<Vec<String>, OutboxError>;

    /// The task if it exists and is not soft-deleted.
    async fn find_active_task(&self, task_id: DbId) -> Result<Option<Task>, OutboxError>;

    /// Finalise a pending notification. Returns `false` if it was no longer
    /// pending.
    async fn record_outcome(
        &self,
        notification_id: DbId,
        outcome: &DeliveryOutcome,
        at: Timestamp,
    ) -> Result<bool, OutboxError>;

    /// Forget tokens the push provider rejected as invalid.
    async fn prune_tokens(&self, tokens: &[String]) -> Result<u64, OutboxError>;

    async fn touch_tokens(
        &self,
        user_id: DbId,
        tokens: &[String],
        at: Timestamp,
    ) -> Result<u64, OutboxError>;
}

// ---------------------------------------------------------------------------
// PostgreSQL
// ---------------------------------------------------------------------------

/// [`OutboxStore`] backed by the repository layer.
#[derive(Clone)]
pub struct PgOutboxStore {
    pool: DbPool,
}

impl PgOutboxStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OutboxStore for PgOutboxStore {
    async fn tasks_due_between(
        &self,
        after: Timestamp,
        until: Timestamp,
    ) -> Result<Vec<Task>, OutboxError> {
        Ok(TaskRepo::due_between(&self.pool, after, until).await?)
    }

    async fn stale_tasks(&self, changed_before: Timestamp) -> Result<Vec<Task>, OutboxError> {
        Ok(TaskRepo::stale(&self.pool, changed_before).await?)
    }

    async fn insert_pending_if_absent(&self, input: &NewNotification) -> Result<bool, OutboxError> {
        let inserted = NotificationRepo::insert_pending_if_absent(&self.pool, input).await?;
        Ok(inserted.is_some())
    }

    async fn due_pending(&self, now: Timestamp) -> Result<Vec<Notification>, OutboxError> {
        Ok(NotificationRepo::list_due_pending(&self.pool, now).await?)
    }

    async fn device_tokens(&self, user_id: DbId) -> Result<Vec<String>, OutboxError> {
        Ok(DeviceTokenRepo::tokens_for_user(&self.pool, user_id).await?)
    }

    async fn find_active_task(&self, task_id: DbId) -> Result<Option<Task>, OutboxError> {
        Ok(TaskRepo::find_active_by_id(&self.pool, task_id).await?)
    }

    async fn record_outcome(
        &self,
        notification_id: DbId,
        outcome: &DeliveryOutcome,
        at: Timestamp,
    ) -> Result<bool, OutboxError> {
        Ok(NotificationRepo::record_outcome(
            &self.pool,
            notification_id,
            outcome.status(),
            at,
            outcome.error_message(),
        )
        .await?)
    }

    async fn prune_tokens(&self, tokens: &[String]) -> Result<u64, OutboxError> {
        Ok(DeviceTokenRepo::delete_tokens(&self.pool, tokens).await?)
    }

    async fn touch_tokens(
        &self,
        user_id: DbId,
        tokens: &[String],
        at: Timestamp,
    ) -> Result<u64, OutboxError> {
        Ok(DeviceTokenRepo::touch_last_used(&self.pool, user_id, tokens, at).await?)
    }
}
