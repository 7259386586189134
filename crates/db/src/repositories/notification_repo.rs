//! Repository for the `notifications` outbox table.

use sqlx::PgPool;
use tasflou_core::notification::{NotificationStatus, NotificationType, ReadSource};
use tasflou_core::types::{DbId, Timestamp};

use crate::models::notification::{InboxRow, NewNotification, Notification};

// ---------------------------------------------------------------------------
// Column lists
// ---------------------------------------------------------------------------

const COLUMNS: &str = "\
    id, user_id, task_id, type, status, scheduled_for, sent_at, \
    error_message, read_at, read_source, created_at";

const INBOX_COLUMNS: &str = "\
    n.id, n.user_id, n.task_id, n.type, n.status, n.scheduled_for, n.sent_at, \
    n.error_message, n.read_at, n.read_source, n.created_at, \
    t.title AS task_title, t.status AS task_status, t.due_date AS task_due_date, \
    t.status_changed_at AS task_status_changed_at";

/// Sent notifications whose task is still active. Orphans never surface.
const INBOX_FROM: &str = "\
    FROM notifications n \
    JOIN tasks t ON t.id = n.task_id AND t.deleted_at IS NULL \
    WHERE n.user_id = $1 AND n.status = 'sent'";

/// Provides outbox writes for the generator and sender, and inbox reads.
pub struct NotificationRepo;

impl NotificationRepo {
    // -----------------------------------------------------------------------
    // Outbox
    // -----------------------------------------------------------------------

    /// Insert a pending notification unless one already exists for the same
    /// task and type. Returns `None` when a pending row was already there.
    ///
    /// The check and the insert are a single statement, which narrows the
    /// race between concurrent generators but does not close it: there is no
    /// unique index behind it, so two runs can still both insert.
    pub async fn insert_pending_if_absent(
        pool: &PgPool,
        input: &NewNotification,
    ) -> Result<Option<Notification>, sqlx::Error> {
        let query = format!(
            "INSERT INTO notifications (user_id, task_id, type, status, scheduled_for) \
             SELECT $1::BIGINT, $2::BIGINT, $3::TEXT, $4::TEXT, $5::TIMESTAMPTZ \
             WHERE NOT EXISTS ( \
                 SELECT 1 FROM notifications \
                 WHERE task_id = $2 AND type = $3 AND status = $4 \
             ) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Notification>(&query)
            .bind(input.user_id)
            .bind(input.task_id)
            .bind(input.kind.as_str())
            .bind(NotificationStatus::Pending.as_str())
            .bind(input.scheduled_for)
            .fetch_optional(pool)
            .await
    }

    /// Whether a pending notification of `kind` exists for the task.
    pub async fn has_pending(
        pool: &PgPool,
        task_id: DbId,
        kind: NotificationType,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT EXISTS ( \
                SELECT 1 FROM notifications \
                WHERE task_id = $1 AND type = $2 AND status = $3 \
             )",
        )
        .bind(task_id)
        .bind(kind.as_str())
        .bind(NotificationStatus::Pending.as_str())
        .fetch_one(pool)
        .await
    }

    /// Pending notifications whose `scheduled_for` has passed.
    pub async fn list_due_pending(
        pool: &PgPool,
        now: Timestamp,
    ) -> Result<Vec<Notification>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM notifications \
             WHERE status = $1 AND scheduled_for <= $2 \
             ORDER BY scheduled_for, id"
        );
        sqlx::query_as::<_, Notification>(&query)
            .bind(NotificationStatus::Pending.as_str())
            .bind(now)
            .fetch_all(pool)
            .await
    }

    /// Record the terminal state of a pending notification.
    ///
    /// Returns `false` if the row is no longer pending, so a notification is
    /// finalised exactly once even if two senders overlap.
    pub async fn record_outcome(
        pool: &PgPool,
        id: DbId,
        status: NotificationStatus,
        sent_at: Timestamp,
        error_message: Option<&str>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE notifications \
             SET status = $2, sent_at = $3, error_message = $4 \
             WHERE id = $1 AND status = $5",
        )
        .bind(id)
        .bind(status.as_str())
        .bind(sent_at)
        .bind(error_message)
        .bind(NotificationStatus::Pending.as_str())
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Notification>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM notifications WHERE id = $1");
        sqlx::query_as::<_, Notification>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    // -----------------------------------------------------------------------
    // Inbox
    // -----------------------------------------------------------------------

    /// A page of the user's inbox: unread first, then newest first.
    pub async fn list_inbox(
        pool: &PgPool,
        user_id: DbId,
        skip: i64,
        limit: i64,
    ) -> Result<Vec<InboxRow>, sqlx::Error> {
        let query = format!(
            "SELECT {INBOX_COLUMNS} {INBOX_FROM} \
             ORDER BY (n.read_at IS NULL) DESC, n.created_at DESC, n.id DESC \
             OFFSET $2 LIMIT $3"
        );
        sqlx::query_as::<_, InboxRow>(&query)
            .bind(user_id)
            .bind(skip)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Total number of inbox entries, ignoring pagination.
    pub async fn count_inbox(pool: &PgPool, user_id: DbId) -> Result<i64, sqlx::Error> {
        let query = format!("SELECT COUNT(*) {INBOX_FROM}");
        sqlx::query_scalar(&query).bind(user_id).fetch_one(pool).await
    }

    pub async fn unread_count(pool: &PgPool, user_id: DbId) -> Result<i64, sqlx::Error> {
        let query = format!("SELECT COUNT(*) {INBOX_FROM} AND n.read_at IS NULL");
        sqlx::query_scalar(&query).bind(user_id).fetch_one(pool).await
    }

    /// Mark a notification read. The first read wins: later calls return the
    /// row unchanged. Returns `None` if the notification is not the user's.
    pub async fn mark_read(
        pool: &PgPool,
        id: DbId,
        user_id: DbId,
        source: ReadSource,
        at: Timestamp,
    ) -> Result<Option<Notification>, sqlx::Error> {
        let query = format!(
            "UPDATE notifications SET \
                read_source = CASE WHEN read_at IS NULL THEN $4 ELSE read_source END, \
                read_at = COALESCE(read_at, $3) \
             WHERE id = $1 AND user_id = $2 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Notification>(&query)
            .bind(id)
            .bind(user_id)
            .bind(at)
            .bind(source.as_str())
            .fetch_optional(pool)
            .await
    }
}
