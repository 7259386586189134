//! Notification outbox models and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::postgres::PgRow;
use sqlx::{FromRow, Row};
use tasflou_core::error::CoreError;
use tasflou_core::notification::{NotificationStatus, NotificationType, ReadSource};
use tasflou_core::task::{TaskSnapshot, TaskStatus};
use tasflou_core::types::{DbId, Timestamp};

/// A row from the `notifications` table.
#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub id: DbId,
    pub user_id: DbId,
    /// Weak reference; `None` once the task row is gone.
    pub task_id: Option<DbId>,
    #[serde(rename = "type")]
    pub kind: NotificationType,
    pub status: NotificationStatus,
    pub scheduled_for: Timestamp,
    pub sent_at: Option<Timestamp>,
    pub error_message: Option<String>,
    pub read_at: Option<Timestamp>,
    pub read_source: Option<ReadSource>,
    pub created_at: Timestamp,
}

// Written by hand because `read_source` is a nullable enum column, which
// `#[sqlx(try_from)]` cannot express.
impl<'r> FromRow<'r, PgRow> for Notification {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        let read_source: Option<String> = row.try_get("read_source")?;
        Ok(Self {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            task_id: row.try_get("task_id")?,
            kind: decode_text(row, "type")?,
            status: decode_text(row, "status")?,
            scheduled_for: row.try_get("scheduled_for")?,
            sent_at: row.try_get("sent_at")?,
            error_message: row.try_get("error_message")?,
            read_at: row.try_get("read_at")?,
            read_source: read_source
                .map(|raw| parse_text("read_source", raw))
                .transpose()?,
            created_at: row.try_get("created_at")?,
        })
    }
}

fn decode_text<T>(row: &PgRow, column: &str) -> Result<T, sqlx::Error>
where
    T: TryFrom<String, Error = CoreError>,
{
    let raw: String = row.try_get(column)?;
    parse_text(column, raw)
}

fn parse_text<T>(column: &str, raw: String) -> Result<T, sqlx::Error>
where
    T: TryFrom<String, Error = CoreError>,
{
    T::try_from(raw).map_err(|e| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(e),
    })
}

/// DTO for inserting a pending outbox entry.
#[derive(Debug, Clone)]
pub struct NewNotification {
    pub user_id: DbId,
    pub task_id: Option<DbId>,
    pub kind: NotificationType,
    pub scheduled_for: Timestamp,
}

/// A sent notification joined with the task it refers to, for the inbox.
#[derive(Debug, Clone, FromRow)]
pub struct InboxRow {
    #[sqlx(flatten)]
    pub notification: Notification,
    pub task_title: String,
    #[sqlx(try_from = "String")]
    pub task_status: TaskStatus,
    pub task_due_date: Option<Timestamp>,
    pub task_status_changed_at: Timestamp,
}

impl InboxRow {
    pub fn task_snapshot(&self) -> TaskSnapshot<'_> {
        TaskSnapshot {
            title: &self.task_title,
            status: self.task_status,
            due_date: self.task_due_date,
            status_changed_at: self.task_status_changed_at,
        }
    }
}

/// Request body for marking a notification read.
#[derive(Debug, Clone, Deserialize)]
pub struct MarkRead {
    pub source: ReadSource,
}
