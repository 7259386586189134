//! Task entity model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use tasflou_core::task::{TaskSnapshot, TaskStatus};
use tasflou_core::types::{DbId, Timestamp};
use validator::Validate;

/// A row from the `tasks` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Task {
    pub id: DbId,
    pub user_id: DbId,
    pub title: String,
    pub description: Option<String>,
    #[sqlx(try_from = "String")]
    pub status: TaskStatus,
    pub due_date: Option<Timestamp>,
    /// Display order key; higher is closer to the top of the list.
    pub position: i64,
    pub status_changed_at: Timestamp,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub deleted_at: Option<Timestamp>,
}

impl Task {
    pub fn snapshot(&self) -> TaskSnapshot<'_> {
        TaskSnapshot {
            title: &self.title,
            status: self.status,
            due_date: self.due_date,
            status_changed_at: self.status_changed_at,
        }
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// DTO for creating a task. Position is always assigned by the server.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateTask {
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<Timestamp>,
}

/// DTO for patching a task. Only non-`None` fields are applied.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateTask {
    #[validate(length(min = 1, max = 255))]
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub due_date: Option<Timestamp>,
    pub position: Option<i64>,
}

/// DTO for moving a task between two visual neighbours.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MoveTask {
    /// Task that should end up directly above (higher position).
    pub above_id: Option<DbId>,
    /// Task that should end up directly below (lower position).
    pub below_id: Option<DbId>,
}
