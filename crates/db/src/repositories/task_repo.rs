//! Repository for the `tasks` table.
//!
//! Every write that reads or assigns a position runs inside a transaction
//! that first locks the owner's `users` row, so two concurrent moves for the
//! same owner never compute a midpoint from stale anchors.

use sqlx::{PgPool, Postgres, Transaction};
use tasflou_core::error::CoreError;
use tasflou_core::notification::{NotificationStatus, NotificationType};
use tasflou_core::positioning::{self, MovePlan, Slot};
use tasflou_core::task::TaskStatus;
use tasflou_core::types::{DbId, Timestamp};

use crate::models::task::{CreateTask, MoveTask, Task, UpdateTask};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "\
    id, user_id, title, description, status, due_date, position, \
    status_changed_at, created_at, updated_at, deleted_at";

/// Errors from task writes that can fail for domain reasons.
#[derive(Debug, thiserror::Error)]
pub enum TaskRepoError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Provides CRUD, ordering, and trigger queries for tasks.
pub struct TaskRepo;

impl TaskRepo {
    // -----------------------------------------------------------------------
    // CRUD
    // -----------------------------------------------------------------------

    /// Insert a task on top of the owner's list.
    pub async fn create(pool: &PgPool, user_id: DbId, input: &CreateTask) -> Result<Task, sqlx::Error> {
        let mut tx = pool.begin().await?;
        Self::lock_owner(&mut tx, user_id).await?;

        let max: Option<i64> = sqlx::query_scalar(
            "SELECT MAX(position) FROM tasks WHERE user_id = $1 AND deleted_at IS NULL",
        )
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;
        let position = match positioning::position_for_new(max) {
            Some(position) => position,
            None => {
                let existing = Self::active_slots(&mut tx, user_id, None).await?;
                let (target, positions) = positioning::regap_for_new(&existing);
                tracing::info!(
                    user_id,
                    tasks = positions.len(),
                    "No room above the top task, renumbering task list",
                );
                Self::apply_positions(&mut tx, &positions).await?;
                target
            }
        };

        let query = format!(
            "INSERT INTO tasks (user_id, title, description, due_date, position) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {COLUMNS}"
        );
        let task = sqlx::query_as::<_, Task>(&query)
            .bind(user_id)
            .bind(&input.title)
            .bind(&input.description)
            .bind(input.due_date)
            .bind(position)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(task)
    }

    /// Find an active task owned by `user_id`.
    pub async fn find_for_owner(
        pool: &PgPool,
        id: DbId,
        user_id: DbId,
    ) -> Result<Option<Task>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM tasks \
             WHERE id = $1 AND user_id = $2 AND deleted_at IS NULL"
        );
        sqlx::query_as::<_, Task>(&query)
            .bind(id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Find an active task regardless of owner. Soft-deleted rows are `None`.
    pub async fn find_active_by_id(pool: &PgPool, id: DbId) -> Result<Option<Task>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM tasks WHERE id = $1 AND deleted_at IS NULL");
        sqlx::query_as::<_, Task>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// The owner's active tasks in display order (highest position first).
    pub async fn list_for_owner(
        pool: &PgPool,
        user_id: DbId,
        status: Option<TaskStatus>,
    ) -> Result<Vec<Task>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM tasks \
             WHERE user_id = $1 AND deleted_at IS NULL \
               AND ($2::TEXT IS NULL OR status = $2) \
             ORDER BY position DESC, id DESC"
        );
        sqlx::query_as::<_, Task>(&query)
            .bind(user_id)
            .bind(status.map(TaskStatus::as_str))
            .fetch_all(pool)
            .await
    }

    /// Apply a partial update.
    ///
    /// `status_changed_at` moves only when the status actually changes. An
    /// explicit position that is already held by another active task of the
    /// owner is rejected with [`CoreError::Conflict`].
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        user_id: DbId,
        input: &UpdateTask,
    ) -> Result<Task, TaskRepoError> {
        let mut tx = pool.begin().await?;
        Self::lock_owner(&mut tx, user_id).await?;

        let current = Self::find_for_update(&mut tx, id, user_id)
            .await?
            .ok_or(CoreError::NotFound { entity: "Task", id })?;

        if let Some(position) = input.position.filter(|p| *p != current.position) {
            let taken: bool = sqlx::query_scalar(
                "SELECT EXISTS ( \
                    SELECT 1 FROM tasks \
                    WHERE user_id = $1 AND deleted_at IS NULL AND id <> $2 AND position = $3 \
                 )",
            )
            .bind(user_id)
            .bind(id)
            .bind(position)
            .fetch_one(&mut *tx)
            .await?;
            if taken {
                return Err(CoreError::Conflict(format!(
                    "Position {position} is already used by another task"
                ))
                .into());
            }
        }

        let query = format!(
            "UPDATE tasks SET \
                title = COALESCE($2, title), \
                description = COALESCE($3, description), \
                status_changed_at = CASE \
                    WHEN $4::TEXT IS NOT NULL AND $4 <> status THEN NOW() \
                    ELSE status_changed_at END, \
                status = COALESCE($4, status), \
                due_date = COALESCE($5, due_date), \
                position = COALESCE($6, position), \
                updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        let task = sqlx::query_as::<_, Task>(&query)
            .bind(id)
            .bind(&input.title)
            .bind(&input.description)
            .bind(input.status.map(TaskStatus::as_str))
            .bind(input.due_date)
            .bind(input.position)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(task)
    }

    /// Move a task between two visual neighbours.
    ///
    /// Anchors must be active tasks of the same owner. When no integer is
    /// free between the anchors the owner's whole list is renumbered with
    /// uniform gaps inside the same transaction.
    pub async fn move_task(
        pool: &PgPool,
        id: DbId,
        user_id: DbId,
        input: &MoveTask,
    ) -> Result<Task, TaskRepoError> {
        let mut tx = pool.begin().await?;
        Self::lock_owner(&mut tx, user_id).await?;

        let task = Self::find_for_update(&mut tx, id, user_id)
            .await?
            .ok_or(CoreError::NotFound { entity: "Task", id })?;

        let siblings = Self::active_slots(&mut tx, user_id, Some(id)).await?;

        let plan = positioning::plan_move(id, &siblings, input.above_id, input.below_id)?;
        let position = match plan {
            MovePlan::Unchanged => {
                tx.commit().await?;
                return Ok(task);
            }
            MovePlan::Place(position) => position,
            MovePlan::Renumber { target, positions } => {
                tracing::info!(
                    user_id,
                    task_id = id,
                    tasks = positions.len(),
                    "No room between anchors, renumbering task list",
                );
                Self::apply_positions(&mut tx, &positions).await?;
                target
            }
        };

        let query = format!(
            "UPDATE tasks SET position = $2, updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        let task = sqlx::query_as::<_, Task>(&query)
            .bind(id)
            .bind(position)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(task)
    }

    /// Soft-delete a task. Returns `false` if it was absent, foreign, or
    /// already deleted.
    pub async fn soft_delete(pool: &PgPool, id: DbId, user_id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE tasks SET deleted_at = NOW(), updated_at = NOW() \
             WHERE id = $1 AND user_id = $2 AND deleted_at IS NULL",
        )
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    // -----------------------------------------------------------------------
    // Notification triggers
    // -----------------------------------------------------------------------

    /// Active, unfinished tasks due in `(after, until]` without a pending
    /// due-date notification.
    pub async fn due_between(
        pool: &PgPool,
        after: Timestamp,
        until: Timestamp,
    ) -> Result<Vec<Task>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM tasks t \
             WHERE t.deleted_at IS NULL \
               AND t.status <> $3 \
               AND t.due_date > $1 AND t.due_date <= $2 \
               AND NOT EXISTS ( \
                   SELECT 1 FROM notifications n \
                   WHERE n.task_id = t.id AND n.type = $4 AND n.status = $5 \
               ) \
             ORDER BY t.due_date, t.id"
        );
        sqlx::query_as::<_, Task>(&query)
            .bind(after)
            .bind(until)
            .bind(TaskStatus::Done.as_str())
            .bind(NotificationType::DueDateApproaching.as_str())
            .bind(NotificationStatus::Pending.as_str())
            .fetch_all(pool)
            .await
    }

    /// Active TODO tasks whose status has not changed since before
    /// `changed_before`, without a pending stale-task notification.
    pub async fn stale(pool: &PgPool, changed_before: Timestamp) -> Result<Vec<Task>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM tasks t \
             WHERE t.deleted_at IS NULL \
               AND t.status = $2 \
               AND t.status_changed_at < $1 \
               AND NOT EXISTS ( \
                   SELECT 1 FROM notifications n \
                   WHERE n.task_id = t.id AND n.type = $3 AND n.status = $4 \
               ) \
             ORDER BY t.status_changed_at, t.id"
        );
        sqlx::query_as::<_, Task>(&query)
            .bind(changed_before)
            .bind(TaskStatus::Todo.as_str())
            .bind(NotificationType::StaleTask.as_str())
            .bind(NotificationStatus::Pending.as_str())
            .fetch_all(pool)
            .await
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    /// Serialize position-affecting writes for one owner.
    async fn lock_owner(tx: &mut Transaction<'_, Postgres>, user_id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT id FROM users WHERE id = $1 FOR NO KEY UPDATE")
            .bind(user_id)
            .fetch_optional(&mut **tx)
            .await?;
        Ok(())
    }

    /// The owner's active tasks as position slots, optionally excluding one.
    async fn active_slots(
        tx: &mut Transaction<'_, Postgres>,
        user_id: DbId,
        exclude: Option<DbId>,
    ) -> Result<Vec<Slot>, sqlx::Error> {
        let rows: Vec<(DbId, i64)> = sqlx::query_as(
            "SELECT id, position FROM tasks \
             WHERE user_id = $1 AND deleted_at IS NULL \
               AND ($2::BIGINT IS NULL OR id <> $2)",
        )
        .bind(user_id)
        .bind(exclude)
        .fetch_all(&mut **tx)
        .await?;
        Ok(rows
            .into_iter()
            .map(|(id, position)| Slot { id, position })
            .collect())
    }

    /// Write a renumbering plan in one statement.
    async fn apply_positions(
        tx: &mut Transaction<'_, Postgres>,
        positions: &[Slot],
    ) -> Result<(), sqlx::Error> {
        let (ids, values): (Vec<DbId>, Vec<i64>) =
            positions.iter().map(|s| (s.id, s.position)).unzip();
        sqlx::query(
            "UPDATE tasks t SET position = v.position \
             FROM UNNEST($1::BIGINT[], $2::BIGINT[]) AS v(id, position) \
             WHERE t.id = v.id",
        )
        .bind(&ids)
        .bind(&values)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    async fn find_for_update(
        tx: &mut Transaction<'_, Postgres>,
        id: DbId,
        user_id: DbId,
    ) -> Result<Option<Task>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM tasks \
             WHERE id = $1 AND user_id = $2 AND deleted_at IS NULL \
             FOR UPDATE"
        );
        sqlx::query_as::<_, Task>(&query)
            .bind(id)
            .bind(user_id)
            .fetch_optional(&mut **tx)
            .await
    }
}
