//! Handlers for the `/tasks` resource.
//!
//! Every query is scoped to the authenticated owner; another user's task is
//! reported as not found.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use tasflou_core::error::CoreError;
use tasflou_core::task::{validate_title, TaskStatus};
use tasflou_core::types::DbId;
use tasflou_db::models::task::{CreateTask, MoveTask, UpdateTask};
use tasflou_db::repositories::TaskRepo;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::query::TaskListParams;
use crate::response::DataResponse;
use crate::state::AppState;

fn task_not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound { entity: "Task", id })
}

/// POST /api/v1/tasks
///
/// New tasks go to the top of the owner's list.
pub async fn create_task(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateTask>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    validate_title(&input.title)?;

    let task = TaskRepo::create(&state.pool, auth.user_id, &input).await?;

    tracing::info!(
        task_id = task.id,
        user_id = auth.user_id,
        position = task.position,
        "Task created",
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: task })))
}

/// GET /api/v1/tasks?status=
///
/// Active tasks, highest position first.
pub async fn list_tasks(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<TaskListParams>,
) -> AppResult<impl IntoResponse> {
    let status = params
        .status
        .as_deref()
        .map(str::parse::<TaskStatus>)
        .transpose()?;

    let tasks = TaskRepo::list_for_owner(&state.pool, auth.user_id, status).await?;

    Ok(Json(DataResponse { data: tasks }))
}

/// GET /api/v1/tasks/{id}
pub async fn get_task(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(task_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let task = TaskRepo::find_for_owner(&state.pool, task_id, auth.user_id)
        .await?
        .ok_or_else(|| task_not_found(task_id))?;

    Ok(Json(DataResponse { data: task }))
}

/// PATCH /api/v1/tasks/{id}
pub async fn update_task(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(task_id): Path<DbId>,
    Json(input): Json<UpdateTask>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    if let Some(title) = &input.title {
        validate_title(title)?;
    }

    let task = TaskRepo::update(&state.pool, task_id, auth.user_id, &input).await?;

    tracing::info!(task_id, user_id = auth.user_id, "Task updated");

    Ok(Json(DataResponse { data: task }))
}

/// POST /api/v1/tasks/{id}/move
///
/// Place the task between two neighbours. Either anchor may be omitted.
pub async fn move_task(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(task_id): Path<DbId>,
    Json(input): Json<MoveTask>,
) -> AppResult<impl IntoResponse> {
    let task = TaskRepo::move_task(&state.pool, task_id, auth.user_id, &input).await?;

    tracing::info!(
        task_id,
        user_id = auth.user_id,
        above_id = ?input.above_id,
        below_id = ?input.below_id,
        position = task.position,
        "Task moved",
    );

    Ok(Json(DataResponse { data: task }))
}

/// DELETE /api/v1/tasks/{id}
///
/// Soft delete. The row stays for notification history.
pub async fn delete_task(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(task_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let deleted = TaskRepo::soft_delete(&state.pool, task_id, auth.user_id).await?;

    if !deleted {
        return Err(task_not_found(task_id));
    }

    tracing::info!(task_id, user_id = auth.user_id, "Task deleted");

    Ok(StatusCode::NO_CONTENT)
}
