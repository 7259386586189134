//! Handlers for the notification inbox and push device registration.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use serde::Serialize;
use tasflou_core::error::CoreError;
use tasflou_core::templates;
use tasflou_core::types::DbId;
use tasflou_db::models::device_token::{DeviceToken, RegisterDevice};
use tasflou_db::models::notification::{MarkRead, Notification};
use tasflou_db::repositories::{DeviceTokenRepo, NotificationRepo};
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::query::PageParams;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

/// A delivered notification with its text rendered at read time.
#[derive(Debug, Serialize)]
pub struct InboxItem {
    #[serde(flatten)]
    pub notification: Notification,
    pub title: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct InboxPage {
    pub items: Vec<InboxItem>,
    /// Total delivered notifications, across all pages.
    pub total: i64,
}

#[derive(Debug, Serialize)]
pub struct UnreadCount {
    pub count: i64,
}

/// Device registration as returned to the client.
#[derive(Debug, Serialize)]
pub struct DeviceTokenResponse {
    pub id: DbId,
    pub token: String,
    pub platform: String,
    pub created_at: tasflou_core::types::Timestamp,
}

impl From<DeviceToken> for DeviceTokenResponse {
    fn from(device: DeviceToken) -> Self {
        Self {
            id: device.id,
            token: device.token,
            platform: device.platform,
            created_at: device.created_at,
        }
    }
}

// ---------------------------------------------------------------------------
// Inbox
// ---------------------------------------------------------------------------

/// GET /api/v1/notifications?skip=&limit=
///
/// Sent notifications only, unread first, then newest first. Rows whose
/// task is gone are left out.
pub async fn list_notifications(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> AppResult<impl IntoResponse> {
    let rows =
        NotificationRepo::list_inbox(&state.pool, auth.user_id, params.skip(), params.limit())
            .await?;
    let total = NotificationRepo::count_inbox(&state.pool, auth.user_id).await?;

    let now = Utc::now();
    let items = rows
        .into_iter()
        .map(|row| {
            let rendered = templates::render(row.notification.kind, &row.task_snapshot(), now);
            InboxItem {
                notification: row.notification,
                title: rendered.title,
                message: rendered.body,
            }
        })
        .collect();

    Ok(Json(DataResponse {
        data: InboxPage { items, total },
    }))
}

/// POST /api/v1/notifications/{id}/read
///
/// The first read wins; repeating the call returns the row unchanged.
pub async fn mark_read(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(notification_id): Path<DbId>,
    Json(input): Json<MarkRead>,
) -> AppResult<impl IntoResponse> {
    let notification = NotificationRepo::mark_read(
        &state.pool,
        notification_id,
        auth.user_id,
        input.source,
        Utc::now(),
    )
    .await?
    .ok_or(AppError::Core(CoreError::NotFound {
        entity: "Notification",
        id: notification_id,
    }))?;

    tracing::info!(
        notification_id,
        user_id = auth.user_id,
        source = input.source.as_str(),
        "Notification marked read",
    );

    Ok(Json(DataResponse { data: notification }))
}

/// GET /api/v1/notifications/unread-count
pub async fn unread_count(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let count = NotificationRepo::unread_count(&state.pool, auth.user_id).await?;

    Ok(Json(DataResponse {
        data: UnreadCount { count },
    }))
}

// ---------------------------------------------------------------------------
// Devices
// ---------------------------------------------------------------------------

/// POST /api/v1/notifications/devices
///
/// Registering a token that belongs to another user moves it to the caller.
pub async fn register_device(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<RegisterDevice>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;

    let device = DeviceTokenRepo::register(&state.pool, auth.user_id, &input).await?;

    tracing::info!(
        device_id = device.id,
        user_id = auth.user_id,
        platform = %device.platform,
        "Device token registered",
    );

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: DeviceTokenResponse::from(device),
        }),
    ))
}

/// DELETE /api/v1/notifications/devices/{token}
pub async fn unregister_device(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> AppResult<impl IntoResponse> {
    let removed = DeviceTokenRepo::unregister(&state.pool, &token, auth.user_id).await?;

    if !removed {
        return Err(AppError::NotFound(
            "Device token not found for this user".into(),
        ));
    }

    tracing::info!(user_id = auth.user_id, "Device token unregistered");

    Ok(StatusCode::NO_CONTENT)
}
