use axum::routing::{delete, get, post};
use axum::Router;

use crate::handlers::notifications;
use crate::state::AppState;

/// Notification routes mounted at `/notifications`.
///
/// ```text
/// GET    /                  -> list_notifications
/// GET    /unread-count      -> unread_count
/// POST   /{id}/read         -> mark_read
/// POST   /devices           -> register_device
/// DELETE /devices/{token}   -> unregister_device
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(notifications::list_notifications))
        .route("/unread-count", get(notifications::unread_count))
        .route("/{id}/read", post(notifications::mark_read))
        .route("/devices", post(notifications::register_device))
        .route("/devices/{token}", delete(notifications::unregister_device))
}
