pub mod auth;
pub mod health;
pub mod notifications;
pub mod tasks;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /auth/signup                          register (public)
/// /auth/signin                          token pair (public)
///
/// /tasks                                list, create
/// /tasks/{id}                           get, patch, delete
/// /tasks/{id}/move                      reposition between neighbours
///
/// /notifications                        inbox (sent only)
/// /notifications/unread-count           unread badge
/// /notifications/{id}/read              mark read
/// /notifications/devices                register push token
/// /notifications/devices/{token}        unregister push token
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/tasks", tasks::router())
        .nest("/notifications", notifications::router())
}
