use axum::routing::post;
use axum::Router;

use crate::handlers::auth;
use crate::state::AppState;

/// Auth routes mounted at `/auth`.
///
/// ```text
/// POST /signup   -> signup
/// POST /signin   -> signin
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/signup", post(auth::signup))
        .route("/signin", post(auth::signin))
}
