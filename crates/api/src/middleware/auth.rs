//! Bearer-token authentication extractor for Axum handlers.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use tasflou_core::error::CoreError;
use tasflou_core::types::DbId;
use tasflou_db::repositories::UserRepo;

use crate::error::AppError;
use crate::state::AppState;

/// Authenticated local user.
///
/// The token is checked by the configured identity provider, then its
/// subject is resolved to the `users` row. Unknown or deactivated users are
/// rejected with 401.
///
/// ```ignore
/// async fn my_handler(auth: AuthUser) -> AppResult<Json<()>> {
///     tracing::info!(user_id = auth.user_id, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: DbId,
    pub email: String,
}

fn unauthorized(msg: &str) -> AppError {
    AppError::Core(CoreError::Unauthorized(msg.into()))
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| unauthorized("Missing Authorization header"))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| unauthorized("Invalid Authorization format. Expected: Bearer <token>"))?;

        let subject = state
            .auth
            .verify_access_token(token)
            .map_err(|_| unauthorized("Invalid or expired token"))?;

        let user = UserRepo::find_by_external_id(&state.pool, &subject)
            .await?
            .filter(|user| user.is_active)
            .ok_or_else(|| {
                tracing::debug!(subject = %subject, "Token subject has no active local user");
                unauthorized("User not found or inactive")
            })?;

        Ok(AuthUser {
            user_id: user.id,
            email: user.email,
        })
    }
}
