//! Handlers for the `/auth` resource (signup, signin).

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use tasflou_core::error::CoreError;
use tasflou_core::types::{DbId, Timestamp};
use tasflou_db::models::user::CreateUser;
use tasflou_db::repositories::UserRepo;
use validator::Validate;

use crate::auth::password::validate_password_strength;
use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /auth/signup` and `POST /auth/signin`.
#[derive(Debug, Deserialize, Validate)]
pub struct AuthRequest {
    #[validate(email)]
    pub email: String,
    pub password: String,
}

impl AuthRequest {
    fn normalized_email(&self) -> String {
        self.email.trim().to_lowercase()
    }
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
}

#[derive(Debug, Serialize)]
pub struct SignupResponse {
    pub id: DbId,
    pub email: String,
    pub created_at: Timestamp,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/auth/signup
///
/// Register the identity with the provider, then create the local user
/// keyed by the subject it returned.
pub async fn signup(
    State(state): State<AppState>,
    Json(input): Json<AuthRequest>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    validate_password_strength(&input.password, state.config.password_min_length)
        .map_err(|msg| AppError::Core(CoreError::Validation(msg)))?;

    let email = input.normalized_email();
    let external_id = state.auth.register(&email, &input.password).await?;
    let user = UserRepo::create(&state.pool, &CreateUser { email, external_id }).await?;

    tracing::info!(user_id = user.id, "User signed up");

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: SignupResponse {
                id: user.id,
                email: user.email,
                created_at: user.created_at,
            },
        }),
    ))
}

/// POST /api/v1/auth/signin
pub async fn signin(
    State(state): State<AppState>,
    Json(input): Json<AuthRequest>,
) -> AppResult<Json<TokenResponse>> {
    let tokens = state
        .auth
        .authenticate(&input.normalized_email(), &input.password)
        .await?;

    Ok(Json(TokenResponse {
        access_token: tokens.access_token,
        refresh_token: tokens.refresh_token,
        token_type: "bearer",
        expires_in: tokens.expires_in,
    }))
}
