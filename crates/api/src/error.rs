use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tasflou_core::auth::AuthError;
use tasflou_core::error::CoreError;
use tasflou_db::repositories::TaskRepoError;

const INTERNAL_MESSAGE: &str = "An internal error occurred";

/// PostgreSQL SQLSTATE codes the API turns into client errors.
const PG_UNIQUE_VIOLATION: &str = "23505";
const PG_CHECK_VIOLATION: &str = "23514";

/// Error returned by every handler.
///
/// Serialized as `{"error": <message>, "code": <CODE>}`. Internal causes are
/// logged and replaced with a generic message before leaving the process.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Missing resource addressed by something other than a numeric id.
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    code: &'static str,
}

impl From<TaskRepoError> for AppError {
    fn from(err: TaskRepoError) -> Self {
        match err {
            TaskRepoError::Core(core) => Self::Core(core),
            TaskRepoError::Database(db) => Self::Database(db),
        }
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        let core = match err {
            AuthError::InvalidCredentials => CoreError::Unauthorized(err.to_string()),
            AuthError::AlreadyRegistered => CoreError::Conflict(err.to_string()),
            AuthError::Rejected(msg) => CoreError::Validation(msg),
            AuthError::Provider(msg) => return Self::InternalError(msg),
        };
        Self::Core(core)
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::Core(CoreError::Validation(errors.to_string()))
    }
}

impl AppError {
    /// Status, machine-readable code and client-facing message.
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            Self::Core(core) => core_parts(core),
            Self::Database(err) => classify_sqlx_error(err),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            Self::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                internal()
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, error) = self.parts();
        (status, axum::Json(ErrorBody { error, code })).into_response()
    }
}

fn internal() -> (StatusCode, &'static str, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        INTERNAL_MESSAGE.to_string(),
    )
}

fn core_parts(core: &CoreError) -> (StatusCode, &'static str, String) {
    match core {
        CoreError::NotFound { entity, id } => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            format!("{entity} with id {id} not found"),
        ),
        // An anchor that is missing, deleted or foreign is reported as absent.
        CoreError::InvalidAnchor { .. } => (StatusCode::NOT_FOUND, "NOT_FOUND", core.to_string()),
        CoreError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
        CoreError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
        CoreError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone()),
        CoreError::Forbidden(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg.clone()),
        CoreError::TemplateMissing(_) | CoreError::Internal(_) => {
            tracing::error!(error = %core, "Internal core error");
            internal()
        }
    }
}

/// Map a sqlx error onto the response triple.
///
/// `uq_*` unique violations become 409 and `ck_*` check violations become
/// 400. Anything else is logged and sanitized.
fn classify_sqlx_error(err: &sqlx::Error) -> (StatusCode, &'static str, String) {
    let db_err = match err {
        sqlx::Error::RowNotFound => {
            return (
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                "Resource not found".to_string(),
            )
        }
        sqlx::Error::Database(db_err) => db_err,
        other => {
            tracing::error!(error = %other, "Database error");
            return internal();
        }
    };

    let constraint = db_err.constraint().unwrap_or_default();
    match db_err.code().as_deref() {
        Some(PG_UNIQUE_VIOLATION) if constraint.starts_with("uq_") => (
            StatusCode::CONFLICT,
            "CONFLICT",
            unique_violation_message(constraint),
        ),
        Some(PG_CHECK_VIOLATION) if constraint.starts_with("ck_") => (
            StatusCode::BAD_REQUEST,
            "VALIDATION_ERROR",
            format!("Value rejected by constraint: {constraint}"),
        ),
        _ => {
            tracing::error!(error = %db_err, "Database error");
            internal()
        }
    }
}

fn unique_violation_message(constraint: &str) -> String {
    match constraint {
        "uq_users_email" | "uq_auth_credentials_email" => {
            "An account with this email already exists".to_string()
        }
        "uq_device_tokens_token" => "Device token is already registered".to_string(),
        other => format!("Duplicate value violates unique constraint: {other}"),
    }
}
