//! `AppError` to HTTP response mapping, exercised without a server.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use http_body_util::BodyExt;
use tasflou_api::error::AppError;
use tasflou_core::auth::AuthError;
use tasflou_core::error::CoreError;
use tasflou_db::repositories::TaskRepoError;

async fn error_to_response(err: AppError) -> (StatusCode, serde_json::Value) {
    let response = err.into_response();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    (status, json)
}

// ---------------------------------------------------------------------------
// Domain errors
// ---------------------------------------------------------------------------

#[tokio::test]
async fn not_found_error_returns_404() {
    let err = AppError::Core(CoreError::NotFound {
        entity: "Task",
        id: 42,
    });

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "NOT_FOUND");
    assert_eq!(json["error"], "Task with id 42 not found");
}

#[tokio::test]
async fn invalid_anchor_reads_as_not_found() {
    let err: AppError = TaskRepoError::Core(CoreError::InvalidAnchor { id: 7 }).into();

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "NOT_FOUND");
    assert_eq!(
        json["error"],
        "Invalid anchor: task 7 cannot be used as a position anchor"
    );
}

#[tokio::test]
async fn conflict_error_returns_409() {
    let err = AppError::Core(CoreError::Conflict("Position 1000 is already used".into()));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["code"], "CONFLICT");
    assert_eq!(json["error"], "Position 1000 is already used");
}

#[tokio::test]
async fn missing_template_is_an_internal_error() {
    let err = AppError::Core(CoreError::TemplateMissing("weekly_digest".into()));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error"], "An internal error occurred");
}

// ---------------------------------------------------------------------------
// Auth provider errors
// ---------------------------------------------------------------------------

#[tokio::test]
async fn auth_errors_map_to_http_statuses() {
    let cases = [
        (AuthError::InvalidCredentials, StatusCode::UNAUTHORIZED),
        (AuthError::AlreadyRegistered, StatusCode::CONFLICT),
        (AuthError::Rejected("weak password".into()), StatusCode::BAD_REQUEST),
        (AuthError::Provider("upstream down".into()), StatusCode::INTERNAL_SERVER_ERROR),
    ];

    for (err, expected) in cases {
        let (status, _) = error_to_response(err.into()).await;
        assert_eq!(status, expected);
    }
}

#[tokio::test]
async fn provider_failure_detail_is_not_leaked() {
    let (_, json) = error_to_response(AuthError::Provider("secret upstream detail".into()).into()).await;

    assert_eq!(json["code"], "INTERNAL_ERROR");
    assert_eq!(json["error"], "An internal error occurred");
}

// ---------------------------------------------------------------------------
// HTTP-specific and database errors
// ---------------------------------------------------------------------------

#[tokio::test]
async fn plain_not_found_keeps_its_message() {
    let err = AppError::NotFound("Device token not found for this user".into());

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "Device token not found for this user");
}

#[tokio::test]
async fn bad_request_error_returns_400() {
    let err = AppError::BadRequest("invalid field value".into());

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn row_not_found_returns_404() {
    let (status, json) = error_to_response(AppError::Database(sqlx::Error::RowNotFound)).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "Resource not found");
}

#[tokio::test]
async fn other_database_errors_are_sanitized() {
    let (status, json) = error_to_response(AppError::Database(sqlx::Error::PoolTimedOut)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["code"], "INTERNAL_ERROR");
    assert_eq!(json["error"], "An internal error occurred");
}
