#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

use tasflou_api::auth::jwt::JwtConfig;
use tasflou_api::auth::local_provider::LocalAuthProvider;
use tasflou_api::config::ServerConfig;
use tasflou_api::router::build_app_router;
use tasflou_api::state::AppState;

pub const TEST_PASSWORD: &str = "correct-horse-battery";

pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        password_min_length: 8,
        jwt: JwtConfig {
            secret: "integration-test-secret-long-enough-for-hmac".to_string(),
            access_token_expiry_mins: 15,
        },
    }
}

/// Build the application exactly as `main.rs` does, on the given pool.
pub fn build_test_app(pool: PgPool) -> Router {
    let config = test_config();
    let auth = LocalAuthProvider::new(pool.clone(), config.jwt.clone());
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        auth: Arc::new(auth),
    };
    build_app_router(state, &config)
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

async fn send(
    app: Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response {
    send(app, Method::GET, uri, None, None).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response {
    send(app, Method::GET, uri, Some(token), None).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response {
    send(app, Method::POST, uri, None, Some(body)).await
}

pub async fn post_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response {
    send(app, Method::POST, uri, Some(token), Some(body)).await
}

pub async fn patch_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response {
    send(app, Method::PATCH, uri, Some(token), Some(body)).await
}

pub async fn delete_auth(app: Router, uri: &str, token: &str) -> Response {
    send(app, Method::DELETE, uri, Some(token), None).await
}

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

// ---------------------------------------------------------------------------
// Account helpers
// ---------------------------------------------------------------------------

/// Sign up and sign in through the API. Returns `(user_id, access_token)`.
pub async fn signup_and_login(app: &Router, email: &str) -> (i64, String) {
    let credentials = serde_json::json!({ "email": email, "password": TEST_PASSWORD });

    let response = post_json(app.clone(), "/api/v1/auth/signup", credentials.clone()).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let user_id = body_json(response).await["data"]["id"].as_i64().unwrap();

    let response = post_json(app.clone(), "/api/v1/auth/signin", credentials).await;
    assert_eq!(response.status(), StatusCode::OK);
    let token = body_json(response).await["access_token"]
        .as_str()
        .unwrap()
        .to_string();

    (user_id, token)
}
