//! HTTP-level tests for the notification inbox and device registration.

mod common;

use axum::http::StatusCode;
use chrono::Utc;
use common::{body_json, delete_auth, get_auth, post_json_auth, signup_and_login};
use serde_json::{json, Value};
use sqlx::PgPool;
use tasflou_core::notification::{NotificationStatus, NotificationType};
use tasflou_core::types::DbId;
use tasflou_db::models::notification::NewNotification;
use tasflou_db::repositories::{DeviceTokenRepo, NotificationRepo};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn create_task(app: &axum::Router, token: &str, title: &str) -> DbId {
    let response =
        post_json_auth(app.clone(), "/api/v1/tasks", json!({ "title": title }), token).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["data"]["id"].as_i64().unwrap()
}

/// Queue a notification and finalise it, as the worker would.
async fn seed(
    pool: &PgPool,
    user_id: DbId,
    task_id: DbId,
    kind: NotificationType,
    status: NotificationStatus,
) -> DbId {
    let input = NewNotification {
        user_id,
        task_id: Some(task_id),
        kind,
        scheduled_for: Utc::now(),
    };
    let row = NotificationRepo::insert_pending_if_absent(pool, &input)
        .await
        .unwrap()
        .expect("no pending duplicate");
    if status != NotificationStatus::Pending {
        NotificationRepo::record_outcome(pool, row.id, status, Utc::now(), None)
            .await
            .unwrap();
    }
    row.id
}

fn item_ids(page: &Value) -> Vec<i64> {
    page["data"]["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n["id"].as_i64().unwrap())
        .collect()
}

// ---------------------------------------------------------------------------
// Inbox
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn inbox_lists_only_sent_notifications_with_rendered_text(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let (user_id, token) = signup_and_login(&app, "alice@example.com").await;
    let report = create_task(&app, &token, "Write report").await;
    let slides = create_task(&app, &token, "Slides").await;

    let sent = seed(&pool, user_id, report, NotificationType::StaleTask, NotificationStatus::Sent).await;
    seed(&pool, user_id, slides, NotificationType::StaleTask, NotificationStatus::Failed).await;
    seed(&pool, user_id, slides, NotificationType::DueDateApproaching, NotificationStatus::Pending).await;

    let response = get_auth(app, "/api/v1/notifications", &token).await;
    assert_eq!(response.status(), StatusCode::OK);

    let page = body_json(response).await;
    assert_eq!(item_ids(&page), [sent]);
    assert_eq!(page["data"]["total"], 1);

    let item = &page["data"]["items"][0];
    assert_eq!(item["type"], "stale_task");
    assert_eq!(item["status"], "sent");
    assert_eq!(item["title"], "Task needs attention");
    assert_eq!(item["message"], "'Write report' has been in todo for 0 days");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn inbox_puts_unread_first_and_paginates(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let (user_id, token) = signup_and_login(&app, "bob@example.com").await;
    let task = create_task(&app, &token, "Taxes").await;

    let older = seed(&pool, user_id, task, NotificationType::StaleTask, NotificationStatus::Sent).await;
    let newer = seed(&pool, user_id, task, NotificationType::DueDateApproaching, NotificationStatus::Sent).await;

    let uri = format!("/api/v1/notifications/{newer}/read");
    post_json_auth(app.clone(), &uri, json!({ "source": "web_client" }), &token).await;

    let response = get_auth(app.clone(), "/api/v1/notifications", &token).await;
    assert_eq!(item_ids(&body_json(response).await), [older, newer]);

    let response = get_auth(app, "/api/v1/notifications?skip=1&limit=1", &token).await;
    let page = body_json(response).await;
    assert_eq!(item_ids(&page), [newer]);
    assert_eq!(page["data"]["total"], 2);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn inbox_skips_notifications_of_deleted_tasks(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let (user_id, token) = signup_and_login(&app, "carol@example.com").await;
    let task = create_task(&app, &token, "Gone soon").await;
    seed(&pool, user_id, task, NotificationType::StaleTask, NotificationStatus::Sent).await;

    delete_auth(app.clone(), &format!("/api/v1/tasks/{task}"), &token).await;

    let response = get_auth(app, "/api/v1/notifications", &token).await;
    let page = body_json(response).await;
    assert!(item_ids(&page).is_empty());
    assert_eq!(page["data"]["total"], 0);
}

// ---------------------------------------------------------------------------
// Read state
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn first_read_wins_and_unread_count_drops(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let (user_id, token) = signup_and_login(&app, "dave@example.com").await;
    let task = create_task(&app, &token, "Review").await;
    let id = seed(&pool, user_id, task, NotificationType::StaleTask, NotificationStatus::Sent).await;

    let response = get_auth(app.clone(), "/api/v1/notifications/unread-count", &token).await;
    assert_eq!(body_json(response).await["data"]["count"], 1);

    let uri = format!("/api/v1/notifications/{id}/read");
    let response = post_json_auth(app.clone(), &uri, json!({ "source": "web_push" }), &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    let first = body_json(response).await["data"].clone();
    assert_eq!(first["read_source"], "web_push");
    assert!(first["read_at"].is_string());

    let response = post_json_auth(app.clone(), &uri, json!({ "source": "web_client" }), &token).await;
    let second = body_json(response).await["data"].clone();
    assert_eq!(second["read_source"], "web_push");
    assert_eq!(second["read_at"], first["read_at"]);

    let response = get_auth(app, "/api/v1/notifications/unread-count", &token).await;
    assert_eq!(body_json(response).await["data"]["count"], 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn cannot_mark_another_users_notification(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let (alice_id, alice) = signup_and_login(&app, "alice@example.com").await;
    let (_, bob) = signup_and_login(&app, "bob@example.com").await;
    let task = create_task(&app, &alice, "Private").await;
    let id = seed(&pool, alice_id, task, NotificationType::StaleTask, NotificationStatus::Sent).await;

    let uri = format!("/api/v1/notifications/{id}/read");
    let response = post_json_auth(app, &uri, json!({ "source": "web_client" }), &bob).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let row = NotificationRepo::find_by_id(&pool, id).await.unwrap().unwrap();
    assert!(row.read_at.is_none());
}

// ---------------------------------------------------------------------------
// Devices
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn device_registration_round_trip(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let (user_id, token) = signup_and_login(&app, "erin@example.com").await;

    let body = json!({ "token": "fcm-token-1", "platform": "web" });
    let response = post_json_auth(app.clone(), "/api/v1/notifications/devices", body, &token).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let device = body_json(response).await["data"].clone();
    assert_eq!(device["token"], "fcm-token-1");
    assert_eq!(device["platform"], "web");
    assert!(device["id"].is_number());

    let tokens = DeviceTokenRepo::tokens_for_user(&pool, user_id).await.unwrap();
    assert_eq!(tokens, ["fcm-token-1"]);

    let response = delete_auth(app.clone(), "/api/v1/notifications/devices/fcm-token-1", &token).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = delete_auth(app, "/api/v1/notifications/devices/fcm-token-1", &token).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        body_json(response).await["error"],
        "Device token not found for this user"
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn device_token_moves_to_latest_registrant(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let (alice_id, alice) = signup_and_login(&app, "alice@example.com").await;
    let (bob_id, bob) = signup_and_login(&app, "bob@example.com").await;

    let body = json!({ "token": "shared-device", "platform": "android" });
    post_json_auth(app.clone(), "/api/v1/notifications/devices", body.clone(), &alice).await;
    let response = post_json_auth(app.clone(), "/api/v1/notifications/devices", body, &bob).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    assert!(DeviceTokenRepo::tokens_for_user(&pool, alice_id).await.unwrap().is_empty());
    assert_eq!(
        DeviceTokenRepo::tokens_for_user(&pool, bob_id).await.unwrap(),
        ["shared-device"]
    );

    // Alice no longer owns it.
    let response = delete_auth(app, "/api/v1/notifications/devices/shared-device", &alice).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
