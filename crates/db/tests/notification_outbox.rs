//! Integration tests for the notification outbox and inbox queries.

use chrono::{Duration, Utc};
use sqlx::PgPool;
use tasflou_core::notification::{NotificationStatus, NotificationType, ReadSource};
use tasflou_db::models::notification::NewNotification;
use tasflou_db::models::task::{CreateTask, Task};
use tasflou_db::models::user::CreateUser;
use tasflou_db::repositories::{NotificationRepo, TaskRepo, UserRepo};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn new_user(pool: &PgPool, email: &str) -> i64 {
    UserRepo::create(
        pool,
        &CreateUser {
            email: email.to_string(),
            external_id: format!("sub-{email}"),
        },
    )
    .await
    .unwrap()
    .id
}

async fn new_task(pool: &PgPool, user_id: i64, title: &str, due_in_hours: Option<i64>) -> Task {
    TaskRepo::create(
        pool,
        user_id,
        &CreateTask {
            title: title.to_string(),
            description: None,
            due_date: due_in_hours.map(|h| Utc::now() + Duration::hours(h)),
        },
    )
    .await
    .unwrap()
}

fn pending_for(task: &Task, kind: NotificationType) -> NewNotification {
    NewNotification {
        user_id: task.user_id,
        task_id: Some(task.id),
        kind,
        scheduled_for: Utc::now(),
    }
}

/// Insert a notification and immediately mark it sent.
async fn sent_for(pool: &PgPool, task: &Task) -> i64 {
    let n = NotificationRepo::insert_pending_if_absent(
        pool,
        &pending_for(task, NotificationType::DueDateApproaching),
    )
    .await
    .unwrap()
    .unwrap();
    NotificationRepo::record_outcome(pool, n.id, NotificationStatus::Sent, Utc::now(), None)
        .await
        .unwrap();
    n.id
}

// ---------------------------------------------------------------------------
// Dedup
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_second_pending_insert_is_skipped(pool: PgPool) {
    let user = new_user(&pool, "a@example.com").await;
    let task = new_task(&pool, user, "t", Some(2)).await;
    let input = pending_for(&task, NotificationType::DueDateApproaching);

    let first = NotificationRepo::insert_pending_if_absent(&pool, &input).await.unwrap();
    let second = NotificationRepo::insert_pending_if_absent(&pool, &input).await.unwrap();

    assert!(first.is_some());
    assert!(second.is_none());
    assert!(
        NotificationRepo::has_pending(&pool, task.id, NotificationType::DueDateApproaching)
            .await
            .unwrap()
    );
    assert!(
        !NotificationRepo::has_pending(&pool, task.id, NotificationType::StaleTask)
            .await
            .unwrap()
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_terminal_row_does_not_block_new_pending(pool: PgPool) {
    let user = new_user(&pool, "a@example.com").await;
    let task = new_task(&pool, user, "t", Some(2)).await;
    sent_for(&pool, &task).await;

    let again = NotificationRepo::insert_pending_if_absent(
        &pool,
        &pending_for(&task, NotificationType::DueDateApproaching),
    )
    .await
    .unwrap();

    assert!(again.is_some());
}

// ---------------------------------------------------------------------------
// Trigger queries
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_due_window_is_open_closed(pool: PgPool) {
    let user = new_user(&pool, "a@example.com").await;
    let soon = new_task(&pool, user, "soon", Some(5)).await;
    let _later = new_task(&pool, user, "later", Some(48)).await;
    let _past = new_task(&pool, user, "past", Some(-1)).await;
    let _undated = new_task(&pool, user, "undated", None).await;

    let now = Utc::now();
    let due = TaskRepo::due_between(&pool, now, now + Duration::days(1)).await.unwrap();

    assert_eq!(due.iter().map(|t| t.id).collect::<Vec<_>>(), vec![soon.id]);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_trigger_queries_skip_deleted_and_pending(pool: PgPool) {
    let user = new_user(&pool, "a@example.com").await;
    let deleted = new_task(&pool, user, "deleted", Some(5)).await;
    let pending = new_task(&pool, user, "pending", Some(5)).await;
    TaskRepo::soft_delete(&pool, deleted.id, user).await.unwrap();
    NotificationRepo::insert_pending_if_absent(
        &pool,
        &pending_for(&pending, NotificationType::DueDateApproaching),
    )
    .await
    .unwrap();

    let now = Utc::now();
    let due = TaskRepo::due_between(&pool, now, now + Duration::days(1)).await.unwrap();
    assert!(due.is_empty());

    // Everything created a moment ago is stale relative to a future cut-off.
    let stale = TaskRepo::stale(&pool, now + Duration::hours(1)).await.unwrap();
    assert_eq!(stale.iter().map(|t| t.id).collect::<Vec<_>>(), vec![pending.id]);
}

// ---------------------------------------------------------------------------
// Sender bookkeeping
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_outcome_is_recorded_once(pool: PgPool) {
    let user = new_user(&pool, "a@example.com").await;
    let task = new_task(&pool, user, "t", Some(2)).await;
    let n = NotificationRepo::insert_pending_if_absent(
        &pool,
        &pending_for(&task, NotificationType::DueDateApproaching),
    )
    .await
    .unwrap()
    .unwrap();

    let due = NotificationRepo::list_due_pending(&pool, Utc::now()).await.unwrap();
    assert_eq!(due.len(), 1);

    let first = NotificationRepo::record_outcome(
        &pool,
        n.id,
        NotificationStatus::Failed,
        Utc::now(),
        Some("boom"),
    )
    .await
    .unwrap();
    let second =
        NotificationRepo::record_outcome(&pool, n.id, NotificationStatus::Sent, Utc::now(), None)
            .await
            .unwrap();

    assert!(first);
    assert!(!second);

    let row = NotificationRepo::find_by_id(&pool, n.id).await.unwrap().unwrap();
    assert_eq!(row.status, NotificationStatus::Failed);
    assert_eq!(row.error_message.as_deref(), Some("boom"));
    assert!(row.sent_at.is_some());
    assert!(NotificationRepo::list_due_pending(&pool, Utc::now()).await.unwrap().is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_future_schedule_is_not_due(pool: PgPool) {
    let user = new_user(&pool, "a@example.com").await;
    let task = new_task(&pool, user, "t", Some(2)).await;
    let mut input = pending_for(&task, NotificationType::DueDateApproaching);
    input.scheduled_for = Utc::now() + Duration::hours(3);
    NotificationRepo::insert_pending_if_absent(&pool, &input).await.unwrap();

    let due = NotificationRepo::list_due_pending(&pool, Utc::now()).await.unwrap();
    assert!(due.is_empty());
}

// ---------------------------------------------------------------------------
// Inbox
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_first_read_wins(pool: PgPool) {
    let user = new_user(&pool, "a@example.com").await;
    let task = new_task(&pool, user, "t", Some(2)).await;
    let id = sent_for(&pool, &task).await;

    let first = NotificationRepo::mark_read(&pool, id, user, ReadSource::WebPush, Utc::now())
        .await
        .unwrap()
        .unwrap();
    let second = NotificationRepo::mark_read(
        &pool,
        id,
        user,
        ReadSource::WebClient,
        Utc::now() + Duration::minutes(5),
    )
    .await
    .unwrap()
    .unwrap();

    assert_eq!(second.read_at, first.read_at);
    assert_eq!(second.read_source, Some(ReadSource::WebPush));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_mark_read_of_foreign_notification_is_none(pool: PgPool) {
    let alice = new_user(&pool, "alice@example.com").await;
    let bob = new_user(&pool, "bob@example.com").await;
    let task = new_task(&pool, alice, "t", Some(2)).await;
    let id = sent_for(&pool, &task).await;

    let result = NotificationRepo::mark_read(&pool, id, bob, ReadSource::WebClient, Utc::now())
        .await
        .unwrap();
    assert!(result.is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_inbox_lists_unread_first_and_skips_orphans(pool: PgPool) {
    let user = new_user(&pool, "a@example.com").await;
    let older = new_task(&pool, user, "older", Some(2)).await;
    let newer = new_task(&pool, user, "newer", Some(2)).await;
    let orphaned = new_task(&pool, user, "orphaned", Some(2)).await;
    let pending = new_task(&pool, user, "pending", Some(2)).await;

    let older_id = sent_for(&pool, &older).await;
    let newer_id = sent_for(&pool, &newer).await;
    sent_for(&pool, &orphaned).await;
    NotificationRepo::insert_pending_if_absent(
        &pool,
        &pending_for(&pending, NotificationType::DueDateApproaching),
    )
    .await
    .unwrap();
    TaskRepo::soft_delete(&pool, orphaned.id, user).await.unwrap();

    NotificationRepo::mark_read(&pool, newer_id, user, ReadSource::WebClient, Utc::now())
        .await
        .unwrap();

    let rows = NotificationRepo::list_inbox(&pool, user, 0, 20).await.unwrap();
    let ids: Vec<i64> = rows.iter().map(|r| r.notification.id).collect();
    assert_eq!(ids, vec![older_id, newer_id]);
    assert_eq!(rows[0].task_title, "older");

    assert_eq!(NotificationRepo::count_inbox(&pool, user).await.unwrap(), 2);
    assert_eq!(NotificationRepo::unread_count(&pool, user).await.unwrap(), 1);

    let page = NotificationRepo::list_inbox(&pool, user, 1, 1).await.unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].notification.id, newer_id);
}
