//! Shared fixtures for outbox pipeline tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use tasflou_core::push::{PushGateway, PushMessage, PushResult};
use tasflou_core::quiet_hours::QuietHours;
use tasflou_core::task::TaskStatus;
use tasflou_core::types::{DbId, Timestamp};
use tasflou_db::models::task::Task;
use tasflou_outbox::{InMemoryOutbox, NotificationGenerator, NotificationSender};

/// 2026-05-10 12:00 UTC, well outside the default 22 -> 8 quiet window.
pub fn noon() -> Timestamp {
    Utc.with_ymd_and_hms(2026, 5, 10, 12, 0, 0).unwrap()
}

pub fn task(id: DbId, user_id: DbId, title: &str, now: Timestamp) -> Task {
    Task {
        id,
        user_id,
        title: title.to_string(),
        description: None,
        status: TaskStatus::Todo,
        due_date: None,
        position: id * 1000,
        status_changed_at: now,
        created_at: now,
        updated_at: now,
        deleted_at: None,
    }
}

/// How the recording gateway answers.
#[derive(Clone)]
pub enum Reply {
    /// Every token succeeds.
    AllDelivered,
    /// Every token fails with no error message.
    AllFailed,
    /// Fixed result.
    Fixed(PushResult),
    /// Never answers.
    Hang,
}

/// Gateway that records every message it is asked to send.
pub struct RecordingGateway {
    reply: Reply,
    pub sent: Mutex<Vec<PushMessage>>,
}

impl RecordingGateway {
    pub fn new(reply: Reply) -> Arc<Self> {
        Arc::new(Self {
            reply,
            sent: Mutex::new(Vec::new()),
        })
    }

    pub fn messages(&self) -> Vec<PushMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl PushGateway for RecordingGateway {
    async fn send(&self, message: &PushMessage) -> PushResult {
        self.sent.lock().unwrap().push(message.clone());
        match &self.reply {
            Reply::AllDelivered => PushResult {
                success_count: message.tokens.len(),
                delivered_tokens: message.tokens.clone(),
                ..PushResult::default()
            },
            Reply::AllFailed => PushResult {
                failure_count: message.tokens.len(),
                ..PushResult::default()
            },
            Reply::Fixed(result) => result.clone(),
            Reply::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                PushResult::default()
            }
        }
    }
}

pub fn generator(store: &Arc<InMemoryOutbox>) -> NotificationGenerator {
    NotificationGenerator::new(
        store.clone(),
        chrono::Duration::days(1),
        chrono::Duration::days(7),
    )
}

pub fn sender(store: &Arc<InMemoryOutbox>, gateway: Arc<dyn PushGateway>) -> NotificationSender {
    NotificationSender::new(
        store.clone(),
        gateway,
        QuietHours::utc(22, 8),
        Duration::from_secs(5),
    )
}
