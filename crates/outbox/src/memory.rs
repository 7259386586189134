//! In-memory [`OutboxStore`] for tests and database-less local runs.
//!
//! Mirrors the PostgreSQL semantics the pipeline relies on: soft-deleted
//! tasks are invisible, dedup only looks at pending rows, and outcome writes
//! only apply to rows that are still pending.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Utc;
use tasflou_core::notification::{DeliveryOutcome, NotificationStatus, NotificationType};
use tasflou_core::task::TaskStatus;
use tasflou_core::types::{DbId, Timestamp};
use tasflou_db::models::notification::{NewNotification, Notification};
use tasflou_db::models::task::Task;

use crate::error::OutboxError;
use crate::store::OutboxStore;

#[derive(Default)]
struct State {
    tasks: BTreeMap<DbId, Task>,
    notifications: BTreeMap<DbId, Notification>,
    /// (user_id, token, last_used_at)
    devices: Vec<(DbId, String, Option<Timestamp>)>,
    next_notification_id: DbId,
    fail_token_lookup: bool,
}

/// Outbox state held in process memory.
#[derive(Default)]
pub struct InMemoryOutbox {
    state: Mutex<State>,
}

impl InMemoryOutbox {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // -----------------------------------------------------------------------
    // Seeding and inspection
    // -----------------------------------------------------------------------

    pub fn put_task(&self, task: Task) {
        self.state().tasks.insert(task.id, task);
    }

    pub fn soft_delete_task(&self, task_id: DbId, at: Timestamp) {
        if let Some(task) = self.state().tasks.get_mut(&task_id) {
            task.deleted_at = Some(at);
        }
    }

    /// Remove the task row entirely, leaving any notification dangling.
    pub fn remove_task(&self, task_id: DbId) {
        self.state().tasks.remove(&task_id);
    }

    pub fn add_device(&self, user_id: DbId, token: &str) {
        self.state().devices.push((user_id, token.to_string(), None));
    }

    /// Make every device-token lookup fail, as a broken store would.
    pub fn fail_token_lookups(&self, fail: bool) {
        self.state().fail_token_lookup = fail;
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.state().notifications.values().cloned().collect()
    }

    pub fn notification(&self, id: DbId) -> Option<Notification> {
        self.state().notifications.get(&id).cloned()
    }

    pub fn tokens_of(&self, user_id: DbId) -> Vec<String> {
        self.state()
            .devices
            .iter()
            .filter(|(owner, _, _)| *owner == user_id)
            .map(|(_, token, _)| token.clone())
            .collect()
    }

    pub fn last_used(&self, token: &str) -> Option<Timestamp> {
        self.state()
            .devices
            .iter()
            .find(|(_, t, _)| t == token)
            .and_then(|(_, _, used)| *used)
    }

    /// Insert without the dedup check, as a concurrent generator racing past
    /// the check would.
    pub fn force_insert(&self, input: &NewNotification) -> DbId {
        let mut state = self.state();
        insert(&mut state, input)
    }
}

fn insert(state: &mut State, input: &NewNotification) -> DbId {
    state.next_notification_id += 1;
    let id = state.next_notification_id;
    state.notifications.insert(
        id,
        Notification {
            id,
            user_id: input.user_id,
            task_id: input.task_id,
            kind: input.kind,
            status: NotificationStatus::Pending,
            scheduled_for: input.scheduled_for,
            sent_at: None,
            error_message: None,
            read_at: None,
            read_source: None,
            created_at: Utc::now(),
        },
    );
    id
}

fn has_pending(state: &State, task_id: DbId, kind: NotificationType) -> bool {
    state.notifications.values().any(|n| {
        n.task_id == Some(task_id) && n.kind == kind && n.status == NotificationStatus::Pending
    })
}

#[async_trait]
impl OutboxStore for InMemoryOutbox {
    async fn tasks_due_between(
        &self,
        after: Timestamp,
        until: Timestamp,
    ) -> Result<Vec<Task>, OutboxError> {
        let state = self.state();
        Ok(state
            .tasks
            .values()
            .filter(|t| !t.is_deleted() && t.status != TaskStatus::Done)
            .filter(|t| t.due_date.is_some_and(|due| due > after && due <= until))
            .filter(|t| !has_pending(&state, t.id, NotificationType::DueDateApproaching))
            .cloned()
            .collect())
    }

    async fn stale_tasks(&self, changed_before: Timestamp) -> Result<Vec<Task>, OutboxError> {
        let state = self.state();
        Ok(state
            .tasks
            .values()
            .filter(|t| !t.is_deleted() && t.status == TaskStatus::Todo)
            .filter(|t| t.status_changed_at < changed_before)
            .filter(|t| !has_pending(&state, t.id, NotificationType::StaleTask))
            .cloned()
            .collect())
    }

    async fn insert_pending_if_absent(&self, input: &NewNotification) -> Result<bool, OutboxError> {
        let mut state = self.state();
        if let Some(task_id) = input.task_id {
            if has_pending(&state, task_id, input.kind) {
                return Ok(false);
            }
        }
        insert(&mut state, input);
        Ok(true)
    }

    async fn due_pending(&self, now: Timestamp) -> Result<Vec<Notification>, OutboxError> {
        Ok(self
            .state()
            .notifications
            .values()
            .filter(|n| n.status == NotificationStatus::Pending && n.scheduled_for <= now)
            .cloned()
            .collect())
    }

    async fn device_tokens(&self, user_id: DbId) -> Result<Vec<String>, OutboxError> {
        if self.state().fail_token_lookup {
            return Err(OutboxError::Store("device token lookup failed".to_string()));
        }
        Ok(self.tokens_of(user_id))
    }

    async fn find_active_task(&self, task_id: DbId) -> Result<Option<Task>, OutboxError> {
        Ok(self
            .state()
            .tasks
            .get(&task_id)
            .filter(|t| !t.is_deleted())
            .cloned())
    }

    async fn record_outcome(
        &self,
        notification_id: DbId,
        outcome: &DeliveryOutcome,
        at: Timestamp,
    ) -> Result<bool, OutboxError> {
        let mut state = self.state();
        match state.notifications.get_mut(&notification_id) {
            Some(n) if n.status.can_transition(outcome.status()) => {
                n.status = outcome.status();
                n.sent_at = Some(at);
                n.error_message = outcome.error_message().map(str::to_string);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn prune_tokens(&self, tokens: &[String]) -> Result<u64, OutboxError> {
        let mut state = self.state();
        let before = state.devices.len();
        state.devices.retain(|(_, token, _)| !tokens.contains(token));
        Ok((before - state.devices.len()) as u64)
    }

    async fn touch_tokens(
        &self,
        user_id: DbId,
        tokens: &[String],
        at: Timestamp,
    ) -> Result<u64, OutboxError> {
        let mut touched = 0;
        for (owner, token, used) in self.state().devices.iter_mut() {
            if *owner == user_id && tokens.contains(token) {
                *used = Some(at);
                touched += 1;
            }
        }
        Ok(touched)
    }
}
