use std::time::Duration;

use chrono::FixedOffset;
use tasflou_core::quiet_hours::QuietHours;

use crate::delivery::fcm::FcmConfig;

/// Notification pipeline configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct NotificationConfig {
    /// How far ahead of a due date the reminder is generated.
    pub due_date_lead: chrono::Duration,
    /// How long a TODO task may sit unchanged before it counts as stale.
    pub stale_after: chrono::Duration,
    pub quiet_hours: QuietHours,
    /// Upper bound for a single gateway call.
    pub push_timeout: Duration,
    pub generate_interval: Duration,
    pub send_interval: Duration,
    /// `None` when no push provider is configured.
    pub fcm: Option<FcmConfig>,
}

impl NotificationConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                                       | Default |
    /// |-----------------------------------------------|---------|
    /// | `NOTIFICATION_DUE_DATE_DAYS_BEFORE`           | `1`     |
    /// | `NOTIFICATION_STALE_TASK_DAYS`                | `7`     |
    /// | `NOTIFICATION_QUIET_HOURS_START`              | `22`    |
    /// | `NOTIFICATION_QUIET_HOURS_END`                | `8`     |
    /// | `NOTIFICATION_QUIET_HOURS_UTC_OFFSET_MINUTES` | `0`     |
    /// | `NOTIFICATION_GENERATE_INTERVAL_SECS`         | `43200` |
    /// | `NOTIFICATION_SEND_INTERVAL_SECS`             | `3600`  |
    /// | `PUSH_TIMEOUT_SECS`                           | `10`    |
    /// | `FCM_PROJECT_ID` / `FCM_CREDENTIALS_PATH`     | unset   |
    pub fn from_env() -> Self {
        let due_days: i64 = env_or("NOTIFICATION_DUE_DATE_DAYS_BEFORE", "1")
            .parse()
            .expect("NOTIFICATION_DUE_DATE_DAYS_BEFORE must be a valid i64");

        let stale_days: i64 = env_or("NOTIFICATION_STALE_TASK_DAYS", "7")
            .parse()
            .expect("NOTIFICATION_STALE_TASK_DAYS must be a valid i64");

        let start_hour = parse_hour("NOTIFICATION_QUIET_HOURS_START", "22");
        let end_hour = parse_hour("NOTIFICATION_QUIET_HOURS_END", "8");

        let offset_minutes: i32 = env_or("NOTIFICATION_QUIET_HOURS_UTC_OFFSET_MINUTES", "0")
            .parse()
            .expect("NOTIFICATION_QUIET_HOURS_UTC_OFFSET_MINUTES must be a valid i32");
        let offset = FixedOffset::east_opt(offset_minutes * 60)
            .expect("NOTIFICATION_QUIET_HOURS_UTC_OFFSET_MINUTES must be within +/- 24h");

        let generate_secs: u64 = env_or("NOTIFICATION_GENERATE_INTERVAL_SECS", "43200")
            .parse()
            .expect("NOTIFICATION_GENERATE_INTERVAL_SECS must be a valid u64");

        let send_secs: u64 = env_or("NOTIFICATION_SEND_INTERVAL_SECS", "3600")
            .parse()
            .expect("NOTIFICATION_SEND_INTERVAL_SECS must be a valid u64");

        let push_timeout_secs: u64 = env_or("PUSH_TIMEOUT_SECS", "10")
            .parse()
            .expect("PUSH_TIMEOUT_SECS must be a valid u64");

        let fcm = match (
            std::env::var("FCM_PROJECT_ID").ok(),
            std::env::var("FCM_CREDENTIALS_PATH").ok(),
        ) {
            (Some(project_id), Some(credentials_path)) => Some(FcmConfig {
                project_id,
                credentials_path: credentials_path.into(),
            }),
            _ => None,
        };

        Self {
            due_date_lead: chrono::Duration::days(due_days),
            stale_after: chrono::Duration::days(stale_days),
            quiet_hours: QuietHours::new(start_hour, end_hour, offset),
            push_timeout: Duration::from_secs(push_timeout_secs),
            generate_interval: Duration::from_secs(generate_secs),
            send_interval: Duration::from_secs(send_secs),
            fcm,
        }
    }
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            due_date_lead: chrono::Duration::days(1),
            stale_after: chrono::Duration::days(7),
            quiet_hours: QuietHours::utc(22, 8),
            push_timeout: Duration::from_secs(10),
            generate_interval: Duration::from_secs(43_200),
            send_interval: Duration::from_secs(3_600),
            fcm: None,
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.into())
}

fn parse_hour(key: &str, default: &str) -> u32 {
    let hour: u32 = env_or(key, default)
        .parse()
        .unwrap_or_else(|_| panic!("{key} must be an hour between 0 and 23"));
    assert!(hour < 24, "{key} must be an hour between 0 and 23");
    hour
}
