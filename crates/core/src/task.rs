//! Task status vocabulary and the read-only snapshot used by templates.
//!
//! The set of statuses has changed over the life of the schema: version 2
//! briefly added `in_progress`, version 3 removed it again. Rows written
//! under version 2 are upgraded through [`TaskStatus::upgrade_legacy`] (and
//! the matching data migration) instead of being silently reinterpreted.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::Timestamp;

/// Maximum length of a task title, in characters.
pub const MAX_TITLE_LEN: usize = 255;

/// Status values retired in earlier schema versions, with their replacement.
const RETIRED_STATUSES: &[(&str, TaskStatus)] = &[("in_progress", TaskStatus::Todo)];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Todo,
    Done,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 2] = [TaskStatus::Todo, TaskStatus::Done];

    /// The value stored in `tasks.status`.
    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::Done => "done",
        }
    }

    /// Map a value written by an older schema version onto the current set.
    ///
    /// Current values pass through unchanged. Returns `None` for values that
    /// were never part of any version.
    pub fn upgrade_legacy(raw: &str) -> Option<TaskStatus> {
        raw.parse().ok().or_else(|| {
            RETIRED_STATUSES
                .iter()
                .find(|(retired, _)| *retired == raw)
                .map(|(_, replacement)| *replacement)
        })
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "todo" => Ok(TaskStatus::Todo),
            "done" => Ok(TaskStatus::Done),
            other => Err(CoreError::Validation(format!(
                "Unknown task status '{other}'"
            ))),
        }
    }
}

impl TryFrom<String> for TaskStatus {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// The fields of a task that notification rendering reads.
#[derive(Debug, Clone, Copy)]
pub struct TaskSnapshot<'a> {
    pub title: &'a str,
    pub status: TaskStatus,
    pub due_date: Option<Timestamp>,
    pub status_changed_at: Timestamp,
}

/// Check a task title for emptiness and length.
pub fn validate_title(title: &str) -> Result<(), CoreError> {
    if title.trim().is_empty() {
        return Err(CoreError::Validation("Task title must not be empty".into()));
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(CoreError::Validation(format!(
            "Task title must be at most {MAX_TITLE_LEN} characters"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_storage_value() {
        for status in TaskStatus::ALL {
            assert_eq!(status.as_str().parse::<TaskStatus>().unwrap(), status);
        }
    }

    #[test]
    fn unknown_status_is_a_validation_error() {
        let err = "blocked".parse::<TaskStatus>().unwrap_err();
        assert!(err.to_string().contains("blocked"));
    }

    #[test]
    fn retired_in_progress_upgrades_to_todo() {
        assert_eq!(TaskStatus::upgrade_legacy("in_progress"), Some(TaskStatus::Todo));
        assert_eq!(TaskStatus::upgrade_legacy("done"), Some(TaskStatus::Done));
        assert_eq!(TaskStatus::upgrade_legacy("archived"), None);
    }

    #[test]
    fn serde_uses_snake_case() {
        let json = serde_json::to_string(&TaskStatus::Done).unwrap();
        assert_eq!(json, "\"done\"");
    }

    #[test]
    fn title_rules() {
        assert!(validate_title("Buy milk").is_ok());
        assert!(validate_title("   ").is_err());
        assert!(validate_title(&"x".repeat(MAX_TITLE_LEN)).is_ok());
        assert!(validate_title(&"x".repeat(MAX_TITLE_LEN + 1)).is_err());
    }
}
