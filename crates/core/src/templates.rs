//! Title/body templates for push notifications.
//!
//! Rendering is a pure function of the notification type, a task snapshot
//! and the render time. Elapsed days are computed here and never stored.

use crate::error::CoreError;
use crate::notification::NotificationType;
use crate::task::TaskSnapshot;
use crate::types::Timestamp;

/// Rendered push content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub title: String,
    pub body: String,
}

/// Placeholder for a task without a due date.
const NO_DUE_DATE: &str = "N/A";

/// Render the message for a known notification type.
pub fn render(kind: NotificationType, task: &TaskSnapshot<'_>, now: Timestamp) -> Rendered {
    match kind {
        NotificationType::DueDateApproaching => {
            let due = task
                .due_date
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| NO_DUE_DATE.to_string());
            Rendered {
                title: "Task due soon".to_string(),
                body: format!("'{}' is due on {due}", task.title),
            }
        }
        NotificationType::StaleTask => {
            let days = (now - task.status_changed_at).num_days().max(0);
            Rendered {
                title: "Task needs attention".to_string(),
                body: format!(
                    "'{}' has been in {} for {days} days",
                    task.title, task.status
                ),
            }
        }
    }
}

/// Render by stored type name, failing for names without a template.
pub fn render_named(
    kind: &str,
    task: &TaskSnapshot<'_>,
    now: Timestamp,
) -> Result<Rendered, CoreError> {
    let kind: NotificationType = kind.parse()?;
    Ok(render(kind, task, now))
}
