use crate::types::DbId;

/// Domain-level failures shared by every crate in the workspace.
///
/// Delivery failures are not represented here: a failed push is recorded on
/// the notification row itself and never surfaces as an error.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    /// A move referenced an anchor that is missing, soft-deleted, owned by
    /// someone else, or otherwise unusable.
    #[error("Invalid anchor: task {id} cannot be used as a position anchor")]
    InvalidAnchor { id: DbId },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("No template registered for notification type '{0}'")]
    TemplateMissing(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
