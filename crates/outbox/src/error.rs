use tasflou_core::error::CoreError;

/// Failures that abort a generation or send run.
///
/// A failed delivery is not one of these: it is recorded on the
/// notification row and the run carries on.
#[derive(Debug, thiserror::Error)]
pub enum OutboxError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Outbox store error: {0}")]
    Store(String),
}
