//! Local user accounts.

use serde::Serialize;
use sqlx::FromRow;
use tasflou_core::types::{DbId, Timestamp};

/// A row from the `users` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: DbId,
    pub email: String,
    /// Stable subject id issued by the identity provider.
    pub external_id: String,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a local user after the provider accepted the signup.
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub email: String,
    pub external_id: String,
}
