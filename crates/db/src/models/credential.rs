//! Credentials owned by the built-in identity provider.

use sqlx::FromRow;
use tasflou_core::types::{DbId, Timestamp};

/// A row from the `auth_credentials` table. Never serialized.
#[derive(Debug, Clone, FromRow)]
pub struct Credential {
    pub id: DbId,
    pub email: String,
    pub subject: String,
    pub password_hash: String,
    pub refresh_token_hash: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
