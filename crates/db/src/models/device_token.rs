//! Push device registrations.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use tasflou_core::types::{DbId, Timestamp};
use validator::Validate;

/// A row from the `device_tokens` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct DeviceToken {
    pub id: DbId,
    pub user_id: DbId,
    pub token: String,
    /// Free-form platform tag (`web`, `android`, `ios`).
    pub platform: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub last_used_at: Option<Timestamp>,
}

/// DTO for registering (or re-assigning) a device token.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterDevice {
    #[validate(length(min = 1, max = 4096))]
    pub token: String,
    #[validate(length(min = 1, max = 32))]
    pub platform: String,
}
