//! Repository for the `device_tokens` table.

use sqlx::PgPool;
use tasflou_core::types::{DbId, Timestamp};

use crate::models::device_token::{DeviceToken, RegisterDevice};

const COLUMNS: &str = "id, user_id, token, platform, created_at, updated_at, last_used_at";

/// Provides registration and lookup of push device tokens.
pub struct DeviceTokenRepo;

impl DeviceTokenRepo {
    /// Register a token for a user.
    ///
    /// Tokens are globally unique: registering a token that already exists
    /// moves it to `user_id` and refreshes its platform tag.
    pub async fn register(
        pool: &PgPool,
        user_id: DbId,
        input: &RegisterDevice,
    ) -> Result<DeviceToken, sqlx::Error> {
        let query = format!(
            "INSERT INTO device_tokens (user_id, token, platform) \
             VALUES ($1, $2, $3) \
             ON CONFLICT (token) DO UPDATE SET \
                user_id = EXCLUDED.user_id, \
                platform = EXCLUDED.platform, \
                updated_at = NOW() \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, DeviceToken>(&query)
            .bind(user_id)
            .bind(&input.token)
            .bind(&input.platform)
            .fetch_one(pool)
            .await
    }

    /// Remove a token owned by `user_id`. Returns `false` if no such token.
    pub async fn unregister(pool: &PgPool, token: &str, user_id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM device_tokens WHERE token = $1 AND user_id = $2")
            .bind(token)
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn list_for_user(pool: &PgPool, user_id: DbId) -> Result<Vec<DeviceToken>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM device_tokens WHERE user_id = $1 ORDER BY created_at, id"
        );
        sqlx::query_as::<_, DeviceToken>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Raw token strings for every device of a user.
    pub async fn tokens_for_user(pool: &PgPool, user_id: DbId) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar("SELECT token FROM device_tokens WHERE user_id = $1 ORDER BY id")
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Delete tokens the push provider no longer accepts.
    pub async fn delete_tokens(pool: &PgPool, tokens: &[String]) -> Result<u64, sqlx::Error> {
        if tokens.is_empty() {
            return Ok(0);
        }
        let result = sqlx::query("DELETE FROM device_tokens WHERE token = ANY($1)")
            .bind(tokens)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Stamp `last_used_at` on the given tokens of a user.
    pub async fn touch_last_used(
        pool: &PgPool,
        user_id: DbId,
        tokens: &[String],
        at: Timestamp,
    ) -> Result<u64, sqlx::Error> {
        if tokens.is_empty() {
            return Ok(0);
        }
        let result = sqlx::query(
            "UPDATE device_tokens SET last_used_at = $3 \
             WHERE user_id = $1 AND token = ANY($2)",
        )
        .bind(user_id)
        .bind(tokens)
        .bind(at)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }
}
