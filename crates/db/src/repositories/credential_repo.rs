//! Repository for the `auth_credentials` table.

use sqlx::PgPool;

use crate::models::credential::Credential;

const COLUMNS: &str =
    "id, email, subject, password_hash, refresh_token_hash, created_at, updated_at";

/// Storage for the built-in identity provider.
pub struct CredentialRepo;

impl CredentialRepo {
    pub async fn create(
        pool: &PgPool,
        email: &str,
        subject: &str,
        password_hash: &str,
    ) -> Result<Credential, sqlx::Error> {
        let query = format!(
            "INSERT INTO auth_credentials (email, subject, password_hash) \
             VALUES ($1, $2, $3) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Credential>(&query)
            .bind(email)
            .bind(subject)
            .bind(password_hash)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_email(
        pool: &PgPool,
        email: &str,
    ) -> Result<Option<Credential>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM auth_credentials WHERE email = $1");
        sqlx::query_as::<_, Credential>(&query)
            .bind(email)
            .fetch_optional(pool)
            .await
    }

    /// Replace the stored refresh-token hash (only the hash is ever stored).
    pub async fn set_refresh_token_hash(
        pool: &PgPool,
        subject: &str,
        hash: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE auth_credentials \
             SET refresh_token_hash = $2, updated_at = NOW() \
             WHERE subject = $1",
        )
        .bind(subject)
        .bind(hash)
        .execute(pool)
        .await?;
        Ok(())
    }
}
