//! [`AuthProvider`] backed by the `auth_credentials` table.
//!
//! Each identity gets a random UUID subject at registration. Access tokens
//! are HS256 JWTs carrying that subject; the refresh token's hash is kept on
//! the credential row.

use async_trait::async_trait;
use sqlx::PgPool;
use tasflou_core::auth::{AuthError, AuthProvider, TokenPair};
use tasflou_db::repositories::CredentialRepo;
use uuid::Uuid;

use crate::auth::jwt::{generate_access_token, generate_refresh_token, validate_token, JwtConfig};
use crate::auth::password::{hash_password, verify_password};

pub struct LocalAuthProvider {
    pool: PgPool,
    jwt: JwtConfig,
}

impl LocalAuthProvider {
    pub fn new(pool: PgPool, jwt: JwtConfig) -> Self {
        Self { pool, jwt }
    }
}

fn provider_error(err: impl std::fmt::Display) -> AuthError {
    AuthError::Provider(err.to_string())
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.code().as_deref() == Some("23505"))
}

#[async_trait]
impl AuthProvider for LocalAuthProvider {
    async fn authenticate(&self, email: &str, password: &str) -> Result<TokenPair, AuthError> {
        let credential = CredentialRepo::find_by_email(&self.pool, email)
            .await
            .map_err(provider_error)?
            .ok_or(AuthError::InvalidCredentials)?;

        if !verify_password(password, &credential.password_hash).map_err(provider_error)? {
            return Err(AuthError::InvalidCredentials);
        }

        let access_token =
            generate_access_token(&credential.subject, &self.jwt).map_err(provider_error)?;
        let (refresh_token, refresh_hash) = generate_refresh_token();
        CredentialRepo::set_refresh_token_hash(&self.pool, &credential.subject, &refresh_hash)
            .await
            .map_err(provider_error)?;

        Ok(TokenPair {
            access_token,
            refresh_token,
            expires_in: self.jwt.access_token_ttl_secs(),
        })
    }

    async fn register(&self, email: &str, password: &str) -> Result<String, AuthError> {
        if CredentialRepo::find_by_email(&self.pool, email)
            .await
            .map_err(provider_error)?
            .is_some()
        {
            return Err(AuthError::AlreadyRegistered);
        }

        let password_hash = hash_password(password).map_err(provider_error)?;
        let subject = Uuid::new_v4().to_string();

        match CredentialRepo::create(&self.pool, email, &subject, &password_hash).await {
            Ok(credential) => Ok(credential.subject),
            // Lost a race with a concurrent signup for the same email.
            Err(e) if is_unique_violation(&e) => Err(AuthError::AlreadyRegistered),
            Err(e) => Err(provider_error(e)),
        }
    }

    fn verify_access_token(&self, token: &str) -> Result<String, AuthError> {
        validate_token(token, &self.jwt)
            .map(|claims| claims.sub)
            .map_err(|_| AuthError::Rejected("Invalid or expired token".into()))
    }
}
