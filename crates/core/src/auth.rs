//! Identity provider port.
//!
//! Token issuance and credential checks belong to the provider. The rest of
//! the system only relies on the stable external subject id it hands back,
//! which becomes the foreign key of the local `users` row.

use async_trait::async_trait;
use serde::Serialize;

/// Tokens returned by a successful authentication.
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Unknown user or wrong password; callers cannot tell which.
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("An account with this email already exists")]
    AlreadyRegistered,

    #[error("{0}")]
    Rejected(String),

    #[error("Authentication service error: {0}")]
    Provider(String),
}

#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn authenticate(&self, email: &str, password: &str) -> Result<TokenPair, AuthError>;

    /// Create an identity and return its stable external subject id.
    async fn register(&self, email: &str, password: &str) -> Result<String, AuthError>;

    /// Resolve an access token to the external subject id it was issued for.
    fn verify_access_token(&self, token: &str) -> Result<String, AuthError>;
}
