//! JWT access tokens and refresh-token helpers.
//!
//! Access tokens are HS256-signed and carry the external subject id, which
//! is what the local `users` row is keyed by. Refresh tokens are opaque
//! random strings; only their SHA-256 hash is persisted.

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

const DEFAULT_ACCESS_EXPIRY_MINS: i64 = 15;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// External subject id issued at signup.
    pub sub: String,
    pub exp: i64,
    pub iat: i64,
    pub jti: String,
}

impl Claims {
    fn issue(subject: &str, ttl_secs: i64) -> Self {
        let iat = Utc::now().timestamp();
        Self {
            sub: subject.to_string(),
            exp: iat + ttl_secs,
            iat,
            jti: Uuid::new_v4().to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// HMAC secret shared by signing and verification.
    pub secret: String,
    pub access_token_expiry_mins: i64,
}

impl JwtConfig {
    /// `JWT_SECRET` is required and must be non-empty.
    /// `JWT_ACCESS_EXPIRY_MINS` defaults to 15.
    pub fn from_env() -> Self {
        let secret = std::env::var("JWT_SECRET").unwrap_or_default();
        assert!(!secret.is_empty(), "JWT_SECRET must be set to a non-empty value");

        let access_token_expiry_mins = match std::env::var("JWT_ACCESS_EXPIRY_MINS") {
            Ok(raw) => raw
                .parse()
                .unwrap_or_else(|e| panic!("JWT_ACCESS_EXPIRY_MINS has an invalid value: {e}")),
            Err(_) => DEFAULT_ACCESS_EXPIRY_MINS,
        };

        Self {
            secret,
            access_token_expiry_mins,
        }
    }

    pub fn access_token_ttl_secs(&self) -> i64 {
        self.access_token_expiry_mins * 60
    }

    fn encoding_key(&self) -> EncodingKey {
        EncodingKey::from_secret(self.secret.as_bytes())
    }

    fn decoding_key(&self) -> DecodingKey {
        DecodingKey::from_secret(self.secret.as_bytes())
    }
}

/// Sign a fresh access token for `subject`.
pub fn generate_access_token(
    subject: &str,
    config: &JwtConfig,
) -> Result<String, jsonwebtoken::errors::Error> {
    let claims = Claims::issue(subject, config.access_token_ttl_secs());
    encode(&Header::new(Algorithm::HS256), &claims, &config.encoding_key())
}

/// Check signature and expiry, returning the embedded [`Claims`].
pub fn validate_token(
    token: &str,
    config: &JwtConfig,
) -> Result<Claims, jsonwebtoken::errors::Error> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_required_spec_claims(&["exp", "sub"]);
    decode::<Claims>(token, &config.decoding_key(), &validation).map(|data| data.claims)
}

/// Returns `(plaintext, sha256_hex)`. Only the hash is stored.
pub fn generate_refresh_token() -> (String, String) {
    let plaintext = format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple());
    let hash = hash_refresh_token(&plaintext);
    (plaintext, hash)
}

pub fn hash_refresh_token(token: &str) -> String {
    format!("{:x}", Sha256::digest(token.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(secret: &str) -> JwtConfig {
        JwtConfig {
            secret: secret.to_string(),
            access_token_expiry_mins: 15,
        }
    }

    #[test]
    fn access_token_carries_subject_and_lifetime() {
        let config = config("test-secret-that-is-long-enough-for-hmac");
        let token = generate_access_token("sub-123", &config).unwrap();

        let claims = validate_token(&token, &config).unwrap();
        assert_eq!(claims.sub, "sub-123");
        assert_eq!(claims.exp - claims.iat, 900);
        assert!(!claims.jti.is_empty());
    }

    #[test]
    fn expired_token_is_rejected() {
        let config = config("test-secret-that-is-long-enough-for-hmac");
        // Past the default 60s leeway.
        let claims = Claims::issue("sub-1", -300);
        let token = encode(&Header::default(), &claims, &config.encoding_key()).unwrap();

        assert!(validate_token(&token, &config).is_err());
    }

    #[test]
    fn token_from_another_secret_is_rejected() {
        let token = generate_access_token("sub-1", &config("secret-alpha")).unwrap();
        assert!(validate_token(&token, &config("secret-bravo")).is_err());
    }

    #[test]
    fn refresh_tokens_are_unique_and_hashed_to_hex() {
        let (first, hash) = generate_refresh_token();
        let (second, _) = generate_refresh_token();

        assert_ne!(first, second);
        assert_eq!(hash, hash_refresh_token(&first));
        assert_eq!(hash.len(), 64);
    }
}
