//! Built-in identity provider.
//!
//! - [`password`] -- Argon2id password hashing and verification.
//! - [`jwt`] -- HS256 access tokens and refresh-token hashing.
//! - [`local_provider`] -- [`AuthProvider`](tasflou_core::auth::AuthProvider)
//!   backed by the `auth_credentials` table.

pub mod jwt;
pub mod local_provider;
pub mod password;
