//! Request extractors.
//!
//! - [`auth::AuthUser`] -- resolves a Bearer token to the local user.

pub mod auth;
