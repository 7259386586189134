use std::fmt::Display;
use std::str::FromStr;

use crate::auth::jwt::JwtConfig;

/// HTTP server settings, read once at startup.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Browser origins allowed by CORS.
    pub cors_origins: Vec<String>,
    pub request_timeout_secs: u64,
    /// Shortest password the built-in provider accepts at signup.
    pub password_min_length: usize,
    pub jwt: JwtConfig,
}

impl ServerConfig {
    /// Read settings from the environment, panicking on unparsable values.
    ///
    /// | Env Var                | Default                 |
    /// |------------------------|-------------------------|
    /// | `HOST`                 | `0.0.0.0`               |
    /// | `PORT`                 | `3000`                  |
    /// | `CORS_ORIGINS`         | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                    |
    /// | `PASSWORD_MIN_LENGTH`  | `8`                     |
    ///
    /// JWT settings come from [`JwtConfig::from_env`]; `JWT_SECRET` has no
    /// default.
    pub fn from_env() -> Self {
        Self {
            host: env_or("HOST", "0.0.0.0"),
            port: parse_env("PORT", "3000"),
            cors_origins: split_origins(&env_or("CORS_ORIGINS", "http://localhost:5173")),
            request_timeout_secs: parse_env("REQUEST_TIMEOUT_SECS", "30"),
            password_min_length: parse_env("PASSWORD_MIN_LENGTH", "8"),
            jwt: JwtConfig::from_env(),
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_env<T>(key: &str, default: &str) -> T
where
    T: FromStr,
    T::Err: Display,
{
    env_or(key, default)
        .parse()
        .unwrap_or_else(|e| panic!("{key} has an invalid value: {e}"))
}

/// Comma-separated list, blanks dropped.
fn split_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origins_are_trimmed_and_blank_entries_dropped() {
        assert_eq!(
            split_origins(" http://a.test ,,http://b.test, "),
            vec!["http://a.test".to_string(), "http://b.test".to_string()]
        );
    }

    #[test]
    fn empty_origin_list_is_empty() {
        assert!(split_origins("").is_empty());
    }
}
