use std::sync::Arc;

use tasflou_core::auth::AuthProvider;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheap to clone: everything is either a pool handle or behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub pool: tasflou_db::DbPool,
    pub config: Arc<ServerConfig>,
    /// Identity provider used for signup, signin and bearer-token checks.
    pub auth: Arc<dyn AuthProvider>,
}
