use std::net::SocketAddr;
use std::sync::Arc;

use sqlx::PgPool;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use tasflou_api::auth::local_provider::LocalAuthProvider;
use tasflou_api::config::ServerConfig;
use tasflou_api::router::build_app_router;
use tasflou_api::state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = config.port, "Loaded server configuration");

    let pool = connect_database().await;

    let state = AppState {
        auth: Arc::new(LocalAuthProvider::new(pool.clone(), config.jwt.clone())),
        pool,
        config: Arc::new(config.clone()),
    };
    let app = build_app_router(state, &config);

    let ip = config
        .host
        .parse()
        .unwrap_or_else(|e| panic!("HOST '{}' is not an IP address: {e}", config.host));
    let addr = SocketAddr::new(ip, config.port);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .unwrap_or_else(|e| panic!("Failed to bind {addr}: {e}"));
    tracing::info!(%addr, "Task API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    tracing::info!("Task API stopped");
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("tasflou_api=debug,tasflou_db=info,tower_http=debug"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Connect, verify and migrate. Any failure aborts startup.
async fn connect_database() -> PgPool {
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = tasflou_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tasflou_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tasflou_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");

    tracing::info!("Database ready");
    pool
}

/// Resolve on Ctrl-C, or SIGTERM on Unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Ctrl-C handler failed");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "SIGTERM handler failed");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let signal = tokio::select! {
        () = ctrl_c => "SIGINT",
        () = terminate => "SIGTERM",
    };
    tracing::info!(signal, "Shutting down, draining in-flight requests");
}
