use std::sync::Arc;
use std::time::Duration;

use tasflou_outbox::delivery::gateway_from_config;
use tasflou_outbox::{NotificationConfig, NotificationGenerator, NotificationSender, PgOutboxStore};
use tasflou_worker::OutboxScheduler;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// How long to wait for an in-flight run after a shutdown signal.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tasflou_worker=debug,tasflou_outbox=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = NotificationConfig::from_env();
    tracing::info!(
        quiet_hours = ?config.quiet_hours,
        fcm_configured = config.fcm.is_some(),
        "Loaded notification configuration",
    );

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = tasflou_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");

    tasflou_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database connection pool created");

    // --- Pipeline ---
    let store = Arc::new(PgOutboxStore::new(pool));
    let gateway = gateway_from_config(&config);

    let generator =
        NotificationGenerator::new(store.clone(), config.due_date_lead, config.stale_after);
    let sender = NotificationSender::new(store, gateway, config.quiet_hours, config.push_timeout);
    let scheduler = Arc::new(OutboxScheduler::new(
        generator,
        sender,
        config.generate_interval,
        config.send_interval,
    ));

    let cancel = CancellationToken::new();
    let handle = {
        let scheduler = Arc::clone(&scheduler);
        let cancel = cancel.clone();
        tokio::spawn(async move { scheduler.run(cancel).await })
    };

    let signal = shutdown_signal().await;
    tracing::info!(signal, "Stopping scheduler");

    cancel.cancel();
    if tokio::time::timeout(SHUTDOWN_GRACE, handle).await.is_err() {
        tracing::warn!("Scheduler did not stop within the grace period");
    }

    tracing::info!("Worker shut down");
}

/// Resolve on Ctrl-C, or SIGTERM on Unix, returning the signal's name.
async fn shutdown_signal() -> &'static str {
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

    tokio::select! {
        () = ctrl_c => "SIGINT",
        () = terminate => "SIGTERM",
    }
}
