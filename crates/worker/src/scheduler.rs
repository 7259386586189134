//! Periodic generation and sending.
//!
//! Two independent loops share one cancellation token. Each fires once
//! immediately and then on its own interval. A failed run is logged and the
//! loop waits for the next tick; nothing here ever stops the process.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tasflou_core::types::Timestamp;
use tasflou_outbox::{
    GenerationReport, NotificationGenerator, NotificationSender, OutboxError, SendReport,
};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

pub struct OutboxScheduler {
    generator: Arc<NotificationGenerator>,
    sender: Arc<NotificationSender>,
    generate_interval: Duration,
    send_interval: Duration,
}

impl OutboxScheduler {
    pub fn new(
        generator: NotificationGenerator,
        sender: NotificationSender,
        generate_interval: Duration,
        send_interval: Duration,
    ) -> Self {
        Self {
            generator: Arc::new(generator),
            sender: Arc::new(sender),
            generate_interval,
            send_interval,
        }
    }

    /// One generation pass.
    pub async fn generate_once(&self, now: Timestamp) -> Result<GenerationReport, OutboxError> {
        self.generator.generate_all(now).await
    }

    /// One send pass.
    pub async fn send_once(&self, now: Timestamp) -> Result<SendReport, OutboxError> {
        self.sender.send_all_pending(now).await
    }

    /// Run both loops until `cancel` fires.
    pub async fn run(&self, cancel: CancellationToken) {
        tracing::info!(
            generate_interval_secs = self.generate_interval.as_secs(),
            send_interval_secs = self.send_interval.as_secs(),
            "Outbox scheduler started",
        );

        tokio::join!(
            self.generation_loop(cancel.clone()),
            self.send_loop(cancel),
        );

        tracing::info!("Outbox scheduler stopped");
    }

    async fn generation_loop(&self, cancel: CancellationToken) {
        let mut interval = tokio::time::interval(self.generate_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Notification generation loop cancelled");
                    break;
                }
                _ = interval.tick() => {
                    if let Err(e) = self.generate_once(Utc::now()).await {
                        tracing::error!(error = %e, "Notification generation failed");
                    }
                }
            }
        }
    }

    async fn send_loop(&self, cancel: CancellationToken) {
        let mut interval = tokio::time::interval(self.send_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Notification send loop cancelled");
                    break;
                }
                _ = interval.tick() => {
                    if let Err(e) = self.send_once(Utc::now()).await {
                        tracing::error!(error = %e, "Notification send failed");
                    }
                }
            }
        }
    }
}
