//! Concrete [`PushGateway`](tasflou_core::push::PushGateway) implementations.

pub mod fcm;

use std::sync::Arc;

use tasflou_core::push::{PushGateway, UnconfiguredGateway};

use crate::config::NotificationConfig;

/// Build the gateway for this process.
///
/// Falls back to [`UnconfiguredGateway`] when FCM is not configured or its
/// credentials cannot be loaded, so sends fail per notification instead of
/// the process refusing to start.
pub fn gateway_from_config(config: &NotificationConfig) -> Arc<dyn PushGateway> {
    let Some(fcm) = &config.fcm else {
        tracing::warn!("FCM not configured, push notifications will be recorded as failed");
        return Arc::new(UnconfiguredGateway);
    };

    match fcm::FcmGateway::from_config(fcm, config.push_timeout) {
        Ok(gateway) => {
            tracing::info!(project_id = %fcm.project_id, "FCM gateway initialised");
            Arc::new(gateway)
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to initialise FCM gateway");
            Arc::new(UnconfiguredGateway)
        }
    }
}

