//! Notification outbox pipeline.
//!
//! - [`NotificationGenerator`] scans tasks for trigger conditions and
//!   inserts deduplicated pending notifications.
//! - [`NotificationSender`] delivers due pending notifications through a
//!   [`PushGateway`](tasflou_core::push::PushGateway), honouring quiet hours,
//!   and records the outcome on each row.
//! - [`OutboxStore`] is the storage seam: [`PgOutboxStore`] in production,
//!   [`InMemoryOutbox`] for tests and local runs.
//! - [`delivery`] holds the concrete push gateways.

pub mod config;
pub mod delivery;
pub mod error;
pub mod generator;
pub mod memory;
pub mod sender;
pub mod store;

pub use config::NotificationConfig;
pub use error::OutboxError;
pub use generator::{GenerationReport, NotificationGenerator};
pub use memory::InMemoryOutbox;
pub use sender::{NotificationSender, SendReport};
pub use store::{OutboxStore, PgOutboxStore};
