//! Domain building blocks for the Tasflou task tracker.
//!
//! This crate has zero internal dependencies so the repository layer, the
//! notification outbox, the HTTP API and the worker can all share it.

pub mod auth;
pub mod error;
pub mod notification;
pub mod positioning;
pub mod push;
pub mod quiet_hours;
pub mod task;
pub mod templates;
pub mod types;
