//! Background processes for the notification outbox.
//!
//! The binary wires a [`scheduler::OutboxScheduler`] to PostgreSQL and the
//! configured push gateway; the library form lets tests drive it against
//! the in-memory store.

pub mod scheduler;

pub use scheduler::OutboxScheduler;
