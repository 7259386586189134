//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` as the first argument.

pub mod credential_repo;
pub mod device_token_repo;
pub mod notification_repo;
pub mod task_repo;
pub mod user_repo;

pub use credential_repo::CredentialRepo;
pub use device_token_repo::DeviceTokenRepo;
pub use notification_repo::NotificationRepo;
pub use task_repo::{TaskRepo, TaskRepoError};
pub use user_repo::UserRepo;
