//! Port contracts for task review updates.
//!
//! Ports define infrastructure-agnostic interfaces used by review services.

pub mod lis;
pub mod notifier;
pub mod repository;

pub use lis::{LisClient, LisError, LisResult};
pub use notifier::{RerunNotification, RerunNotifier, RerunNotifierError, RerunNotifierResult};
pub use repository::{
    TaskReviewRepository, TaskReviewRepositoryError, TaskReviewRepositoryResult,
    TaskReviewTransaction,
};
