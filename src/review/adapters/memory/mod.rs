//! In-memory adapter implementations for testing.
//!
//! These adapters keep their state behind a lock and expose inspection
//! helpers so tests can assert on what was written, pushed, or published.

mod lis;
mod notifier;
mod repository;

pub use lis::InMemoryLisClient;
pub use notifier::RecordingRerunNotifier;
pub use repository::InMemoryTaskReviewRepository;
