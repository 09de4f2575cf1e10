//! Shared world state for task review BDD scenarios.

#[path = "../in_memory/helpers.rs"]
pub mod helpers;

use labtask::review::{
    adapters::memory::{InMemoryLisClient, InMemoryTaskReviewRepository, RecordingRerunNotifier},
    domain::TestDetailUpdate,
    services::{TaskUpdateError, TaskUpdateOutcome},
};
use rstest::fixture;

/// Scenario world for task review behaviour tests.
pub struct TaskReviewWorld {
    pub repository: InMemoryTaskReviewRepository,
    pub lis: InMemoryLisClient,
    pub notifier: RecordingRerunNotifier,
    pub pending_test_details: Vec<TestDetailUpdate>,
    pub last_result: Option<Result<TaskUpdateOutcome, TaskUpdateError>>,
}

impl TaskReviewWorld {
    /// Creates a world over the seeded in-memory adapters.
    #[must_use]
    pub fn new() -> Self {
        Self {
            repository: helpers::repository(),
            lis: helpers::lis(),
            notifier: RecordingRerunNotifier::new(),
            pending_test_details: Vec::new(),
            last_result: None,
        }
    }

    /// Returns the outcome of the last submission.
    ///
    /// # Errors
    ///
    /// Returns an error when nothing was submitted or the submission failed.
    pub fn outcome(&self) -> Result<&TaskUpdateOutcome, eyre::Report> {
        match self.last_result.as_ref() {
            Some(Ok(outcome)) => Ok(outcome),
            Some(Err(err)) => Err(eyre::eyre!("update failed: {err}")),
            None => Err(eyre::eyre!("no update was submitted")),
        }
    }
}

impl Default for TaskReviewWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> TaskReviewWorld {
    TaskReviewWorld::default()
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
