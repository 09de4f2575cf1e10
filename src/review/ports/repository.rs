//! Repository port for task review reads and transactional writes.
//!
//! Reads are async and individually scoped. Writes are only reachable through
//! [`TaskReviewRepository::in_transaction`], which hands the work closure an
//! explicit [`TaskReviewTransaction`] handle and commits only when the closure
//! succeeds.

use crate::review::domain::{
    CoAuthorizedPathologist, InvestigationData, InvestigationId, InvestigationResult, NewRemark,
    PathologistAssignment, Remark, RemarkId, RerunInvestigationResult, Task, TaskId, TestDetail,
    TestDetailId, Tombstone, User, UserId, VisitLab,
};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for task review repository operations.
pub type TaskReviewRepositoryResult<T> = Result<T, TaskReviewRepositoryError>;

/// Read contract over the stored review state.
///
/// Every read filters soft-deleted rows. Lookups by identifier silently skip
/// identifiers that have no live row; callers compare the result against
/// what they asked for.
#[async_trait]
pub trait TaskReviewRepository: Send + Sync {
    /// Finds a task by identifier.
    async fn find_task(&self, id: TaskId) -> TaskReviewRepositoryResult<Option<Task>>;

    /// Returns the test details with the given identifiers.
    async fn find_test_details(
        &self,
        ids: &[TestDetailId],
    ) -> TaskReviewRepositoryResult<Vec<TestDetail>>;

    /// Returns every test detail of a task.
    async fn find_test_details_by_task(
        &self,
        task_id: TaskId,
    ) -> TaskReviewRepositoryResult<Vec<TestDetail>>;

    /// Returns the investigations with the given identifiers.
    async fn find_investigations(
        &self,
        ids: &[InvestigationId],
    ) -> TaskReviewRepositoryResult<Vec<InvestigationResult>>;

    /// Returns every investigation of the given test details.
    async fn find_investigations_by_test_details(
        &self,
        test_detail_ids: &[TestDetailId],
    ) -> TaskReviewRepositoryResult<Vec<InvestigationResult>>;

    /// Returns the data rows of the given investigations.
    async fn find_investigation_data(
        &self,
        investigation_ids: &[InvestigationId],
    ) -> TaskReviewRepositoryResult<Vec<InvestigationData>>;

    /// Returns the remarks with the given identifiers.
    async fn find_remarks(&self, ids: &[RemarkId]) -> TaskReviewRepositoryResult<Vec<Remark>>;

    /// Finds a user by identifier.
    async fn find_user(&self, id: UserId) -> TaskReviewRepositoryResult<Option<User>>;

    /// Finds the active pathologist assignment of a task.
    async fn find_active_assignment(
        &self,
        task_id: TaskId,
    ) -> TaskReviewRepositoryResult<Option<PathologistAssignment>>;

    /// Resolves the visits carrying samples for the given external test ids.
    ///
    /// Each distinct visit is returned once.
    async fn find_visits_by_external_test_ids(
        &self,
        external_test_ids: &[String],
    ) -> TaskReviewRepositoryResult<Vec<VisitLab>>;

    /// Runs `work` inside one transaction.
    ///
    /// Changes made through the handle become visible only when `work`
    /// returns `Ok`; an error rolls every change back and is returned as is.
    ///
    /// # Errors
    ///
    /// Returns the error produced by `work`, or
    /// [`TaskReviewRepositoryError::Persistence`] when the transaction cannot
    /// be opened or committed.
    async fn in_transaction<F, T>(&self, work: F) -> TaskReviewRepositoryResult<T>
    where
        F: FnOnce(&mut dyn TaskReviewTransaction) -> TaskReviewRepositoryResult<T>
            + Send
            + 'static,
        T: Send + 'static;
}

/// Write operations available inside a transaction.
pub trait TaskReviewTransaction {
    /// Persists the status, completion time, and audit columns of a task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskReviewRepositoryError::TaskNotFound`] when the task has
    /// no live row.
    fn update_task(&mut self, task: &Task) -> TaskReviewRepositoryResult<()>;

    /// Persists test detail statuses and approval sources.
    fn update_test_details(&mut self, test_details: &[TestDetail])
    -> TaskReviewRepositoryResult<()>;

    /// Persists investigation results.
    fn update_investigations(
        &mut self,
        investigations: &[InvestigationResult],
    ) -> TaskReviewRepositoryResult<()>;

    /// Inserts investigation data rows.
    fn create_investigation_data(
        &mut self,
        rows: &[InvestigationData],
    ) -> TaskReviewRepositoryResult<()>;

    /// Updates existing investigation data rows.
    fn update_investigation_data(
        &mut self,
        rows: &[InvestigationData],
    ) -> TaskReviewRepositoryResult<()>;

    /// Appends rerun snapshots.
    fn insert_rerun_results(
        &mut self,
        rows: &[RerunInvestigationResult],
    ) -> TaskReviewRepositoryResult<()>;

    /// Soft-deletes the active co-authorization of a task, if any.
    fn delete_active_co_authorization(
        &mut self,
        task_id: TaskId,
        tombstone: Tombstone,
    ) -> TaskReviewRepositoryResult<()>;

    /// Inserts a co-authorization row.
    fn insert_co_authorization(
        &mut self,
        row: &CoAuthorizedPathologist,
    ) -> TaskReviewRepositoryResult<()>;

    /// Inserts remarks and returns their assigned identifiers in order.
    fn create_remarks(&mut self, remarks: &[NewRemark])
    -> TaskReviewRepositoryResult<Vec<RemarkId>>;

    /// Updates remark text, type, and author.
    fn update_remarks(&mut self, remarks: &[Remark]) -> TaskReviewRepositoryResult<()>;

    /// Soft-deletes remarks.
    fn delete_remarks(
        &mut self,
        ids: &[RemarkId],
        tombstone: Tombstone,
    ) -> TaskReviewRepositoryResult<()>;
}

/// Errors returned by task review repository implementations.
#[derive(Debug, Clone, Error)]
pub enum TaskReviewRepositoryError {
    /// The task row to update does not exist.
    #[error("task not found: {0}")]
    TaskNotFound(TaskId),

    /// A row to update does not exist.
    #[error("{entity} not found: {id}")]
    RowNotFound {
        /// Table or entity name.
        entity: &'static str,
        /// Raw row key.
        id: u64,
    },

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl TaskReviewRepositoryError {
    /// Wraps a persistence error.
    #[must_use]
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }

    /// Creates a missing-row error.
    #[must_use]
    pub const fn row_not_found(entity: &'static str, id: u64) -> Self {
        Self::RowNotFound { entity, id }
    }
}

impl From<diesel::result::Error> for TaskReviewRepositoryError {
    fn from(err: diesel::result::Error) -> Self {
        Self::persistence(err)
    }
}
