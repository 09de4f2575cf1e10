//! Service orchestrating one batched task review update.

use super::{
    committer::{CommittedPlan, commit_plan},
    lis_sync::{
        LisSyncError, PatchedOrder, SyncPhase, approval_patch, fetch_visit_orders, patch_orders,
        push_orders, rerun_patch,
    },
    planner::{MutationPlan, plan_mutations},
};
use crate::review::{
    config::{LisSyncMode, TaskUpdateConfig},
    domain::{
        InvestigationResult, RemarkId, Task, TestDetail, UpdateTaskRequest, User, UserId,
    },
    ports::{
        LisClient, LisError, RerunNotification, RerunNotifier, TaskReviewRepository,
        TaskReviewRepositoryError,
    },
    validation::{
        BatchRejection, CurrentState, MissingEntity, ProposedState, ValidationError,
        check_approved_values, validate_batch,
    },
};
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Why the acting user may not update the task.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConflictReason {
    /// The task has no active pathologist assignment.
    #[error("task has no active pathologist assignment")]
    NoActiveAssignment,
    /// The task is assigned to another pathologist.
    #[error("task is assigned to pathologist {assigned}, not {acting}")]
    NotAssignedPathologist {
        /// Pathologist holding the assignment.
        assigned: UserId,
        /// User submitting the update.
        acting: UserId,
    },
    /// The acting user does not exist.
    #[error("user {0} does not exist")]
    UnknownUser(UserId),
    /// The acting user's type may not review tasks.
    #[error("user type '{0}' may not review tasks")]
    UserTypeNotAllowed(String),
    /// The acting user has no numeric LIS operator id.
    #[error("user has no numeric LIS user id")]
    MissingLisUserId,
    /// The acting user has no system user id.
    #[error("user has no system user id")]
    MissingSystemUserId,
}

/// Broad category of a [`TaskUpdateError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskUpdateErrorKind {
    /// The batch is malformed or violates a rule.
    Validation,
    /// The acting user may not update the task.
    Conflict,
    /// A referenced row does not exist.
    NotFound,
    /// Storage or LIS failure.
    Internal,
}

/// Service-level errors for task review updates.
#[derive(Debug, Clone, Error)]
pub enum TaskUpdateError {
    /// The batch was rejected by validation; nothing was written.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// The acting user may not update the task; nothing was written.
    #[error("update not allowed: {0}")]
    Conflict(#[from] ConflictReason),
    /// The batch references a missing row; nothing was written.
    #[error(transparent)]
    NotFound(#[from] MissingEntity),
    /// A read or the commit transaction failed; nothing was written.
    #[error(transparent)]
    Repository(#[from] TaskReviewRepositoryError),
    /// An LIS order could not be fetched; nothing was written.
    #[error("LIS order fetch failed: {0}")]
    LisFetch(#[from] LisError),
}

impl TaskUpdateError {
    /// Returns the error category.
    #[must_use]
    pub const fn kind(&self) -> TaskUpdateErrorKind {
        match self {
            Self::Validation(_) => TaskUpdateErrorKind::Validation,
            Self::Conflict(_) => TaskUpdateErrorKind::Conflict,
            Self::NotFound(_) => TaskUpdateErrorKind::NotFound,
            Self::Repository(_) | Self::LisFetch(_) => TaskUpdateErrorKind::Internal,
        }
    }

    /// Returns the HTTP status code matching the error category.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self.kind() {
            TaskUpdateErrorKind::Validation => 400,
            TaskUpdateErrorKind::Conflict => 409,
            TaskUpdateErrorKind::NotFound => 404,
            TaskUpdateErrorKind::Internal => 500,
        }
    }
}

impl From<BatchRejection> for TaskUpdateError {
    fn from(rejection: BatchRejection) -> Self {
        match rejection {
            BatchRejection::Invalid(err) => Self::Validation(err),
            BatchRejection::Missing(entity) => Self::NotFound(entity),
        }
    }
}

impl From<LisSyncError> for TaskUpdateError {
    fn from(err: LisSyncError) -> Self {
        match err {
            LisSyncError::Repository(err) => Self::Repository(err),
            LisSyncError::Lis(err) => Self::LisFetch(err),
        }
    }
}

/// Result type for task update service operations.
pub type TaskUpdateResult<T> = Result<T, TaskUpdateError>;

/// Committed state of the task after an update.
#[derive(Debug, Clone)]
pub struct TaskUpdateOutcome {
    /// Task with its derived status.
    pub task: Task,
    /// Updated test details.
    pub test_details: Vec<TestDetail>,
    /// Updated investigations.
    pub investigations: Vec<InvestigationResult>,
    /// Identifiers of the remarks inserted by the update.
    pub created_remark_ids: Vec<RemarkId>,
    /// Number of rerun snapshots appended.
    pub rerun_results_created: usize,
    /// State of the LIS mirror.
    pub sync: SyncPhase,
}

/// Reviewer who passed the assignment precondition.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Reviewer {
    user: User,
    lis_operator_id: u64,
}

/// Task review update orchestration service.
pub struct TaskUpdateService<R, L, N, C>
where
    R: TaskReviewRepository,
    L: LisClient,
    N: RerunNotifier + 'static,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    lis: Arc<L>,
    notifier: Arc<N>,
    clock: Arc<C>,
    config: TaskUpdateConfig,
}

impl<R, L, N, C> TaskUpdateService<R, L, N, C>
where
    R: TaskReviewRepository,
    L: LisClient,
    N: RerunNotifier + 'static,
    C: Clock + Send + Sync,
{
    /// Creates a service with the default configuration.
    #[must_use]
    pub fn new(repository: Arc<R>, lis: Arc<L>, notifier: Arc<N>, clock: Arc<C>) -> Self {
        Self::with_config(repository, lis, notifier, clock, TaskUpdateConfig::default())
    }

    /// Creates a service with an explicit configuration.
    #[must_use]
    pub const fn with_config(
        repository: Arc<R>,
        lis: Arc<L>,
        notifier: Arc<N>,
        clock: Arc<C>,
        config: TaskUpdateConfig,
    ) -> Self {
        Self {
            repository,
            lis,
            notifier,
            clock,
            config,
        }
    }

    /// Returns the active configuration.
    #[must_use]
    pub const fn config(&self) -> &TaskUpdateConfig {
        &self.config
    }

    /// Validates, plans, and commits one batched update of a task.
    ///
    /// Reruns, and approvals when mirroring is enabled, are patched into the
    /// LIS orders of the affected visits. The orders are fetched before the
    /// commit and pushed after it.
    ///
    /// # Errors
    ///
    /// Returns [`TaskUpdateError`] when the precondition, validation, any
    /// fetch, or the commit fails. In every error case nothing was written.
    /// A failed LIS push is reported as [`SyncPhase::SyncFailed`] in a
    /// successful outcome.
    pub async fn update_task(
        &self,
        request: UpdateTaskRequest,
    ) -> TaskUpdateResult<TaskUpdateOutcome> {
        let reviewer = self.authorize(&request).await?;
        check_approved_values(&request)?;

        let (proposed, current) = tokio::try_join!(
            self.fetch_proposed(&request),
            self.fetch_current(&request, reviewer.user.clone())
        )?;
        let batch = validate_batch(&request, proposed, current)?;
        let plan = plan_mutations(&batch, &self.config, self.clock.utc());
        debug!(
            task_id = %request.task_id,
            status = %plan.task.status,
            reruns = plan.rerun_tests.len(),
            approvals = plan.approved_tests.len(),
            "planned task review update"
        );

        let orders = self.prepare_orders(&plan, reviewer.lis_operator_id).await?;
        let committed = commit_plan(self.repository.as_ref(), plan).await?;
        info!(
            task_id = %committed.plan.task_id(),
            status = %committed.plan.task.status,
            remarks_created = committed.created_remark_ids.len(),
            "committed task review update"
        );

        let sync = self.sync_orders(orders).await;
        self.notify_reruns(&committed.plan, reviewer.user.id);
        Ok(outcome(committed, sync))
    }

    async fn authorize(&self, request: &UpdateTaskRequest) -> TaskUpdateResult<Reviewer> {
        let assignment = self
            .repository
            .find_active_assignment(request.task_id)
            .await?
            .filter(|assignment| assignment.is_active)
            .ok_or(ConflictReason::NoActiveAssignment)?;
        if assignment.pathologist_id != request.acting_user_id {
            return Err(ConflictReason::NotAssignedPathologist {
                assigned: assignment.pathologist_id,
                acting: request.acting_user_id,
            }
            .into());
        }

        let user = self
            .repository
            .find_user(request.acting_user_id)
            .await?
            .ok_or(ConflictReason::UnknownUser(request.acting_user_id))?;
        if !self.config.allows_user_type(&user.user_type) {
            return Err(ConflictReason::UserTypeNotAllowed(user.user_type).into());
        }
        let lis_operator_id = user
            .lis_user_id
            .as_deref()
            .and_then(|id| id.trim().parse::<u64>().ok())
            .ok_or(ConflictReason::MissingLisUserId)?;
        if user
            .system_user_id
            .as_deref()
            .is_none_or(|id| id.trim().is_empty())
        {
            return Err(ConflictReason::MissingSystemUserId.into());
        }

        Ok(Reviewer {
            user,
            lis_operator_id,
        })
    }

    async fn fetch_proposed(&self, request: &UpdateTaskRequest) -> TaskUpdateResult<ProposedState> {
        let test_detail_ids = request.test_detail_ids();
        let investigation_ids = request.investigation_ids();
        let remark_ids = request.medical_remark_ids();

        let task = self
            .repository
            .find_task(request.task_id)
            .await?
            .ok_or(MissingEntity::Task(request.task_id))?;
        let test_details = self.repository.find_test_details(&test_detail_ids).await?;
        let investigations = self
            .repository
            .find_investigations(&investigation_ids)
            .await?;
        let investigation_data = self
            .repository
            .find_investigation_data(&investigation_ids)
            .await?;
        let remarks = if remark_ids.is_empty() {
            Vec::new()
        } else {
            self.repository.find_remarks(&remark_ids).await?
        };

        Ok(ProposedState {
            task,
            test_details,
            investigations,
            investigation_data,
            remarks,
        })
    }

    async fn fetch_current(
        &self,
        request: &UpdateTaskRequest,
        acting_user: User,
    ) -> TaskUpdateResult<CurrentState> {
        let test_details = self
            .repository
            .find_test_details_by_task(request.task_id)
            .await?;
        let test_detail_ids: Vec<_> = test_details.iter().map(|detail| detail.id).collect();
        let investigations = self
            .repository
            .find_investigations_by_test_details(&test_detail_ids)
            .await?;

        Ok(CurrentState {
            test_details,
            investigations,
            acting_user,
        })
    }

    async fn prepare_orders(
        &self,
        plan: &MutationPlan,
        lis_operator_id: u64,
    ) -> TaskUpdateResult<Vec<PatchedOrder>> {
        let rerun = rerun_patch(plan, lis_operator_id);
        let approval = if self.config.mirror_approvals {
            approval_patch(plan, lis_operator_id)
        } else {
            None
        };
        if rerun.is_none() && approval.is_none() {
            return Ok(Vec::new());
        }

        let mut external_test_ids = plan.rerun_external_test_ids();
        if approval.is_some() {
            external_test_ids.extend(
                plan.approved_tests
                    .iter()
                    .map(|test| test.external_test_id.clone()),
            );
        }

        let fetched = fetch_visit_orders(
            self.repository.as_ref(),
            self.lis.as_ref(),
            &external_test_ids,
        )
        .await?;
        Ok(patch_orders(
            fetched,
            rerun.as_ref(),
            approval.as_ref(),
            &self.config,
        ))
    }

    async fn sync_orders(&self, orders: Vec<PatchedOrder>) -> SyncPhase {
        if orders.is_empty() {
            return SyncPhase::Committed;
        }
        match self.config.lis_sync_mode {
            LisSyncMode::Deferred => {
                debug!(orders = orders.len(), "deferring LIS order push");
                SyncPhase::SyncPending(orders)
            }
            LisSyncMode::Immediate => push_orders(self.lis.as_ref(), &orders).await,
        }
    }

    fn notify_reruns(&self, plan: &MutationPlan, requested_by: UserId) {
        let external_test_ids = plan.rerun_external_test_ids();
        if external_test_ids.is_empty() {
            return;
        }
        let notification = RerunNotification::new(
            plan.task_id(),
            external_test_ids,
            requested_by,
            plan.planned_at,
        );
        let notifier = Arc::clone(&self.notifier);
        tokio::spawn(async move {
            let event_id = notification.event_id;
            if let Err(err) = notifier.publish(notification).await {
                warn!(%event_id, error = %err, "rerun notification failed");
            }
        });
    }
}

fn outcome(committed: CommittedPlan, sync: SyncPhase) -> TaskUpdateOutcome {
    let CommittedPlan {
        plan,
        created_remark_ids,
    } = committed;
    TaskUpdateOutcome {
        task: plan.task,
        test_details: plan.test_details,
        investigations: plan.investigations,
        created_remark_ids,
        rerun_results_created: plan.rerun_results.len(),
        sync,
    }
}
