//! Transactional application of a mutation plan.

use super::planner::MutationPlan;
use crate::review::{
    domain::RemarkId,
    ports::{TaskReviewRepository, TaskReviewRepositoryResult, TaskReviewTransaction},
};
use tracing::debug;

/// Plan that has been committed, with the identifiers assigned on insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommittedPlan {
    /// Applied plan.
    pub plan: MutationPlan,
    /// Identifiers of the inserted remarks, in plan order.
    pub created_remark_ids: Vec<RemarkId>,
}

/// Applies `plan` in one repository transaction.
///
/// # Errors
///
/// Returns the first repository error. Nothing the plan wrote is visible
/// afterwards.
pub async fn commit_plan<R>(
    repository: &R,
    plan: MutationPlan,
) -> TaskReviewRepositoryResult<CommittedPlan>
where
    R: TaskReviewRepository,
{
    repository
        .in_transaction(move |tx| {
            let created_remark_ids = apply_plan(tx, &plan)?;
            Ok(CommittedPlan {
                plan,
                created_remark_ids,
            })
        })
        .await
}

/// Writes every part of `plan` through `tx` in the fixed commit order.
///
/// The order is task, test details, investigations, investigation data,
/// rerun snapshots, the co-authorization swap, then remark creates, updates,
/// and deletes. Empty groups are skipped except the co-authorization delete,
/// which always runs.
///
/// # Errors
///
/// Returns the first error raised by `tx`; later steps are not attempted.
pub fn apply_plan(
    tx: &mut dyn TaskReviewTransaction,
    plan: &MutationPlan,
) -> TaskReviewRepositoryResult<Vec<RemarkId>> {
    let tombstone = plan.tombstone();

    tx.update_task(&plan.task)?;
    tx.update_test_details(&plan.test_details)?;
    tx.update_investigations(&plan.investigations)?;
    if !plan.data_creates.is_empty() {
        tx.create_investigation_data(&plan.data_creates)?;
    }
    if !plan.data_updates.is_empty() {
        tx.update_investigation_data(&plan.data_updates)?;
    }
    if !plan.rerun_results.is_empty() {
        tx.insert_rerun_results(&plan.rerun_results)?;
    }

    tx.delete_active_co_authorization(plan.task_id(), tombstone)?;
    if let Some(co_authorization) = plan.co_authorization.as_ref() {
        tx.insert_co_authorization(co_authorization)?;
    }

    let created_remark_ids = if plan.remark_creates.is_empty() {
        Vec::new()
    } else {
        tx.create_remarks(&plan.remark_creates)?
    };
    if !plan.remark_updates.is_empty() {
        tx.update_remarks(&plan.remark_updates)?;
    }
    if !plan.remark_deletes.is_empty() {
        tx.delete_remarks(&plan.remark_deletes, tombstone)?;
    }

    debug!(
        task_id = %plan.task_id(),
        test_details = plan.test_details.len(),
        investigations = plan.investigations.len(),
        rerun_results = plan.rerun_results.len(),
        remarks_created = created_remark_ids.len(),
        remarks_deleted = plan.remark_deletes.len(),
        "applied task review plan"
    );
    Ok(created_remark_ids)
}
