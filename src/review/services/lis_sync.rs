//! Glue between committed review changes and the LIS.
//!
//! Orders are fetched and patched before the commit so that a failed fetch
//! leaves the store untouched. Patched orders are pushed after the commit;
//! a failed push is reported but never rolls the commit back.

use super::planner::{MutationPlan, values_by_lis_code};
use crate::review::{
    config::TaskUpdateConfig,
    domain::{LisLineFields, LisOrder, RemarkType, VisitId, VisitLab},
    ports::{LisClient, LisError, TaskReviewRepository, TaskReviewRepositoryError},
};
use chrono::{DateTime, Utc};
use futures::future::try_join_all;
use std::collections::{HashMap, HashSet};
use thiserror::Error;
use tracing::{debug, warn};

/// Errors raised while preparing LIS orders.
#[derive(Debug, Clone, Error)]
pub enum LisSyncError {
    /// Visit resolution failed.
    #[error(transparent)]
    Repository(#[from] TaskReviewRepositoryError),
    /// An order could not be fetched.
    #[error(transparent)]
    Lis(#[from] LisError),
}

/// Order patched for one visit and ready to push.
#[derive(Debug, Clone, PartialEq)]
pub struct PatchedOrder {
    /// Visit the order belongs to.
    pub visit: VisitLab,
    /// Patched order.
    pub order: LisOrder,
}

/// Visit whose order could not be pushed.
#[derive(Debug, Clone)]
pub struct SyncFailure {
    /// Visit of the rejected order.
    pub visit_id: VisitId,
    /// Error returned by the LIS.
    pub error: LisError,
}

/// State of the LIS mirror after a successful commit.
#[derive(Debug, Clone)]
pub enum SyncPhase {
    /// Committed with nothing to mirror, or every patched order was pushed.
    Committed,
    /// Committed; patched orders are left for an out-of-band push.
    SyncPending(Vec<PatchedOrder>),
    /// Committed; at least one order could not be pushed.
    SyncFailed(Vec<SyncFailure>),
}

impl SyncPhase {
    /// Returns `true` when the store and the LIS are known to agree.
    #[must_use]
    pub const fn is_consistent(&self) -> bool {
        matches!(self, Self::Committed)
    }
}

/// Line changes for test details entering rerun.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RerunPatch {
    /// LIS codes of the rerun tests.
    pub test_codes: HashSet<String>,
    /// New values keyed by LIS code.
    pub values: HashMap<String, String>,
    /// Rerun reason and remarks keyed by investigation LIS code.
    pub details: HashMap<String, (String, String)>,
    /// LIS operator id of the requesting user.
    pub operator_id: u64,
    /// Rerun timestamp in LIS format.
    pub rerun_time: String,
}

/// Line changes for approved test details.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApprovalPatch {
    /// LIS codes of the approved tests.
    pub test_codes: HashSet<String>,
    /// New values keyed by LIS code.
    pub values: HashMap<String, String>,
    /// Medical remarks keyed by investigation LIS code.
    pub medical_remarks: HashMap<String, String>,
    /// LIS operator id of the approving user.
    pub operator_id: u64,
    /// Approval timestamp in LIS format.
    pub approved_at: String,
}

/// Formats a timestamp the way the LIS expects, with seven fractional
/// digits and a literal `Z`.
#[must_use]
pub fn format_lis_timestamp(at: DateTime<Utc>) -> String {
    let fraction: String = at.format("%9f").to_string().chars().take(7).collect();
    format!("{}.{fraction}Z", at.format("%Y-%m-%dT%H:%M:%S"))
}

/// Builds the rerun patch of a plan, if any test enters rerun.
#[must_use]
pub fn rerun_patch(plan: &MutationPlan, operator_id: u64) -> Option<RerunPatch> {
    if plan.rerun_tests.is_empty() {
        return None;
    }
    Some(RerunPatch {
        test_codes: plan
            .rerun_tests
            .iter()
            .map(|test| test.lis_code.clone())
            .collect(),
        values: values_by_lis_code(plan),
        details: plan
            .rerun_results
            .iter()
            .map(|rerun| {
                (
                    rerun.lis_code.clone(),
                    (rerun.reason.clone(), rerun.remarks.clone()),
                )
            })
            .collect(),
        operator_id,
        rerun_time: format_lis_timestamp(plan.planned_at),
    })
}

/// Builds the approval patch of a plan, if any test is approved.
#[must_use]
pub fn approval_patch(plan: &MutationPlan, operator_id: u64) -> Option<ApprovalPatch> {
    if plan.approved_tests.is_empty() {
        return None;
    }
    let lis_codes: HashMap<_, _> = plan
        .investigations
        .iter()
        .map(|investigation| (investigation.id, investigation.lis_code.clone()))
        .collect();
    let medical_remarks = plan
        .remark_creates
        .iter()
        .filter(|remark| remark.remark_type == RemarkType::MedicalRemark)
        .map(|remark| (remark.investigation_id, remark.description.clone()))
        .chain(
            plan.remark_updates
                .iter()
                .map(|remark| (remark.investigation_id, remark.description.clone())),
        )
        .filter_map(|(investigation_id, description)| {
            lis_codes
                .get(&investigation_id)
                .map(|code| (code.clone(), description))
        })
        .collect();

    Some(ApprovalPatch {
        test_codes: plan
            .approved_tests
            .iter()
            .map(|test| test.lis_code.clone())
            .collect(),
        values: values_by_lis_code(plan),
        medical_remarks,
        operator_id,
        approved_at: format_lis_timestamp(plan.planned_at),
    })
}

/// Resolves the visits of `external_test_ids` and fetches one order per
/// visit concurrently.
///
/// Visits without a number or lab are skipped.
///
/// # Errors
///
/// Returns the visit lookup error or the first fetch error.
pub async fn fetch_visit_orders<R, L>(
    repository: &R,
    lis: &L,
    external_test_ids: &[String],
) -> Result<Vec<(VisitLab, LisOrder)>, LisSyncError>
where
    R: TaskReviewRepository + ?Sized,
    L: LisClient + ?Sized,
{
    if external_test_ids.is_empty() {
        return Ok(Vec::new());
    }
    let mut seen = HashSet::new();
    let visits: Vec<VisitLab> = repository
        .find_visits_by_external_test_ids(external_test_ids)
        .await?
        .into_iter()
        .filter(|visit| !visit.visit_id.is_blank() && !visit.lab_id.is_unset())
        .filter(|visit| seen.insert(visit.visit_id.clone()))
        .collect();

    debug!(visits = visits.len(), "fetching LIS orders");
    let orders = try_join_all(visits.iter().map(|visit| async move {
        let order = lis.fetch_order_by_visit(&visit.visit_id, visit.lab_id).await?;
        Ok::<_, LisError>((visit.clone(), order))
    }))
    .await?;
    Ok(orders)
}

/// Applies the patches to every fetched order and keeps the orders that
/// changed.
#[must_use]
pub fn patch_orders(
    orders: Vec<(VisitLab, LisOrder)>,
    rerun: Option<&RerunPatch>,
    approval: Option<&ApprovalPatch>,
    config: &TaskUpdateConfig,
) -> Vec<PatchedOrder> {
    orders
        .into_iter()
        .filter_map(|(visit, mut order)| {
            let rerun_hits = rerun.map_or(0, |patch| apply_rerun_patch(&mut order, patch, config));
            let approval_hits =
                approval.map_or(0, |patch| apply_approval_patch(&mut order, patch, config));
            (rerun_hits + approval_hits > 0).then_some(PatchedOrder { visit, order })
        })
        .collect()
}

/// Patches the lines of `order` whose test code is being rerun and returns
/// the number of top-level lines changed.
pub fn apply_rerun_patch(
    order: &mut LisOrder,
    patch: &RerunPatch,
    config: &TaskUpdateConfig,
) -> usize {
    let mut patched = 0;
    for line in order
        .lines
        .iter_mut()
        .filter(|line| patch.test_codes.contains(&line.fields.test_code))
    {
        patched += 1;
        let fields = &mut line.fields;
        mark_rerun(fields, patch, config);
        fields.rerun_reason.clone_from(&config.default_rerun_reason);
        fields.rerun_remarks.clone_from(&config.default_rerun_remark);
        if fields.test_type == config.lis_investigation_type {
            set_value(fields, &patch.values);
            if let Some((reason, remarks)) = patch.details.get(&fields.test_code) {
                fields.rerun_reason.clone_from(reason);
                fields.rerun_remarks.clone_from(remarks);
            }
        }

        for content in &mut line.contents {
            set_value(&mut content.fields, &patch.values);
            content.fields.user_id = patch.operator_id;
            apply_rerun_details(&mut content.fields, patch, config);

            for parameter in &mut content.parameters {
                parameter.fields.user_id = patch.operator_id;
                apply_rerun_details(&mut parameter.fields, patch, config);
                set_value(&mut parameter.fields, &patch.values);
            }
        }
    }
    patched
}

fn mark_rerun(fields: &mut LisLineFields, patch: &RerunPatch, config: &TaskUpdateConfig) {
    fields.test_status.clone_from(&config.lis_rerun_status);
    fields.user_id = patch.operator_id;
    fields.rerun_time.clone_from(&patch.rerun_time);
}

fn apply_rerun_details(fields: &mut LisLineFields, patch: &RerunPatch, config: &TaskUpdateConfig) {
    if let Some((reason, remarks)) = patch.details.get(&fields.test_code) {
        mark_rerun(fields, patch, config);
        fields.rerun_reason.clone_from(reason);
        fields.rerun_remarks.clone_from(remarks);
    }
}

/// Patches the lines of `order` whose test code is approved and returns
/// the number of top-level lines changed.
pub fn apply_approval_patch(
    order: &mut LisOrder,
    patch: &ApprovalPatch,
    config: &TaskUpdateConfig,
) -> usize {
    let mut patched = 0;
    for line in order
        .lines
        .iter_mut()
        .filter(|line| patch.test_codes.contains(&line.fields.test_code))
    {
        patched += 1;
        mark_approved(&mut line.fields, patch, config);
        if line.fields.test_type == config.lis_investigation_type {
            set_value(&mut line.fields, &patch.values);
            set_medical_remark(&mut line.fields, &patch.medical_remarks);
        }

        for content in &mut line.contents {
            mark_approved(&mut content.fields, patch, config);
            set_value(&mut content.fields, &patch.values);
            set_medical_remark(&mut content.fields, &patch.medical_remarks);

            for parameter in &mut content.parameters {
                mark_approved(&mut parameter.fields, patch, config);
                set_value(&mut parameter.fields, &patch.values);
                set_medical_remark(&mut parameter.fields, &patch.medical_remarks);
            }
        }
    }
    patched
}

fn mark_approved(fields: &mut LisLineFields, patch: &ApprovalPatch, config: &TaskUpdateConfig) {
    fields.test_status.clone_from(&config.lis_approved_status);
    fields.user_id = patch.operator_id;
    fields.result_approved_at = Some(patch.approved_at.clone());
    fields.rerun_reason.clear();
    fields.rerun_remarks.clear();
}

fn set_value(fields: &mut LisLineFields, values: &HashMap<String, String>) {
    if let Some(value) = values.get(&fields.test_code) {
        fields.test_value.clone_from(value);
    }
}

fn set_medical_remark(fields: &mut LisLineFields, remarks: &HashMap<String, String>) {
    match remarks.get(&fields.test_code) {
        Some(remark) => fields.medical_remarks.clone_from(remark),
        None => fields.medical_remarks.clear(),
    }
}

/// Pushes every patched order, one visit at a time.
///
/// Every order is attempted; failures are collected rather than stopping
/// the loop.
pub async fn push_orders<L>(lis: &L, orders: &[PatchedOrder]) -> SyncPhase
where
    L: LisClient + ?Sized,
{
    let mut failures = Vec::new();
    for patched in orders {
        if let Err(error) = lis.push_order(&patched.order).await {
            warn!(
                visit_id = %patched.visit.visit_id,
                order_id = %patched.order.order_id,
                error = %error,
                "LIS order push failed"
            );
            failures.push(SyncFailure {
                visit_id: patched.visit.visit_id.clone(),
                error,
            });
        }
    }
    if failures.is_empty() {
        SyncPhase::Committed
    } else {
        SyncPhase::SyncFailed(failures)
    }
}
