//! Mutation planning for a validated batch.
//!
//! Planning is pure. It turns a [`ValidatedBatch`] into the typed creates,
//! updates, and soft deletes the committer applies, plus the tests the LIS
//! must hear about.

use crate::review::{
    config::TaskUpdateConfig,
    domain::{
        AuditStamp, CoAuthorizedPathologist, InvestigationData, InvestigationResult,
        InvestigationStatus, NewRemark, Remark, RemarkId, RemarkType, RerunInvestigationResult,
        Task, TaskId, TaskStatus, TestDetail, TestDetailId, TestStatus, Tombstone, UserId,
    },
    validation::{
        ValidatedBatch, ValidatedInvestigation, ValidatedTestDetail, resolve_task_status,
    },
};
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};

/// Test detail whose new status must be mirrored to the LIS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AffectedTest {
    /// Test detail identifier.
    pub test_detail_id: TestDetailId,
    /// Central order-system test id used to locate the visit.
    pub external_test_id: String,
    /// Test code in the LIS.
    pub lis_code: String,
}

impl AffectedTest {
    fn from_test_detail(test_detail: &TestDetail) -> Self {
        Self {
            test_detail_id: test_detail.id,
            external_test_id: test_detail.external_test_id.clone(),
            lis_code: test_detail.lis_code.clone(),
        }
    }
}

/// Every change a validated batch makes, grouped by entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationPlan {
    /// User applying the plan.
    pub actor: UserId,
    /// Time the plan was made, used for every timestamp it writes.
    pub planned_at: DateTime<Utc>,
    /// Task with its derived status.
    pub task: Task,
    /// Test details with derived statuses.
    pub test_details: Vec<TestDetail>,
    /// Updated investigations.
    pub investigations: Vec<InvestigationResult>,
    /// Data rows to insert.
    pub data_creates: Vec<InvestigationData>,
    /// Data rows to update.
    pub data_updates: Vec<InvestigationData>,
    /// Rerun snapshots to append.
    pub rerun_results: Vec<RerunInvestigationResult>,
    /// Co-authorization replacing the active one, if any.
    pub co_authorization: Option<CoAuthorizedPathologist>,
    /// Remarks to insert.
    pub remark_creates: Vec<NewRemark>,
    /// Remarks to update in place.
    pub remark_updates: Vec<Remark>,
    /// Remarks to soft-delete, without duplicates.
    pub remark_deletes: Vec<RemarkId>,
    /// Test details entering rerun.
    pub rerun_tests: Vec<AffectedTest>,
    /// Test details becoming approved.
    pub approved_tests: Vec<AffectedTest>,
}

impl MutationPlan {
    /// Returns the task the plan applies to.
    #[must_use]
    pub const fn task_id(&self) -> TaskId {
        self.task.id
    }

    /// Returns the soft-delete marker used for every delete in the plan.
    #[must_use]
    pub const fn tombstone(&self) -> Tombstone {
        Tombstone {
            deleted_by: self.actor,
            deleted_at: self.planned_at,
        }
    }

    /// Returns the external test ids of test details entering rerun.
    #[must_use]
    pub fn rerun_external_test_ids(&self) -> Vec<String> {
        self.rerun_tests
            .iter()
            .map(|test| test.external_test_id.clone())
            .collect()
    }
}

/// Plans every change of a validated batch.
#[must_use]
pub fn plan_mutations(
    batch: &ValidatedBatch,
    config: &TaskUpdateConfig,
    now: DateTime<Utc>,
) -> MutationPlan {
    let actor = batch.acting_user.id;
    let mut plan = MutationPlan {
        actor,
        planned_at: now,
        task: plan_task(batch, actor, now),
        test_details: Vec::with_capacity(batch.test_details.len()),
        investigations: Vec::new(),
        data_creates: Vec::new(),
        data_updates: Vec::new(),
        rerun_results: Vec::new(),
        co_authorization: batch.co_authorize_to.map(|target| CoAuthorizedPathologist {
            task_id: batch.task.id,
            co_authorized_by: actor,
            co_authorized_to: target,
            co_authorized_at: now,
            audit: AuditStamp::created(actor, now),
            tombstone: None,
        }),
        remark_creates: Vec::new(),
        remark_updates: Vec::new(),
        remark_deletes: Vec::new(),
        rerun_tests: Vec::new(),
        approved_tests: Vec::new(),
    };

    for test_detail in &batch.test_details {
        let planned = plan_test_detail(test_detail, config, actor, now);
        match planned.status {
            TestStatus::RerunRequested => {
                plan.rerun_tests.push(AffectedTest::from_test_detail(&planned));
            }
            TestStatus::Approve => {
                plan.approved_tests
                    .push(AffectedTest::from_test_detail(&planned));
            }
            _ => {}
        }
        plan.test_details.push(planned);

        for investigation in &test_detail.investigations {
            plan.investigations
                .push(plan_investigation(investigation, config, actor, now));
            plan_data(&mut plan, batch, investigation, config, now);
            if investigation.requested == InvestigationStatus::Rerun {
                plan.rerun_results
                    .push(plan_rerun(test_detail, investigation, config, actor, now));
            }
            plan_remarks(&mut plan, batch, investigation, actor, now);
        }
    }

    dedupe_in_place(&mut plan.remark_deletes);
    plan
}

fn plan_task(batch: &ValidatedBatch, actor: UserId, now: DateTime<Utc>) -> Task {
    let mut task = batch.task.clone();
    task.status = resolve_task_status(batch.merged_statuses.iter().copied());
    if task.status == TaskStatus::Completed {
        task.completed_at = Some(now);
    }
    task.audit.touch(actor, now);
    task
}

fn plan_test_detail(
    test_detail: &ValidatedTestDetail,
    config: &TaskUpdateConfig,
    actor: UserId,
    now: DateTime<Utc>,
) -> TestDetail {
    let mut planned = test_detail.stored.clone();
    planned.status = test_detail.status;
    if planned.status == TestStatus::Approve {
        planned.approval_source = Some(config.approval_source.clone());
    }
    planned.audit.touch(actor, now);
    planned
}

fn plan_investigation(
    investigation: &ValidatedInvestigation,
    config: &TaskUpdateConfig,
    actor: UserId,
    now: DateTime<Utc>,
) -> InvestigationResult {
    let update = &investigation.update;
    let mut planned = investigation.stored.clone();
    planned.status = investigation.effective;
    planned.value.clone_from(&update.value);
    planned.abnormality.clone_from(&update.abnormality);
    planned.is_abnormal = config.is_abnormal(&update.abnormality);

    if investigation.effective == InvestigationStatus::Approve {
        planned.approved_by = Some(actor);
        planned.approved_at = Some(now);
    } else if investigation.approval_reset() {
        planned.approved_by = None;
        planned.approved_at = None;
    }
    planned.audit.touch(actor, now);
    planned
}

fn plan_data(
    plan: &mut MutationPlan,
    batch: &ValidatedBatch,
    investigation: &ValidatedInvestigation,
    config: &TaskUpdateConfig,
    now: DateTime<Utc>,
) {
    let Some(payload) = investigation.update.data_payload() else {
        return;
    };
    if let Some(existing) = batch.investigation_data.get(&investigation.id()) {
        let mut row = existing.clone();
        payload.clone_into(&mut row.data);
        row.audit.touch(plan.actor, now);
        plan.data_updates.push(row);
    } else {
        plan.data_creates.push(InvestigationData {
            investigation_id: investigation.id(),
            data: payload.to_owned(),
            data_type: config.investigation_data_type.clone(),
            audit: AuditStamp::created(plan.actor, now),
        });
    }
}

fn plan_rerun(
    test_detail: &ValidatedTestDetail,
    investigation: &ValidatedInvestigation,
    config: &TaskUpdateConfig,
    actor: UserId,
    now: DateTime<Utc>,
) -> RerunInvestigationResult {
    let stored = &investigation.stored;
    let reason = investigation
        .update
        .rerun_reason()
        .unwrap_or(&config.default_rerun_reason)
        .to_owned();

    RerunInvestigationResult {
        test_detail_id: test_detail.stored.id,
        investigation_id: stored.id,
        master_investigation_id: stored.master_investigation_id,
        name: stored.name.clone(),
        value: stored.value.clone(),
        device_value: stored.device_value.clone(),
        result_representation_type: stored.result_representation_type.clone(),
        lis_code: stored.lis_code.clone(),
        triggered_by: actor,
        triggered_at: now,
        remarks: reason.clone(),
        reason,
        entered_by: stored.entered_by,
        entered_at: stored.entered_at,
        audit: AuditStamp::created(actor, now),
    }
}

fn plan_remarks(
    plan: &mut MutationPlan,
    batch: &ValidatedBatch,
    investigation: &ValidatedInvestigation,
    actor: UserId,
    now: DateTime<Utc>,
) {
    let Some(remarks) = investigation.update.remarks.as_ref() else {
        return;
    };

    if let Some(medical) = remarks.medical.as_ref() {
        let existing = medical.id.filter(|id| !id.is_unset());
        match existing {
            Some(remark_id) if medical.delete => plan.remark_deletes.push(remark_id),
            Some(remark_id) if !medical.description.is_empty() => {
                if let Some(stored) = batch.remarks.get(&remark_id) {
                    let mut updated = stored.clone();
                    updated.description.clone_from(&medical.description);
                    updated.remark_type = RemarkType::MedicalRemark;
                    updated.remark_by = actor;
                    updated.audit.touch(actor, now);
                    plan.remark_updates.push(updated);
                }
            }
            None if !medical.description.is_empty() => plan.remark_creates.push(NewRemark {
                investigation_id: investigation.id(),
                description: medical.description.clone(),
                remark_type: RemarkType::MedicalRemark,
                remark_by: actor,
                audit: AuditStamp::created(actor, now),
            }),
            _ => {}
        }
    }

    let withheld_reason = remarks
        .withheld_reason
        .as_ref()
        .map(|reason| reason.description.as_str())
        .filter(|description| !description.is_empty());
    if investigation.requested == InvestigationStatus::Withheld {
        if let Some(description) = withheld_reason {
            plan.remark_creates.push(NewRemark {
                investigation_id: investigation.id(),
                description: description.to_owned(),
                remark_type: RemarkType::WithheldReason,
                remark_by: actor,
                audit: AuditStamp::created(actor, now),
            });
        }
    }
}

fn dedupe_in_place(ids: &mut Vec<RemarkId>) {
    let mut seen = HashSet::with_capacity(ids.len());
    ids.retain(|id| seen.insert(*id));
}

/// Maps each LIS code of the planned investigations to its new value.
#[must_use]
pub fn values_by_lis_code(plan: &MutationPlan) -> HashMap<String, String> {
    plan.investigations
        .iter()
        .map(|investigation| (investigation.lis_code.clone(), investigation.value.clone()))
        .collect()
}
