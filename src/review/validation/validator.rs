//! Batch validation against the stored review state.
//!
//! The validator is pure: it receives the rows fetched for the proposed
//! batch and the current rows of the task, and either rejects the batch or
//! returns a [`ValidatedBatch`] carrying the derived statuses the planner
//! needs.

use super::error::{BatchRejection, MissingEntity, ValidationError};
use crate::review::domain::{
    InvestigationData, InvestigationId, InvestigationResult, InvestigationStatus,
    InvestigationUpdate, Remark, RemarkId, Task, TaskId, TestDetail, TestDetailId,
    TestDetailUpdate, TestStatus, UpdateTaskRequest, User, UserId,
};
use std::collections::{HashMap, HashSet};

/// Rows fetched for the identifiers named in a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProposedState {
    /// Task being updated.
    pub task: Task,
    /// Test details named by the batch.
    pub test_details: Vec<TestDetail>,
    /// Investigations named by the batch.
    pub investigations: Vec<InvestigationResult>,
    /// Existing data rows of the named investigations.
    pub investigation_data: Vec<InvestigationData>,
    /// Medical remarks named by the batch.
    pub remarks: Vec<Remark>,
}

/// Rows currently stored for the task, independent of the batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentState {
    /// Every test detail of the task.
    pub test_details: Vec<TestDetail>,
    /// Every investigation of those test details.
    pub investigations: Vec<InvestigationResult>,
    /// User submitting the batch.
    pub acting_user: User,
}

/// Investigation update that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedInvestigation {
    /// Stored row before the update.
    pub stored: InvestigationResult,
    /// Submitted update.
    pub update: InvestigationUpdate,
    /// Status as submitted.
    pub requested: InvestigationStatus,
    /// Status to persist. Differs from `requested` only when an approval is
    /// reset because a sibling entered rerun.
    pub effective: InvestigationStatus,
}

impl ValidatedInvestigation {
    /// Returns the investigation identifier.
    #[must_use]
    pub const fn id(&self) -> InvestigationId {
        self.stored.id
    }

    /// Returns `true` when a submitted approval was reset to pending.
    #[must_use]
    pub fn approval_reset(&self) -> bool {
        self.requested == InvestigationStatus::Approve
            && self.effective == InvestigationStatus::Pending
    }
}

/// Test detail update that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedTestDetail {
    /// Stored row before the update.
    pub stored: TestDetail,
    /// Derived test status.
    pub status: TestStatus,
    /// Validated investigations in submission order.
    pub investigations: Vec<ValidatedInvestigation>,
}

/// Batch that passed every validation rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedBatch {
    /// Task being updated, as stored.
    pub task: Task,
    /// User submitting the batch.
    pub acting_user: User,
    /// Validated test details in submission order.
    pub test_details: Vec<ValidatedTestDetail>,
    /// Co-authorization target shared by every co-authorize investigation.
    pub co_authorize_to: Option<UserId>,
    /// Derived statuses of submitted test details followed by the stored
    /// statuses of untouched ones.
    pub merged_statuses: Vec<TestStatus>,
    /// Existing data rows keyed by investigation.
    pub investigation_data: HashMap<InvestigationId, InvestigationData>,
    /// Referenced medical remarks keyed by identifier.
    pub remarks: HashMap<RemarkId, Remark>,
}

impl ValidatedBatch {
    /// Iterates over test details that enter rerun.
    pub fn rerun_test_details(&self) -> impl Iterator<Item = &ValidatedTestDetail> {
        self.test_details
            .iter()
            .filter(|test_detail| test_detail.status == TestStatus::RerunRequested)
    }

    /// Iterates over test details that become approved.
    pub fn approved_test_details(&self) -> impl Iterator<Item = &ValidatedTestDetail> {
        self.test_details
            .iter()
            .filter(|test_detail| test_detail.status == TestStatus::Approve)
    }
}

/// Rejects approvals that carry a negative value.
///
/// Runs before any row is fetched. A value is negative when it parses to a
/// number below zero or starts with `-`.
///
/// # Errors
///
/// Returns [`ValidationError::NegativeApprovedValue`] for the first offending
/// investigation.
pub fn check_approved_values(request: &UpdateTaskRequest) -> Result<(), ValidationError> {
    let offending = request.investigations().find(|investigation| {
        InvestigationStatus::try_from(investigation.status.as_str())
            .is_ok_and(|status| status == InvestigationStatus::Approve)
            && is_negative(&investigation.value)
    });

    match offending {
        Some(investigation) => Err(ValidationError::NegativeApprovedValue {
            investigation_id: investigation.investigation_id,
            value: investigation.value.clone(),
        }),
        None => Ok(()),
    }
}

fn is_negative(value: &str) -> bool {
    value.starts_with('-') || value.trim().parse::<f64>().is_ok_and(|number| number < 0.0)
}

/// Validates a batch against the proposed and current rows.
///
/// # Errors
///
/// Returns [`BatchRejection::Missing`] when the batch names a row that does
/// not exist and [`BatchRejection::Invalid`] for the first rule violation.
pub fn validate_batch(
    request: &UpdateTaskRequest,
    proposed: ProposedState,
    current: CurrentState,
) -> Result<ValidatedBatch, BatchRejection> {
    let ProposedState {
        task,
        test_details,
        investigations,
        investigation_data,
        remarks,
    } = proposed;
    let CurrentState {
        test_details: current_test_details,
        investigations: current_investigations,
        acting_user,
    } = current;

    let mut stored_test_details: HashMap<TestDetailId, TestDetail> = test_details
        .into_iter()
        .map(|test_detail| (test_detail.id, test_detail))
        .collect();
    let mut stored_investigations: HashMap<InvestigationId, InvestigationResult> = investigations
        .into_iter()
        .map(|investigation| (investigation.id, investigation))
        .collect();
    let current_ids = group_investigation_ids(&current_investigations);

    let mut seen = HashSet::new();
    let mut validated = Vec::with_capacity(request.test_details.len());
    for submitted in &request.test_details {
        if !seen.insert(submitted.test_detail_id) {
            return Err(ValidationError::DuplicateTestDetail(submitted.test_detail_id).into());
        }
        let stored = take_test_detail(&mut stored_test_details, submitted, task.id)?;
        check_investigation_ids(submitted, &current_ids)?;
        let parsed = take_investigations(&mut stored_investigations, submitted)?;
        validated.push(derive_test_status(stored, parsed)?);
    }

    let co_authorize_to = resolve_co_authorize_target(&validated, request.acting_user_id)?;
    let merged_statuses = merge_statuses(&validated, &current_test_details);
    check_withheld_co_authorize(&merged_statuses)?;

    let remarks: HashMap<RemarkId, Remark> = remarks
        .into_iter()
        .map(|remark| (remark.id, remark))
        .collect();
    check_remarks(&validated, &remarks)?;

    Ok(ValidatedBatch {
        task,
        acting_user,
        test_details: validated,
        co_authorize_to,
        merged_statuses,
        investigation_data: investigation_data
            .into_iter()
            .map(|row| (row.investigation_id, row))
            .collect(),
        remarks,
    })
}

fn group_investigation_ids(
    investigations: &[InvestigationResult],
) -> HashMap<TestDetailId, Vec<InvestigationId>> {
    let mut grouped: HashMap<TestDetailId, Vec<InvestigationId>> = HashMap::new();
    for investigation in investigations {
        grouped
            .entry(investigation.test_detail_id)
            .or_default()
            .push(investigation.id);
    }
    for ids in grouped.values_mut() {
        ids.sort_unstable();
    }
    grouped
}

fn take_test_detail(
    stored: &mut HashMap<TestDetailId, TestDetail>,
    submitted: &TestDetailUpdate,
    task_id: TaskId,
) -> Result<TestDetail, BatchRejection> {
    let test_detail = stored
        .remove(&submitted.test_detail_id)
        .ok_or(MissingEntity::TestDetail(submitted.test_detail_id))?;
    if test_detail.task_id != task_id {
        return Err(ValidationError::TestDetailNotInTask {
            test_detail_id: test_detail.id,
            task_id,
        }
        .into());
    }
    Ok(test_detail)
}

fn check_investigation_ids(
    submitted: &TestDetailUpdate,
    current_ids: &HashMap<TestDetailId, Vec<InvestigationId>>,
) -> Result<(), ValidationError> {
    let mut submitted_ids: Vec<InvestigationId> = submitted
        .investigations
        .iter()
        .map(|investigation| investigation.investigation_id)
        .collect();
    submitted_ids.sort_unstable();

    let stored_ids = current_ids
        .get(&submitted.test_detail_id)
        .map_or(&[][..], Vec::as_slice);

    if submitted_ids.is_empty() && stored_ids.is_empty() {
        return Err(ValidationError::EmptyTestDetail(submitted.test_detail_id));
    }
    if submitted_ids != stored_ids {
        return Err(ValidationError::InvestigationIdsMismatch(
            submitted.test_detail_id,
        ));
    }
    Ok(())
}

fn take_investigations(
    stored: &mut HashMap<InvestigationId, InvestigationResult>,
    submitted: &TestDetailUpdate,
) -> Result<Vec<ValidatedInvestigation>, BatchRejection> {
    submitted
        .investigations
        .iter()
        .map(|update| -> Result<ValidatedInvestigation, BatchRejection> {
            let row = stored
                .remove(&update.investigation_id)
                .ok_or(MissingEntity::Investigation(update.investigation_id))?;
            if row.test_detail_id != submitted.test_detail_id {
                return Err(
                    ValidationError::InvestigationIdsMismatch(submitted.test_detail_id).into(),
                );
            }
            let requested = InvestigationStatus::try_from(update.status.as_str()).map_err(|_| {
                ValidationError::InvalidInvestigationStatus {
                    investigation_id: update.investigation_id,
                    status: update.status.clone(),
                }
            })?;
            Ok(ValidatedInvestigation {
                stored: row,
                update: update.clone(),
                requested,
                effective: requested,
            })
        })
        .collect()
}

fn derive_test_status(
    stored: TestDetail,
    mut investigations: Vec<ValidatedInvestigation>,
) -> Result<ValidatedTestDetail, ValidationError> {
    let has_rerun = investigations
        .iter()
        .any(|investigation| investigation.requested == InvestigationStatus::Rerun);

    let status = if has_rerun {
        for investigation in &mut investigations {
            match investigation.requested {
                InvestigationStatus::Rerun => {}
                InvestigationStatus::Approve => {
                    investigation.effective = InvestigationStatus::Pending;
                }
                _ => {
                    return Err(ValidationError::RerunStatusCoupling {
                        test_detail_id: stored.id,
                        investigation_id: investigation.id(),
                    });
                }
            }
        }
        TestStatus::RerunRequested
    } else {
        let Some(first) = investigations.first() else {
            return Err(ValidationError::EmptyTestDetail(stored.id));
        };
        let (shared, spelling) = (first.requested, first.update.status.trim());
        // An alias and its canonical spelling count as different statuses.
        if investigations
            .iter()
            .any(|investigation| investigation.update.status.trim() != spelling)
        {
            return Err(ValidationError::InvestigationStatusMismatch(stored.id));
        }
        TestStatus::from_homogeneous(shared).ok_or(ValidationError::InvalidTestStatus(stored.id))?
    };

    Ok(ValidatedTestDetail {
        stored,
        status,
        investigations,
    })
}

fn resolve_co_authorize_target(
    test_details: &[ValidatedTestDetail],
    acting_user_id: UserId,
) -> Result<Option<UserId>, ValidationError> {
    let mut target: Option<UserId> = None;
    let co_authorizing = test_details
        .iter()
        .flat_map(|test_detail| test_detail.investigations.iter())
        .filter(|investigation| investigation.requested == InvestigationStatus::CoAuthorize);

    for investigation in co_authorizing {
        let named = investigation
            .update
            .co_authorize_to
            .filter(|user_id| !user_id.is_unset());
        match target {
            None => {
                let first =
                    named.ok_or(ValidationError::CoAuthorizeTargetMissing(investigation.id()))?;
                if first == acting_user_id {
                    return Err(ValidationError::CoAuthorizeToSelf(investigation.id()));
                }
                target = Some(first);
            }
            Some(expected) if named != Some(expected) => {
                return Err(ValidationError::CoAuthorizeTargetMismatch {
                    investigation_id: investigation.id(),
                    expected,
                });
            }
            Some(_) => {}
        }
    }
    Ok(target)
}

fn merge_statuses(
    validated: &[ValidatedTestDetail],
    current_test_details: &[TestDetail],
) -> Vec<TestStatus> {
    let submitted: HashSet<TestDetailId> = validated
        .iter()
        .map(|test_detail| test_detail.stored.id)
        .collect();
    validated
        .iter()
        .map(|test_detail| test_detail.status)
        .chain(
            current_test_details
                .iter()
                .filter(|test_detail| !submitted.contains(&test_detail.id))
                .map(|test_detail| test_detail.status),
        )
        .collect()
}

fn check_withheld_co_authorize(statuses: &[TestStatus]) -> Result<(), ValidationError> {
    let withheld = statuses.contains(&TestStatus::Withheld);
    let co_authorize = statuses.contains(&TestStatus::CoAuthorize);
    if withheld && co_authorize {
        return Err(ValidationError::WithheldCoAuthorizeCoupling);
    }
    Ok(())
}

fn check_remarks(
    test_details: &[ValidatedTestDetail],
    remarks: &HashMap<RemarkId, Remark>,
) -> Result<(), BatchRejection> {
    let referenced = test_details
        .iter()
        .flat_map(|test_detail| test_detail.investigations.iter())
        .filter_map(|investigation| {
            investigation
                .update
                .remarks
                .as_ref()
                .and_then(|updates| updates.medical.as_ref())
                .and_then(|medical| medical.id)
                .filter(|remark_id| !remark_id.is_unset())
                .map(|remark_id| (investigation.id(), remark_id))
        });

    for (investigation_id, remark_id) in referenced {
        let remark = remarks
            .get(&remark_id)
            .ok_or(MissingEntity::Remark(remark_id))?;
        if remark.investigation_id != investigation_id {
            return Err(ValidationError::RemarkNotOwned {
                remark_id,
                investigation_id,
            }
            .into());
        }
    }
    Ok(())
}
