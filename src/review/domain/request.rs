//! Batched update request submitted by a reviewing pathologist.
//!
//! Statuses stay as raw strings here so that the validator can report an
//! unknown status as a validation failure instead of a decoding failure.

use super::{InvestigationId, RemarkId, TaskId, TestDetailId, UserId};
use serde::{Deserialize, Serialize};

/// Request to update every submitted detail of one task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateTaskRequest {
    /// Task being reviewed.
    pub task_id: TaskId,
    /// User submitting the update.
    pub acting_user_id: UserId,
    /// Proposed test detail updates.
    #[serde(default)]
    pub test_details: Vec<TestDetailUpdate>,
}

impl UpdateTaskRequest {
    /// Creates an empty request for a task.
    #[must_use]
    pub const fn new(task_id: TaskId, acting_user_id: UserId) -> Self {
        Self {
            task_id,
            acting_user_id,
            test_details: Vec::new(),
        }
    }

    /// Appends a test detail update.
    #[must_use]
    pub fn with_test_detail(mut self, test_detail: TestDetailUpdate) -> Self {
        self.test_details.push(test_detail);
        self
    }

    /// Iterates over every submitted investigation update.
    pub fn investigations(&self) -> impl Iterator<Item = &InvestigationUpdate> {
        self.test_details
            .iter()
            .flat_map(|test_detail| test_detail.investigations.iter())
    }

    /// Collects the non-zero test detail identifiers in submission order.
    #[must_use]
    pub fn test_detail_ids(&self) -> Vec<TestDetailId> {
        self.test_details
            .iter()
            .map(|test_detail| test_detail.test_detail_id)
            .filter(|id| !id.is_unset())
            .collect()
    }

    /// Collects the non-zero investigation identifiers in submission order.
    #[must_use]
    pub fn investigation_ids(&self) -> Vec<InvestigationId> {
        self.investigations()
            .map(|investigation| investigation.investigation_id)
            .filter(|id| !id.is_unset())
            .collect()
    }

    /// Collects the identifiers of medical remarks referenced by the batch.
    #[must_use]
    pub fn medical_remark_ids(&self) -> Vec<RemarkId> {
        self.investigations()
            .filter_map(|investigation| investigation.remarks.as_ref())
            .filter_map(|remarks| remarks.medical.as_ref())
            .filter_map(|medical| medical.id)
            .filter(|id| !id.is_unset())
            .collect()
    }
}

/// Proposed update of one test detail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestDetailUpdate {
    /// Test detail being updated.
    pub test_detail_id: TestDetailId,
    /// Updates for every investigation of the test detail.
    #[serde(default)]
    pub investigations: Vec<InvestigationUpdate>,
}

impl TestDetailUpdate {
    /// Creates a test detail update from its investigation updates.
    #[must_use]
    pub fn new(
        test_detail_id: TestDetailId,
        investigations: impl IntoIterator<Item = InvestigationUpdate>,
    ) -> Self {
        Self {
            test_detail_id,
            investigations: investigations.into_iter().collect(),
        }
    }
}

/// Proposed update of one investigation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvestigationUpdate {
    /// Investigation being updated.
    pub investigation_id: InvestigationId,
    /// Proposed status, parsed during validation.
    pub status: String,
    /// Proposed value.
    #[serde(default)]
    pub value: String,
    /// Proposed abnormality classification.
    #[serde(default)]
    pub abnormality: String,
    /// Free-form payload to store alongside the result.
    #[serde(default)]
    pub data: Option<String>,
    /// Target pathologist when the status is `co_authorize`.
    #[serde(default)]
    pub co_authorize_to: Option<UserId>,
    /// Rerun details when the status is `rerun`.
    #[serde(default)]
    pub rerun: Option<RerunDetails>,
    /// Remark changes.
    #[serde(default)]
    pub remarks: Option<RemarkUpdates>,
}

impl InvestigationUpdate {
    /// Creates an update with a status and value and nothing else.
    #[must_use]
    pub fn new(
        investigation_id: InvestigationId,
        status: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            investigation_id,
            status: status.into(),
            value: value.into(),
            abnormality: String::new(),
            data: None,
            co_authorize_to: None,
            rerun: None,
            remarks: None,
        }
    }

    /// Sets the abnormality classification.
    #[must_use]
    pub fn with_abnormality(mut self, abnormality: impl Into<String>) -> Self {
        self.abnormality = abnormality.into();
        self
    }

    /// Sets the free-form payload.
    #[must_use]
    pub fn with_data(mut self, data: impl Into<String>) -> Self {
        self.data = Some(data.into());
        self
    }

    /// Sets the co-authorization target.
    #[must_use]
    pub fn with_co_authorize_to(mut self, target: UserId) -> Self {
        self.co_authorize_to = Some(target);
        self
    }

    /// Sets rerun details.
    #[must_use]
    pub fn with_rerun_reason(mut self, reason: Option<String>) -> Self {
        self.rerun = Some(RerunDetails { reason });
        self
    }

    /// Sets remark changes.
    #[must_use]
    pub fn with_remarks(mut self, remarks: RemarkUpdates) -> Self {
        self.remarks = Some(remarks);
        self
    }

    /// Returns the proposed data payload when it is non-empty.
    #[must_use]
    pub fn data_payload(&self) -> Option<&str> {
        self.data.as_deref().filter(|data| !data.is_empty())
    }

    /// Returns the supplied rerun reason when it is non-empty.
    #[must_use]
    pub fn rerun_reason(&self) -> Option<&str> {
        self.rerun
            .as_ref()
            .and_then(|rerun| rerun.reason.as_deref())
            .filter(|reason| !reason.trim().is_empty())
    }
}

/// Rerun details attached to an investigation update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RerunDetails {
    /// Reason for the rerun; a configured default is used when absent.
    #[serde(default)]
    pub reason: Option<String>,
}

/// Remark changes attached to an investigation update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemarkUpdates {
    /// Medical remark to create, update, or delete.
    #[serde(default)]
    pub medical: Option<MedicalRemarkUpdate>,
    /// Reason recorded when the investigation is withheld.
    #[serde(default)]
    pub withheld_reason: Option<WithheldReasonUpdate>,
}

/// Medical remark change.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedicalRemarkUpdate {
    /// Existing remark identifier, absent for a new remark.
    #[serde(default)]
    pub id: Option<RemarkId>,
    /// Remark text.
    #[serde(default)]
    pub description: String,
    /// Requests soft deletion of the existing remark.
    #[serde(default)]
    pub delete: bool,
}

/// Withheld-reason remark.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithheldReasonUpdate {
    /// Reason text.
    #[serde(default)]
    pub description: String,
}
