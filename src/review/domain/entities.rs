//! Persisted review entities.
//!
//! Rows are plain data carriers: the validator and planner derive new values
//! and the committer writes them back. Entities that can be soft-deleted
//! carry a [`Tombstone`] instead of being removed.

use super::{
    InvestigationId, InvestigationStatus, LabId, RemarkId, RemarkType, TaskId, TaskStatus,
    TestDetailId, TestStatus, UserId, VisitId,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Creation and last-update audit columns shared by every persisted row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditStamp {
    /// User that created the row.
    pub created_by: UserId,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// User that last updated the row.
    pub updated_by: UserId,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl AuditStamp {
    /// Creates a stamp for a row created by `user` at `at`.
    #[must_use]
    pub const fn created(user: UserId, at: DateTime<Utc>) -> Self {
        Self {
            created_by: user,
            created_at: at,
            updated_by: user,
            updated_at: at,
        }
    }

    /// Records an update by `user` at `at`.
    pub const fn touch(&mut self, user: UserId, at: DateTime<Utc>) {
        self.updated_by = user;
        self.updated_at = at;
    }
}

/// Soft-delete marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tombstone {
    /// User that deleted the row.
    pub deleted_by: UserId,
    /// Deletion timestamp.
    pub deleted_at: DateTime<Utc>,
}

/// Review task grouping the test details of one lab order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Task identifier.
    pub id: TaskId,
    /// Central order reference the task was created for.
    pub order_ref: String,
    /// City code of the ordering lab.
    pub city_code: String,
    /// Derived review status.
    pub status: TaskStatus,
    /// Completion timestamp, set when the task reaches [`TaskStatus::Completed`].
    pub completed_at: Option<DateTime<Utc>>,
    /// Audit columns.
    pub audit: AuditStamp,
}

/// A single ordered test within a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestDetail {
    /// Test detail identifier.
    pub id: TestDetailId,
    /// Owning task.
    pub task_id: TaskId,
    /// Current status.
    pub status: TestStatus,
    /// Ordering lab.
    pub lab_id: LabId,
    /// Lab that processes the sample.
    pub processing_lab_id: LabId,
    /// Test identifier in the central order system, used to locate visits.
    pub external_test_id: String,
    /// Test code in the LIS.
    pub lis_code: String,
    /// Where the approval originated, set when the test is approved.
    pub approval_source: Option<String>,
    /// Audit columns.
    pub audit: AuditStamp,
}

/// A single measured parameter within a test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvestigationResult {
    /// Investigation identifier.
    pub id: InvestigationId,
    /// Owning test detail.
    pub test_detail_id: TestDetailId,
    /// Catalogue identifier of the investigation.
    pub master_investigation_id: u64,
    /// Display name.
    pub name: String,
    /// Reported value.
    pub value: String,
    /// Raw value reported by the analyser.
    pub device_value: String,
    /// How the value is represented (numeric, textual, ...).
    pub result_representation_type: String,
    /// Parameter code in the LIS.
    pub lis_code: String,
    /// Abnormality classification.
    pub abnormality: String,
    /// Whether the abnormality classification marks the value as abnormal.
    pub is_abnormal: bool,
    /// Review status.
    pub status: InvestigationStatus,
    /// Approving user.
    pub approved_by: Option<UserId>,
    /// Approval timestamp.
    pub approved_at: Option<DateTime<Utc>>,
    /// User that entered the value.
    pub entered_by: Option<UserId>,
    /// Entry timestamp.
    pub entered_at: Option<DateTime<Utc>>,
    /// Audit columns.
    pub audit: AuditStamp,
}

/// Free-form payload attached 1:1 to an investigation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvestigationData {
    /// Owning investigation, which is also the row key.
    pub investigation_id: InvestigationId,
    /// Payload text.
    pub data: String,
    /// Payload type label.
    pub data_type: String,
    /// Audit columns.
    pub audit: AuditStamp,
}

/// Stored remark on an investigation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Remark {
    /// Remark identifier.
    pub id: RemarkId,
    /// Investigation the remark belongs to.
    pub investigation_id: InvestigationId,
    /// Remark text.
    pub description: String,
    /// Remark kind.
    pub remark_type: RemarkType,
    /// Author of the remark.
    pub remark_by: UserId,
    /// Audit columns.
    pub audit: AuditStamp,
    /// Soft-delete marker.
    pub tombstone: Option<Tombstone>,
}

/// Remark to be inserted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRemark {
    /// Investigation the remark belongs to.
    pub investigation_id: InvestigationId,
    /// Remark text.
    pub description: String,
    /// Remark kind.
    pub remark_type: RemarkType,
    /// Author of the remark.
    pub remark_by: UserId,
    /// Audit columns.
    pub audit: AuditStamp,
}

/// Append-only snapshot of an investigation taken when it enters rerun.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RerunInvestigationResult {
    /// Test detail of the rerun investigation.
    pub test_detail_id: TestDetailId,
    /// Investigation that entered rerun.
    pub investigation_id: InvestigationId,
    /// Catalogue identifier of the investigation.
    pub master_investigation_id: u64,
    /// Display name.
    pub name: String,
    /// Value before the rerun.
    pub value: String,
    /// Analyser value before the rerun.
    pub device_value: String,
    /// Value representation.
    pub result_representation_type: String,
    /// Parameter code in the LIS.
    pub lis_code: String,
    /// User that requested the rerun.
    pub triggered_by: UserId,
    /// Rerun request timestamp.
    pub triggered_at: DateTime<Utc>,
    /// Rerun reason.
    pub reason: String,
    /// Rerun remarks.
    pub remarks: String,
    /// User that entered the prior value.
    pub entered_by: Option<UserId>,
    /// Entry timestamp of the prior value.
    pub entered_at: Option<DateTime<Utc>>,
    /// Audit columns.
    pub audit: AuditStamp,
}

/// Co-authorization routing of a task to a second pathologist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoAuthorizedPathologist {
    /// Routed task.
    pub task_id: TaskId,
    /// Pathologist requesting co-authorization.
    pub co_authorized_by: UserId,
    /// Pathologist asked to co-authorize.
    pub co_authorized_to: UserId,
    /// Routing timestamp.
    pub co_authorized_at: DateTime<Utc>,
    /// Audit columns.
    pub audit: AuditStamp,
    /// Soft-delete marker.
    pub tombstone: Option<Tombstone>,
}

/// Internal user record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// User identifier.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Role category, for example `pathologist`.
    pub user_type: String,
    /// Operator identifier in the LIS.
    pub lis_user_id: Option<String>,
    /// Identifier in the central identity system.
    pub system_user_id: Option<String>,
}

/// Mapping of a pathologist to a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathologistAssignment {
    /// Assigned task.
    pub task_id: TaskId,
    /// Assigned pathologist.
    pub pathologist_id: UserId,
    /// Whether the assignment is current.
    pub is_active: bool,
}

/// Visit that carries a sample for one or more tests, with its lab.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VisitLab {
    /// LIS visit number.
    pub visit_id: VisitId,
    /// Lab holding the visit.
    pub lab_id: LabId,
}
