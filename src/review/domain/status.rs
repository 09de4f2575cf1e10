//! Lifecycle status vocabularies for tasks, test details, and investigations.

use super::ParseStatusError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Review status of a task, derived from the statuses of its test details.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Awaiting review or re-entry of results.
    Pending,
    /// Assigned upstream and being worked on.
    InProgress,
    /// Routed to a second pathologist for co-authorization.
    CoAuthorize,
    /// Blocked by at least one withheld test.
    WithheldApproval,
    /// Every test is approved.
    Completed,
}

impl TaskStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::CoAuthorize => "co_authorize",
            Self::WithheldApproval => "withheld_approval",
            Self::Completed => "completed",
        }
    }
}

impl TryFrom<&str> for TaskStatus {
    type Error = ParseStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim() {
            "pending" => Ok(Self::Pending),
            "in_progress" => Ok(Self::InProgress),
            "co_authorize" => Ok(Self::CoAuthorize),
            "withheld_approval" => Ok(Self::WithheldApproval),
            "completed" => Ok(Self::Completed),
            _ => Err(ParseStatusError::task(value)),
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Processing status of a single ordered test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestStatus {
    /// Ordered but not yet processed.
    Requested,
    /// Sample processed, results awaited.
    ResultPending,
    /// Results entered.
    ResultSaved,
    /// Sample rejected by the lab.
    Rejected,
    /// A rerun has been requested for at least one investigation.
    RerunRequested,
    /// Rerun results entered.
    RerunResultSaved,
    /// Held back from approval.
    Withheld,
    /// Awaiting co-authorization.
    CoAuthorize,
    /// Approved by the reviewing pathologist.
    Approve,
    /// Completed, report not yet sent.
    CompletedNotSent,
    /// Completed and report sent.
    CompletedSent,
    /// Sample in transfer between labs.
    InTransfer,
    /// Sample transfer failed.
    TransferFailed,
    /// Sample never arrived.
    SampleNotReceived,
    /// Sample collection rescheduled.
    CollectSampleLater,
    /// Sample received by the lab.
    LabReceived,
}

impl TestStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Requested => "requested",
            Self::ResultPending => "result_pending",
            Self::ResultSaved => "result_saved",
            Self::Rejected => "rejected",
            Self::RerunRequested => "rerun_requested",
            Self::RerunResultSaved => "rerun_result_saved",
            Self::Withheld => "withheld",
            Self::CoAuthorize => "co_authorize",
            Self::Approve => "approve",
            Self::CompletedNotSent => "completed_not_sent",
            Self::CompletedSent => "completed_sent",
            Self::InTransfer => "in_transfer",
            Self::TransferFailed => "transfer_failed",
            Self::SampleNotReceived => "sample_not_received",
            Self::CollectSampleLater => "collect_sample_later",
            Self::LabReceived => "lab_received",
        }
    }

    /// Maps the shared status of a homogeneous test detail onto a test status.
    ///
    /// Returns `None` for [`InvestigationStatus::Pending`], which has no test
    /// level counterpart.
    #[must_use]
    pub const fn from_homogeneous(status: InvestigationStatus) -> Option<Self> {
        match status {
            InvestigationStatus::Pending => None,
            InvestigationStatus::Approve => Some(Self::Approve),
            InvestigationStatus::Rerun => Some(Self::RerunRequested),
            InvestigationStatus::Withheld => Some(Self::Withheld),
            InvestigationStatus::CoAuthorize => Some(Self::CoAuthorize),
        }
    }
}

impl TryFrom<&str> for TestStatus {
    type Error = ParseStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim() {
            "requested" => Ok(Self::Requested),
            "result_pending" => Ok(Self::ResultPending),
            "result_saved" => Ok(Self::ResultSaved),
            "rejected" => Ok(Self::Rejected),
            "rerun_requested" => Ok(Self::RerunRequested),
            "rerun_result_saved" => Ok(Self::RerunResultSaved),
            "withheld" => Ok(Self::Withheld),
            "co_authorize" => Ok(Self::CoAuthorize),
            "approve" => Ok(Self::Approve),
            "completed_not_sent" => Ok(Self::CompletedNotSent),
            "completed_sent" => Ok(Self::CompletedSent),
            "in_transfer" => Ok(Self::InTransfer),
            "transfer_failed" => Ok(Self::TransferFailed),
            "sample_not_received" => Ok(Self::SampleNotReceived),
            "collect_sample_later" => Ok(Self::CollectSampleLater),
            "lab_received" => Ok(Self::LabReceived),
            _ => Err(ParseStatusError::test(value)),
        }
    }
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Review status of an investigation result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvestigationStatus {
    /// Entered, awaiting review.
    Pending,
    /// Approved.
    Approve,
    /// Sent back for re-execution.
    Rerun,
    /// Held back from approval.
    Withheld,
    /// Requires a second pathologist.
    CoAuthorize,
}

impl InvestigationStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approve => "approve",
            Self::Rerun => "rerun",
            Self::Withheld => "withheld",
            Self::CoAuthorize => "co_authorize",
        }
    }
}

impl TryFrom<&str> for InvestigationStatus {
    type Error = ParseStatusError;

    /// Parses canonical names and the order-system spellings `Approve`,
    /// `Rerun`, and `Entered`.
    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim() {
            "pending" | "Entered" => Ok(Self::Pending),
            "approve" | "Approve" => Ok(Self::Approve),
            "rerun" | "Rerun" => Ok(Self::Rerun),
            "withheld" => Ok(Self::Withheld),
            "co_authorize" => Ok(Self::CoAuthorize),
            _ => Err(ParseStatusError::investigation(value)),
        }
    }
}

impl fmt::Display for InvestigationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of remark attached to an investigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemarkType {
    /// Clinical note printed with the result.
    MedicalRemark,
    /// Reason recorded when a result is withheld.
    WithheldReason,
}

impl RemarkType {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MedicalRemark => "medical_remark",
            Self::WithheldReason => "withheld_reason",
        }
    }
}

impl TryFrom<&str> for RemarkType {
    type Error = ParseStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim() {
            "medical_remark" => Ok(Self::MedicalRemark),
            "withheld_reason" => Ok(Self::WithheldReason),
            _ => Err(ParseStatusError::remark(value)),
        }
    }
}
