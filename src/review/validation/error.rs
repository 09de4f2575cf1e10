//! Rejection reasons for a submitted review batch.

use crate::review::domain::{InvestigationId, RemarkId, TaskId, TestDetailId, UserId};
use thiserror::Error;

/// Structural or business-rule violations found in a batch.
///
/// Validation is fail-fast: the first violation found is reported.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A submitted test detail belongs to a different task.
    #[error("test detail {test_detail_id} does not belong to task {task_id}")]
    TestDetailNotInTask {
        /// Submitted test detail.
        test_detail_id: TestDetailId,
        /// Task being updated.
        task_id: TaskId,
    },

    /// The same test detail was submitted more than once.
    #[error("test detail {0} submitted more than once")]
    DuplicateTestDetail(TestDetailId),

    /// The submitted investigations differ from the stored investigations.
    #[error("investigations submitted for test detail {0} do not match the stored investigations")]
    InvestigationIdsMismatch(TestDetailId),

    /// A test detail was submitted without investigations and has none stored.
    #[error("test detail {0} has no investigations")]
    EmptyTestDetail(TestDetailId),

    /// An investigation status is not part of the review vocabulary.
    #[error("invalid status '{status}' for investigation {investigation_id}")]
    InvalidInvestigationStatus {
        /// Offending investigation.
        investigation_id: InvestigationId,
        /// Submitted status.
        status: String,
    },

    /// An approved investigation carries a negative value.
    #[error("investigation {investigation_id} cannot be approved with negative value '{value}'")]
    NegativeApprovedValue {
        /// Offending investigation.
        investigation_id: InvestigationId,
        /// Submitted value.
        value: String,
    },

    /// A rerun test detail contains an investigation that is neither rerun
    /// nor approved.
    #[error("test detail {test_detail_id} mixes a rerun with investigation {investigation_id}")]
    RerunStatusCoupling {
        /// Test detail containing the rerun.
        test_detail_id: TestDetailId,
        /// Offending sibling investigation.
        investigation_id: InvestigationId,
    },

    /// Investigations of one test detail carry different statuses.
    #[error("investigations of test detail {0} must share one status")]
    InvestigationStatusMismatch(TestDetailId),

    /// The shared investigation status has no test-level counterpart.
    #[error("test detail {0} cannot move to a pending test status")]
    InvalidTestStatus(TestDetailId),

    /// The first co-authorize investigation names no target.
    #[error("investigation {0} requests co-authorization without a target")]
    CoAuthorizeTargetMissing(InvestigationId),

    /// The co-authorization target is the acting user.
    #[error("investigation {0} requests co-authorization from the acting user")]
    CoAuthorizeToSelf(InvestigationId),

    /// Co-authorize investigations name different targets.
    #[error("investigation {investigation_id} names a co-author other than {expected}")]
    CoAuthorizeTargetMismatch {
        /// Offending investigation.
        investigation_id: InvestigationId,
        /// Target named by the first co-authorize investigation.
        expected: UserId,
    },

    /// Withheld and co-authorize test statuses cannot coexist in one task.
    #[error("withheld and co_authorize test statuses cannot coexist in one task")]
    WithheldCoAuthorizeCoupling,

    /// A referenced medical remark belongs to another investigation.
    #[error("remark {remark_id} does not belong to investigation {investigation_id}")]
    RemarkNotOwned {
        /// Referenced remark.
        remark_id: RemarkId,
        /// Investigation the update targets.
        investigation_id: InvestigationId,
    },
}

/// Entity referenced by a batch that has no live row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MissingEntity {
    /// Task row is absent.
    #[error("task {0} not found")]
    Task(TaskId),
    /// Test detail row is absent.
    #[error("test detail {0} not found")]
    TestDetail(TestDetailId),
    /// Investigation row is absent.
    #[error("investigation {0} not found")]
    Investigation(InvestigationId),
    /// Remark row is absent.
    #[error("remark {0} not found")]
    Remark(RemarkId),
}

/// Reason a batch was rejected by the validator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BatchRejection {
    /// The batch violates a consistency rule.
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    /// The batch references a row that does not exist.
    #[error(transparent)]
    Missing(#[from] MissingEntity),
}
