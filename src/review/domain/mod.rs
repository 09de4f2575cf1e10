//! Domain model for task review updates.
//!
//! The review domain models tasks, their test details and investigation
//! results, the remarks and rerun snapshots attached to them, and the
//! request submitted by a reviewing pathologist. Infrastructure concerns stay
//! outside this boundary.

mod entities;
mod error;
mod ids;
mod lis;
mod request;
mod status;

pub use entities::{
    AuditStamp, CoAuthorizedPathologist, InvestigationData, InvestigationResult, NewRemark,
    PathologistAssignment, Remark, RerunInvestigationResult, Task, TestDetail, Tombstone, User,
    VisitLab,
};
pub use error::ParseStatusError;
pub use ids::{InvestigationId, LabId, RemarkId, TaskId, TestDetailId, UserId, VisitId};
pub use lis::{LisContentLine, LisLineFields, LisOrder, LisOrderLine, LisParameterLine};
pub use request::{
    InvestigationUpdate, MedicalRemarkUpdate, RemarkUpdates, RerunDetails, TestDetailUpdate,
    UpdateTaskRequest, WithheldReasonUpdate,
};
pub use status::{InvestigationStatus, RemarkType, TaskStatus, TestStatus};
