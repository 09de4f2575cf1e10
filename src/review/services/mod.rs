//! Application services for task review updates.
//!
//! The update service runs the precondition, fetches, validation, planning,
//! commit, and LIS mirroring of one batch. Planning and the LIS patches are
//! pure and exposed for direct testing.

pub mod committer;
pub mod lis_sync;
pub mod planner;
pub mod update;

pub use committer::{CommittedPlan, apply_plan, commit_plan};
pub use lis_sync::{
    ApprovalPatch, LisSyncError, PatchedOrder, RerunPatch, SyncFailure, SyncPhase,
    format_lis_timestamp,
};
pub use planner::{AffectedTest, MutationPlan, plan_mutations};
pub use update::{
    ConflictReason, TaskUpdateError, TaskUpdateErrorKind, TaskUpdateOutcome, TaskUpdateResult,
    TaskUpdateService,
};
