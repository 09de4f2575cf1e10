//! Validation of submitted review batches and task status resolution.
//!
//! Both halves are pure and synchronous: the validator checks a batch
//! against fetched rows, and the resolver derives the task status from the
//! merged test detail statuses.

pub mod error;
pub mod transition;
pub mod validator;

pub use error::{BatchRejection, MissingEntity, ValidationError};
pub use transition::resolve_task_status;
pub use validator::{
    CurrentState, ProposedState, ValidatedBatch, ValidatedInvestigation, ValidatedTestDetail,
    check_approved_values, validate_batch,
};
