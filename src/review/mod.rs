//! Task review updates for lab operations.
//!
//! A reviewing pathologist submits one batch covering the test details and
//! investigation results of a task. The batch is validated against the
//! stored state, the task status is derived from the resulting test
//! statuses, and every create, update, and soft delete is committed in one
//! transaction before reruns are mirrored to the LIS. The module follows
//! hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Validation and status resolution in [`validation`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
pub mod services;
pub mod validation;

#[cfg(test)]
mod tests;
