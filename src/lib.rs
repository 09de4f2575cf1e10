//! Labtask: pathologist review of laboratory test results.
//!
//! This crate validates and commits batched review updates for a lab task.
//! A reviewing pathologist approves, reruns, withholds, or routes each
//! investigation of a task's tests; the batch is checked against the stored
//! state, written in one transaction, and reruns are mirrored to the
//! laboratory information system (LIS).
//!
//! # Architecture
//!
//! Labtask follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for persistence, the LIS, and
//!   rerun notifications
//! - **Adapters**: Concrete implementations of ports (in-memory, `PostgreSQL`)
//!
//! # Modules
//!
//! - [`review`]: Task review updates, validation, and LIS mirroring

pub mod review;
