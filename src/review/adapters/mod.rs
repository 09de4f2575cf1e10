//! Adapter implementations of the task review ports.
//!
//! - [`memory`]: thread-safe in-memory repository, LIS client, and notifier
//!   used by tests and local runs
//! - [`postgres`]: Diesel-backed repository for production persistence

pub mod memory;
pub mod postgres;
