//! Unit tests for the task review module.
