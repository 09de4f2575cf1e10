//! `PostgreSQL` adapters for task review persistence.

mod models;
mod repository;
mod schema;

pub use repository::{PostgresTaskReviewRepository, ReviewPgPool};
