//! Port for the downstream rerun event sink.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::review::domain::{TaskId, UserId};

/// Result type for rerun notifications.
pub type RerunNotifierResult<T> = Result<T, RerunNotifierError>;

/// Event published after a commit that requested reruns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RerunNotification {
    /// Unique event identifier.
    pub event_id: Uuid,
    /// Task the reruns belong to.
    pub task_id: TaskId,
    /// Central order-system test ids sent back for rerun.
    pub external_test_ids: Vec<String>,
    /// User that requested the reruns.
    pub requested_by: UserId,
    /// Commit timestamp.
    pub occurred_at: DateTime<Utc>,
}

impl RerunNotification {
    /// Creates a notification with a fresh event identifier.
    #[must_use]
    pub fn new(
        task_id: TaskId,
        external_test_ids: Vec<String>,
        requested_by: UserId,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            task_id,
            external_test_ids,
            requested_by,
            occurred_at,
        }
    }
}

/// Fire-and-forget sink for rerun events.
#[async_trait]
pub trait RerunNotifier: Send + Sync {
    /// Publishes a rerun event.
    async fn publish(&self, notification: RerunNotification) -> RerunNotifierResult<()>;
}

/// Errors returned by rerun notifier adapters.
#[derive(Debug, Clone, Error)]
pub enum RerunNotifierError {
    /// The sink could not accept the event.
    #[error("rerun notification failed: {0}")]
    Publish(Arc<dyn std::error::Error + Send + Sync>),
}

impl RerunNotifierError {
    /// Wraps a sink error.
    #[must_use]
    pub fn publish(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Publish(Arc::new(err))
    }
}
