//! Port for the external laboratory information system.

use crate::review::domain::{LabId, LisOrder, VisitId};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for LIS client operations.
pub type LisResult<T> = Result<T, LisError>;

/// The two LIS operations the review engine consumes.
#[async_trait]
pub trait LisClient: Send + Sync {
    /// Fetches the order held for a visit at a lab.
    async fn fetch_order_by_visit(&self, visit_id: &VisitId, lab_id: LabId)
    -> LisResult<LisOrder>;

    /// Pushes a patched order back to the LIS.
    async fn push_order(&self, order: &LisOrder) -> LisResult<()>;
}

/// Errors returned by LIS client adapters.
#[derive(Debug, Clone, Error)]
pub enum LisError {
    /// The LIS holds no order for the visit.
    #[error("no LIS order for visit {0}")]
    OrderNotFound(VisitId),

    /// The LIS rejected a pushed order.
    #[error("LIS rejected order {order_id}: {reason}")]
    Rejected {
        /// Rejected order identifier.
        order_id: String,
        /// Reason reported by the LIS.
        reason: String,
    },

    /// Transport or decoding failure.
    #[error("LIS transport error: {0}")]
    Transport(Arc<dyn std::error::Error + Send + Sync>),
}

impl LisError {
    /// Wraps a transport error from the client adapter.
    #[must_use]
    pub fn transport(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Transport(Arc::new(err))
    }

    /// Creates a rejection error.
    #[must_use]
    pub fn rejected(order_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Rejected {
            order_id: order_id.into(),
            reason: reason.into(),
        }
    }
}
