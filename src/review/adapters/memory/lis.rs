//! In-memory LIS client.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, PoisonError, RwLock};

use crate::review::{
    domain::{LabId, LisOrder, VisitId},
    ports::{LisClient, LisError, LisResult},
};

/// LIS client serving seeded orders and recording every push.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLisClient {
    state: Arc<RwLock<InMemoryLisState>>,
}

#[derive(Debug, Default)]
struct InMemoryLisState {
    orders: HashMap<(VisitId, LabId), LisOrder>,
    rejected_orders: HashSet<String>,
    fetched: Vec<VisitId>,
    pushed: Vec<LisOrder>,
}

impl InMemoryLisClient {
    /// Creates a client with no orders.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serves `order` for the visit at the lab.
    pub fn insert_order(&self, visit_id: VisitId, lab_id: LabId, order: LisOrder) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.orders.insert((visit_id, lab_id), order);
    }

    /// Rejects every push of the order with the given identifier.
    pub fn reject_push(&self, order_id: impl Into<String>) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.rejected_orders.insert(order_id.into());
    }

    /// Returns the visits fetched so far, in call order.
    #[must_use]
    pub fn fetched_visits(&self) -> Vec<VisitId> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state.fetched.clone()
    }

    /// Returns the orders accepted so far, in push order.
    #[must_use]
    pub fn pushed_orders(&self) -> Vec<LisOrder> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state.pushed.clone()
    }
}

#[async_trait]
impl LisClient for InMemoryLisClient {
    async fn fetch_order_by_visit(
        &self,
        visit_id: &VisitId,
        lab_id: LabId,
    ) -> LisResult<LisOrder> {
        let mut state = self
            .state
            .write()
            .map_err(|err| LisError::transport(std::io::Error::other(err.to_string())))?;
        state.fetched.push(visit_id.clone());
        state
            .orders
            .get(&(visit_id.clone(), lab_id))
            .cloned()
            .ok_or_else(|| LisError::OrderNotFound(visit_id.clone()))
    }

    async fn push_order(&self, order: &LisOrder) -> LisResult<()> {
        let mut state = self
            .state
            .write()
            .map_err(|err| LisError::transport(std::io::Error::other(err.to_string())))?;
        if state.rejected_orders.contains(&order.order_id) {
            return Err(LisError::rejected(order.order_id.clone(), "rejected by LIS"));
        }
        state.pushed.push(order.clone());
        Ok(())
    }
}
