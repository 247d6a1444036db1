//! Order-status mapping supplied by the host.
//!
//! The externally-visible order status is order-service vocabulary; the
//! engine only looks it up. A node without a mapping is a configuration
//! defect and must fail loudly — the engine never guesses a status.

use crate::NodeId;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Externally-visible order status (owned by the order service)
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderStatus(pub String);

impl OrderStatus {
    pub fn new(status: impl Into<String>) -> Self {
        Self(status.into())
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Maps approval progress onto externally-visible order statuses.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OrderStatusMap {
    /// Status to apply while the instance waits at a given node
    node_status: HashMap<NodeId, OrderStatus>,
    /// Terminal status once the instance is approved
    pub approved: OrderStatus,
    /// Terminal status once the instance is rejected
    pub rejected: OrderStatus,
    /// Operational statuses that lock the order against resubmission
    /// (e.g. pushing, pushed, delivered, closed)
    locked: HashSet<OrderStatus>,
}

impl OrderStatusMap {
    pub fn new(approved: OrderStatus, rejected: OrderStatus) -> Self {
        Self {
            node_status: HashMap::new(),
            approved,
            rejected,
            locked: HashSet::new(),
        }
    }

    pub fn with_node_status(mut self, node_id: NodeId, status: OrderStatus) -> Self {
        self.node_status.insert(node_id, status);
        self
    }

    pub fn with_locked(mut self, status: OrderStatus) -> Self {
        self.locked.insert(status);
        self
    }

    /// Status to apply while waiting at `node_id`, if configured
    pub fn status_for_node(&self, node_id: &NodeId) -> Option<&OrderStatus> {
        self.node_status.get(node_id)
    }

    /// Whether the order status blocks resubmission
    pub fn is_locked(&self, status: &OrderStatus) -> bool {
        self.locked.contains(status)
    }
}
