//! Collaborator contracts the engine consumes.
//!
//! The engine owns approval state and nothing else. Order semantics and
//! customer assignments belong to their services; these traits are the
//! seams the host wires up.

use crate::EngineResult;
use approval_types::{Actor, CustomerId, OrderId, OrderStatus, UserId};
use async_trait::async_trait;

/// The order service, as seen from the engine.
#[async_trait]
pub trait OrderGateway: Send + Sync {
    /// Current externally-visible status of an order.
    async fn order_status(&self, order_id: &OrderId) -> EngineResult<OrderStatus>;

    /// Apply the status resulting from an approval transition. The engine
    /// passes the status; the order service owns its meaning.
    async fn update_order_status(
        &self,
        order_id: &OrderId,
        status: &OrderStatus,
        remark: Option<&str>,
        actor: &Actor,
    ) -> EngineResult<()>;
}

/// The customer service, consulted during assignee resolution.
#[async_trait]
pub trait CustomerDirectory: Send + Sync {
    /// The customer's regional head. Every customer is expected to have
    /// one; absence is a data defect the resolver turns into an error.
    async fn regional_head(&self, customer_id: &CustomerId) -> EngineResult<Option<UserId>>;

    /// The customer's provincial head, if configured.
    async fn provincial_head(&self, customer_id: &CustomerId) -> EngineResult<Option<UserId>>;
}
