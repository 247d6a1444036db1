//! Submission context and actor identity.
//!
//! The routing context is a fixed, explicitly-typed snapshot of the
//! submission — the condition evaluator only ever sees these fields,
//! never an arbitrary object.

use crate::ProcessCode;
use serde::{Deserialize, Serialize};

// ── Identifiers ──────────────────────────────────────────────────────

/// Identifier of a back-office user (issued by the auth system)
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a customer in the catalog
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CustomerId(pub String);

impl CustomerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for CustomerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of an order in the order service
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderId(pub String);

impl OrderId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ── Actor ────────────────────────────────────────────────────────────

/// An authenticated user performing a mutation. The engine never
/// authenticates — it only records who acted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: UserId,
    pub display_name: String,
}

impl Actor {
    pub fn new(user_id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            user_id: UserId::new(user_id),
            display_name: display_name.into(),
        }
    }
}

// ── Routing Context ──────────────────────────────────────────────────

/// Typed snapshot of the submission fields routing conditions may read.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RoutingContext {
    /// Total order amount
    pub order_amount: f64,
    /// Roles held by the submitter
    pub submitter_roles: Vec<String>,
    /// Whether the order pushes the customer over their credit quota
    pub quota_exceeded: bool,
}

impl RoutingContext {
    pub fn new(order_amount: f64) -> Self {
        Self {
            order_amount,
            submitter_roles: Vec::new(),
            quota_exceeded: false,
        }
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.submitter_roles.push(role.into());
        self
    }

    pub fn with_quota_exceeded(mut self, exceeded: bool) -> Self {
        self.quota_exceeded = exceeded;
        self
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.submitter_roles.iter().any(|r| r == role)
    }
}

// ── Submission Context ───────────────────────────────────────────────

/// Everything the engine needs to start an approval for one order.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SubmissionContext {
    /// Which process to run
    pub process_code: ProcessCode,
    /// The order under approval
    pub order_id: OrderId,
    /// The ordering customer
    pub customer_id: CustomerId,
    /// Who submitted the order
    pub submitter: Actor,
    /// Routing snapshot
    pub routing: RoutingContext,
}

impl SubmissionContext {
    pub fn new(
        process_code: ProcessCode,
        order_id: OrderId,
        customer_id: CustomerId,
        submitter: Actor,
    ) -> Self {
        Self {
            process_code,
            order_id,
            customer_id,
            submitter,
            routing: RoutingContext::default(),
        }
    }

    pub fn with_routing(mut self, routing: RoutingContext) -> Self {
        self.routing = routing;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_routing_context_roles() {
        let ctx = RoutingContext::new(1200.0)
            .with_role("sales")
            .with_role("manager");
        assert!(ctx.has_role("sales"));
        assert!(!ctx.has_role("finance"));
    }

    #[test]
    fn test_submission_context_defaults() {
        let submission = SubmissionContext::new(
            ProcessCode::offline_order(),
            OrderId::new("order-1"),
            CustomerId::new("customer-1"),
            Actor::new("user-7", "Sam Seller"),
        );
        assert_eq!(submission.routing.order_amount, 0.0);
        assert!(!submission.routing.quota_exceeded);
    }
}
