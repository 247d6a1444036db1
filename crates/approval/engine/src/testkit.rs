//! Shared fixtures for the engine's unit tests.

use crate::{ApprovalEngine, CustomerDirectory, EngineResult, OrderGateway};
use approval_store::memory::InMemoryApprovalStore;
use approval_types::{
    Actor, AssigneeRule, CustomerId, NodeId, OrderId, OrderStatus, OrderStatusMap, ProcessCode,
    ProcessDefinition, ProcessId, ProcessNode, ProcessRouter, ResponsibleScope, RoutingContext,
    SubmissionContext, UserId,
};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// Order gateway stub: serves a configurable current status and records
/// every update it receives.
pub(crate) struct StubOrders {
    pub status: Mutex<OrderStatus>,
    pub updates: Mutex<Vec<(OrderId, OrderStatus, Option<String>, UserId)>>,
}

impl StubOrders {
    pub fn with_status(status: &str) -> Self {
        Self {
            status: Mutex::new(OrderStatus::new(status)),
            updates: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl OrderGateway for StubOrders {
    async fn order_status(&self, _order_id: &OrderId) -> EngineResult<OrderStatus> {
        Ok(self.status.lock().unwrap().clone())
    }

    async fn update_order_status(
        &self,
        order_id: &OrderId,
        status: &OrderStatus,
        remark: Option<&str>,
        actor: &Actor,
    ) -> EngineResult<()> {
        *self.status.lock().unwrap() = status.clone();
        self.updates.lock().unwrap().push((
            order_id.clone(),
            status.clone(),
            remark.map(str::to_string),
            actor.user_id.clone(),
        ));
        Ok(())
    }
}

/// Customer directory stub with fixed heads.
pub(crate) struct StubCustomers {
    pub regional: Option<UserId>,
    pub provincial: Option<UserId>,
}

#[async_trait]
impl CustomerDirectory for StubCustomers {
    async fn regional_head(&self, _customer_id: &CustomerId) -> EngineResult<Option<UserId>> {
        Ok(self.regional.clone())
    }

    async fn provincial_head(&self, _customer_id: &CustomerId) -> EngineResult<Option<UserId>> {
        Ok(self.provincial.clone())
    }
}

/// The seeded offline-order process: start → provincial head (optional)
/// → regional head (mandatory), unconditional edges.
pub(crate) struct OfflineOrderFixture {
    pub store: Arc<InMemoryApprovalStore>,
    pub orders: Arc<StubOrders>,
    pub process_id: ProcessId,
    pub provincial_node: NodeId,
    pub regional_node: NodeId,
}

impl OfflineOrderFixture {
    pub fn new() -> Self {
        let definition = ProcessDefinition::new(ProcessCode::offline_order(), "Offline order");
        let process_id = definition.id.clone();

        let start = ProcessNode::start(process_id.clone());
        let provincial = ProcessNode::approval(
            process_id.clone(),
            1,
            AssigneeRule::CustomerResponsible {
                scope: ResponsibleScope::ProvincialHead,
            },
        );
        let regional = ProcessNode::approval(
            process_id.clone(),
            2,
            AssigneeRule::CustomerResponsible {
                scope: ResponsibleScope::RegionalHead,
            },
        );
        let provincial_node = provincial.id.clone();
        let regional_node = regional.id.clone();

        let routers = vec![
            ProcessRouter::new(process_id.clone(), start.id.clone(), provincial.id.clone()),
            ProcessRouter::new(process_id.clone(), provincial.id.clone(), regional.id.clone()),
        ];

        let store = Arc::new(InMemoryApprovalStore::new());
        store
            .seed_process(definition, vec![start, provincial, regional], routers)
            .unwrap();

        Self {
            store,
            orders: Arc::new(StubOrders::with_status("submitted")),
            process_id,
            provincial_node,
            regional_node,
        }
    }

    pub fn status_map(&self) -> OrderStatusMap {
        OrderStatusMap::new(OrderStatus::new("approved"), OrderStatus::new("rejected"))
            .with_node_status(
                self.provincial_node.clone(),
                OrderStatus::new("pending_provincial"),
            )
            .with_node_status(
                self.regional_node.clone(),
                OrderStatus::new("pending_regional"),
            )
            .with_locked(OrderStatus::new("pushing"))
            .with_locked(OrderStatus::new("pushed"))
            .with_locked(OrderStatus::new("delivered"))
            .with_locked(OrderStatus::new("closed"))
    }

    /// Engine over this fixture's store with the given customer heads.
    pub fn engine(
        &self,
        regional: Option<&str>,
        provincial: Option<&str>,
    ) -> ApprovalEngine<InMemoryApprovalStore> {
        let customers = StubCustomers {
            regional: regional.map(UserId::new),
            provincial: provincial.map(UserId::new),
        };
        ApprovalEngine::new(
            self.store.clone(),
            self.orders.clone(),
            Arc::new(customers),
            self.status_map(),
        )
    }
}

pub(crate) fn submission(order: &str, submitter: &Actor) -> SubmissionContext {
    SubmissionContext::new(
        ProcessCode::offline_order(),
        OrderId::new(order),
        CustomerId::new("customer-1"),
        submitter.clone(),
    )
    .with_routing(RoutingContext::new(10_000.0))
}

pub(crate) fn submitter() -> Actor {
    Actor::new("user-7", "Sam Seller")
}

pub(crate) fn regional_head() -> Actor {
    Actor::new("user-42", "Rita Regional")
}
