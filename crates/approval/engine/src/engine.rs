//! The approval engine facade.
//!
//! One value wires the store, the collaborators, and the status mapping
//! together and exposes the public operations: start an approval, act on
//! a task, validate resubmission/cancellation, and the read surface the
//! back office lists and detail screens use.
//!
//! The engine coordinates state, it never owns order semantics — order
//! statuses pass through from configuration to the order gateway.

use crate::{ConditionEvaluator, CustomerDirectory, EngineError, EngineResult, OrderGateway};
use approval_store::ApprovalStore;
use approval_types::{
    ApprovalInstance, ApprovalTask, AuditEntry, InstanceId, OrderId, OrderStatusMap, UserId,
};
use std::sync::Arc;

/// The approval workflow engine.
pub struct ApprovalEngine<S> {
    pub(crate) store: Arc<S>,
    pub(crate) orders: Arc<dyn OrderGateway>,
    pub(crate) customers: Arc<dyn CustomerDirectory>,
    pub(crate) status_map: OrderStatusMap,
    pub(crate) evaluator: ConditionEvaluator,
}

impl<S: ApprovalStore> ApprovalEngine<S> {
    pub fn new(
        store: Arc<S>,
        orders: Arc<dyn OrderGateway>,
        customers: Arc<dyn CustomerDirectory>,
        status_map: OrderStatusMap,
    ) -> Self {
        Self {
            store,
            orders,
            customers,
            status_map,
            evaluator: ConditionEvaluator::new(),
        }
    }

    /// Pending tasks the user can act on right now.
    pub async fn pending_tasks(&self, user_id: &UserId) -> EngineResult<Vec<ApprovalTask>> {
        Ok(self.store.actionable_tasks_for_user(user_id).await?)
    }

    /// Every task of an instance, in step order.
    pub async fn task_history(&self, instance_id: &InstanceId) -> EngineResult<Vec<ApprovalTask>> {
        if self.store.instance(instance_id).await?.is_none() {
            return Err(EngineError::NotFound(format!(
                "instance {instance_id} not found"
            )));
        }
        Ok(self.store.tasks_for_instance(instance_id).await?)
    }

    /// The approval instance for an order, if one exists.
    pub async fn instance_for_order(
        &self,
        order_id: &OrderId,
    ) -> EngineResult<Option<ApprovalInstance>> {
        Ok(self.store.instance_by_order(order_id).await?)
    }

    /// Audit entries for an instance, oldest first.
    pub async fn audit_trail(&self, instance_id: &InstanceId) -> EngineResult<Vec<AuditEntry>> {
        Ok(self.store.entries_for_instance(instance_id).await?)
    }
}
