use crate::model::{ActionCommit, InstanceCreation};
use crate::StoreResult;
use approval_types::{
    ApprovalInstance, ApprovalTask, AuditEntry, InstanceId, NodeId, OrderId, ProcessCode,
    ProcessDefinition, ProcessId, ProcessNode, ProcessRouter, TaskId, UserId,
};
use async_trait::async_trait;

/// Read-only access to process reference data.
#[async_trait]
pub trait ProcessStore: Send + Sync {
    /// Look up a process definition by its business code.
    async fn definition_by_code(
        &self,
        code: &ProcessCode,
    ) -> StoreResult<Option<ProcessDefinition>>;

    /// The enabled, non-deleted start node of a process.
    async fn start_node(&self, process_id: &ProcessId) -> StoreResult<Option<ProcessNode>>;

    /// Look up one node by id.
    async fn node(&self, node_id: &NodeId) -> StoreResult<Option<ProcessNode>>;

    /// Enabled, non-deleted routers leaving a node, ordered by
    /// `(priority asc, id asc)` — the id is the deterministic tie-break.
    async fn outgoing_routers(&self, node_id: &NodeId) -> StoreResult<Vec<ProcessRouter>>;
}

/// Mutating access to approval instances. Both write methods are atomic:
/// all rows in the unit become visible together or not at all.
#[async_trait]
pub trait InstanceStore: Send + Sync {
    /// Get one instance by id.
    async fn instance(&self, id: &InstanceId) -> StoreResult<Option<ApprovalInstance>>;

    /// Get the instance for an order; at most one exists.
    async fn instance_by_order(&self, order_id: &OrderId)
        -> StoreResult<Option<ApprovalInstance>>;

    /// Insert a new instance with all its tasks and the submission audit
    /// entry, optionally discarding a prior unacted instance first.
    /// A live instance for the same order fails with `Conflict`.
    async fn create_instance(&self, creation: InstanceCreation) -> StoreResult<()>;

    /// Apply an action's row changes under the instance version check.
    async fn commit_action(&self, commit: ActionCommit) -> StoreResult<()>;
}

/// Read access to approval tasks.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Get one task by id.
    async fn task(&self, id: &TaskId) -> StoreResult<Option<ApprovalTask>>;

    /// All tasks of an instance, ordered by `(task_step asc, id asc)`.
    async fn tasks_for_instance(&self, instance_id: &InstanceId)
        -> StoreResult<Vec<ApprovalTask>>;

    /// Pending tasks a user can act on right now: the owning instance is
    /// in progress and positioned at the task's step.
    async fn actionable_tasks_for_user(&self, user_id: &UserId)
        -> StoreResult<Vec<ApprovalTask>>;
}

/// Read access to audit entries (writes ride inside instance commits).
#[async_trait]
pub trait AuditStore: Send + Sync {
    /// Entries for one instance, oldest first.
    async fn entries_for_instance(&self, instance_id: &InstanceId)
        -> StoreResult<Vec<AuditEntry>>;
}

/// Unified storage bundle the approval engine runs against.
pub trait ApprovalStore:
    ProcessStore + InstanceStore + TaskStore + AuditStore + Send + Sync
{
}

impl<T> ApprovalStore for T where
    T: ProcessStore + InstanceStore + TaskStore + AuditStore + Send + Sync
{
}
