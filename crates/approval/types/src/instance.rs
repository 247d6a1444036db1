//! Approval instances and tasks: the runtime state of one approval.
//!
//! An instance is one concrete run of a process definition for one order.
//! Its tasks are created together, atomically, in path order; tasks that
//! share a `task_step` are alternative approvers for one logical node.

use crate::{Actor, NodeId, OrderId, ProcessId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ── Identifiers ──────────────────────────────────────────────────────

/// Unique identifier for an approval instance
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InstanceId(pub String);

impl InstanceId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for InstanceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for an approval task
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TaskId(pub String);

impl TaskId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ── Statuses ─────────────────────────────────────────────────────────

/// Lifecycle of an approval instance
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum InstanceStatus {
    InProgress,
    Approved,
    Rejected,
    Cancelled,
}

impl InstanceStatus {
    /// Terminal instances accept no further actions
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::InProgress)
    }
}

/// Lifecycle of an approval task
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskStatus {
    Pending,
    Approved,
    Rejected,
    Skipped,
}

// ── Approval Instance ────────────────────────────────────────────────

/// One concrete run of a process definition for one order
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ApprovalInstance {
    /// Unique identifier
    pub id: InstanceId,
    /// The process definition this instance runs
    pub process_id: ProcessId,
    /// The order under approval; at most one instance per order
    pub order_id: OrderId,
    /// Node of the task currently awaiting action, if any
    pub current_node_id: Option<NodeId>,
    /// 1-based ordinal into the resolved task path, if any
    pub current_step: Option<u32>,
    /// Lifecycle status
    pub status: InstanceStatus,
    /// Optimistic-concurrency counter; bumped by every mutating commit
    pub version: i64,
    /// Who submitted the order
    pub created_by: UserId,
    pub created_by_name: String,
    /// Who last mutated the instance
    pub revised_by: Option<UserId>,
    pub revised_by_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ApprovalInstance {
    /// Create a fresh in-progress instance
    pub fn new(process_id: ProcessId, order_id: OrderId, creator: &Actor) -> Self {
        let now = Utc::now();
        Self {
            id: InstanceId::generate(),
            process_id,
            order_id,
            current_node_id: None,
            current_step: None,
            status: InstanceStatus::InProgress,
            version: 1,
            created_by: creator.user_id.clone(),
            created_by_name: creator.display_name.clone(),
            revised_by: None,
            revised_by_name: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Point the instance at the task awaiting action
    pub fn position_at(&mut self, node_id: NodeId, step: u32) {
        self.current_node_id = Some(node_id);
        self.current_step = Some(step);
        self.updated_at = Utc::now();
    }

    /// Move to the next pending task, recording who advanced the instance
    pub fn advance_to(&mut self, node_id: NodeId, step: u32, actor: &Actor) {
        self.current_node_id = Some(node_id);
        self.current_step = Some(step);
        self.touch(actor);
    }

    /// Finalize as approved; no task remains pending
    pub fn approve(&mut self, actor: &Actor) {
        self.status = InstanceStatus::Approved;
        self.current_node_id = None;
        self.current_step = None;
        self.touch(actor);
    }

    /// Finalize as rejected; one rejection ends the whole instance
    pub fn reject(&mut self, actor: &Actor) {
        self.status = InstanceStatus::Rejected;
        self.touch(actor);
    }

    /// Finalize as cancelled
    pub fn cancel(&mut self, actor: &Actor) {
        self.status = InstanceStatus::Cancelled;
        self.touch(actor);
    }

    fn touch(&mut self, actor: &Actor) {
        self.revised_by = Some(actor.user_id.clone());
        self.revised_by_name = Some(actor.display_name.clone());
        self.updated_at = Utc::now();
    }
}

// ── Approval Task ────────────────────────────────────────────────────

/// One approver's unit of work within an instance, tied to one node
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ApprovalTask {
    /// Unique identifier
    pub id: TaskId,
    /// Owning instance
    pub instance_id: InstanceId,
    /// The process node this task realizes
    pub node_id: NodeId,
    /// 1-based position in the resolved path
    pub task_step: u32,
    /// The resolved approver; `None` when the step was skipped
    pub approver: Option<UserId>,
    /// Lifecycle status
    pub status: TaskStatus,
    /// Whether the task resolved without human action
    pub auto_approved: bool,
    /// Free-form note attached at resolution or action time
    pub remark: Option<String>,
    /// Who acted on the task, if a human did
    pub acted_by: Option<UserId>,
    pub acted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl ApprovalTask {
    /// A task awaiting a human approver
    pub fn pending(instance_id: InstanceId, node_id: NodeId, step: u32, approver: UserId) -> Self {
        Self::build(instance_id, node_id, step, Some(approver), TaskStatus::Pending, false, None)
    }

    /// A task resolved as approved without human action
    pub fn auto_approved(
        instance_id: InstanceId,
        node_id: NodeId,
        step: u32,
        approver: UserId,
        remark: impl Into<String>,
    ) -> Self {
        Self::build(
            instance_id,
            node_id,
            step,
            Some(approver),
            TaskStatus::Approved,
            true,
            Some(remark.into()),
        )
    }

    /// A task skipped because no approver exists for the step
    pub fn skipped(
        instance_id: InstanceId,
        node_id: NodeId,
        step: u32,
        remark: impl Into<String>,
    ) -> Self {
        Self::build(
            instance_id,
            node_id,
            step,
            None,
            TaskStatus::Skipped,
            true,
            Some(remark.into()),
        )
    }

    fn build(
        instance_id: InstanceId,
        node_id: NodeId,
        step: u32,
        approver: Option<UserId>,
        status: TaskStatus,
        auto_approved: bool,
        remark: Option<String>,
    ) -> Self {
        Self {
            id: TaskId::generate(),
            instance_id,
            node_id,
            task_step: step,
            approver,
            status,
            auto_approved,
            remark,
            acted_by: None,
            acted_at: None,
            created_at: Utc::now(),
        }
    }

    /// Record a human approval
    pub fn approve(&mut self, actor: &Actor, remark: Option<String>) {
        self.status = TaskStatus::Approved;
        self.remark = remark;
        self.record_action(actor);
    }

    /// Record a human rejection
    pub fn reject(&mut self, actor: &Actor, remark: Option<String>) {
        self.status = TaskStatus::Rejected;
        self.remark = remark;
        self.record_action(actor);
    }

    /// Skip a sibling task because a peer approver acted first
    pub fn skip(&mut self, remark: impl Into<String>) {
        self.status = TaskStatus::Skipped;
        self.remark = Some(remark.into());
        self.acted_at = Some(Utc::now());
    }

    fn record_action(&mut self, actor: &Actor) {
        self.acted_by = Some(actor.user_id.clone());
        self.acted_at = Some(Utc::now());
    }
}
