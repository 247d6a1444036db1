//! Process reference data: the blueprint an approval runs against.
//!
//! A process is a directed graph. Nodes are approval checkpoints with an
//! assignment rule; routers are conditional edges ordered by priority.
//! Reference data is immutable at runtime — the engine only reads it.

use serde::{Deserialize, Serialize};

// ── Identifiers ──────────────────────────────────────────────────────

/// Unique identifier for a process definition
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProcessId(pub String);

impl ProcessId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for ProcessId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a process node
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub String);

impl NodeId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a process router
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RouterId(pub String);

impl RouterId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for RouterId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Business key of a process definition (e.g. `OFFLINE_ORDER`)
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProcessCode(pub String);

impl ProcessCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// The offline order approval process shipped with the back office.
    pub fn offline_order() -> Self {
        Self("OFFLINE_ORDER".to_string())
    }
}

impl std::fmt::Display for ProcessCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ── Process Definition ───────────────────────────────────────────────

/// A process definition — immutable reference data keyed by business code
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProcessDefinition {
    /// Unique identifier
    pub id: ProcessId,
    /// Globally unique business key
    pub process_code: ProcessCode,
    /// Human-readable name
    pub name: String,
}

impl ProcessDefinition {
    pub fn new(process_code: ProcessCode, name: impl Into<String>) -> Self {
        Self {
            id: ProcessId::generate(),
            process_code,
            name: name.into(),
        }
    }
}

// ── Process Node ─────────────────────────────────────────────────────

/// The type of a process node
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    /// The entry point of the process; never carries an approval task
    Start,
    /// One approval checkpoint
    Approval,
}

/// How many approvers at one node must act
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApprovalStrategy {
    /// Any one approver settles the step
    AnyOne,
    /// Every approver must act
    All,
}

/// Which responsible person of the customer a node targets
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResponsibleScope {
    /// Mandatory — every customer has a regional head
    RegionalHead,
    /// Optional — the step is skipped when absent
    ProvincialHead,
}

/// The assignment rule of an approval node
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssigneeRule {
    /// A fixed user id
    User { user_id: crate::UserId },
    /// A role name, resolved by a future process
    Role { role: String },
    /// The customer's configured responsible person
    CustomerResponsible { scope: ResponsibleScope },
}

/// A node in the process graph
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProcessNode {
    /// Unique identifier
    pub id: NodeId,
    /// Owning process
    pub process_id: ProcessId,
    /// Node type
    pub kind: NodeKind,
    /// Ordinal used for display; routing order comes from routers
    pub node_order: u32,
    /// Assignment rule; `None` only for the start node
    pub assignee: Option<AssigneeRule>,
    /// Approval strategy at this node
    pub strategy: ApprovalStrategy,
    /// Disabled nodes are invisible to routing
    pub enabled: bool,
    /// Soft-delete flag
    pub deleted: bool,
}

impl ProcessNode {
    /// Create the start node of a process
    pub fn start(process_id: ProcessId) -> Self {
        Self {
            id: NodeId::generate(),
            process_id,
            kind: NodeKind::Start,
            node_order: 0,
            assignee: None,
            strategy: ApprovalStrategy::AnyOne,
            enabled: true,
            deleted: false,
        }
    }

    /// Create an approval node with an assignment rule
    pub fn approval(process_id: ProcessId, node_order: u32, assignee: AssigneeRule) -> Self {
        Self {
            id: NodeId::generate(),
            process_id,
            kind: NodeKind::Approval,
            node_order,
            assignee: Some(assignee),
            strategy: ApprovalStrategy::AnyOne,
            enabled: true,
            deleted: false,
        }
    }

    pub fn with_strategy(mut self, strategy: ApprovalStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_deleted(mut self, deleted: bool) -> Self {
        self.deleted = deleted;
        self
    }

    /// Visible to routing: enabled and not soft-deleted
    pub fn is_active(&self) -> bool {
        self.enabled && !self.deleted
    }
}

// ── Process Router ───────────────────────────────────────────────────

/// A directed, conditional edge between two nodes
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProcessRouter {
    /// Unique identifier; also the deterministic tie-break on equal priority
    pub id: RouterId,
    /// Owning process
    pub process_id: ProcessId,
    /// Source node
    pub source_node_id: NodeId,
    /// Target node
    pub target_node_id: NodeId,
    /// Routing condition; `None` means always true
    pub condition: Option<String>,
    /// Ascending priority — lower value is evaluated first
    pub priority: u32,
    /// Disabled routers are invisible to routing
    pub enabled: bool,
    /// Soft-delete flag
    pub deleted: bool,
}

impl ProcessRouter {
    pub fn new(process_id: ProcessId, source: NodeId, target: NodeId) -> Self {
        Self {
            id: RouterId::generate(),
            process_id,
            source_node_id: source,
            target_node_id: target,
            condition: None,
            priority: 0,
            enabled: true,
            deleted: false,
        }
    }

    pub fn with_condition(mut self, condition: impl Into<String>) -> Self {
        self.condition = Some(condition.into());
        self
    }

    pub fn with_priority(mut self, priority: u32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_deleted(mut self, deleted: bool) -> Self {
        self.deleted = deleted;
        self
    }

    pub fn is_active(&self) -> bool {
        self.enabled && !self.deleted
    }
}
