//! Write units accepted by the instance store.
//!
//! Both shapes describe one atomic commit: either everything in them
//! becomes visible together, or nothing does.

use approval_types::{ApprovalInstance, ApprovalTask, AuditEntry, InstanceId};

/// Everything inserted when an approval starts.
#[derive(Clone, Debug)]
pub struct InstanceCreation {
    /// Prior unacted instance to hard-delete first (resubmission path);
    /// its tasks go with it, in the same transaction.
    pub discard: Option<InstanceId>,
    /// The new instance row.
    pub instance: ApprovalInstance,
    /// All task rows, in `task_step` order.
    pub tasks: Vec<ApprovalTask>,
    /// The submission audit entry.
    pub audit: AuditEntry,
}

impl InstanceCreation {
    pub fn new(instance: ApprovalInstance, tasks: Vec<ApprovalTask>, audit: AuditEntry) -> Self {
        Self {
            discard: None,
            instance,
            tasks,
            audit,
        }
    }

    pub fn discarding(mut self, prior: InstanceId) -> Self {
        self.discard = Some(prior);
        self
    }
}

/// One approval action's row changes, applied under a version check.
///
/// `expected_version` is the instance version the caller read before
/// computing the transition. The adapter writes the instance snapshot
/// with `expected_version + 1`; a stored version that no longer matches
/// fails the whole commit with [`StoreError::Conflict`](crate::StoreError).
#[derive(Clone, Debug)]
pub struct ActionCommit {
    /// Version the transition was computed against.
    pub expected_version: i64,
    /// Updated instance snapshot.
    pub instance: ApprovalInstance,
    /// Updated task snapshots: the acted task plus skipped siblings.
    pub tasks: Vec<ApprovalTask>,
    /// The action audit entry.
    pub audit: AuditEntry,
}

impl ActionCommit {
    pub fn new(expected_version: i64, instance: ApprovalInstance, audit: AuditEntry) -> Self {
        Self {
            expected_version,
            instance,
            tasks: Vec::new(),
            audit,
        }
    }

    pub fn with_task(mut self, task: ApprovalTask) -> Self {
        self.tasks.push(task);
        self
    }
}
