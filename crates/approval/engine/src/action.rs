//! Approval action processing: one approve/reject becomes one atomic
//! state transition.
//!
//! Acting on a task settles its whole step — pending siblings are
//! skipped — and either advances the instance to the next pending step
//! or finalizes it. A rejection is terminal for the instance. The commit
//! runs under the instance version check; a losing concurrent writer
//! re-reads state and surfaces the double-action error instead of
//! double-advancing.

use crate::{ApprovalEngine, EngineError, EngineResult};
use approval_store::{ActionCommit, ApprovalStore, StoreError};
use approval_types::{
    Actor, ApprovalTask, AuditEntry, AuditEvent, InstanceStatus, OrderStatus, TaskId, TaskStatus,
};
use serde::{Deserialize, Serialize};

/// How many times a version conflict is retried before giving up.
const MAX_COMMIT_ATTEMPTS: u32 = 3;

/// What the approver decided.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApprovalAction {
    Agree,
    Reject,
}

/// One approver's decision on one task.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ActionRequest {
    pub task_id: TaskId,
    pub action: ApprovalAction,
    pub remark: Option<String>,
}

impl ActionRequest {
    pub fn agree(task_id: TaskId) -> Self {
        Self {
            task_id,
            action: ApprovalAction::Agree,
            remark: None,
        }
    }

    pub fn reject(task_id: TaskId) -> Self {
        Self {
            task_id,
            action: ApprovalAction::Reject,
            remark: None,
        }
    }

    pub fn with_remark(mut self, remark: impl Into<String>) -> Self {
        self.remark = Some(remark.into());
        self
    }
}

/// Result of a processed action, for the caller to apply upstream.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ActionOutcome {
    /// Instance status after the transition.
    pub instance_status: InstanceStatus,
    /// Externally-visible order status mapped from the transition.
    pub order_status: OrderStatus,
    /// Human-readable summary of what happened.
    pub message: String,
}

impl<S: ApprovalStore> ApprovalEngine<S> {
    /// Process one approve/reject action on a task.
    ///
    /// The task update, sibling skips, instance update, and audit entry
    /// commit as one version-checked unit; afterwards the order gateway
    /// receives the mapped status. A concurrent action on the same
    /// instance loses the version check, and the retry re-reads state so
    /// it fails with the double-action business error.
    pub async fn process_action(
        &self,
        request: ActionRequest,
        actor: Actor,
    ) -> EngineResult<ActionOutcome> {
        let mut attempt = 1;
        loop {
            match self.try_action(&request, &actor).await {
                Err(EngineError::Store(StoreError::Conflict(reason)))
                    if attempt < MAX_COMMIT_ATTEMPTS =>
                {
                    tracing::warn!(
                        task_id = %request.task_id,
                        attempt,
                        reason,
                        "action commit lost a version check, retrying"
                    );
                    attempt += 1;
                }
                outcome => return outcome,
            }
        }
    }

    async fn try_action(
        &self,
        request: &ActionRequest,
        actor: &Actor,
    ) -> EngineResult<ActionOutcome> {
        let task = self
            .store
            .task(&request.task_id)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("task {} not found", request.task_id)))?;

        let instance = self.store.instance(&task.instance_id).await?.ok_or_else(|| {
            EngineError::NotFound(format!("instance {} not found", task.instance_id))
        })?;

        match instance.status {
            InstanceStatus::InProgress => {}
            InstanceStatus::Approved => {
                return Err(EngineError::Validation(format!(
                    "order {} is already approved",
                    instance.order_id
                )))
            }
            InstanceStatus::Rejected => {
                return Err(EngineError::Validation(format!(
                    "order {} is already rejected",
                    instance.order_id
                )))
            }
            InstanceStatus::Cancelled => {
                return Err(EngineError::Validation(format!(
                    "order {} approval was cancelled",
                    instance.order_id
                )))
            }
        }

        if task.status != TaskStatus::Pending {
            return Err(EngineError::Validation(format!(
                "task {} has already been acted on",
                task.id
            )));
        }
        if task.approver.as_ref() != Some(&actor.user_id) {
            return Err(EngineError::Validation(format!(
                "task {} is not assigned to user {}",
                task.id, actor.user_id
            )));
        }

        let all_tasks = self.store.tasks_for_instance(&task.instance_id).await?;
        let siblings: Vec<&ApprovalTask> = all_tasks
            .iter()
            .filter(|t| {
                t.task_step == task.task_step && t.id != task.id && t.status == TaskStatus::Pending
            })
            .collect();

        let expected_version = instance.version;
        let mut updated_instance = instance;
        let mut updated_task = task;

        let (order_status, event, message) = match request.action {
            ApprovalAction::Reject => {
                updated_task.reject(actor, request.remark.clone());
                updated_instance.reject(actor);
                (
                    self.status_map.rejected.clone(),
                    AuditEvent::Rejected,
                    format!("order {} rejected", updated_instance.order_id),
                )
            }
            ApprovalAction::Agree => {
                updated_task.approve(actor, request.remark.clone());
                let next = all_tasks.iter().find(|t| {
                    t.task_step > updated_task.task_step && t.status == TaskStatus::Pending
                });
                match next {
                    Some(next) => {
                        updated_instance.advance_to(next.node_id.clone(), next.task_step, actor);
                        let status = self
                            .status_map
                            .status_for_node(&next.node_id)
                            .ok_or_else(|| {
                                EngineError::Validation(format!(
                                    "node {} has no configured order status",
                                    next.node_id
                                ))
                            })?
                            .clone();
                        (
                            status,
                            AuditEvent::Approved,
                            format!(
                                "step {} approved, awaiting step {}",
                                updated_task.task_step, next.task_step
                            ),
                        )
                    }
                    None => {
                        updated_instance.approve(actor);
                        (
                            self.status_map.approved.clone(),
                            AuditEvent::Approved,
                            format!("order {} fully approved", updated_instance.order_id),
                        )
                    }
                }
            }
        };

        let mut audit = AuditEntry::new(
            updated_instance.id.clone(),
            updated_instance.order_id.clone(),
            actor,
            event,
        );
        if let Some(remark) = &request.remark {
            audit = audit.with_remark(remark.clone());
        }

        let mut commit = ActionCommit::new(expected_version, updated_instance.clone(), audit)
            .with_task(updated_task);
        for sibling in siblings {
            let mut skipped = sibling.clone();
            skipped.skip("peer approver acted, step skipped");
            commit = commit.with_task(skipped);
        }
        self.store.commit_action(commit).await?;

        self.orders
            .update_order_status(
                &updated_instance.order_id,
                &order_status,
                request.remark.as_deref(),
                actor,
            )
            .await?;

        tracing::info!(
            instance_id = %updated_instance.id,
            order_id = %updated_instance.order_id,
            task_id = %request.task_id,
            action = ?request.action,
            status = ?updated_instance.status,
            order_status = %order_status,
            "approval action processed"
        );

        Ok(ActionOutcome {
            instance_status: updated_instance.status,
            order_status,
            message,
        })
    }
}
