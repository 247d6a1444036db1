//! Instance orchestration: one submission becomes one instance plus its
//! ordered tasks, persisted as a single write unit.
//!
//! Every node of the resolved path gets a task up front; auto-approval
//! and skip outcomes are settled at creation time, so the instance
//! starts at the first step that genuinely needs a human — or finishes
//! immediately when no step does.

use crate::{AssigneeResolver, EngineError, EngineResult, PathResolver};
use approval_store::{ApprovalStore, InstanceCreation};
use approval_types::{
    ApprovalInstance, ApprovalTask, AuditEntry, AuditEvent, SubmissionContext, TaskStatus,
};

use crate::ApprovalEngine;

impl<S: ApprovalStore> ApprovalEngine<S> {
    /// Start the approval process for a submitted order.
    ///
    /// Runs as one atomic store operation: a prior unacted instance (the
    /// resubmission path) is discarded in the same unit that inserts the
    /// new instance, all its tasks, and the submission audit entry. Any
    /// lookup failure aborts the whole operation.
    pub async fn start_approval(
        &self,
        submission: SubmissionContext,
    ) -> EngineResult<ApprovalInstance> {
        let definition = self
            .store
            .definition_by_code(&submission.process_code)
            .await?
            .ok_or_else(|| {
                EngineError::NotFound(format!(
                    "process definition `{}` not found",
                    submission.process_code
                ))
            })?;

        // Throws when the existing instance blocks resubmission.
        let prior = self.validate_resubmission(&submission.order_id).await?;

        let resolver = PathResolver::new(self.store.as_ref(), &self.evaluator);
        let nodes = resolver.resolve(&definition.id, &submission.routing).await?;

        let mut instance = ApprovalInstance::new(
            definition.id.clone(),
            submission.order_id.clone(),
            &submission.submitter,
        );

        let assignees = AssigneeResolver::new(self.customers.as_ref());
        let mut tasks: Vec<ApprovalTask> = Vec::with_capacity(nodes.len());
        for (index, node) in nodes.iter().enumerate() {
            let resolved = assignees.resolve(node, &submission).await?;
            tasks.push(resolved.into_task(
                instance.id.clone(),
                node.id.clone(),
                index as u32 + 1,
            ));
        }

        match tasks.iter().find(|t| t.status == TaskStatus::Pending) {
            Some(current) => instance.position_at(current.node_id.clone(), current.task_step),
            // Every step auto-resolved; the approval is complete on arrival.
            None => instance.approve(&submission.submitter),
        }

        let event = if prior.is_some() {
            AuditEvent::Resubmitted
        } else {
            AuditEvent::Submitted
        };
        let audit = AuditEntry::new(
            instance.id.clone(),
            submission.order_id.clone(),
            &submission.submitter,
            event,
        );

        let mut creation = InstanceCreation::new(instance.clone(), tasks, audit);
        if let Some(prior) = prior {
            creation = creation.discarding(prior.id);
        }
        self.store.create_instance(creation).await?;

        tracing::info!(
            instance_id = %instance.id,
            order_id = %instance.order_id,
            status = ?instance.status,
            current_step = ?instance.current_step,
            "approval instance created"
        );

        Ok(instance)
    }
}
