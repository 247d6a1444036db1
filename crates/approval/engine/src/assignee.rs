//! Assignee resolution: from a node's assignment rule to a task seed.
//!
//! Resolution decides who must approve a step and whether the step needs
//! a human at all: a step whose configured approver is the submitter is
//! auto-approved, and a missing provincial head skips the step outright.

use crate::{CustomerDirectory, EngineError, EngineResult};
use approval_types::{
    ApprovalTask, AssigneeRule, InstanceId, NodeId, ProcessNode, ResponsibleScope,
    SubmissionContext, UserId,
};

/// Outcome of resolving one node for one submission.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResolvedAssignee {
    /// The step awaits the named approver.
    Pending { approver: UserId },
    /// Auto-approved: the configured approver is the submitter.
    SelfApproved { approver: UserId },
    /// Skipped: no approver exists for the step.
    Skipped { remark: String },
}

impl ResolvedAssignee {
    /// Materialize as a task row at the given step.
    pub fn into_task(self, instance_id: InstanceId, node_id: NodeId, step: u32) -> ApprovalTask {
        match self {
            Self::Pending { approver } => {
                ApprovalTask::pending(instance_id, node_id, step, approver)
            }
            Self::SelfApproved { approver } => ApprovalTask::auto_approved(
                instance_id,
                node_id,
                step,
                approver,
                "self-approval, auto-approved",
            ),
            Self::Skipped { remark } => ApprovalTask::skipped(instance_id, node_id, step, remark),
        }
    }
}

/// Resolves assignment rules against the customer directory.
pub struct AssigneeResolver<'a> {
    customers: &'a dyn CustomerDirectory,
}

impl<'a> AssigneeResolver<'a> {
    pub fn new(customers: &'a dyn CustomerDirectory) -> Self {
        Self { customers }
    }

    /// Resolve the approver for one node of the submission's path.
    pub async fn resolve(
        &self,
        node: &ProcessNode,
        submission: &SubmissionContext,
    ) -> EngineResult<ResolvedAssignee> {
        let rule = node.assignee.as_ref().ok_or_else(|| {
            EngineError::Validation(format!(
                "approval node {} has no assignment rule",
                node.id
            ))
        })?;

        match rule {
            AssigneeRule::User { user_id } => Ok(self.with_self_check(user_id.clone(), submission)),

            AssigneeRule::CustomerResponsible {
                scope: ResponsibleScope::ProvincialHead,
            } => {
                match self
                    .customers
                    .provincial_head(&submission.customer_id)
                    .await?
                {
                    // The one case where a missing approver is not an error.
                    None => Ok(ResolvedAssignee::Skipped {
                        remark: "no provincial head, step skipped".to_string(),
                    }),
                    Some(head) => Ok(self.with_self_check(head, submission)),
                }
            }

            AssigneeRule::CustomerResponsible {
                scope: ResponsibleScope::RegionalHead,
            } => {
                match self
                    .customers
                    .regional_head(&submission.customer_id)
                    .await?
                {
                    None => Err(EngineError::Validation(format!(
                        "customer {} has no regional head configured",
                        submission.customer_id
                    ))),
                    Some(head) => Ok(self.with_self_check(head, submission)),
                }
            }

            AssigneeRule::Role { role } => Err(EngineError::Validation(format!(
                "role-based assignment (`{role}`) is not supported by the configured processes"
            ))),
        }
    }

    fn with_self_check(
        &self,
        approver: UserId,
        submission: &SubmissionContext,
    ) -> ResolvedAssignee {
        if approver == submission.submitter.user_id {
            ResolvedAssignee::SelfApproved { approver }
        } else {
            ResolvedAssignee::Pending { approver }
        }
    }
}
