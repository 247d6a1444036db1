//! Resubmission and cancellation guards.
//!
//! Both gates hinge on the same question: has a human actually exercised
//! approval judgment on the current instance? Auto-approvals (self-approval,
//! skipped steps) never count. Resubmission additionally respects the
//! order's operational state — an order that is already being pushed or
//! delivered is locked regardless of approval progress.

use crate::{ApprovalEngine, EngineError, EngineResult};
use approval_store::ApprovalStore;
use approval_types::{
    Actor, ApprovalInstance, AuditEntry, AuditEvent, InstanceStatus, OrderId, TaskStatus,
};

impl<S: ApprovalStore> ApprovalEngine<S> {
    /// Check whether the order may be resubmitted for approval.
    ///
    /// Returns the existing instance when one exists and does not block,
    /// `None` when the order was never submitted. Fails with `Validation`
    /// when the order status is locked or a human approval has already
    /// taken effect.
    pub async fn validate_resubmission(
        &self,
        order_id: &OrderId,
    ) -> EngineResult<Option<ApprovalInstance>> {
        let Some(instance) = self.store.instance_by_order(order_id).await? else {
            return Ok(None);
        };

        let status = self.orders.order_status(order_id).await?;
        if self.status_map.is_locked(&status) {
            return Err(EngineError::Validation(format!(
                "order {order_id} is {status} and can no longer be resubmitted"
            )));
        }

        self.ensure_no_human_approval(&instance, "resubmitted").await?;
        Ok(Some(instance))
    }

    /// Check whether the order's approval may be cancelled.
    ///
    /// A rejected instance is trivially cancellable — there is nothing to
    /// undo. Otherwise the same "no human approval yet" rule applies.
    pub async fn validate_cancellation(
        &self,
        order_id: &OrderId,
    ) -> EngineResult<Option<ApprovalInstance>> {
        let Some(instance) = self.store.instance_by_order(order_id).await? else {
            return Ok(None);
        };

        if instance.status == InstanceStatus::Rejected {
            return Ok(Some(instance));
        }

        self.ensure_no_human_approval(&instance, "cancelled").await?;
        Ok(Some(instance))
    }

    /// Cancel the order's approval, when the guard allows it.
    ///
    /// An instance that is already finished stays as it is; an in-flight
    /// one flips to `Cancelled` under the version check, with a
    /// cancellation audit entry in the same commit.
    pub async fn cancel(
        &self,
        order_id: &OrderId,
        actor: &Actor,
    ) -> EngineResult<ApprovalInstance> {
        let instance = self.validate_cancellation(order_id).await?.ok_or_else(|| {
            EngineError::NotFound(format!("order {order_id} has no approval instance"))
        })?;

        if instance.status.is_terminal() {
            return Ok(instance);
        }

        let expected_version = instance.version;
        let mut cancelled = instance;
        cancelled.cancel(actor);

        let audit = AuditEntry::new(
            cancelled.id.clone(),
            cancelled.order_id.clone(),
            actor,
            AuditEvent::Cancelled,
        );
        self.store
            .commit_action(approval_store::ActionCommit::new(
                expected_version,
                cancelled.clone(),
                audit,
            ))
            .await?;

        tracing::info!(
            instance_id = %cancelled.id,
            order_id = %cancelled.order_id,
            "approval instance cancelled"
        );

        Ok(cancelled)
    }

    async fn ensure_no_human_approval(
        &self,
        instance: &ApprovalInstance,
        action_word: &str,
    ) -> EngineResult<()> {
        let tasks = self.store.tasks_for_instance(&instance.id).await?;
        let human_acted = tasks
            .iter()
            .any(|t| t.status == TaskStatus::Approved && !t.auto_approved);
        if human_acted {
            return Err(EngineError::Validation(format!(
                "an approver has already acted on order {}; it cannot be {action_word}",
                instance.order_id
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::{regional_head, submission, submitter, OfflineOrderFixture};
    use crate::ActionRequest;
    use approval_store::TaskStore;
    use approval_types::OrderStatus;

    #[tokio::test]
    async fn unknown_order_is_always_resubmittable() {
        let fixture = OfflineOrderFixture::new();
        let engine = fixture.engine(Some("user-42"), None);

        let existing = engine
            .validate_resubmission(&OrderId::new("order-1"))
            .await
            .unwrap();
        assert!(existing.is_none());
    }

    #[tokio::test]
    async fn unacted_instance_allows_resubmission() {
        let fixture = OfflineOrderFixture::new();
        let engine = fixture.engine(Some("user-42"), None);

        let instance = engine
            .start_approval(submission("order-1", &submitter()))
            .await
            .unwrap();

        // Step 1 was auto-skipped (no provincial head); no human has acted.
        let existing = engine
            .validate_resubmission(&OrderId::new("order-1"))
            .await
            .unwrap();
        assert_eq!(existing.map(|i| i.id), Some(instance.id));
    }

    #[tokio::test]
    async fn human_approval_blocks_resubmission() {
        let fixture = OfflineOrderFixture::new();
        let engine = fixture.engine(Some("user-42"), Some("user-11"));

        let instance = engine
            .start_approval(submission("order-1", &submitter()))
            .await
            .unwrap();
        let tasks = fixture.store.tasks_for_instance(&instance.id).await.unwrap();
        engine
            .process_action(
                ActionRequest::agree(tasks[0].id.clone()),
                Actor::new("user-11", "Pat Provincial"),
            )
            .await
            .unwrap();

        let result = engine.validate_resubmission(&OrderId::new("order-1")).await;
        assert!(matches!(result, Err(EngineError::Validation(_))));
    }

    #[tokio::test]
    async fn locked_order_status_blocks_resubmission() {
        let fixture = OfflineOrderFixture::new();
        let engine = fixture.engine(Some("user-42"), None);

        engine
            .start_approval(submission("order-1", &submitter()))
            .await
            .unwrap();
        *fixture.orders.status.lock().unwrap() = OrderStatus::new("pushed");

        let result = engine.validate_resubmission(&OrderId::new("order-1")).await;
        match result {
            Err(EngineError::Validation(message)) => assert!(message.contains("pushed")),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn rejected_instance_is_trivially_cancellable() {
        let fixture = OfflineOrderFixture::new();
        let engine = fixture.engine(Some("user-42"), None);

        let instance = engine
            .start_approval(submission("order-1", &submitter()))
            .await
            .unwrap();
        let tasks = fixture.store.tasks_for_instance(&instance.id).await.unwrap();
        let current = tasks
            .iter()
            .find(|t| t.status == approval_types::TaskStatus::Pending)
            .unwrap();
        engine
            .process_action(ActionRequest::reject(current.id.clone()), regional_head())
            .await
            .unwrap();

        let existing = engine
            .validate_cancellation(&OrderId::new("order-1"))
            .await
            .unwrap();
        assert_eq!(
            existing.map(|i| i.status),
            Some(InstanceStatus::Rejected)
        );

        // Cancelling leaves the rejected instance untouched.
        let cancelled = engine
            .cancel(&OrderId::new("order-1"), &submitter())
            .await
            .unwrap();
        assert_eq!(cancelled.status, InstanceStatus::Rejected);
    }

    #[tokio::test]
    async fn human_approval_blocks_cancellation() {
        let fixture = OfflineOrderFixture::new();
        let engine = fixture.engine(Some("user-42"), Some("user-11"));

        let instance = engine
            .start_approval(submission("order-1", &submitter()))
            .await
            .unwrap();
        let tasks = fixture.store.tasks_for_instance(&instance.id).await.unwrap();
        engine
            .process_action(
                ActionRequest::agree(tasks[0].id.clone()),
                Actor::new("user-11", "Pat Provincial"),
            )
            .await
            .unwrap();

        let result = engine.validate_cancellation(&OrderId::new("order-1")).await;
        assert!(matches!(result, Err(EngineError::Validation(_))));
        let result = engine.cancel(&OrderId::new("order-1"), &submitter()).await;
        assert!(matches!(result, Err(EngineError::Validation(_))));
    }

    #[tokio::test]
    async fn cancel_flips_in_progress_instance() {
        let fixture = OfflineOrderFixture::new();
        let engine = fixture.engine(Some("user-42"), None);

        let instance = engine
            .start_approval(submission("order-1", &submitter()))
            .await
            .unwrap();

        let cancelled = engine
            .cancel(&OrderId::new("order-1"), &submitter())
            .await
            .unwrap();
        assert_eq!(cancelled.status, InstanceStatus::Cancelled);
        assert_eq!(cancelled.id, instance.id);

        let entries = engine.audit_trail(&instance.id).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].event, AuditEvent::Cancelled);

        // A cancelled instance accepts no further actions.
        let tasks = fixture.store.tasks_for_instance(&instance.id).await.unwrap();
        let current = tasks
            .iter()
            .find(|t| t.status == approval_types::TaskStatus::Pending)
            .unwrap();
        let result = engine
            .process_action(ActionRequest::agree(current.id.clone()), regional_head())
            .await;
        match result {
            Err(EngineError::Validation(message)) => assert!(message.contains("cancelled")),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn cancel_without_instance_is_not_found() {
        let fixture = OfflineOrderFixture::new();
        let engine = fixture.engine(Some("user-42"), None);

        let result = engine.cancel(&OrderId::new("order-9"), &submitter()).await;
        assert!(matches!(result, Err(EngineError::NotFound(_))));
    }
}
