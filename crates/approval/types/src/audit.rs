//! Audit entries written alongside every mutation.
//!
//! One entry per submission and per approval action, persisted in the
//! same transaction as the rows it describes.

use crate::{Actor, InstanceId, OrderId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What happened to an instance
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditEvent {
    Submitted,
    Resubmitted,
    Approved,
    Rejected,
    Cancelled,
}

/// One audit row
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: String,
    pub instance_id: InstanceId,
    pub order_id: OrderId,
    pub actor_id: UserId,
    pub actor_name: String,
    pub event: AuditEvent,
    pub remark: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl AuditEntry {
    pub fn new(
        instance_id: InstanceId,
        order_id: OrderId,
        actor: &Actor,
        event: AuditEvent,
    ) -> Self {
        Self {
            id: format!("audit-{}", uuid::Uuid::new_v4()),
            instance_id,
            order_id,
            actor_id: actor.user_id.clone(),
            actor_name: actor.display_name.clone(),
            event,
            remark: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_remark(mut self, remark: impl Into<String>) -> Self {
        self.remark = Some(remark.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_records_actor() {
        let entry = AuditEntry::new(
            InstanceId::generate(),
            OrderId::new("order-1"),
            &Actor::new("user-42", "Rita Regional"),
            AuditEvent::Approved,
        )
        .with_remark("ok");

        assert_eq!(entry.actor_id, UserId::new("user-42"));
        assert_eq!(entry.event, AuditEvent::Approved);
        assert_eq!(entry.remark.as_deref(), Some("ok"));
        assert!(entry.id.starts_with("audit-"));
    }
}
