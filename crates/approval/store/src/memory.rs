//! In-memory reference implementation of the approval store traits.
//!
//! Deterministic and test-friendly. Production deployments use the
//! PostgreSQL adapter for source-of-truth data. All collections live
//! under one lock so each write unit is visible atomically, matching
//! the transactional guarantee of the relational adapter.

use crate::model::{ActionCommit, InstanceCreation};
use crate::traits::{AuditStore, InstanceStore, ProcessStore, TaskStore};
use crate::{StoreError, StoreResult};
use approval_types::{
    ApprovalInstance, ApprovalTask, AuditEntry, InstanceId, InstanceStatus, NodeId, OrderId,
    ProcessCode, ProcessDefinition, ProcessId, ProcessNode, ProcessRouter, TaskId, TaskStatus,
    UserId,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

#[derive(Default)]
struct StoreState {
    definitions: HashMap<ProcessId, ProcessDefinition>,
    nodes: HashMap<NodeId, ProcessNode>,
    routers: HashMap<String, ProcessRouter>,
    instances: HashMap<InstanceId, ApprovalInstance>,
    tasks: HashMap<TaskId, ApprovalTask>,
    audits: Vec<AuditEntry>,
}

/// In-memory approval store adapter.
#[derive(Default)]
pub struct InMemoryApprovalStore {
    state: RwLock<StoreState>,
}

impl InMemoryApprovalStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load one process definition with its nodes and routers.
    pub fn seed_process(
        &self,
        definition: ProcessDefinition,
        nodes: Vec<ProcessNode>,
        routers: Vec<ProcessRouter>,
    ) -> StoreResult<()> {
        let mut state = self.write()?;
        state.definitions.insert(definition.id.clone(), definition);
        for node in nodes {
            state.nodes.insert(node.id.clone(), node);
        }
        for router in routers {
            state.routers.insert(router.id.0.clone(), router);
        }
        Ok(())
    }

    fn read(&self) -> StoreResult<std::sync::RwLockReadGuard<'_, StoreState>> {
        self.state
            .read()
            .map_err(|_| StoreError::Backend("store lock poisoned".to_string()))
    }

    fn write(&self) -> StoreResult<std::sync::RwLockWriteGuard<'_, StoreState>> {
        self.state
            .write()
            .map_err(|_| StoreError::Backend("store lock poisoned".to_string()))
    }
}

#[async_trait]
impl ProcessStore for InMemoryApprovalStore {
    async fn definition_by_code(
        &self,
        code: &ProcessCode,
    ) -> StoreResult<Option<ProcessDefinition>> {
        let state = self.read()?;
        Ok(state
            .definitions
            .values()
            .find(|d| &d.process_code == code)
            .cloned())
    }

    async fn start_node(&self, process_id: &ProcessId) -> StoreResult<Option<ProcessNode>> {
        let state = self.read()?;
        Ok(state
            .nodes
            .values()
            .find(|n| {
                &n.process_id == process_id
                    && n.kind == approval_types::NodeKind::Start
                    && n.is_active()
            })
            .cloned())
    }

    async fn node(&self, node_id: &NodeId) -> StoreResult<Option<ProcessNode>> {
        let state = self.read()?;
        Ok(state.nodes.get(node_id).cloned())
    }

    async fn outgoing_routers(&self, node_id: &NodeId) -> StoreResult<Vec<ProcessRouter>> {
        let state = self.read()?;
        let mut routers = state
            .routers
            .values()
            .filter(|r| &r.source_node_id == node_id && r.is_active())
            .cloned()
            .collect::<Vec<_>>();
        routers.sort_by(|a, b| a.priority.cmp(&b.priority).then_with(|| a.id.cmp(&b.id)));
        Ok(routers)
    }
}

#[async_trait]
impl InstanceStore for InMemoryApprovalStore {
    async fn instance(&self, id: &InstanceId) -> StoreResult<Option<ApprovalInstance>> {
        let state = self.read()?;
        Ok(state.instances.get(id).cloned())
    }

    async fn instance_by_order(
        &self,
        order_id: &OrderId,
    ) -> StoreResult<Option<ApprovalInstance>> {
        let state = self.read()?;
        Ok(state
            .instances
            .values()
            .find(|i| &i.order_id == order_id)
            .cloned())
    }

    async fn create_instance(&self, creation: InstanceCreation) -> StoreResult<()> {
        let mut state = self.write()?;

        if let Some(prior) = &creation.discard {
            state.tasks.retain(|_, t| &t.instance_id != prior);
            state.instances.remove(prior);
        }

        if state
            .instances
            .values()
            .any(|i| i.order_id == creation.instance.order_id)
        {
            return Err(StoreError::Conflict(format!(
                "order {} already has an approval instance",
                creation.instance.order_id
            )));
        }

        state
            .instances
            .insert(creation.instance.id.clone(), creation.instance);
        for task in creation.tasks {
            state.tasks.insert(task.id.clone(), task);
        }
        state.audits.push(creation.audit);
        Ok(())
    }

    async fn commit_action(&self, commit: ActionCommit) -> StoreResult<()> {
        let mut state = self.write()?;

        let stored = state.instances.get(&commit.instance.id).ok_or_else(|| {
            StoreError::NotFound(format!("instance {} not found", commit.instance.id))
        })?;
        if stored.version != commit.expected_version {
            return Err(StoreError::Conflict(format!(
                "instance {} was concurrently modified",
                commit.instance.id
            )));
        }

        for task in &commit.tasks {
            if !state.tasks.contains_key(&task.id) {
                return Err(StoreError::NotFound(format!("task {} not found", task.id)));
            }
        }

        let mut instance = commit.instance;
        instance.version = commit.expected_version + 1;
        state.instances.insert(instance.id.clone(), instance);
        for task in commit.tasks {
            state.tasks.insert(task.id.clone(), task);
        }
        state.audits.push(commit.audit);
        Ok(())
    }
}

#[async_trait]
impl TaskStore for InMemoryApprovalStore {
    async fn task(&self, id: &TaskId) -> StoreResult<Option<ApprovalTask>> {
        let state = self.read()?;
        Ok(state.tasks.get(id).cloned())
    }

    async fn tasks_for_instance(
        &self,
        instance_id: &InstanceId,
    ) -> StoreResult<Vec<ApprovalTask>> {
        let state = self.read()?;
        let mut tasks = state
            .tasks
            .values()
            .filter(|t| &t.instance_id == instance_id)
            .cloned()
            .collect::<Vec<_>>();
        tasks.sort_by(|a, b| a.task_step.cmp(&b.task_step).then_with(|| a.id.cmp(&b.id)));
        Ok(tasks)
    }

    async fn actionable_tasks_for_user(
        &self,
        user_id: &UserId,
    ) -> StoreResult<Vec<ApprovalTask>> {
        let state = self.read()?;
        let mut tasks = state
            .tasks
            .values()
            .filter(|t| t.approver.as_ref() == Some(user_id) && t.status == TaskStatus::Pending)
            .filter(|t| {
                state
                    .instances
                    .get(&t.instance_id)
                    .is_some_and(|i| {
                        i.status == InstanceStatus::InProgress
                            && i.current_step == Some(t.task_step)
                    })
            })
            .cloned()
            .collect::<Vec<_>>();
        tasks.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(tasks)
    }
}

#[async_trait]
impl AuditStore for InMemoryApprovalStore {
    async fn entries_for_instance(
        &self,
        instance_id: &InstanceId,
    ) -> StoreResult<Vec<AuditEntry>> {
        let state = self.read()?;
        Ok(state
            .audits
            .iter()
            .filter(|e| &e.instance_id == instance_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approval_types::{Actor, AssigneeRule, AuditEvent, ResponsibleScope};

    fn actor() -> Actor {
        Actor::new("user-7", "Sam Seller")
    }

    fn seeded_process(store: &InMemoryApprovalStore) -> (ProcessId, NodeId, Vec<NodeId>) {
        let definition = ProcessDefinition::new(ProcessCode::offline_order(), "Offline order");
        let process_id = definition.id.clone();

        let start = ProcessNode::start(process_id.clone());
        let first = ProcessNode::approval(
            process_id.clone(),
            1,
            AssigneeRule::CustomerResponsible {
                scope: ResponsibleScope::ProvincialHead,
            },
        );
        let second = ProcessNode::approval(
            process_id.clone(),
            2,
            AssigneeRule::CustomerResponsible {
                scope: ResponsibleScope::RegionalHead,
            },
        );
        let start_id = start.id.clone();
        let approval_ids = vec![first.id.clone(), second.id.clone()];

        let routers = vec![
            ProcessRouter::new(process_id.clone(), start_id.clone(), first.id.clone()),
            ProcessRouter::new(process_id.clone(), first.id.clone(), second.id.clone()),
        ];

        store
            .seed_process(definition, vec![start, first, second], routers)
            .unwrap();
        (process_id, start_id, approval_ids)
    }

    fn instance_with_task(
        process_id: &ProcessId,
        node_id: &NodeId,
        order: &str,
    ) -> (ApprovalInstance, ApprovalTask) {
        let mut instance =
            ApprovalInstance::new(process_id.clone(), OrderId::new(order), &actor());
        let task = ApprovalTask::pending(
            instance.id.clone(),
            node_id.clone(),
            1,
            UserId::new("user-42"),
        );
        instance.position_at(node_id.clone(), 1);
        (instance, task)
    }

    #[tokio::test]
    async fn definition_lookup_by_code() {
        let store = InMemoryApprovalStore::new();
        let (process_id, start_id, _) = seeded_process(&store);

        let found = store
            .definition_by_code(&ProcessCode::offline_order())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, process_id);

        let start = store.start_node(&process_id).await.unwrap().unwrap();
        assert_eq!(start.id, start_id);

        assert!(store
            .definition_by_code(&ProcessCode::new("ONLINE_ORDER"))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn outgoing_routers_sort_by_priority_then_id() {
        let store = InMemoryApprovalStore::new();
        let process_id = ProcessId::generate();
        let source = NodeId::new("source");

        let mut high = ProcessRouter::new(process_id.clone(), source.clone(), NodeId::new("a"))
            .with_priority(5);
        high.id = approval_types::RouterId::new("zz");
        let mut tie_b = ProcessRouter::new(process_id.clone(), source.clone(), NodeId::new("b"))
            .with_priority(1);
        tie_b.id = approval_types::RouterId::new("bb");
        let mut tie_a = ProcessRouter::new(process_id.clone(), source.clone(), NodeId::new("c"))
            .with_priority(1);
        tie_a.id = approval_types::RouterId::new("aa");

        store
            .seed_process(
                ProcessDefinition::new(ProcessCode::new("P"), "P"),
                vec![],
                vec![high, tie_b, tie_a],
            )
            .unwrap();

        let routers = store.outgoing_routers(&source).await.unwrap();
        let ids: Vec<&str> = routers.iter().map(|r| r.id.0.as_str()).collect();
        assert_eq!(ids, vec!["aa", "bb", "zz"]);
    }

    #[tokio::test]
    async fn disabled_routers_are_invisible() {
        let store = InMemoryApprovalStore::new();
        let process_id = ProcessId::generate();
        let source = NodeId::new("source");
        let router = ProcessRouter::new(process_id.clone(), source.clone(), NodeId::new("a"))
            .with_enabled(false);

        store
            .seed_process(
                ProcessDefinition::new(ProcessCode::new("P"), "P"),
                vec![],
                vec![router],
            )
            .unwrap();

        assert!(store.outgoing_routers(&source).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn create_instance_rejects_duplicate_order() {
        let store = InMemoryApprovalStore::new();
        let (process_id, _, approvals) = seeded_process(&store);

        let (instance, task) = instance_with_task(&process_id, &approvals[0], "order-1");
        let audit = AuditEntry::new(
            instance.id.clone(),
            instance.order_id.clone(),
            &actor(),
            AuditEvent::Submitted,
        );
        store
            .create_instance(InstanceCreation::new(instance, vec![task], audit))
            .await
            .unwrap();

        let (dup, dup_task) = instance_with_task(&process_id, &approvals[0], "order-1");
        let audit = AuditEntry::new(
            dup.id.clone(),
            dup.order_id.clone(),
            &actor(),
            AuditEvent::Submitted,
        );
        let result = store
            .create_instance(InstanceCreation::new(dup, vec![dup_task], audit))
            .await;
        assert!(matches!(result, Err(StoreError::Conflict(_))));
    }

    #[tokio::test]
    async fn discard_cascades_to_tasks() {
        let store = InMemoryApprovalStore::new();
        let (process_id, _, approvals) = seeded_process(&store);

        let (prior, prior_task) = instance_with_task(&process_id, &approvals[0], "order-1");
        let prior_id = prior.id.clone();
        let prior_task_id = prior_task.id.clone();
        let audit = AuditEntry::new(
            prior.id.clone(),
            prior.order_id.clone(),
            &actor(),
            AuditEvent::Submitted,
        );
        store
            .create_instance(InstanceCreation::new(prior, vec![prior_task], audit))
            .await
            .unwrap();

        let (fresh, fresh_task) = instance_with_task(&process_id, &approvals[0], "order-1");
        let fresh_id = fresh.id.clone();
        let audit = AuditEntry::new(
            fresh.id.clone(),
            fresh.order_id.clone(),
            &actor(),
            AuditEvent::Resubmitted,
        );
        store
            .create_instance(
                InstanceCreation::new(fresh, vec![fresh_task], audit).discarding(prior_id.clone()),
            )
            .await
            .unwrap();

        assert!(store.instance(&prior_id).await.unwrap().is_none());
        assert!(store.task(&prior_task_id).await.unwrap().is_none());
        assert!(store.instance(&fresh_id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn commit_action_checks_version() {
        let store = InMemoryApprovalStore::new();
        let (process_id, _, approvals) = seeded_process(&store);

        let (instance, task) = instance_with_task(&process_id, &approvals[0], "order-1");
        let audit = AuditEntry::new(
            instance.id.clone(),
            instance.order_id.clone(),
            &actor(),
            AuditEvent::Submitted,
        );
        let snapshot = instance.clone();
        store
            .create_instance(InstanceCreation::new(instance, vec![task.clone()], audit))
            .await
            .unwrap();

        let stale = ActionCommit::new(
            snapshot.version - 1,
            snapshot.clone(),
            AuditEntry::new(
                snapshot.id.clone(),
                snapshot.order_id.clone(),
                &actor(),
                AuditEvent::Approved,
            ),
        );
        assert!(matches!(
            store.commit_action(stale).await,
            Err(StoreError::Conflict(_))
        ));

        let good = ActionCommit::new(
            snapshot.version,
            snapshot.clone(),
            AuditEntry::new(
                snapshot.id.clone(),
                snapshot.order_id.clone(),
                &actor(),
                AuditEvent::Approved,
            ),
        )
        .with_task(task);
        store.commit_action(good).await.unwrap();

        let stored = store.instance(&snapshot.id).await.unwrap().unwrap();
        assert_eq!(stored.version, snapshot.version + 1);

        let entries = store.entries_for_instance(&snapshot.id).await.unwrap();
        assert_eq!(entries.len(), 2);
    }

    #[tokio::test]
    async fn actionable_tasks_respect_current_step() {
        let store = InMemoryApprovalStore::new();
        let (process_id, _, approvals) = seeded_process(&store);

        let mut instance =
            ApprovalInstance::new(process_id.clone(), OrderId::new("order-1"), &actor());
        let behind = ApprovalTask::pending(
            instance.id.clone(),
            approvals[0].clone(),
            1,
            UserId::new("user-42"),
        );
        let current = ApprovalTask::pending(
            instance.id.clone(),
            approvals[1].clone(),
            2,
            UserId::new("user-42"),
        );
        let current_id = current.id.clone();
        instance.position_at(approvals[1].clone(), 2);
        let audit = AuditEntry::new(
            instance.id.clone(),
            instance.order_id.clone(),
            &actor(),
            AuditEvent::Submitted,
        );
        store
            .create_instance(InstanceCreation::new(instance, vec![behind, current], audit))
            .await
            .unwrap();

        let actionable = store
            .actionable_tasks_for_user(&UserId::new("user-42"))
            .await
            .unwrap();
        assert_eq!(actionable.len(), 1);
        assert_eq!(actionable[0].id, current_id);

        assert!(store
            .actionable_tasks_for_user(&UserId::new("user-99"))
            .await
            .unwrap()
            .is_empty());
    }
}
