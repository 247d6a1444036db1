//! Path resolution: from process graph to ordered approval nodes.
//!
//! Walks the graph from the start node, taking at each node the first
//! satisfied outgoing router in `(priority, id)` order. The walk stops
//! when no router matches; the nodes collected on the way are the
//! approval steps the order must pass through.

use crate::{ConditionEvaluator, EngineError, EngineResult};
use approval_store::ProcessStore;
use approval_types::{NodeKind, ProcessId, ProcessNode, RoutingContext};
use std::collections::HashSet;

/// Resolves the ordered approval path for one submission.
pub struct PathResolver<'a, S: ?Sized> {
    store: &'a S,
    evaluator: &'a ConditionEvaluator,
}

impl<'a, S: ProcessStore + ?Sized> PathResolver<'a, S> {
    pub fn new(store: &'a S, evaluator: &'a ConditionEvaluator) -> Self {
        Self { store, evaluator }
    }

    /// Resolve the node path for `process_id` under `ctx`.
    ///
    /// Fails with `NotFound` when the process has no usable start node,
    /// and with `Validation` when routing yields no approval step, when a
    /// router targets an unusable node, or when the graph revisits a node.
    pub async fn resolve(
        &self,
        process_id: &ProcessId,
        ctx: &RoutingContext,
    ) -> EngineResult<Vec<ProcessNode>> {
        let start = self.store.start_node(process_id).await?.ok_or_else(|| {
            EngineError::NotFound(format!("process {process_id} has no start node"))
        })?;

        let mut visited = HashSet::new();
        visited.insert(start.id.clone());

        let mut path: Vec<ProcessNode> = Vec::new();
        let mut current = start;

        loop {
            let routers = self.store.outgoing_routers(&current.id).await?;
            let matched = routers
                .into_iter()
                .find(|r| self.evaluator.evaluate(r.condition.as_deref(), ctx));

            let Some(router) = matched else {
                break;
            };

            let target = self
                .store
                .node(&router.target_node_id)
                .await?
                .ok_or_else(|| {
                    EngineError::NotFound(format!(
                        "router {} targets missing node {}",
                        router.id, router.target_node_id
                    ))
                })?;

            if target.kind != NodeKind::Approval || !target.is_active() {
                return Err(EngineError::Validation(format!(
                    "router {} targets node {} which is not an active approval node",
                    router.id, target.id
                )));
            }

            if !visited.insert(target.id.clone()) {
                return Err(EngineError::Validation(format!(
                    "process {process_id} routing revisits node {}",
                    target.id
                )));
            }

            path.push(target.clone());
            current = target;
        }

        if path.is_empty() {
            return Err(EngineError::Validation(format!(
                "no routing condition matched for process {process_id}; at least one approval step is required"
            )));
        }

        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approval_store::memory::InMemoryApprovalStore;
    use approval_types::{
        AssigneeRule, ProcessCode, ProcessDefinition, ProcessRouter, RouterId, UserId,
    };

    fn rule() -> AssigneeRule {
        AssigneeRule::User {
            user_id: UserId::new("user-1"),
        }
    }

    fn seeded(
        nodes: Vec<ProcessNode>,
        routers: Vec<ProcessRouter>,
        definition: ProcessDefinition,
    ) -> InMemoryApprovalStore {
        let store = InMemoryApprovalStore::new();
        store.seed_process(definition, nodes, routers).unwrap();
        store
    }

    async fn resolve(
        store: &InMemoryApprovalStore,
        process_id: &ProcessId,
        ctx: &RoutingContext,
    ) -> EngineResult<Vec<ProcessNode>> {
        let evaluator = ConditionEvaluator::new();
        PathResolver::new(store, &evaluator)
            .resolve(process_id, ctx)
            .await
    }

    #[tokio::test]
    async fn linear_path_in_router_order() {
        let definition = ProcessDefinition::new(ProcessCode::offline_order(), "Offline order");
        let process_id = definition.id.clone();
        let start = ProcessNode::start(process_id.clone());
        let first = ProcessNode::approval(process_id.clone(), 1, rule());
        let second = ProcessNode::approval(process_id.clone(), 2, rule());
        let routers = vec![
            ProcessRouter::new(process_id.clone(), start.id.clone(), first.id.clone()),
            ProcessRouter::new(process_id.clone(), first.id.clone(), second.id.clone()),
        ];
        let store = seeded(
            vec![start, first.clone(), second.clone()],
            routers,
            definition,
        );

        let path = resolve(&store, &process_id, &RoutingContext::new(0.0))
            .await
            .unwrap();
        let ids: Vec<_> = path.iter().map(|n| n.id.clone()).collect();
        assert_eq!(ids, vec![first.id, second.id]);
    }

    #[tokio::test]
    async fn first_satisfied_condition_wins_by_priority() {
        let definition = ProcessDefinition::new(ProcessCode::offline_order(), "Offline order");
        let process_id = definition.id.clone();
        let start = ProcessNode::start(process_id.clone());
        let pricey = ProcessNode::approval(process_id.clone(), 1, rule());
        let cheap = ProcessNode::approval(process_id.clone(), 2, rule());
        let routers = vec![
            ProcessRouter::new(process_id.clone(), start.id.clone(), pricey.id.clone())
                .with_condition("order_amount >= 100000")
                .with_priority(1),
            ProcessRouter::new(process_id.clone(), start.id.clone(), cheap.id.clone())
                .with_priority(2),
        ];
        let store = seeded(
            vec![start, pricey.clone(), cheap.clone()],
            routers,
            definition,
        );

        let path = resolve(&store, &process_id, &RoutingContext::new(150_000.0))
            .await
            .unwrap();
        assert_eq!(path[0].id, pricey.id);

        let path = resolve(&store, &process_id, &RoutingContext::new(100.0))
            .await
            .unwrap();
        assert_eq!(path[0].id, cheap.id);
    }

    #[tokio::test]
    async fn equal_priority_breaks_ties_by_router_id() {
        let definition = ProcessDefinition::new(ProcessCode::offline_order(), "Offline order");
        let process_id = definition.id.clone();
        let start = ProcessNode::start(process_id.clone());
        let a = ProcessNode::approval(process_id.clone(), 1, rule());
        let b = ProcessNode::approval(process_id.clone(), 2, rule());

        let mut to_b = ProcessRouter::new(process_id.clone(), start.id.clone(), b.id.clone());
        to_b.id = RouterId::new("router-b");
        let mut to_a = ProcessRouter::new(process_id.clone(), start.id.clone(), a.id.clone());
        to_a.id = RouterId::new("router-a");
        let store = seeded(
            vec![start, a.clone(), b.clone()],
            vec![to_b, to_a],
            definition,
        );

        // Same priority on both; "router-a" sorts first, every time.
        for _ in 0..3 {
            let path = resolve(&store, &process_id, &RoutingContext::new(0.0))
                .await
                .unwrap();
            assert_eq!(path[0].id, a.id);
        }
    }

    #[tokio::test]
    async fn broken_condition_blocks_the_route() {
        let definition = ProcessDefinition::new(ProcessCode::offline_order(), "Offline order");
        let process_id = definition.id.clone();
        let start = ProcessNode::start(process_id.clone());
        let guarded = ProcessNode::approval(process_id.clone(), 1, rule());
        let fallback = ProcessNode::approval(process_id.clone(), 2, rule());
        let routers = vec![
            ProcessRouter::new(process_id.clone(), start.id.clone(), guarded.id.clone())
                .with_condition("no_such_field >= 1")
                .with_priority(1),
            ProcessRouter::new(process_id.clone(), start.id.clone(), fallback.id.clone())
                .with_priority(2),
        ];
        let store = seeded(
            vec![start, guarded, fallback.clone()],
            routers,
            definition,
        );

        let path = resolve(&store, &process_id, &RoutingContext::new(0.0))
            .await
            .unwrap();
        assert_eq!(path[0].id, fallback.id);
    }

    #[tokio::test]
    async fn missing_start_node_is_not_found() {
        let definition = ProcessDefinition::new(ProcessCode::offline_order(), "Offline order");
        let process_id = definition.id.clone();
        let store = seeded(vec![], vec![], definition);

        let result = resolve(&store, &process_id, &RoutingContext::new(0.0)).await;
        assert!(matches!(result, Err(EngineError::NotFound(_))));
    }

    #[tokio::test]
    async fn empty_path_is_a_validation_error() {
        let definition = ProcessDefinition::new(ProcessCode::offline_order(), "Offline order");
        let process_id = definition.id.clone();
        let start = ProcessNode::start(process_id.clone());
        let node = ProcessNode::approval(process_id.clone(), 1, rule());
        let routers = vec![ProcessRouter::new(
            process_id.clone(),
            start.id.clone(),
            node.id.clone(),
        )
        .with_condition("order_amount >= 100000")];
        let store = seeded(vec![start, node], routers, definition);

        let result = resolve(&store, &process_id, &RoutingContext::new(10.0)).await;
        assert!(matches!(result, Err(EngineError::Validation(_))));
    }

    #[tokio::test]
    async fn cycle_fails_fast() {
        let definition = ProcessDefinition::new(ProcessCode::offline_order(), "Offline order");
        let process_id = definition.id.clone();
        let start = ProcessNode::start(process_id.clone());
        let a = ProcessNode::approval(process_id.clone(), 1, rule());
        let b = ProcessNode::approval(process_id.clone(), 2, rule());
        let routers = vec![
            ProcessRouter::new(process_id.clone(), start.id.clone(), a.id.clone()),
            ProcessRouter::new(process_id.clone(), a.id.clone(), b.id.clone()),
            ProcessRouter::new(process_id.clone(), b.id.clone(), a.id.clone()),
        ];
        let store = seeded(vec![start, a, b], routers, definition);

        let result = resolve(&store, &process_id, &RoutingContext::new(0.0)).await;
        assert!(matches!(result, Err(EngineError::Validation(_))));
    }

    #[tokio::test]
    async fn disabled_target_is_rejected() {
        let definition = ProcessDefinition::new(ProcessCode::offline_order(), "Offline order");
        let process_id = definition.id.clone();
        let start = ProcessNode::start(process_id.clone());
        let node = ProcessNode::approval(process_id.clone(), 1, rule()).with_enabled(false);
        let routers = vec![ProcessRouter::new(
            process_id.clone(),
            start.id.clone(),
            node.id.clone(),
        )];
        let store = seeded(vec![start, node], routers, definition);

        let result = resolve(&store, &process_id, &RoutingContext::new(0.0)).await;
        assert!(matches!(result, Err(EngineError::Validation(_))));
    }
}
