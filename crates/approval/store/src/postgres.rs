//! PostgreSQL adapter for the approval store.
//!
//! Source-of-truth backend. Each write unit runs in one transaction;
//! the instance version check replaces row-level locking, so a losing
//! concurrent writer sees `Conflict` instead of double-applying.

use crate::model::{ActionCommit, InstanceCreation};
use crate::traits::{AuditStore, InstanceStore, ProcessStore, TaskStore};
use crate::{StoreError, StoreResult};
use approval_types::{
    ApprovalInstance, ApprovalStrategy, ApprovalTask, AssigneeRule, AuditEntry, AuditEvent,
    CustomerId, InstanceId, InstanceStatus, NodeId, NodeKind, OrderId, ProcessCode,
    ProcessDefinition, ProcessId, ProcessNode, ProcessRouter, ResponsibleScope, RouterId, TaskId,
    TaskStatus, UserId,
};
use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;

/// PostgreSQL-backed approval store.
#[derive(Clone)]
pub struct PostgresApprovalStore {
    pool: PgPool,
}

impl PostgresApprovalStore {
    /// Connect to PostgreSQL and initialize the schema.
    pub async fn connect(database_url: &str) -> StoreResult<Self> {
        Self::connect_with_options(database_url, 10, 5).await
    }

    /// Connect with explicit pool parameters.
    pub async fn connect_with_options(
        database_url: &str,
        max_connections: u32,
        connect_timeout_secs: u64,
    ) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(std::time::Duration::from_secs(connect_timeout_secs))
            .connect(database_url)
            .await
            .map_err(|e| StoreError::Backend(format!("failed to connect postgres: {e}")))?;
        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    /// Create adapter from an existing pool.
    pub async fn from_pool(pool: PgPool) -> StoreResult<Self> {
        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn init_schema(&self) -> StoreResult<()> {
        let ddl = [
            r#"
            CREATE TABLE IF NOT EXISTS approval_process (
                id TEXT PRIMARY KEY,
                process_code TEXT NOT NULL UNIQUE,
                name TEXT NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS approval_process_node (
                id TEXT PRIMARY KEY,
                process_id TEXT NOT NULL,
                kind TEXT NOT NULL,
                node_order INTEGER NOT NULL,
                assignee_kind TEXT,
                assignee_value TEXT,
                strategy TEXT NOT NULL,
                enabled BOOLEAN NOT NULL,
                deleted BOOLEAN NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS approval_process_router (
                id TEXT PRIMARY KEY,
                process_id TEXT NOT NULL,
                source_node_id TEXT NOT NULL,
                target_node_id TEXT NOT NULL,
                condition_expression TEXT,
                priority INTEGER NOT NULL,
                enabled BOOLEAN NOT NULL,
                deleted BOOLEAN NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS approval_instance (
                id TEXT PRIMARY KEY,
                process_id TEXT NOT NULL,
                order_id TEXT NOT NULL UNIQUE,
                current_node_id TEXT,
                current_step INTEGER,
                status TEXT NOT NULL,
                version BIGINT NOT NULL,
                created_by TEXT NOT NULL,
                created_by_name TEXT NOT NULL,
                revised_by TEXT,
                revised_by_name TEXT,
                created_at TIMESTAMPTZ NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS approval_task (
                id TEXT PRIMARY KEY,
                instance_id TEXT NOT NULL,
                node_id TEXT NOT NULL,
                task_step INTEGER NOT NULL,
                approver TEXT,
                status TEXT NOT NULL,
                auto_approved BOOLEAN NOT NULL,
                remark TEXT,
                acted_by TEXT,
                acted_at TIMESTAMPTZ,
                created_at TIMESTAMPTZ NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS approval_audit_log (
                id TEXT PRIMARY KEY,
                instance_id TEXT NOT NULL,
                order_id TEXT NOT NULL,
                actor_id TEXT NOT NULL,
                actor_name TEXT NOT NULL,
                event TEXT NOT NULL,
                remark TEXT,
                created_at TIMESTAMPTZ NOT NULL
            )
            "#,
            r#"
            CREATE INDEX IF NOT EXISTS idx_approval_task_instance
                ON approval_task (instance_id, task_step)
            "#,
            r#"
            CREATE INDEX IF NOT EXISTS idx_approval_task_approver
                ON approval_task (approver) WHERE status = 'PENDING'
            "#,
        ];

        for stmt in ddl {
            sqlx::query(stmt)
                .execute(&self.pool)
                .await
                .map_err(|e| StoreError::Backend(format!("schema init failed: {e}")))?;
        }
        Ok(())
    }

    /// Load one process definition with its nodes and routers.
    /// Reference data is normally managed by catalog tooling; this is the
    /// bootstrap path for fresh environments.
    pub async fn seed_process(
        &self,
        definition: &ProcessDefinition,
        nodes: &[ProcessNode],
        routers: &[ProcessRouter],
    ) -> StoreResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        sqlx::query(
            "INSERT INTO approval_process (id, process_code, name) VALUES ($1, $2, $3)
             ON CONFLICT (id) DO UPDATE SET process_code = EXCLUDED.process_code, name = EXCLUDED.name",
        )
        .bind(definition.id.0.clone())
        .bind(definition.process_code.0.clone())
        .bind(definition.name.clone())
        .execute(&mut *tx)
        .await
        .map_err(|e| StoreError::Backend(e.to_string()))?;

        for node in nodes {
            let (assignee_kind, assignee_value) = assignee_to_columns(node.assignee.as_ref());
            sqlx::query(
                r#"
                INSERT INTO approval_process_node
                    (id, process_id, kind, node_order, assignee_kind, assignee_value, strategy, enabled, deleted)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                ON CONFLICT (id) DO NOTHING
                "#,
            )
            .bind(node.id.0.clone())
            .bind(node.process_id.0.clone())
            .bind(node_kind_to_str(node.kind))
            .bind(node.node_order as i32)
            .bind(assignee_kind)
            .bind(assignee_value)
            .bind(strategy_to_str(node.strategy))
            .bind(node.enabled)
            .bind(node.deleted)
            .execute(&mut *tx)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        }

        for router in routers {
            sqlx::query(
                r#"
                INSERT INTO approval_process_router
                    (id, process_id, source_node_id, target_node_id, condition_expression, priority, enabled, deleted)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                ON CONFLICT (id) DO NOTHING
                "#,
            )
            .bind(router.id.0.clone())
            .bind(router.process_id.0.clone())
            .bind(router.source_node_id.0.clone())
            .bind(router.target_node_id.0.clone())
            .bind(router.condition.clone())
            .bind(router.priority as i32)
            .bind(router.enabled)
            .bind(router.deleted)
            .execute(&mut *tx)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        }

        tx.commit()
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))
    }
}

#[async_trait]
impl ProcessStore for PostgresApprovalStore {
    async fn definition_by_code(
        &self,
        code: &ProcessCode,
    ) -> StoreResult<Option<ProcessDefinition>> {
        let row = sqlx::query("SELECT id, process_code, name FROM approval_process WHERE process_code = $1")
            .bind(code.0.clone())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        row.map(definition_row_to_record).transpose()
    }

    async fn start_node(&self, process_id: &ProcessId) -> StoreResult<Option<ProcessNode>> {
        let row = sqlx::query(
            r#"
            SELECT id, process_id, kind, node_order, assignee_kind, assignee_value, strategy, enabled, deleted
              FROM approval_process_node
             WHERE process_id = $1 AND kind = 'START' AND enabled AND NOT deleted
             LIMIT 1
            "#,
        )
        .bind(process_id.0.clone())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::Backend(e.to_string()))?;

        row.map(node_row_to_record).transpose()
    }

    async fn node(&self, node_id: &NodeId) -> StoreResult<Option<ProcessNode>> {
        let row = sqlx::query(
            r#"
            SELECT id, process_id, kind, node_order, assignee_kind, assignee_value, strategy, enabled, deleted
              FROM approval_process_node
             WHERE id = $1
            "#,
        )
        .bind(node_id.0.clone())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::Backend(e.to_string()))?;

        row.map(node_row_to_record).transpose()
    }

    async fn outgoing_routers(&self, node_id: &NodeId) -> StoreResult<Vec<ProcessRouter>> {
        let rows = sqlx::query(
            r#"
            SELECT id, process_id, source_node_id, target_node_id, condition_expression, priority, enabled, deleted
              FROM approval_process_router
             WHERE source_node_id = $1 AND enabled AND NOT deleted
             ORDER BY priority ASC, id ASC
            "#,
        )
        .bind(node_id.0.clone())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::Backend(e.to_string()))?;

        rows.into_iter().map(router_row_to_record).collect()
    }
}

#[async_trait]
impl InstanceStore for PostgresApprovalStore {
    async fn instance(&self, id: &InstanceId) -> StoreResult<Option<ApprovalInstance>> {
        let row = sqlx::query(&instance_select("WHERE id = $1"))
            .bind(id.0.clone())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        row.map(instance_row_to_record).transpose()
    }

    async fn instance_by_order(
        &self,
        order_id: &OrderId,
    ) -> StoreResult<Option<ApprovalInstance>> {
        let row = sqlx::query(&instance_select("WHERE order_id = $1"))
            .bind(order_id.0.clone())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        row.map(instance_row_to_record).transpose()
    }

    async fn create_instance(&self, creation: InstanceCreation) -> StoreResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        if let Some(prior) = &creation.discard {
            sqlx::query("DELETE FROM approval_task WHERE instance_id = $1")
                .bind(prior.0.clone())
                .execute(&mut *tx)
                .await
                .map_err(|e| StoreError::Backend(e.to_string()))?;
            sqlx::query("DELETE FROM approval_instance WHERE id = $1")
                .bind(prior.0.clone())
                .execute(&mut *tx)
                .await
                .map_err(|e| StoreError::Backend(e.to_string()))?;
        }

        let instance = &creation.instance;
        sqlx::query(
            r#"
            INSERT INTO approval_instance
                (id, process_id, order_id, current_node_id, current_step, status, version,
                 created_by, created_by_name, revised_by, revised_by_name, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(instance.id.0.clone())
        .bind(instance.process_id.0.clone())
        .bind(instance.order_id.0.clone())
        .bind(instance.current_node_id.as_ref().map(|n| n.0.clone()))
        .bind(instance.current_step.map(|s| s as i32))
        .bind(instance_status_to_str(instance.status))
        .bind(instance.version)
        .bind(instance.created_by.0.clone())
        .bind(instance.created_by_name.clone())
        .bind(instance.revised_by.as_ref().map(|u| u.0.clone()))
        .bind(instance.revised_by_name.clone())
        .bind(instance.created_at)
        .bind(instance.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_conflict)?;

        for task in &creation.tasks {
            insert_task(&mut tx, task).await?;
        }
        insert_audit(&mut tx, &creation.audit).await?;

        tx.commit()
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))
    }

    async fn commit_action(&self, commit: ActionCommit) -> StoreResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        let instance = &commit.instance;
        let result = sqlx::query(
            r#"
            UPDATE approval_instance
               SET current_node_id = $1,
                   current_step = $2,
                   status = $3,
                   version = $4,
                   revised_by = $5,
                   revised_by_name = $6,
                   updated_at = $7
             WHERE id = $8
               AND version = $9
            "#,
        )
        .bind(instance.current_node_id.as_ref().map(|n| n.0.clone()))
        .bind(instance.current_step.map(|s| s as i32))
        .bind(instance_status_to_str(instance.status))
        .bind(commit.expected_version + 1)
        .bind(instance.revised_by.as_ref().map(|u| u.0.clone()))
        .bind(instance.revised_by_name.clone())
        .bind(instance.updated_at)
        .bind(instance.id.0.clone())
        .bind(commit.expected_version)
        .execute(&mut *tx)
        .await
        .map_err(|e| StoreError::Backend(e.to_string()))?;

        if result.rows_affected() == 0 {
            let exists = self.instance(&instance.id).await?.is_some();
            if exists {
                return Err(StoreError::Conflict(format!(
                    "instance {} was concurrently modified",
                    instance.id
                )));
            }
            return Err(StoreError::NotFound(format!(
                "instance {} not found",
                instance.id
            )));
        }

        for task in &commit.tasks {
            let result = sqlx::query(
                r#"
                UPDATE approval_task
                   SET status = $1,
                       remark = $2,
                       acted_by = $3,
                       acted_at = $4
                 WHERE id = $5
                "#,
            )
            .bind(task_status_to_str(task.status))
            .bind(task.remark.clone())
            .bind(task.acted_by.as_ref().map(|u| u.0.clone()))
            .bind(task.acted_at)
            .bind(task.id.0.clone())
            .execute(&mut *tx)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

            if result.rows_affected() == 0 {
                return Err(StoreError::NotFound(format!("task {} not found", task.id)));
            }
        }

        insert_audit(&mut tx, &commit.audit).await?;

        tx.commit()
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))
    }
}

#[async_trait]
impl TaskStore for PostgresApprovalStore {
    async fn task(&self, id: &TaskId) -> StoreResult<Option<ApprovalTask>> {
        let row = sqlx::query(&task_select("WHERE id = $1"))
            .bind(id.0.clone())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        row.map(task_row_to_record).transpose()
    }

    async fn tasks_for_instance(
        &self,
        instance_id: &InstanceId,
    ) -> StoreResult<Vec<ApprovalTask>> {
        let rows = sqlx::query(&task_select(
            "WHERE instance_id = $1 ORDER BY task_step ASC, id ASC",
        ))
        .bind(instance_id.0.clone())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::Backend(e.to_string()))?;

        rows.into_iter().map(task_row_to_record).collect()
    }

    async fn actionable_tasks_for_user(
        &self,
        user_id: &UserId,
    ) -> StoreResult<Vec<ApprovalTask>> {
        let rows = sqlx::query(
            r#"
            SELECT t.id, t.instance_id, t.node_id, t.task_step, t.approver, t.status,
                   t.auto_approved, t.remark, t.acted_by, t.acted_at, t.created_at
              FROM approval_task t
              JOIN approval_instance i ON i.id = t.instance_id
             WHERE t.approver = $1
               AND t.status = 'PENDING'
               AND i.status = 'IN_PROGRESS'
               AND i.current_step = t.task_step
             ORDER BY t.created_at ASC
            "#,
        )
        .bind(user_id.0.clone())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::Backend(e.to_string()))?;

        rows.into_iter().map(task_row_to_record).collect()
    }
}

#[async_trait]
impl AuditStore for PostgresApprovalStore {
    async fn entries_for_instance(
        &self,
        instance_id: &InstanceId,
    ) -> StoreResult<Vec<AuditEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT id, instance_id, order_id, actor_id, actor_name, event, remark, created_at
              FROM approval_audit_log
             WHERE instance_id = $1
             ORDER BY created_at ASC
            "#,
        )
        .bind(instance_id.0.clone())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::Backend(e.to_string()))?;

        rows.into_iter().map(audit_row_to_record).collect()
    }
}

async fn insert_task(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    task: &ApprovalTask,
) -> StoreResult<()> {
    sqlx::query(
        r#"
        INSERT INTO approval_task
            (id, instance_id, node_id, task_step, approver, status, auto_approved,
             remark, acted_by, acted_at, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        "#,
    )
    .bind(task.id.0.clone())
    .bind(task.instance_id.0.clone())
    .bind(task.node_id.0.clone())
    .bind(task.task_step as i32)
    .bind(task.approver.as_ref().map(|u| u.0.clone()))
    .bind(task_status_to_str(task.status))
    .bind(task.auto_approved)
    .bind(task.remark.clone())
    .bind(task.acted_by.as_ref().map(|u| u.0.clone()))
    .bind(task.acted_at)
    .bind(task.created_at)
    .execute(&mut **tx)
    .await
    .map_err(|e| StoreError::Backend(e.to_string()))?;
    Ok(())
}

async fn insert_audit(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    entry: &AuditEntry,
) -> StoreResult<()> {
    sqlx::query(
        r#"
        INSERT INTO approval_audit_log
            (id, instance_id, order_id, actor_id, actor_name, event, remark, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        "#,
    )
    .bind(entry.id.clone())
    .bind(entry.instance_id.0.clone())
    .bind(entry.order_id.0.clone())
    .bind(entry.actor_id.0.clone())
    .bind(entry.actor_name.clone())
    .bind(audit_event_to_str(entry.event))
    .bind(entry.remark.clone())
    .bind(entry.created_at)
    .execute(&mut **tx)
    .await
    .map_err(|e| StoreError::Backend(e.to_string()))?;
    Ok(())
}

fn instance_select(filter: &str) -> String {
    format!(
        "SELECT id, process_id, order_id, current_node_id, current_step, status, version, \
         created_by, created_by_name, revised_by, revised_by_name, created_at, updated_at \
         FROM approval_instance {filter}"
    )
}

fn task_select(filter: &str) -> String {
    format!(
        "SELECT id, instance_id, node_id, task_step, approver, status, auto_approved, \
         remark, acted_by, acted_at, created_at \
         FROM approval_task {filter}"
    )
}

fn definition_row_to_record(row: PgRow) -> StoreResult<ProcessDefinition> {
    Ok(ProcessDefinition {
        id: ProcessId::new(get::<String>(&row, "id")?),
        process_code: ProcessCode::new(get::<String>(&row, "process_code")?),
        name: get(&row, "name")?,
    })
}

fn node_row_to_record(row: PgRow) -> StoreResult<ProcessNode> {
    let kind = parse_node_kind(&get::<String>(&row, "kind")?)?;
    let assignee_kind: Option<String> = get(&row, "assignee_kind")?;
    let assignee_value: Option<String> = get(&row, "assignee_value")?;
    let assignee = assignee_from_columns(assignee_kind.as_deref(), assignee_value.as_deref())?;

    Ok(ProcessNode {
        id: NodeId::new(get::<String>(&row, "id")?),
        process_id: ProcessId::new(get::<String>(&row, "process_id")?),
        kind,
        node_order: get::<i32>(&row, "node_order")? as u32,
        assignee,
        strategy: parse_strategy(&get::<String>(&row, "strategy")?)?,
        enabled: get(&row, "enabled")?,
        deleted: get(&row, "deleted")?,
    })
}

fn router_row_to_record(row: PgRow) -> StoreResult<ProcessRouter> {
    Ok(ProcessRouter {
        id: RouterId::new(get::<String>(&row, "id")?),
        process_id: ProcessId::new(get::<String>(&row, "process_id")?),
        source_node_id: NodeId::new(get::<String>(&row, "source_node_id")?),
        target_node_id: NodeId::new(get::<String>(&row, "target_node_id")?),
        condition: get(&row, "condition_expression")?,
        priority: get::<i32>(&row, "priority")? as u32,
        enabled: get(&row, "enabled")?,
        deleted: get(&row, "deleted")?,
    })
}

fn instance_row_to_record(row: PgRow) -> StoreResult<ApprovalInstance> {
    Ok(ApprovalInstance {
        id: InstanceId::new(get::<String>(&row, "id")?),
        process_id: ProcessId::new(get::<String>(&row, "process_id")?),
        order_id: OrderId::new(get::<String>(&row, "order_id")?),
        current_node_id: get::<Option<String>>(&row, "current_node_id")?.map(NodeId::new),
        current_step: get::<Option<i32>>(&row, "current_step")?.map(|s| s as u32),
        status: parse_instance_status(&get::<String>(&row, "status")?)?,
        version: get(&row, "version")?,
        created_by: UserId::new(get::<String>(&row, "created_by")?),
        created_by_name: get(&row, "created_by_name")?,
        revised_by: get::<Option<String>>(&row, "revised_by")?.map(UserId::new),
        revised_by_name: get(&row, "revised_by_name")?,
        created_at: get(&row, "created_at")?,
        updated_at: get(&row, "updated_at")?,
    })
}

fn task_row_to_record(row: PgRow) -> StoreResult<ApprovalTask> {
    Ok(ApprovalTask {
        id: TaskId::new(get::<String>(&row, "id")?),
        instance_id: InstanceId::new(get::<String>(&row, "instance_id")?),
        node_id: NodeId::new(get::<String>(&row, "node_id")?),
        task_step: get::<i32>(&row, "task_step")? as u32,
        approver: get::<Option<String>>(&row, "approver")?.map(UserId::new),
        status: parse_task_status(&get::<String>(&row, "status")?)?,
        auto_approved: get(&row, "auto_approved")?,
        remark: get(&row, "remark")?,
        acted_by: get::<Option<String>>(&row, "acted_by")?.map(UserId::new),
        acted_at: get(&row, "acted_at")?,
        created_at: get(&row, "created_at")?,
    })
}

fn audit_row_to_record(row: PgRow) -> StoreResult<AuditEntry> {
    Ok(AuditEntry {
        id: get(&row, "id")?,
        instance_id: InstanceId::new(get::<String>(&row, "instance_id")?),
        order_id: OrderId::new(get::<String>(&row, "order_id")?),
        actor_id: UserId::new(get::<String>(&row, "actor_id")?),
        actor_name: get(&row, "actor_name")?,
        event: parse_audit_event(&get::<String>(&row, "event")?)?,
        remark: get(&row, "remark")?,
        created_at: get(&row, "created_at")?,
    })
}

fn get<'r, T>(row: &'r PgRow, column: &str) -> StoreResult<T>
where
    T: sqlx::Decode<'r, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>,
{
    row.try_get(column)
        .map_err(|e| StoreError::Backend(e.to_string()))
}

fn node_kind_to_str(kind: NodeKind) -> &'static str {
    match kind {
        NodeKind::Start => "START",
        NodeKind::Approval => "APPROVAL",
    }
}

fn parse_node_kind(raw: &str) -> StoreResult<NodeKind> {
    match raw {
        "START" => Ok(NodeKind::Start),
        "APPROVAL" => Ok(NodeKind::Approval),
        _ => Err(StoreError::Serialization(format!(
            "unknown node kind `{raw}`"
        ))),
    }
}

fn strategy_to_str(strategy: ApprovalStrategy) -> &'static str {
    match strategy {
        ApprovalStrategy::AnyOne => "ANY_ONE",
        ApprovalStrategy::All => "ALL",
    }
}

fn parse_strategy(raw: &str) -> StoreResult<ApprovalStrategy> {
    match raw {
        "ANY_ONE" => Ok(ApprovalStrategy::AnyOne),
        "ALL" => Ok(ApprovalStrategy::All),
        _ => Err(StoreError::Serialization(format!(
            "unknown approval strategy `{raw}`"
        ))),
    }
}

fn assignee_to_columns(rule: Option<&AssigneeRule>) -> (Option<String>, Option<String>) {
    match rule {
        None => (None, None),
        Some(AssigneeRule::User { user_id }) => {
            (Some("USER".to_string()), Some(user_id.0.clone()))
        }
        Some(AssigneeRule::Role { role }) => (Some("ROLE".to_string()), Some(role.clone())),
        Some(AssigneeRule::CustomerResponsible { scope }) => {
            let value = match scope {
                ResponsibleScope::RegionalHead => "REGIONAL_HEAD",
                ResponsibleScope::ProvincialHead => "PROVINCIAL_HEAD",
            };
            (
                Some("CUSTOMER_RESPONSIBLE".to_string()),
                Some(value.to_string()),
            )
        }
    }
}

fn assignee_from_columns(
    kind: Option<&str>,
    value: Option<&str>,
) -> StoreResult<Option<AssigneeRule>> {
    match (kind, value) {
        (None, _) => Ok(None),
        (Some("USER"), Some(v)) => Ok(Some(AssigneeRule::User {
            user_id: UserId::new(v),
        })),
        (Some("ROLE"), Some(v)) => Ok(Some(AssigneeRule::Role {
            role: v.to_string(),
        })),
        (Some("CUSTOMER_RESPONSIBLE"), Some("REGIONAL_HEAD")) => {
            Ok(Some(AssigneeRule::CustomerResponsible {
                scope: ResponsibleScope::RegionalHead,
            }))
        }
        (Some("CUSTOMER_RESPONSIBLE"), Some("PROVINCIAL_HEAD")) => {
            Ok(Some(AssigneeRule::CustomerResponsible {
                scope: ResponsibleScope::ProvincialHead,
            }))
        }
        (Some(k), v) => Err(StoreError::Serialization(format!(
            "unknown assignee rule `{k}`/`{}`",
            v.unwrap_or("")
        ))),
    }
}

fn instance_status_to_str(status: InstanceStatus) -> &'static str {
    match status {
        InstanceStatus::InProgress => "IN_PROGRESS",
        InstanceStatus::Approved => "APPROVED",
        InstanceStatus::Rejected => "REJECTED",
        InstanceStatus::Cancelled => "CANCELLED",
    }
}

fn parse_instance_status(raw: &str) -> StoreResult<InstanceStatus> {
    match raw {
        "IN_PROGRESS" => Ok(InstanceStatus::InProgress),
        "APPROVED" => Ok(InstanceStatus::Approved),
        "REJECTED" => Ok(InstanceStatus::Rejected),
        "CANCELLED" => Ok(InstanceStatus::Cancelled),
        _ => Err(StoreError::Serialization(format!(
            "unknown instance status `{raw}`"
        ))),
    }
}

fn task_status_to_str(status: TaskStatus) -> &'static str {
    match status {
        TaskStatus::Pending => "PENDING",
        TaskStatus::Approved => "APPROVED",
        TaskStatus::Rejected => "REJECTED",
        TaskStatus::Skipped => "SKIPPED",
    }
}

fn parse_task_status(raw: &str) -> StoreResult<TaskStatus> {
    match raw {
        "PENDING" => Ok(TaskStatus::Pending),
        "APPROVED" => Ok(TaskStatus::Approved),
        "REJECTED" => Ok(TaskStatus::Rejected),
        "SKIPPED" => Ok(TaskStatus::Skipped),
        _ => Err(StoreError::Serialization(format!(
            "unknown task status `{raw}`"
        ))),
    }
}

fn audit_event_to_str(event: AuditEvent) -> &'static str {
    match event {
        AuditEvent::Submitted => "SUBMITTED",
        AuditEvent::Resubmitted => "RESUBMITTED",
        AuditEvent::Approved => "APPROVED",
        AuditEvent::Rejected => "REJECTED",
        AuditEvent::Cancelled => "CANCELLED",
    }
}

fn parse_audit_event(raw: &str) -> StoreResult<AuditEvent> {
    match raw {
        "SUBMITTED" => Ok(AuditEvent::Submitted),
        "RESUBMITTED" => Ok(AuditEvent::Resubmitted),
        "APPROVED" => Ok(AuditEvent::Approved),
        "REJECTED" => Ok(AuditEvent::Rejected),
        "CANCELLED" => Ok(AuditEvent::Cancelled),
        _ => Err(StoreError::Serialization(format!(
            "unknown audit event `{raw}`"
        ))),
    }
}

fn map_sqlx_conflict(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.code().as_deref() == Some("23505") {
            return StoreError::Conflict(db_err.message().to_string());
        }
    }
    StoreError::Backend(err.to_string())
}
