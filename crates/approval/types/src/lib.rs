//! Approval domain types.
//!
//! This crate defines the vocabulary shared by the approval engine and its
//! storage adapters:
//! - process reference data (definitions, nodes, routers)
//! - runtime state (instances, tasks)
//! - submission/routing context and actor identity
//! - the order-status mapping supplied by the host
//! - audit entries written alongside every mutation
//!
//! Types here are plain data. Graph traversal, assignee resolution, and the
//! task state machine live in `approval-engine`; persistence lives in
//! `approval-store`.

#![deny(unsafe_code)]
#![warn(rust_2018_idioms)]

mod audit;
mod context;
mod instance;
mod process;
mod status_map;

pub use audit::{AuditEntry, AuditEvent};
pub use context::{Actor, CustomerId, OrderId, RoutingContext, SubmissionContext, UserId};
pub use instance::{
    ApprovalInstance, ApprovalTask, InstanceId, InstanceStatus, TaskId, TaskStatus,
};
pub use process::{
    ApprovalStrategy, AssigneeRule, NodeId, NodeKind, ProcessCode, ProcessDefinition, ProcessId,
    ProcessNode, ProcessRouter, ResponsibleScope, RouterId,
};
pub use status_map::{OrderStatus, OrderStatusMap};
