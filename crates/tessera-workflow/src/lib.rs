//! Tessera Workflow
//!
//! This crate provides the in-memory workflow representation for Tessera.
//! A [`Workflow`] is materialized from a `tessera-config` definition: task
//! identifiers are assigned, every task starts `Pending`, and the dependency
//! edges can be inspected through a [`Graph`].
//!
//! Key pieces:
//! - Status enums with forward-only transitions
//! - Dependency graph with entry points, join points, unknown references and
//!   cycle detection
//! - [`runnable_tasks`], the readiness resolver consulted by the scheduler

mod error;
mod graph;
mod readiness;
mod task;
mod workflow;

pub use error::WorkflowError;
pub use graph::Graph;
pub use readiness::runnable_tasks;
pub use task::{TaskStatus, WorkflowTask};
pub use workflow::{Workflow, WorkflowStatus};
