//! Tessera Orchestrator
//!
//! This crate provides the workflow orchestrator: it stores workflows created
//! from definitions, drives them through round-based DAG scheduling, and
//! exposes status snapshots and reports.
//!
//! # Architecture
//!
//! ```text
//! Orchestrator
//! ├── create_workflow(def) -> workflow_id
//! ├── execute_workflow(workflow_id) -> WorkflowReport
//! │     └── WorkflowExecution::wait()
//! │           round: runnable_tasks -> Processing -> JoinSet of handlers -> drain
//! │           repeat until nothing is runnable, then apply CompletionPolicy
//! ├── workflow_status(workflow_id) -> WorkflowStatusReport
//! └── workflow_report(workflow_id) -> WorkflowReport
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use tessera_handler::HandlerRegistry;
//! use tessera_orchestrator::Orchestrator;
//!
//! let orchestrator = Orchestrator::new(HandlerRegistry::with_builtins());
//! let workflow_id = orchestrator.create_workflow_from_value(definition)?;
//! let report = orchestrator.execute_workflow(&workflow_id).await?;
//! ```

mod error;
mod events;
mod execution;
mod orchestrator;
mod report;

pub use error::OrchestratorError;
pub use events::{ChannelNotifier, ExecutionEvent, ExecutionNotifier, NoopNotifier};
pub use orchestrator::Orchestrator;
pub use report::{TaskReport, WorkflowReport, WorkflowStatusReport};

pub use tessera_config::{CompletionPolicy, OrchestratorConfig, WorkflowDef};
pub use tessera_workflow::{TaskStatus, WorkflowError, WorkflowStatus};
