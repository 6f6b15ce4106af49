//! Tessera Config
//!
//! This crate contains the serializable types handed to the orchestrator by its
//! environment: workflow definitions as submitted by callers, and the
//! orchestrator's own configuration.
//!
//! Definitions can be loaded from:
//! - JSON files (via the CLI with `tessera run workflow.json`)
//! - Any `serde_json::Value` produced by an outer transport layer
//!
//! The orchestrator takes these types, assigns identifiers, and materializes
//! them into `tessera-workflow` structures for scheduling.

mod orchestrator;
mod workflow;

pub use orchestrator::{CompletionPolicy, OrchestratorConfig};
pub use workflow::{Parameters, TaskDef, WorkflowDef};
