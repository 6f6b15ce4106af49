//! Orchestrator errors.

use tessera_workflow::{WorkflowError, WorkflowStatus};

/// Errors returned by [`Orchestrator`](crate::Orchestrator) operations.
///
/// Task failures never show up here; they are recorded on the task itself.
#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
  /// No workflow with this ID has been created.
  #[error("workflow '{workflow_id}' not found")]
  WorkflowNotFound { workflow_id: String },

  /// The definition was rejected at creation time.
  #[error(transparent)]
  Workflow(#[from] WorkflowError),

  /// The workflow has already been started.
  #[error("workflow '{workflow_id}' cannot be executed: status is {status}")]
  InvalidState {
    workflow_id: String,
    status: WorkflowStatus,
  },

  /// Execution was cancelled.
  #[error("workflow execution cancelled")]
  Cancelled,

  /// The execution future was dropped before the workflow finished.
  #[error("workflow execution interrupted")]
  Interrupted,
}
