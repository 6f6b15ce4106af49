//! Execution events and notifiers for observability.
//!
//! Events are emitted while a workflow executes so that consumers can observe
//! progress, stream it to a UI, record analytics, etc.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Events emitted during workflow execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ExecutionEvent {
  /// Workflow execution has started.
  WorkflowStarted {
    execution_id: String,
    workflow_id: String,
  },

  /// A round has been dispatched.
  RoundStarted {
    execution_id: String,
    round: usize,
    task_ids: Vec<String>,
  },

  /// A task has been handed to its handler.
  TaskStarted {
    execution_id: String,
    task_id: String,
    task_type: String,
  },

  /// A task has completed successfully.
  TaskCompleted {
    execution_id: String,
    task_id: String,
    output: serde_json::Value,
  },

  /// A task has failed.
  TaskFailed {
    execution_id: String,
    task_id: String,
    error: String,
  },

  /// Every dispatch of a round has resolved.
  RoundCompleted { execution_id: String, round: usize },

  /// The scheduler loop exited and the workflow was marked completed.
  WorkflowCompleted {
    execution_id: String,
    tasks_completed: usize,
    tasks_total: usize,
  },

  /// The workflow was marked failed.
  WorkflowFailed { execution_id: String, error: String },
}

/// Trait for receiving execution events.
///
/// The orchestrator calls `notify` for each event, never while holding a
/// workflow lock. Implementations decide what to do with them.
pub trait ExecutionNotifier: Send + Sync {
  /// Called when an execution event occurs.
  fn notify(&self, event: ExecutionEvent);
}

/// A no-op notifier that discards all events.
#[derive(Debug, Clone, Default)]
pub struct NoopNotifier;

impl ExecutionNotifier for NoopNotifier {
  fn notify(&self, _event: ExecutionEvent) {}
}

/// A notifier that sends events to an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
  // Unbounded so a slow consumer never stalls a round. Volume is a handful of
  // events per task.
  sender: mpsc::UnboundedSender<ExecutionEvent>,
}

impl ChannelNotifier {
  /// Create a new channel notifier.
  pub fn new(sender: mpsc::UnboundedSender<ExecutionEvent>) -> Self {
    Self { sender }
  }

  /// Create a notifier together with the receiving end of its channel.
  pub fn channel() -> (Self, mpsc::UnboundedReceiver<ExecutionEvent>) {
    let (sender, receiver) = mpsc::unbounded_channel();
    (Self::new(sender), receiver)
  }
}

impl ExecutionNotifier for ChannelNotifier {
  fn notify(&self, event: ExecutionEvent) {
    // Receiver may have been dropped
    let _ = self.sender.send(event);
  }
}
