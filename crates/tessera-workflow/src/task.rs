use std::fmt;

use serde::{Deserialize, Serialize};
use tessera_config::{Parameters, TaskDef};

/// Status of a single task.
///
/// Tasks only move forward: `Pending -> Processing -> Completed | Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
  Pending,
  Processing,
  Completed,
  Failed,
}

impl TaskStatus {
  pub fn as_str(&self) -> &'static str {
    match self {
      TaskStatus::Pending => "pending",
      TaskStatus::Processing => "processing",
      TaskStatus::Completed => "completed",
      TaskStatus::Failed => "failed",
    }
  }

  pub fn is_terminal(&self) -> bool {
    matches!(self, TaskStatus::Completed | TaskStatus::Failed)
  }
}

impl fmt::Display for TaskStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// A task inside a workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowTask {
  pub task_id: String,
  pub name: String,
  #[serde(rename = "type")]
  pub task_type: String,
  pub parameters: Parameters,
  pub depends_on: Vec<String>,
  status: TaskStatus,
  result: Option<serde_json::Value>,
}

impl WorkflowTask {
  /// Materialize a task from its definition. The task starts `Pending`.
  pub fn new(task_id: impl Into<String>, def: TaskDef) -> Self {
    Self {
      task_id: task_id.into(),
      name: def.name,
      task_type: def.task_type,
      parameters: def.parameters,
      depends_on: def.depends_on,
      status: TaskStatus::Pending,
      result: None,
    }
  }

  pub fn status(&self) -> TaskStatus {
    self.status
  }

  /// Handler output or error payload. `None` until the task finishes.
  pub fn result(&self) -> Option<&serde_json::Value> {
    self.result.as_ref()
  }

  /// Move `Pending -> Processing`. Returns `false` if the task was not pending.
  pub fn start(&mut self) -> bool {
    if self.status != TaskStatus::Pending {
      return false;
    }
    self.status = TaskStatus::Processing;
    true
  }

  /// Move `Processing -> Completed` and store the handler output.
  ///
  /// Returns `false` (and changes nothing) if the task was not processing.
  pub fn complete(&mut self, output: serde_json::Value) -> bool {
    if self.status != TaskStatus::Processing {
      return false;
    }
    self.status = TaskStatus::Completed;
    self.result = Some(output);
    true
  }

  /// Move `Processing -> Failed` and store `{"error": "<message>"}`.
  ///
  /// Returns `false` (and changes nothing) if the task was not processing.
  pub fn fail(&mut self, error: impl fmt::Display) -> bool {
    if self.status != TaskStatus::Processing {
      return false;
    }
    self.status = TaskStatus::Failed;
    self.result = Some(serde_json::json!({ "error": error.to_string() }));
    true
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn create_task() -> WorkflowTask {
    WorkflowTask::new(
      "task_0",
      TaskDef {
        name: "Notify".to_string(),
        task_type: "notification".to_string(),
        parameters: Parameters::new(),
        depends_on: vec![],
      },
    )
  }

  #[test]
  fn test_new_task_is_pending_without_result() {
    let task = create_task();
    assert_eq!(task.status(), TaskStatus::Pending);
    assert!(task.result().is_none());
  }

  #[test]
  fn test_complete_requires_processing() {
    let mut task = create_task();
    assert!(!task.complete(json!({"ok": true})));
    assert_eq!(task.status(), TaskStatus::Pending);

    assert!(task.start());
    assert!(task.complete(json!({"ok": true})));
    assert_eq!(task.status(), TaskStatus::Completed);
    assert_eq!(task.result(), Some(&json!({"ok": true})));
  }

  #[test]
  fn test_terminal_status_never_changes() {
    let mut task = create_task();
    task.start();
    task.fail("boom");

    assert!(!task.start());
    assert!(!task.complete(json!({})));
    assert!(!task.fail("again"));
    assert_eq!(task.status(), TaskStatus::Failed);
    assert_eq!(task.result(), Some(&json!({"error": "boom"})));
  }

  #[test]
  fn test_status_serializes_snake_case() {
    assert_eq!(serde_json::to_value(TaskStatus::Processing).unwrap(), "processing");
    assert_eq!(TaskStatus::Completed.to_string(), "completed");
  }
}
