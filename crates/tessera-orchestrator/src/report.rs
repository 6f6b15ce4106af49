//! Read-only projections of workflow state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tessera_workflow::{TaskStatus, Workflow, WorkflowStatus, WorkflowTask};

/// Outcome of a single task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskReport {
  pub id: String,
  pub name: String,
  #[serde(rename = "type")]
  pub task_type: String,
  pub status: TaskStatus,
  /// Handler output, `{"error": ...}` on failure, `None` if never run.
  pub result: Option<serde_json::Value>,
}

impl From<&WorkflowTask> for TaskReport {
  fn from(task: &WorkflowTask) -> Self {
    Self {
      id: task.task_id.clone(),
      name: task.name.clone(),
      task_type: task.task_type.clone(),
      status: task.status(),
      result: task.result().cloned(),
    }
  }
}

/// Full report of a workflow, with every task in definition order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowReport {
  pub workflow_id: String,
  /// ID of the execution that produced this state, if it has run.
  pub execution_id: Option<String>,
  pub name: String,
  pub status: WorkflowStatus,
  pub tasks: Vec<TaskReport>,
  pub created_at: DateTime<Utc>,
  pub completed_at: Option<DateTime<Utc>>,
}

impl WorkflowReport {
  pub fn new(workflow: &Workflow, execution_id: Option<String>) -> Self {
    Self {
      workflow_id: workflow.workflow_id.clone(),
      execution_id,
      name: workflow.name.clone(),
      status: workflow.status(),
      tasks: workflow.tasks().iter().map(TaskReport::from).collect(),
      created_at: workflow.created_at(),
      completed_at: workflow.completed_at(),
    }
  }

  /// Get a task report by task ID.
  pub fn task(&self, task_id: &str) -> Option<&TaskReport> {
    self.tasks.iter().find(|t| t.id == task_id)
  }

  /// Tasks that ended in `status`.
  pub fn tasks_with_status(&self, status: TaskStatus) -> impl Iterator<Item = &TaskReport> {
    self.tasks.iter().filter(move |t| t.status == status)
  }
}

/// Lightweight status snapshot of a workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowStatusReport {
  pub id: String,
  pub name: String,
  pub status: WorkflowStatus,
  pub tasks_total: usize,
  pub tasks_completed: usize,
  pub created_at: DateTime<Utc>,
  pub completed_at: Option<DateTime<Utc>>,
}

impl WorkflowStatusReport {
  pub fn new(workflow: &Workflow) -> Self {
    Self {
      id: workflow.workflow_id.clone(),
      name: workflow.name.clone(),
      status: workflow.status(),
      tasks_total: workflow.tasks_total(),
      tasks_completed: workflow.tasks_completed(),
      created_at: workflow.created_at(),
      completed_at: workflow.completed_at(),
    }
  }

  /// Whether every task actually completed, independent of the workflow
  /// status reported under the lenient completion policy.
  pub fn all_tasks_completed(&self) -> bool {
    self.tasks_completed == self.tasks_total
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn create_workflow() -> Workflow {
    Workflow::from_value(
      "wf_3",
      json!({
        "name": "Onboarding",
        "tasks": [
          { "name": "Notify", "type": "notification", "parameters": { "recipient": "alice" } },
          { "name": "Archive", "type": "archiving", "parameters": {}, "depends_on": ["task_0"] }
        ]
      }),
    )
    .unwrap()
  }

  #[test]
  fn test_report_preserves_task_order() {
    let mut workflow = create_workflow();
    workflow.start();
    let task = workflow.get_task_mut("task_0").unwrap();
    task.start();
    task.complete(json!({ "notified": true }));

    let report = WorkflowReport::new(&workflow, Some("exec-1".to_string()));
    assert_eq!(report.workflow_id, "wf_3");
    assert_eq!(report.status, WorkflowStatus::Running);
    assert_eq!(report.tasks[0].id, "task_0");
    assert_eq!(report.tasks[0].status, TaskStatus::Completed);
    assert_eq!(report.tasks[1].id, "task_1");
    assert!(report.tasks[1].result.is_none());
    assert_eq!(report.tasks_with_status(TaskStatus::Pending).count(), 1);
  }

  #[test]
  fn test_status_report_counts() {
    let workflow = create_workflow();
    let status = WorkflowStatusReport::new(&workflow);

    assert_eq!(status.id, "wf_3");
    assert_eq!(status.tasks_total, 2);
    assert_eq!(status.tasks_completed, 0);
    assert!(!status.all_tasks_completed());

    let value = serde_json::to_value(&status).unwrap();
    assert_eq!(value["status"], "pending");
    assert!(value["completed_at"].is_null());
  }
}
