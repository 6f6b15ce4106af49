use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tessera_config::WorkflowDef;

use crate::error::WorkflowError;
use crate::graph::Graph;
use crate::task::{TaskStatus, WorkflowTask};

/// Status of a workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
  Pending,
  Running,
  Completed,
  Failed,
}

impl WorkflowStatus {
  pub fn as_str(&self) -> &'static str {
    match self {
      WorkflowStatus::Pending => "pending",
      WorkflowStatus::Running => "running",
      WorkflowStatus::Completed => "completed",
      WorkflowStatus::Failed => "failed",
    }
  }

  pub fn is_terminal(&self) -> bool {
    matches!(self, WorkflowStatus::Completed | WorkflowStatus::Failed)
  }
}

impl fmt::Display for WorkflowStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// A workflow materialized from a definition and tracked by the orchestrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workflow {
  pub workflow_id: String,
  pub name: String,
  tasks: Vec<WorkflowTask>,
  status: WorkflowStatus,
  created_at: DateTime<Utc>,
  completed_at: Option<DateTime<Utc>>,
}

impl Workflow {
  /// Materialize a definition. Tasks get ids `task_0`, `task_1`, ... in
  /// definition order and everything starts `Pending`.
  ///
  /// Dependency references are not checked here; see
  /// [`Workflow::validate_dependencies`].
  pub fn from_def(workflow_id: impl Into<String>, def: WorkflowDef) -> Result<Self, WorkflowError> {
    for (index, task) in def.tasks.iter().enumerate() {
      if task.name.trim().is_empty() {
        return Err(WorkflowError::InvalidDefinition(format!(
          "task at index {} has an empty name",
          index
        )));
      }
      if task.task_type.trim().is_empty() {
        return Err(WorkflowError::InvalidDefinition(format!(
          "task '{}' has an empty type",
          task.name
        )));
      }
    }

    let tasks = def
      .tasks
      .into_iter()
      .enumerate()
      .map(|(index, task)| WorkflowTask::new(format!("task_{}", index), task))
      .collect();

    Ok(Self {
      workflow_id: workflow_id.into(),
      name: def.name,
      tasks,
      status: WorkflowStatus::Pending,
      created_at: Utc::now(),
      completed_at: None,
    })
  }

  /// Materialize an untyped JSON definition, reporting missing or mistyped
  /// fields as [`WorkflowError::InvalidDefinition`].
  pub fn from_value(
    workflow_id: impl Into<String>,
    value: serde_json::Value,
  ) -> Result<Self, WorkflowError> {
    let def = WorkflowDef::from_value(value)?;
    Self::from_def(workflow_id, def)
  }

  pub fn tasks(&self) -> &[WorkflowTask] {
    &self.tasks
  }

  /// Get a task by ID.
  pub fn get_task(&self, task_id: &str) -> Option<&WorkflowTask> {
    self.tasks.iter().find(|t| t.task_id == task_id)
  }

  /// Get a mutable task by ID.
  pub fn get_task_mut(&mut self, task_id: &str) -> Option<&mut WorkflowTask> {
    self.tasks.iter_mut().find(|t| t.task_id == task_id)
  }

  pub fn status(&self) -> WorkflowStatus {
    self.status
  }

  pub fn created_at(&self) -> DateTime<Utc> {
    self.created_at
  }

  /// Set only when the workflow reaches `Completed`.
  pub fn completed_at(&self) -> Option<DateTime<Utc>> {
    self.completed_at
  }

  pub fn tasks_total(&self) -> usize {
    self.tasks.len()
  }

  pub fn tasks_completed(&self) -> usize {
    self.count_status(TaskStatus::Completed)
  }

  pub fn count_status(&self, status: TaskStatus) -> usize {
    self.tasks.iter().filter(|t| t.status() == status).count()
  }

  /// Move `Pending -> Running`. Returns `false` if the workflow was not pending.
  pub fn start(&mut self) -> bool {
    if self.status != WorkflowStatus::Pending {
      return false;
    }
    self.status = WorkflowStatus::Running;
    true
  }

  /// Move `Running -> Completed` and stamp the completion time.
  pub fn complete(&mut self) -> bool {
    if self.status != WorkflowStatus::Running {
      return false;
    }
    self.status = WorkflowStatus::Completed;
    self.completed_at = Some(Utc::now());
    true
  }

  /// Move any non-terminal status to `Failed`. The completion time stays unset.
  pub fn fail(&mut self) -> bool {
    if self.status.is_terminal() {
      return false;
    }
    self.status = WorkflowStatus::Failed;
    true
  }

  /// Build the dependency graph.
  pub fn graph(&self) -> Graph {
    Graph::new(&self.tasks)
  }

  /// Reject dependency references to unknown tasks and dependency cycles.
  pub fn validate_dependencies(&self) -> Result<(), WorkflowError> {
    let graph = self.graph();

    if let Some((task_id, dependency)) = graph.unknown_dependencies().first() {
      return Err(WorkflowError::UnknownDependency {
        task_id: task_id.clone(),
        dependency: dependency.clone(),
      });
    }

    graph
      .levels()
      .map(|_| ())
      .map_err(|task_ids| WorkflowError::CyclicDependency { task_ids })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn create_definition() -> serde_json::Value {
    json!({
      "name": "Contract review",
      "tasks": [
        { "name": "Process", "type": "document_processing", "parameters": { "document_id": "d1" } },
        { "name": "Approve", "type": "approval", "parameters": { "approver": "bob" }, "depends_on": ["task_0"] }
      ]
    })
  }

  #[test]
  fn test_from_value_assigns_sequential_ids() {
    let workflow = Workflow::from_value("wf_0", create_definition()).unwrap();

    assert_eq!(workflow.workflow_id, "wf_0");
    assert_eq!(workflow.name, "Contract review");
    assert_eq!(workflow.status(), WorkflowStatus::Pending);
    assert!(workflow.completed_at().is_none());

    let ids: Vec<&str> = workflow.tasks().iter().map(|t| t.task_id.as_str()).collect();
    assert_eq!(ids, vec!["task_0", "task_1"]);
    assert!(
      workflow
        .tasks()
        .iter()
        .all(|t| t.status() == TaskStatus::Pending)
    );
  }

  #[test]
  fn test_missing_type_is_invalid_definition() {
    let err = Workflow::from_value(
      "wf_0",
      json!({ "name": "x", "tasks": [{ "name": "a", "parameters": {} }] }),
    )
    .unwrap_err();

    assert!(matches!(err, WorkflowError::InvalidDefinition(_)));
  }

  #[test]
  fn test_empty_type_is_invalid_definition() {
    let err = Workflow::from_value(
      "wf_0",
      json!({ "name": "x", "tasks": [{ "name": "a", "type": " ", "parameters": {} }] }),
    )
    .unwrap_err();

    assert!(matches!(err, WorkflowError::InvalidDefinition(_)));
  }

  #[test]
  fn test_lifecycle_is_forward_only() {
    let mut workflow = Workflow::from_value("wf_0", create_definition()).unwrap();

    assert!(!workflow.complete());
    assert!(workflow.start());
    assert!(!workflow.start());
    assert!(workflow.complete());
    assert!(workflow.completed_at().is_some());

    assert!(!workflow.fail());
    assert!(!workflow.start());
    assert_eq!(workflow.status(), WorkflowStatus::Completed);
  }

  #[test]
  fn test_failed_workflow_has_no_completion_time() {
    let mut workflow = Workflow::from_value("wf_0", create_definition()).unwrap();
    workflow.start();
    assert!(workflow.fail());
    assert_eq!(workflow.status(), WorkflowStatus::Failed);
    assert!(workflow.completed_at().is_none());
  }

  #[test]
  fn test_validate_dependencies() {
    let workflow = Workflow::from_value("wf_0", create_definition()).unwrap();
    assert!(workflow.validate_dependencies().is_ok());

    let stranded = Workflow::from_value(
      "wf_1",
      json!({
        "name": "x",
        "tasks": [{ "name": "c", "type": "archiving", "parameters": {}, "depends_on": ["task_99"] }]
      }),
    )
    .unwrap();
    assert!(matches!(
      stranded.validate_dependencies(),
      Err(WorkflowError::UnknownDependency { ref dependency, .. }) if dependency == "task_99"
    ));

    let cyclic = Workflow::from_value(
      "wf_2",
      json!({
        "name": "x",
        "tasks": [
          { "name": "a", "type": "archiving", "parameters": {}, "depends_on": ["task_1"] },
          { "name": "b", "type": "archiving", "parameters": {}, "depends_on": ["task_0"] }
        ]
      }),
    )
    .unwrap();
    assert!(matches!(
      cyclic.validate_dependencies(),
      Err(WorkflowError::CyclicDependency { .. })
    ));
  }
}
