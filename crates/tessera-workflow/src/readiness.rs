use std::collections::HashSet;

use crate::task::{TaskStatus, WorkflowTask};
use crate::workflow::Workflow;

/// Find tasks that are ready to run.
///
/// A task is ready when it is not in `completed`, has not failed, and every
/// declared dependency is in `completed`. A dependency on a failed or
/// nonexistent task therefore keeps its dependents out of every round.
/// Results come back in workflow order.
pub fn runnable_tasks<'a>(
  workflow: &'a Workflow,
  completed: &HashSet<String>,
) -> Vec<&'a WorkflowTask> {
  workflow
    .tasks()
    .iter()
    .filter(|task| !completed.contains(&task.task_id))
    .filter(|task| task.status() != TaskStatus::Failed)
    .filter(|task| task.depends_on.iter().all(|dep| completed.contains(dep)))
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn create_chain() -> Workflow {
    Workflow::from_value(
      "wf_0",
      json!({
        "name": "Chain",
        "tasks": [
          { "name": "A", "type": "archiving", "parameters": {} },
          { "name": "B", "type": "archiving", "parameters": {}, "depends_on": ["task_0"] },
          { "name": "C", "type": "archiving", "parameters": {}, "depends_on": ["task_99"] },
          { "name": "D", "type": "archiving", "parameters": {} }
        ]
      }),
    )
    .unwrap()
  }

  fn ids(tasks: &[&WorkflowTask]) -> Vec<String> {
    tasks.iter().map(|t| t.task_id.clone()).collect()
  }

  #[test]
  fn test_initial_round_contains_only_unblocked_tasks() {
    let workflow = create_chain();
    let ready = runnable_tasks(&workflow, &HashSet::new());
    assert_eq!(ids(&ready), vec!["task_0", "task_3"]);
  }

  #[test]
  fn test_dependents_become_ready_once_completed() {
    let workflow = create_chain();
    let completed: HashSet<String> = ["task_0".to_string(), "task_3".to_string()].into();

    let ready = runnable_tasks(&workflow, &completed);
    assert_eq!(ids(&ready), vec!["task_1"]);
  }

  #[test]
  fn test_failed_tasks_are_never_ready() {
    let mut workflow = create_chain();
    let task = workflow.get_task_mut("task_0").unwrap();
    task.start();
    task.fail("boom");

    let ready = runnable_tasks(&workflow, &HashSet::new());
    assert_eq!(ids(&ready), vec!["task_3"]);
  }

  #[test]
  fn test_unknown_dependency_is_never_ready() {
    let workflow = create_chain();
    let completed: HashSet<String> = ["task_0", "task_1", "task_3"]
      .iter()
      .map(|s| s.to_string())
      .collect();

    assert!(runnable_tasks(&workflow, &completed).is_empty());
  }
}
