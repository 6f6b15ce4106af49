use std::collections::{HashMap, HashSet};

use crate::WorkflowTask;

/// Dependency graph structure for traversal and analysis.
///
/// Edges point from a dependency to its dependent (`upstream -> downstream`).
/// References to task ids that do not exist in the workflow are not turned
/// into edges; they are kept in [`Graph::unknown_dependencies`].
#[derive(Debug, Clone)]
pub struct Graph {
  /// Task ids in workflow order.
  order: Vec<String>,
  /// Adjacency list: task_id -> list of downstream task_ids.
  adjacency: HashMap<String, Vec<String>>,
  /// Reverse adjacency: task_id -> list of upstream task_ids.
  reverse_adjacency: HashMap<String, Vec<String>>,
  /// Tasks with no dependencies.
  entry_points: Vec<String>,
  /// Tasks with multiple dependencies (join points).
  join_points: HashSet<String>,
  /// (task_id, dependency) pairs whose dependency does not exist.
  unknown: Vec<(String, String)>,
}

impl Graph {
  /// Build a graph from a workflow's tasks.
  pub fn new(tasks: &[WorkflowTask]) -> Self {
    let order: Vec<String> = tasks.iter().map(|t| t.task_id.clone()).collect();
    let known: HashSet<&str> = order.iter().map(String::as_str).collect();

    let mut adjacency: HashMap<String, Vec<String>> = HashMap::new();
    let mut reverse_adjacency: HashMap<String, Vec<String>> = HashMap::new();
    let mut unknown = Vec::new();

    // Initialize all tasks
    for task_id in &order {
      adjacency.entry(task_id.clone()).or_default();
      reverse_adjacency.entry(task_id.clone()).or_default();
    }

    // Build adjacency lists, ignoring repeated references
    for task in tasks {
      let mut seen = HashSet::new();
      for dep in &task.depends_on {
        if !seen.insert(dep.as_str()) {
          continue;
        }
        if !known.contains(dep.as_str()) {
          unknown.push((task.task_id.clone(), dep.clone()));
          continue;
        }
        adjacency
          .entry(dep.clone())
          .or_default()
          .push(task.task_id.clone());
        reverse_adjacency
          .entry(task.task_id.clone())
          .or_default()
          .push(dep.clone());
      }
    }

    // Entry points: no declared dependencies at all
    let entry_points: Vec<String> = tasks
      .iter()
      .filter(|t| t.depends_on.is_empty())
      .map(|t| t.task_id.clone())
      .collect();

    let join_points: HashSet<String> = reverse_adjacency
      .iter()
      .filter(|(_, incoming)| incoming.len() > 1)
      .map(|(id, _)| id.clone())
      .collect();

    Self {
      order,
      adjacency,
      reverse_adjacency,
      entry_points,
      join_points,
      unknown,
    }
  }

  /// Get entry points (tasks with no dependencies).
  pub fn entry_points(&self) -> &[String] {
    &self.entry_points
  }

  /// Get downstream tasks for a given task.
  pub fn downstream(&self, task_id: &str) -> &[String] {
    self
      .adjacency
      .get(task_id)
      .map(|v| v.as_slice())
      .unwrap_or(&[])
  }

  /// Get upstream tasks for a given task.
  pub fn upstream(&self, task_id: &str) -> &[String] {
    self
      .reverse_adjacency
      .get(task_id)
      .map(|v| v.as_slice())
      .unwrap_or(&[])
  }

  /// Check if a task is a join point (has multiple dependencies).
  pub fn is_join_point(&self, task_id: &str) -> bool {
    self.join_points.contains(task_id)
  }

  /// Dependency references that point at no task in the workflow, as
  /// `(task_id, missing_dependency)` pairs.
  pub fn unknown_dependencies(&self) -> &[(String, String)] {
    &self.unknown
  }

  /// Group tasks into execution levels using Kahn's algorithm.
  ///
  /// Level `n` holds the tasks whose dependencies all sit in levels `< n`, so
  /// for a fully runnable workflow each level corresponds to one scheduler
  /// round. Unknown dependency references are ignored here.
  ///
  /// Returns `Err` with the ids (workflow order) of every task that sits on or
  /// behind a dependency cycle.
  pub fn levels(&self) -> Result<Vec<Vec<String>>, Vec<String>> {
    let mut in_degree: HashMap<&str, usize> = self
      .order
      .iter()
      .map(|id| (id.as_str(), self.upstream(id).len()))
      .collect();

    let mut current: Vec<&str> = self
      .order
      .iter()
      .map(String::as_str)
      .filter(|id| in_degree.get(id).copied() == Some(0))
      .collect();

    let mut levels = Vec::new();
    let mut placed = 0;

    while !current.is_empty() {
      placed += current.len();
      let mut next = Vec::new();

      for id in &current {
        for down in self.downstream(id) {
          if let Some(degree) = in_degree.get_mut(down.as_str()) {
            *degree -= 1;
            if *degree == 0 {
              next.push(down.as_str());
            }
          }
        }
      }

      levels.push(current.iter().map(|id| id.to_string()).collect());

      // Keep workflow order within a level
      next.sort_by_key(|id| self.order.iter().position(|o| o == id));
      current = next;
    }

    if placed == self.order.len() {
      Ok(levels)
    } else {
      Err(
        self
          .order
          .iter()
          .filter(|id| in_degree.get(id.as_str()).copied().unwrap_or(0) > 0)
          .cloned()
          .collect(),
      )
    }
  }

  /// Check whether the dependency edges contain a cycle.
  pub fn has_cycle(&self) -> bool {
    self.levels().is_err()
  }
}
