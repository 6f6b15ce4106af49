use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkflowError {
  #[error("invalid workflow definition: {0}")]
  InvalidDefinition(String),

  #[error("task '{task_id}' depends on unknown task '{dependency}'")]
  UnknownDependency { task_id: String, dependency: String },

  #[error("dependency cycle detected involving tasks: {}", task_ids.join(", "))]
  CyclicDependency { task_ids: Vec<String> },
}

impl From<serde_json::Error> for WorkflowError {
  fn from(err: serde_json::Error) -> Self {
    Self::InvalidDefinition(err.to_string())
  }
}
