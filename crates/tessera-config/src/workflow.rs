use serde::{Deserialize, Serialize};

/// Opaque task parameters, passed verbatim to the task's handler.
pub type Parameters = serde_json::Map<String, serde_json::Value>;

/// A workflow definition as submitted by a caller.
///
/// ```json
/// {
///   "name": "Invoice approval",
///   "tasks": [
///     { "name": "Extract", "type": "data_extraction", "parameters": {} },
///     {
///       "name": "Approve",
///       "type": "approval",
///       "parameters": { "approver": "finance" },
///       "depends_on": ["task_0"]
///     }
///   ]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowDef {
  pub name: String,
  pub tasks: Vec<TaskDef>,
}

/// A single task definition inside a [`WorkflowDef`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskDef {
  pub name: String,
  /// Key into the handler registry.
  #[serde(rename = "type")]
  pub task_type: String,
  pub parameters: Parameters,
  /// Identifiers (`task_<index>`) of tasks that must complete first.
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub depends_on: Vec<String>,
}

impl WorkflowDef {
  /// Parse a definition from a JSON string.
  pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
    serde_json::from_str(json)
  }

  /// Parse a definition from an already-decoded JSON value.
  pub fn from_value(value: serde_json::Value) -> Result<Self, serde_json::Error> {
    serde_json::from_value(value)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_parse_definition_with_dependencies() {
    let def = WorkflowDef::from_value(json!({
      "name": "Review",
      "tasks": [
        { "name": "Extract", "type": "data_extraction", "parameters": {} },
        {
          "name": "Notify",
          "type": "notification",
          "parameters": { "recipient": "alice" },
          "depends_on": ["task_0"]
        }
      ]
    }))
    .unwrap();

    assert_eq!(def.name, "Review");
    assert_eq!(def.tasks.len(), 2);
    assert!(def.tasks[0].depends_on.is_empty());
    assert_eq!(def.tasks[1].task_type, "notification");
    assert_eq!(def.tasks[1].depends_on, vec!["task_0".to_string()]);
    assert_eq!(def.tasks[1].parameters["recipient"], "alice");
  }

  #[test]
  fn test_missing_parameters_is_rejected() {
    let err = WorkflowDef::from_value(json!({
      "name": "Broken",
      "tasks": [{ "name": "Extract", "type": "data_extraction" }]
    }))
    .unwrap_err();

    assert!(err.to_string().contains("parameters"));
  }

  #[test]
  fn test_non_object_parameters_are_rejected() {
    let result = WorkflowDef::from_json(
      r#"{"name": "Broken", "tasks": [{"name": "a", "type": "b", "parameters": [1, 2]}]}"#,
    );
    assert!(result.is_err());
  }

  #[test]
  fn test_type_field_serializes_as_type() {
    let def = TaskDef {
      name: "Archive".to_string(),
      task_type: "archiving".to_string(),
      parameters: Parameters::new(),
      depends_on: vec![],
    };

    let value = serde_json::to_value(&def).unwrap();
    assert_eq!(value["type"], "archiving");
    assert!(value.get("depends_on").is_none());
  }
}
