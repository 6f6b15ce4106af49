use serde::{Deserialize, Serialize};

/// How the orchestrator decides a workflow's terminal status once no more
/// tasks can run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionPolicy {
  /// The workflow is `Completed` whenever the scheduler loop exits normally,
  /// even if some tasks failed or were never runnable. Callers inspect
  /// `tasks_completed` / `tasks_total` for the real outcome.
  #[default]
  Lenient,
  /// The workflow is `Completed` only if every task completed; otherwise it
  /// is `Failed`.
  Strict,
}

/// Orchestrator configuration.
///
/// Every field has a default, so `{}` is a valid config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
  pub completion_policy: CompletionPolicy,
  /// Reject unknown dependency references and dependency cycles when a
  /// workflow is created, instead of letting the affected tasks strand.
  pub validate_dependencies: bool,
  /// Register the built-in example handlers (used by the CLI).
  pub builtin_handlers: bool,
}

impl Default for OrchestratorConfig {
  fn default() -> Self {
    Self {
      completion_policy: CompletionPolicy::Lenient,
      validate_dependencies: false,
      builtin_handlers: true,
    }
  }
}

impl OrchestratorConfig {
  /// Parse a config from a JSON string.
  pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
    serde_json::from_str(json)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_empty_config_uses_defaults() {
    let config = OrchestratorConfig::from_json("{}").unwrap();
    assert_eq!(config, OrchestratorConfig::default());
    assert_eq!(config.completion_policy, CompletionPolicy::Lenient);
    assert!(!config.validate_dependencies);
  }

  #[test]
  fn test_strict_policy_parses() {
    let config =
      OrchestratorConfig::from_json(r#"{"completion_policy": "strict", "validate_dependencies": true}"#)
        .unwrap();
    assert_eq!(config.completion_policy, CompletionPolicy::Strict);
    assert!(config.validate_dependencies);
    assert!(config.builtin_handlers);
  }
}
