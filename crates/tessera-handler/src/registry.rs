use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use crate::builtin;
use crate::error::HandlerError;
use crate::handler::{FnHandler, Handler, Output, Parameters};

/// Maps task types to the handlers that execute them.
#[derive(Clone, Default)]
pub struct HandlerRegistry {
  handlers: HashMap<String, Arc<dyn Handler>>,
}

impl HandlerRegistry {
  /// Create an empty registry.
  pub fn new() -> Self {
    Self::default()
  }

  /// Create a registry pre-populated with the example handlers from
  /// [`builtin`].
  pub fn with_builtins() -> Self {
    let mut registry = Self::new();
    builtin::register_all(&mut registry);
    registry
  }

  /// Register a handler for a task type, returning the one it replaced.
  pub fn register(
    &mut self,
    task_type: impl Into<String>,
    handler: impl Handler + 'static,
  ) -> Option<Arc<dyn Handler>> {
    self.register_arc(task_type, Arc::new(handler))
  }

  /// Register an already shared handler.
  pub fn register_arc(
    &mut self,
    task_type: impl Into<String>,
    handler: Arc<dyn Handler>,
  ) -> Option<Arc<dyn Handler>> {
    self.handlers.insert(task_type.into(), handler)
  }

  /// Register an async closure as the handler for a task type.
  pub fn register_fn<F, Fut>(
    &mut self,
    task_type: impl Into<String>,
    f: F,
  ) -> Option<Arc<dyn Handler>>
  where
    F: Fn(Parameters) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Output, HandlerError>> + Send + 'static,
  {
    self.register(task_type, FnHandler::new(f))
  }

  /// Get the handler for a task type.
  pub fn get(&self, task_type: &str) -> Option<Arc<dyn Handler>> {
    self.handlers.get(task_type).cloned()
  }

  /// Get the handler for a task type, failing with
  /// [`HandlerError::UnknownHandlerType`] when none is registered.
  pub fn resolve(&self, task_type: &str) -> Result<Arc<dyn Handler>, HandlerError> {
    self
      .get(task_type)
      .ok_or_else(|| HandlerError::UnknownHandlerType {
        task_type: task_type.to_string(),
      })
  }

  pub fn contains(&self, task_type: &str) -> bool {
    self.handlers.contains_key(task_type)
  }

  /// Registered task types, sorted.
  pub fn task_types(&self) -> Vec<&str> {
    let mut types: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
    types.sort_unstable();
    types
  }

  pub fn len(&self) -> usize {
    self.handlers.len()
  }

  pub fn is_empty(&self) -> bool {
    self.handlers.is_empty()
  }
}

impl fmt::Debug for HandlerRegistry {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("HandlerRegistry")
      .field("task_types", &self.task_types())
      .finish()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_new_registry_is_empty() {
    let registry = HandlerRegistry::new();
    assert!(registry.is_empty());
    assert!(registry.get("notification").is_none());
  }

  #[test]
  fn test_resolve_unknown_type() {
    let registry = HandlerRegistry::new();
    let err = match registry.resolve("unknown_type") {
      Err(err) => err,
      Ok(_) => panic!("expected unknown handler type"),
    };
    assert!(matches!(err, HandlerError::UnknownHandlerType { .. }));
    assert_eq!(err.to_string(), "No handler for task type: unknown_type");
  }

  #[test]
  fn test_with_builtins_registers_examples() {
    let registry = HandlerRegistry::with_builtins();
    assert_eq!(
      registry.task_types(),
      vec![
        "approval",
        "archiving",
        "data_extraction",
        "document_processing",
        "notification"
      ]
    );
  }

  #[tokio::test]
  async fn test_register_fn_replaces_previous() {
    let mut registry = HandlerRegistry::new();
    assert!(
      registry
        .register_fn("echo", |params| async move { Ok::<_, HandlerError>(params) })
        .is_none()
    );
    let replaced = registry.register_fn("echo", |_params| async move {
      Err::<Output, _>(HandlerError::execution("disabled"))
    });
    assert!(replaced.is_some());
    assert_eq!(registry.len(), 1);

    let mut params = Parameters::new();
    params.insert("k".to_string(), json!(1));
    let err = registry
      .resolve("echo")
      .unwrap()
      .execute(params)
      .await
      .unwrap_err();
    assert_eq!(err.to_string(), "disabled");
  }
}
