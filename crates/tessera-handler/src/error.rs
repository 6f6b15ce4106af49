//! Handler errors.

/// Errors produced while executing a task.
///
/// Every variant is recorded as the failing task's result; none of them
/// aborts the surrounding workflow.
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
  /// No handler is registered for the task's type.
  #[error("No handler for task type: {task_type}")]
  UnknownHandlerType { task_type: String },

  /// A parameter the handler needs is absent.
  #[error("missing required parameter '{name}'")]
  MissingParameter { name: String },

  /// The handler ran and reported a failure.
  #[error("{message}")]
  Execution { message: String },

  /// The handler panicked or its task was torn down.
  #[error("handler aborted: {message}")]
  Aborted { message: String },
}

impl HandlerError {
  /// Create an execution error with the given message.
  pub fn execution(message: impl Into<String>) -> Self {
    Self::Execution {
      message: message.into(),
    }
  }
}
