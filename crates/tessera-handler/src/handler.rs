//! The handler trait.

use std::future::Future;

use async_trait::async_trait;

use crate::error::HandlerError;

pub use tessera_config::Parameters;

/// Output of a successful handler invocation.
pub type Output = serde_json::Map<String, serde_json::Value>;

/// Executes the work for one task type.
///
/// Implementations must be safe to call concurrently: the scheduler dispatches
/// every ready task of a round at once, and several of them may share a type.
#[async_trait]
pub trait Handler: Send + Sync {
  /// Run a task with the parameters from its definition.
  async fn execute(&self, parameters: Parameters) -> Result<Output, HandlerError>;
}

/// Adapts an async closure into a [`Handler`].
///
/// ```ignore
/// registry.register(
///   "echo",
///   FnHandler::new(|params| async move { Ok(params) }),
/// );
/// ```
pub struct FnHandler<F> {
  f: F,
}

impl<F> FnHandler<F> {
  pub fn new(f: F) -> Self {
    Self { f }
  }
}

#[async_trait]
impl<F, Fut> Handler for FnHandler<F>
where
  F: Fn(Parameters) -> Fut + Send + Sync,
  Fut: Future<Output = Result<Output, HandlerError>> + Send,
{
  async fn execute(&self, parameters: Parameters) -> Result<Output, HandlerError> {
    (self.f)(parameters).await
  }
}

/// Look up a parameter, failing with [`HandlerError::MissingParameter`].
pub fn require_param<'a>(
  parameters: &'a Parameters,
  name: &str,
) -> Result<&'a serde_json::Value, HandlerError> {
  parameters
    .get(name)
    .ok_or_else(|| HandlerError::MissingParameter {
      name: name.to_string(),
    })
}
