//! Tessera Handler
//!
//! This crate defines how task work is plugged into the orchestrator. A
//! [`Handler`] executes one task type: it receives the task's parameters
//! verbatim and returns a JSON object or a [`HandlerError`].
//!
//! Handlers are looked up by task type in a [`HandlerRegistry`]. The
//! orchestrator ships no business logic of its own; the handlers in
//! [`builtin`] are illustrative and only registered on request.

pub mod builtin;
mod error;
mod handler;
mod registry;

pub use error::HandlerError;
pub use handler::{FnHandler, Handler, Output, Parameters, require_param};
pub use registry::HandlerRegistry;
