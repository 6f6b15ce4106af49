//! Example handlers for office-automation task types.
//!
//! These return canned results and exist to exercise the orchestrator end to
//! end. Real deployments register their own handlers.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Value, json};
use tracing::debug;

use crate::error::HandlerError;
use crate::handler::{Handler, Output, Parameters, require_param};
use crate::registry::HandlerRegistry;

pub const DOCUMENT_PROCESSING: &str = "document_processing";
pub const DATA_EXTRACTION: &str = "data_extraction";
pub const NOTIFICATION: &str = "notification";
pub const APPROVAL: &str = "approval";
pub const ARCHIVING: &str = "archiving";

/// Register every example handler under its task type.
pub fn register_all(registry: &mut HandlerRegistry) {
  registry.register(DOCUMENT_PROCESSING, DocumentProcessing);
  registry.register(DATA_EXTRACTION, DataExtraction);
  registry.register(NOTIFICATION, Notification);
  registry.register(APPROVAL, Approval);
  registry.register(ARCHIVING, Archiving);
}

fn object(value: Value) -> Output {
  match value {
    Value::Object(map) => map,
    _ => Output::new(),
  }
}

/// Marks a document as processed. Requires `document_id`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentProcessing;

#[async_trait]
impl Handler for DocumentProcessing {
  async fn execute(&self, parameters: Parameters) -> Result<Output, HandlerError> {
    let document_id = require_param(&parameters, "document_id")?;
    debug!(document_id = %document_id, "processing document");
    Ok(object(json!({
      "status": "processed",
      "document_id": document_id,
    })))
  }
}

/// Returns a fixed extraction payload.
#[derive(Debug, Clone, Copy, Default)]
pub struct DataExtraction;

#[async_trait]
impl Handler for DataExtraction {
  async fn execute(&self, _parameters: Parameters) -> Result<Output, HandlerError> {
    Ok(object(json!({ "extracted_data": { "key": "value" } })))
  }
}

/// Reports a notification as sent. Requires `recipient`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Notification;

#[async_trait]
impl Handler for Notification {
  async fn execute(&self, parameters: Parameters) -> Result<Output, HandlerError> {
    let recipient = require_param(&parameters, "recipient")?;
    debug!(recipient = %recipient, "sending notification");
    Ok(object(json!({ "notified": true, "recipient": recipient })))
  }
}

/// Reports an approval as granted. Requires `approver`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Approval;

#[async_trait]
impl Handler for Approval {
  async fn execute(&self, parameters: Parameters) -> Result<Output, HandlerError> {
    let approver = require_param(&parameters, "approver")?;
    Ok(object(json!({ "approved": true, "approver": approver })))
  }
}

/// Reports the input as archived under `archive/<year>/<month>`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Archiving;

#[async_trait]
impl Handler for Archiving {
  async fn execute(&self, _parameters: Parameters) -> Result<Output, HandlerError> {
    let location = Utc::now().format("archive/%Y/%m").to_string();
    Ok(object(json!({ "archived": true, "location": location })))
  }
}
