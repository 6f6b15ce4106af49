//! The orchestrator: workflow store and public entry points.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tessera_config::{OrchestratorConfig, WorkflowDef};
use tessera_handler::HandlerRegistry;
use tessera_workflow::Workflow;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};

use crate::error::OrchestratorError;
use crate::events::{ExecutionNotifier, NoopNotifier};
use crate::execution::WorkflowExecution;
use crate::report::{WorkflowReport, WorkflowStatusReport};

/// State guarded by a workflow's lock.
pub(crate) struct SlotState {
  pub(crate) workflow: Workflow,
  pub(crate) execution_id: Option<String>,
}

/// A stored workflow.
///
/// The scheduler driving the workflow is its only writer; status queries take
/// the read lock and copy what they need, so they always see the state between
/// two updates, never half of one.
pub(crate) struct WorkflowSlot {
  seq: u64,
  state: RwLock<SlotState>,
}

impl WorkflowSlot {
  pub(crate) fn read(&self) -> RwLockReadGuard<'_, SlotState> {
    self.state.read().unwrap_or_else(|e| e.into_inner())
  }

  pub(crate) fn write(&self) -> RwLockWriteGuard<'_, SlotState> {
    self.state.write().unwrap_or_else(|e| e.into_inner())
  }
}

/// The workflow orchestrator.
///
/// Owns every workflow it creates and the handler registry used to execute
/// them. Share it behind an `Arc` to create, execute, and query workflows from
/// several tasks at once; distinct workflows execute independently.
pub struct Orchestrator {
  config: OrchestratorConfig,
  pub(crate) handlers: Arc<HandlerRegistry>,
  pub(crate) notifier: Arc<dyn ExecutionNotifier>,
  workflows: RwLock<HashMap<String, Arc<WorkflowSlot>>>,
  next_id: AtomicU64,
}

impl Orchestrator {
  /// Create an orchestrator with the default configuration.
  pub fn new(handlers: HandlerRegistry) -> Self {
    Self::with_config(handlers, OrchestratorConfig::default())
  }

  /// Create an orchestrator with the given configuration.
  pub fn with_config(handlers: HandlerRegistry, config: OrchestratorConfig) -> Self {
    Self {
      config,
      handlers: Arc::new(handlers),
      notifier: Arc::new(NoopNotifier),
      workflows: RwLock::new(HashMap::new()),
      next_id: AtomicU64::new(0),
    }
  }

  /// Replace the notifier that receives execution events.
  pub fn with_notifier(mut self, notifier: Arc<dyn ExecutionNotifier>) -> Self {
    self.notifier = notifier;
    self
  }

  pub fn config(&self) -> &OrchestratorConfig {
    &self.config
  }

  pub fn handlers(&self) -> &HandlerRegistry {
    &self.handlers
  }

  /// Create a workflow from a definition and store it.
  ///
  /// Returns the new workflow's ID. Dependency references are only checked
  /// when `validate_dependencies` is enabled in the config.
  pub fn create_workflow(&self, def: WorkflowDef) -> Result<String, OrchestratorError> {
    let seq = self.next_id.fetch_add(1, Ordering::Relaxed);
    let workflow_id = format!("wf_{}", seq);

    let workflow = Workflow::from_def(workflow_id.clone(), def)?;
    if self.config.validate_dependencies {
      workflow.validate_dependencies()?;
    }

    info!(
      workflow_id = %workflow_id,
      workflow_name = %workflow.name,
      tasks = workflow.tasks_total(),
      "workflow_created"
    );

    let slot = WorkflowSlot {
      seq,
      state: RwLock::new(SlotState {
        workflow,
        execution_id: None,
      }),
    };

    self
      .workflows
      .write()
      .unwrap_or_else(|e| e.into_inner())
      .insert(workflow_id.clone(), Arc::new(slot));

    Ok(workflow_id)
  }

  /// Create a workflow from an untyped JSON definition.
  pub fn create_workflow_from_value(
    &self,
    value: serde_json::Value,
  ) -> Result<String, OrchestratorError> {
    let def = WorkflowDef::from_value(value).map_err(tessera_workflow::WorkflowError::from)?;
    self.create_workflow(def)
  }

  /// Create a workflow from a JSON string.
  pub fn create_workflow_from_json(&self, json: &str) -> Result<String, OrchestratorError> {
    let def = WorkflowDef::from_json(json).map_err(tessera_workflow::WorkflowError::from)?;
    self.create_workflow(def)
  }

  /// Execute a pending workflow to completion and return its report.
  pub async fn execute_workflow(
    &self,
    workflow_id: &str,
  ) -> Result<WorkflowReport, OrchestratorError> {
    self
      .execute_workflow_with_cancel(workflow_id, CancellationToken::new())
      .await
  }

  /// Execute a pending workflow, stopping early if `cancel` fires.
  ///
  /// On cancellation the workflow is marked `Failed`, tasks still in flight
  /// are failed, and [`OrchestratorError::Cancelled`] is returned. The state
  /// remains available through [`Orchestrator::workflow_report`].
  #[instrument(name = "orchestrator_execute", skip(self, cancel))]
  pub async fn execute_workflow_with_cancel(
    &self,
    workflow_id: &str,
    cancel: CancellationToken,
  ) -> Result<WorkflowReport, OrchestratorError> {
    let slot = self.slot(workflow_id)?;
    let execution_id = uuid::Uuid::new_v4().to_string();

    WorkflowExecution::new(self, slot, execution_id, cancel)
      .wait()
      .await
  }

  /// Status snapshot of a workflow.
  pub fn workflow_status(
    &self,
    workflow_id: &str,
  ) -> Result<WorkflowStatusReport, OrchestratorError> {
    let slot = self.slot(workflow_id)?;
    let state = slot.read();
    Ok(WorkflowStatusReport::new(&state.workflow))
  }

  /// Full report of a workflow, whatever its current status.
  pub fn workflow_report(&self, workflow_id: &str) -> Result<WorkflowReport, OrchestratorError> {
    let slot = self.slot(workflow_id)?;
    let state = slot.read();
    Ok(WorkflowReport::new(
      &state.workflow,
      state.execution_id.clone(),
    ))
  }

  /// Copy of a stored workflow.
  pub fn workflow(&self, workflow_id: &str) -> Result<Workflow, OrchestratorError> {
    let slot = self.slot(workflow_id)?;
    let state = slot.read();
    Ok(state.workflow.clone())
  }

  /// Status snapshots of every workflow, in creation order.
  pub fn list_workflows(&self) -> Vec<WorkflowStatusReport> {
    let mut slots: Vec<Arc<WorkflowSlot>> = self
      .workflows
      .read()
      .unwrap_or_else(|e| e.into_inner())
      .values()
      .cloned()
      .collect();
    slots.sort_by_key(|slot| slot.seq);

    slots
      .iter()
      .map(|slot| WorkflowStatusReport::new(&slot.read().workflow))
      .collect()
  }

  fn slot(&self, workflow_id: &str) -> Result<Arc<WorkflowSlot>, OrchestratorError> {
    self
      .workflows
      .read()
      .unwrap_or_else(|e| e.into_inner())
      .get(workflow_id)
      .cloned()
      .ok_or_else(|| OrchestratorError::WorkflowNotFound {
        workflow_id: workflow_id.to_string(),
      })
  }
}
