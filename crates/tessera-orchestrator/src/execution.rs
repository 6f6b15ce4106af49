//! Workflow execution.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tessera_config::{CompletionPolicy, Parameters};
use tessera_handler::{HandlerError, HandlerRegistry, Output};
use tessera_workflow::{TaskStatus, WorkflowStatus, runnable_tasks};
use tokio::task::{AbortHandle, Id, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, error, info, info_span, instrument, warn};

use crate::error::OrchestratorError;
use crate::events::{ExecutionEvent, ExecutionNotifier};
use crate::orchestrator::{Orchestrator, WorkflowSlot};
use crate::report::WorkflowReport;

/// Result of one handler invocation.
type TaskOutcome = Result<Output, HandlerError>;

/// Everything a handler invocation needs, copied out of the workflow so no
/// lock is held while it runs.
struct Dispatch {
  task_id: String,
  task_type: String,
  parameters: Parameters,
}

/// A single execution of a stored workflow.
///
/// Call `.wait()` to run the execution and get the report. Dropping the
/// `wait()` future part way aborts the round in flight and marks the
/// workflow failed with [`OrchestratorError::Interrupted`].
pub(crate) struct WorkflowExecution<'a> {
  orchestrator: &'a Orchestrator,
  slot: Arc<WorkflowSlot>,
  workflow_id: String,
  execution_id: String,
  cancel: CancellationToken,
  /// True between starting the workflow and settling its terminal status.
  running: AtomicBool,
}

impl<'a> WorkflowExecution<'a> {
  pub(crate) fn new(
    orchestrator: &'a Orchestrator,
    slot: Arc<WorkflowSlot>,
    execution_id: String,
    cancel: CancellationToken,
  ) -> Self {
    let workflow_id = slot.read().workflow.workflow_id.clone();
    Self {
      orchestrator,
      slot,
      workflow_id,
      execution_id,
      cancel,
      running: AtomicBool::new(false),
    }
  }

  fn notifier(&self) -> &dyn ExecutionNotifier {
    self.orchestrator.notifier.as_ref()
  }

  fn handlers(&self) -> &HandlerRegistry {
    &self.orchestrator.handlers
  }

  /// Run the workflow until no more tasks can make progress.
  #[instrument(
    name = "workflow_execute",
    skip(self),
    fields(
      workflow_id = %self.workflow_id,
      execution_id = %self.execution_id,
    )
  )]
  pub(crate) async fn wait(self) -> Result<WorkflowReport, OrchestratorError> {
    {
      let mut state = self.slot.write();
      if !state.workflow.start() {
        return Err(OrchestratorError::InvalidState {
          workflow_id: self.workflow_id.clone(),
          status: state.workflow.status(),
        });
      }
      state.execution_id = Some(self.execution_id.clone());
      self.running.store(true, Ordering::Release);
    }

    info!(
      execution_id = %self.execution_id,
      workflow_id = %self.workflow_id,
      "workflow_started"
    );
    self.notifier().notify(ExecutionEvent::WorkflowStarted {
      execution_id: self.execution_id.clone(),
      workflow_id: self.workflow_id.clone(),
    });

    match self.run_loop().await {
      Ok(rounds) => Ok(self.finish(rounds)),
      Err(e) => {
        self.abort(&e);
        Err(e)
      }
    }
  }

  /// Run rounds until every task completed or nothing is runnable.
  ///
  /// Returns the number of rounds executed.
  async fn run_loop(&self) -> Result<usize, OrchestratorError> {
    let tasks_total = self.slot.read().workflow.tasks_total();
    let mut completed: HashSet<String> = HashSet::new();
    let mut round = 0;

    // A finished workflow stays finished even if the token fires afterwards
    while completed.len() < tasks_total {
      if self.cancel.is_cancelled() {
        warn!(execution_id = %self.execution_id, "workflow cancelled");
        return Err(OrchestratorError::Cancelled);
      }

      let dispatches = self.start_ready_tasks(&completed);
      if dispatches.is_empty() {
        break;
      }

      round += 1;
      let task_ids: Vec<String> = dispatches.iter().map(|d| d.task_id.clone()).collect();

      info!(
        execution_id = %self.execution_id,
        round,
        ready_tasks = ?task_ids,
        "executing round"
      );
      self.notifier().notify(ExecutionEvent::RoundStarted {
        execution_id: self.execution_id.clone(),
        round,
        task_ids,
      });

      // Dispatch every ready task concurrently. The set aborts whatever is
      // still running when it is dropped.
      let mut tasks: JoinSet<TaskOutcome> = JoinSet::new();
      let mut in_flight: HashMap<Id, String> = HashMap::new();
      for dispatch in dispatches {
        let task_id = dispatch.task_id.clone();
        let handle = self.spawn_task(&mut tasks, dispatch);
        in_flight.insert(handle.id(), task_id);
      }

      // Round barrier: wait for every dispatch to resolve
      let mut outcomes = Vec::with_capacity(in_flight.len());
      let cancelled = loop {
        tokio::select! {
          biased;
          joined = tasks.join_next_with_id() => match joined {
            Some(Ok((id, outcome))) => {
              if let Some(task_id) = in_flight.remove(&id) {
                outcomes.push((task_id, outcome));
              }
            }
            Some(Err(e)) => {
              if let Some(task_id) = in_flight.remove(&e.id()) {
                let aborted = HandlerError::Aborted {
                  message: e.to_string(),
                };
                outcomes.push((task_id, Err(aborted)));
              }
            }
            None => break false,
          },
          _ = self.cancel.cancelled() => break true,
        }
      };

      // Handlers that returned before a cancellation keep their outcome
      self.record_outcomes(outcomes, &mut completed);

      if cancelled {
        let pending: Vec<&String> = in_flight.values().collect();
        warn!(
          execution_id = %self.execution_id,
          round,
          in_flight = ?pending,
          "workflow cancelled during round"
        );
        tasks.abort_all();
        return Err(OrchestratorError::Cancelled);
      }

      self.notifier().notify(ExecutionEvent::RoundCompleted {
        execution_id: self.execution_id.clone(),
        round,
      });
    }

    Ok(round)
  }

  /// Compute the ready set and move it to `Processing`.
  fn start_ready_tasks(&self, completed: &HashSet<String>) -> Vec<Dispatch> {
    let mut state = self.slot.write();
    let workflow = &mut state.workflow;

    let ready: Vec<String> = runnable_tasks(workflow, completed)
      .into_iter()
      .map(|task| task.task_id.clone())
      .collect();

    ready
      .iter()
      .filter_map(|task_id| {
        let task = workflow.get_task_mut(task_id)?;
        if !task.start() {
          return None;
        }
        Some(Dispatch {
          task_id: task.task_id.clone(),
          task_type: task.task_type.clone(),
          parameters: task.parameters.clone(),
        })
      })
      .collect()
  }

  /// Spawn a single handler invocation into the round's set.
  ///
  /// A missing handler still goes through the task so it fails like any other
  /// handler error; a panic surfaces as a join error for this task only.
  fn spawn_task(&self, tasks: &mut JoinSet<TaskOutcome>, dispatch: Dispatch) -> AbortHandle {
    let handler = self.handlers().resolve(&dispatch.task_type);

    info!(
      execution_id = %self.execution_id,
      task_id = %dispatch.task_id,
      task_type = %dispatch.task_type,
      "task_started"
    );
    self.notifier().notify(ExecutionEvent::TaskStarted {
      execution_id: self.execution_id.clone(),
      task_id: dispatch.task_id.clone(),
      task_type: dispatch.task_type.clone(),
    });

    let span = info_span!(
      "task_execute",
      execution_id = %self.execution_id,
      task_id = %dispatch.task_id,
      task_type = %dispatch.task_type
    );

    tasks.spawn(
      async move {
        match handler {
          Ok(handler) => handler.execute(dispatch.parameters).await,
          Err(e) => Err(e),
        }
      }
      .instrument(span),
    )
  }

  /// Apply a round's outcomes to the workflow, then emit their events.
  fn record_outcomes(
    &self,
    outcomes: Vec<(String, TaskOutcome)>,
    completed: &mut HashSet<String>,
  ) {
    let mut events = Vec::with_capacity(outcomes.len());

    {
      let mut state = self.slot.write();
      for (task_id, outcome) in outcomes {
        let Some(task) = state.workflow.get_task_mut(&task_id) else {
          continue;
        };

        match outcome {
          Ok(output) => {
            let output = serde_json::Value::Object(output);
            info!(
              execution_id = %self.execution_id,
              task_id = %task_id,
              output = %output,
              "task_completed"
            );
            if task.complete(output.clone()) {
              completed.insert(task_id.clone());
              events.push(ExecutionEvent::TaskCompleted {
                execution_id: self.execution_id.clone(),
                task_id,
                output,
              });
            }
          }
          Err(e) => {
            error!(
              execution_id = %self.execution_id,
              task_id = %task_id,
              error = %e,
              "task_failed"
            );
            if task.fail(&e) {
              events.push(ExecutionEvent::TaskFailed {
                execution_id: self.execution_id.clone(),
                task_id,
                error: e.to_string(),
              });
            }
          }
        }
      }
    }

    for event in events {
      self.notifier().notify(event);
    }
  }

  /// Apply the completion policy after the loop exits normally.
  fn finish(&self, rounds: usize) -> WorkflowReport {
    self.running.store(false, Ordering::Release);
    let policy = self.orchestrator.config().completion_policy;

    let (report, tasks_completed, tasks_total) = {
      let mut guard = self.slot.write();
      let state = &mut *guard;
      let workflow = &mut state.workflow;
      let tasks_total = workflow.tasks_total();
      let tasks_completed = workflow.tasks_completed();

      let stranded: Vec<&str> = workflow
        .tasks()
        .iter()
        .filter(|t| t.status() == TaskStatus::Pending)
        .map(|t| t.task_id.as_str())
        .collect();
      if !stranded.is_empty() {
        warn!(
          execution_id = %self.execution_id,
          stranded_tasks = ?stranded,
          "no runnable tasks left; tasks with failed or unknown dependencies were never run"
        );
      }

      match policy {
        CompletionPolicy::Strict if tasks_completed < tasks_total => workflow.fail(),
        _ => workflow.complete(),
      };

      (
        WorkflowReport::new(workflow, state.execution_id.clone()),
        tasks_completed,
        tasks_total,
      )
    };

    if report.status == WorkflowStatus::Completed {
      info!(
        execution_id = %self.execution_id,
        rounds,
        tasks_completed,
        tasks_total,
        "workflow_completed"
      );
      self.notifier().notify(ExecutionEvent::WorkflowCompleted {
        execution_id: self.execution_id.clone(),
        tasks_completed,
        tasks_total,
      });
    } else {
      let message = format!(
        "{} of {} tasks did not complete",
        tasks_total - tasks_completed,
        tasks_total
      );
      error!(
        execution_id = %self.execution_id,
        rounds,
        error = %message,
        "workflow_failed"
      );
      self.notifier().notify(ExecutionEvent::WorkflowFailed {
        execution_id: self.execution_id.clone(),
        error: message,
      });
    }

    report
  }

  /// Mark the workflow failed after an error escaped the loop.
  fn abort(&self, err: &OrchestratorError) {
    self.running.store(false, Ordering::Release);
    let mut events = Vec::new();

    {
      let mut state = self.slot.write();
      let workflow = &mut state.workflow;

      let in_flight: Vec<String> = workflow
        .tasks()
        .iter()
        .filter(|t| t.status() == TaskStatus::Processing)
        .map(|t| t.task_id.clone())
        .collect();

      for task_id in in_flight {
        if let Some(task) = workflow.get_task_mut(&task_id) {
          if task.fail(err) {
            events.push(ExecutionEvent::TaskFailed {
              execution_id: self.execution_id.clone(),
              task_id,
              error: err.to_string(),
            });
          }
        }
      }

      workflow.fail();
    }

    error!(
      execution_id = %self.execution_id,
      error = %err,
      "workflow_failed"
    );

    events.push(ExecutionEvent::WorkflowFailed {
      execution_id: self.execution_id.clone(),
      error: err.to_string(),
    });
    for event in events {
      self.notifier().notify(event);
    }
  }
}

impl Drop for WorkflowExecution<'_> {
  fn drop(&mut self) {
    if self.running.load(Ordering::Acquire) {
      warn!(
        execution_id = %self.execution_id,
        workflow_id = %self.workflow_id,
        "workflow execution dropped before finishing"
      );
      self.abort(&OrchestratorError::Interrupted);
    }
  }
}
