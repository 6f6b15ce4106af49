use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use tessera_config::{CompletionPolicy, OrchestratorConfig, WorkflowDef};
use tessera_handler::HandlerRegistry;
use tessera_orchestrator::Orchestrator;
use tessera_workflow::Workflow;

/// Tessera - a round-based workflow task orchestrator
#[derive(Parser)]
#[command(name = "tessera")]
#[command(version, about, long_about = None)]
struct Cli {
  /// Path to an orchestrator config file (JSON)
  #[arg(long, global = true)]
  config: Option<PathBuf>,

  #[command(subcommand)]
  command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
  /// Create and execute a workflow, printing its report as JSON
  Run {
    /// Path to the workflow definition (JSON), or `-` for stdin
    workflow_file: PathBuf,

    /// Mark the workflow failed unless every task completes
    #[arg(long)]
    strict: bool,

    /// Reject unknown dependencies and dependency cycles before running
    #[arg(long)]
    validate: bool,
  },

  /// Check a workflow definition without executing it
  Validate {
    /// Path to the workflow definition (JSON), or `-` for stdin
    workflow_file: PathBuf,
  },

  /// List the built-in handler types
  Handlers,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tessera=info,warn")),
    )
    .with_writer(io::stderr)
    .with_target(false)
    .init();

  let cli = Cli::parse();
  let config = load_config(cli.config.as_deref())?;

  match cli.command {
    Some(Commands::Run {
      workflow_file,
      strict,
      validate,
    }) => {
      let mut config = config;
      if strict {
        config.completion_policy = CompletionPolicy::Strict;
      }
      if validate {
        config.validate_dependencies = true;
      }
      run_workflow(workflow_file, config)?;
    }
    Some(Commands::Validate { workflow_file }) => {
      validate_workflow(workflow_file)?;
    }
    Some(Commands::Handlers) => {
      for task_type in HandlerRegistry::with_builtins().task_types() {
        println!("{}", task_type);
      }
    }
    None => {
      println!("tessera - use --help to see available commands");
    }
  }

  Ok(())
}

fn load_config(path: Option<&Path>) -> Result<OrchestratorConfig> {
  let Some(path) = path else {
    return Ok(OrchestratorConfig::default());
  };

  let content = std::fs::read_to_string(path)
    .with_context(|| format!("failed to read config file: {}", path.display()))?;
  OrchestratorConfig::from_json(&content)
    .with_context(|| format!("failed to parse config file: {}", path.display()))
}

fn run_workflow(workflow_file: PathBuf, config: OrchestratorConfig) -> Result<()> {
  let rt = tokio::runtime::Runtime::new()?;
  rt.block_on(async { run_workflow_async(workflow_file, config).await })
}

async fn run_workflow_async(workflow_file: PathBuf, config: OrchestratorConfig) -> Result<()> {
  let workflow_def = read_definition(&workflow_file).await?;
  info!(workflow_name = %workflow_def.name, tasks = workflow_def.tasks.len(), "loaded workflow");

  let registry = if config.builtin_handlers {
    HandlerRegistry::with_builtins()
  } else {
    warn!("built-in handlers disabled; every task will fail with an unknown handler type");
    HandlerRegistry::new()
  };

  let orchestrator = Orchestrator::with_config(registry, config);
  let workflow_id = orchestrator
    .create_workflow(workflow_def)
    .context("failed to create workflow")?;

  // Ctrl-C cancels the execution
  let cancel = CancellationToken::new();
  let ctrl_c = cancel.clone();
  tokio::spawn(async move {
    if tokio::signal::ctrl_c().await.is_ok() {
      ctrl_c.cancel();
    }
  });

  let report = orchestrator
    .execute_workflow_with_cancel(&workflow_id, cancel)
    .await
    .context("workflow execution failed")?;

  let status = orchestrator.workflow_status(&workflow_id)?;
  eprintln!(
    "Workflow {} {}: {}/{} tasks completed",
    report.workflow_id, report.status, status.tasks_completed, status.tasks_total
  );

  println!("{}", serde_json::to_string_pretty(&report)?);

  Ok(())
}

fn validate_workflow(workflow_file: PathBuf) -> Result<()> {
  let rt = tokio::runtime::Runtime::new()?;
  rt.block_on(async { validate_workflow_async(workflow_file).await })
}

async fn validate_workflow_async(workflow_file: PathBuf) -> Result<()> {
  let workflow_def = read_definition(&workflow_file).await?;
  let workflow = Workflow::from_def("wf_validate", workflow_def).context("invalid workflow")?;
  let check = check_workflow(&workflow, &HandlerRegistry::with_builtins());

  for line in &check.plan {
    println!("{}", line);
  }
  for warning in &check.warnings {
    eprintln!("warning: {}", warning);
  }
  for problem in &check.problems {
    eprintln!("error: {}", problem);
  }

  if !check.problems.is_empty() {
    bail!(
      "{} problem(s) found in {}",
      check.problems.len(),
      workflow_file.display()
    );
  }

  eprintln!("{} is valid ({} tasks)", workflow.name, workflow.tasks_total());
  Ok(())
}

/// Outcome of a static workflow check.
#[derive(Debug, Default)]
struct WorkflowCheck {
  /// Entry points and the rounds the scheduler would run.
  plan: Vec<String>,
  warnings: Vec<String>,
  problems: Vec<String>,
}

fn check_workflow(workflow: &Workflow, registry: &HandlerRegistry) -> WorkflowCheck {
  let graph = workflow.graph();
  let mut check = WorkflowCheck::default();

  check
    .plan
    .push(format!("entry points: {}", graph.entry_points().join(", ")));

  for (task_id, dependency) in graph.unknown_dependencies() {
    check.problems.push(format!(
      "{} depends on unknown task {}",
      task_id, dependency
    ));
  }

  match graph.levels() {
    Ok(levels) => {
      for (index, level) in levels.iter().enumerate() {
        let tasks: Vec<String> = level
          .iter()
          .map(|task_id| {
            if graph.is_join_point(task_id) {
              format!("{} (join)", task_id)
            } else {
              task_id.clone()
            }
          })
          .collect();
        check
          .plan
          .push(format!("round {}: {}", index + 1, tasks.join(", ")));
      }
    }
    Err(cyclic) => {
      check
        .problems
        .push(format!("dependency cycle involving {}", cyclic.join(", ")));
    }
  }

  for task in workflow.tasks() {
    if !registry.contains(&task.task_type) {
      check.warnings.push(format!(
        "{} has type '{}' with no built-in handler",
        task.task_id, task.task_type
      ));
    }
  }

  check
}

async fn read_definition(workflow_file: &Path) -> Result<WorkflowDef> {
  let content = if workflow_file == Path::new("-") {
    let mut input = String::new();
    io::stdin()
      .read_to_string(&mut input)
      .context("failed to read workflow definition from stdin")?;
    input
  } else {
    tokio::fs::read_to_string(workflow_file)
      .await
      .with_context(|| format!("failed to read workflow file: {}", workflow_file.display()))?
  };

  WorkflowDef::from_json(&content)
    .with_context(|| format!("failed to parse workflow file: {}", workflow_file.display()))
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn create_workflow(tasks: serde_json::Value) -> Workflow {
    Workflow::from_value("wf_validate", json!({ "name": "Check", "tasks": tasks })).unwrap()
  }

  #[test]
  fn test_check_reports_entry_points_and_joins() {
    let workflow = create_workflow(json!([
      { "name": "extract", "type": "data_extraction", "parameters": {} },
      { "name": "process", "type": "document_processing", "parameters": {}, "depends_on": ["task_0"] },
      { "name": "notify", "type": "notification", "parameters": {}, "depends_on": ["task_0"] },
      { "name": "approve", "type": "approval", "parameters": {}, "depends_on": ["task_1", "task_2"] }
    ]));

    let check = check_workflow(&workflow, &HandlerRegistry::with_builtins());

    assert_eq!(
      check.plan,
      vec![
        "entry points: task_0",
        "round 1: task_0",
        "round 2: task_1, task_2",
        "round 3: task_3 (join)",
      ]
    );
    assert!(check.problems.is_empty());
    assert!(check.warnings.is_empty());
  }

  #[test]
  fn test_check_flags_unknown_dependencies_and_cycles() {
    let workflow = create_workflow(json!([
      { "name": "a", "type": "archiving", "parameters": {}, "depends_on": ["task_1"] },
      { "name": "b", "type": "archiving", "parameters": {}, "depends_on": ["task_0"] },
      { "name": "c", "type": "shredding", "parameters": {}, "depends_on": ["task_99"] }
    ]));

    let check = check_workflow(&workflow, &HandlerRegistry::with_builtins());

    assert_eq!(
      check.problems,
      vec![
        "task_2 depends on unknown task task_99",
        "dependency cycle involving task_0, task_1",
      ]
    );
    assert_eq!(
      check.warnings,
      vec!["task_2 has type 'shredding' with no built-in handler"]
    );
    assert_eq!(check.plan, vec!["entry points: "]);
  }
}
