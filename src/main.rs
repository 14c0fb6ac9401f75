use anyhow::{Context, Result};
use checkrun::cli::commands::{
    HistoryCommand, InitCommand, ListCommand, RunCommand, ValidateCommand,
};
use checkrun::cli::output::*;
use checkrun::cli::{Cli, Command};
use checkrun::core::config::WorkflowConfig;
use checkrun::core::{Event, Workflow};
use checkrun::execution::{DispatchOutcome, RunEngine, RunEvent};
use checkrun::persistence::{create_summary, RunStore};
#[cfg(not(feature = "sqlite"))]
use checkrun::persistence::InMemoryRunStore;
#[cfg(feature = "sqlite")]
use checkrun::persistence::SqliteRunStore;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::from_args();

    // Initialize logging
    let log_level = if cli.verbose { Level::DEBUG } else { Level::WARN };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set logging subscriber")?;

    // Execute command
    match &cli.command {
        Command::Run(cmd) => run_workflow(cmd).await?,
        Command::Validate(cmd) => validate_workflow(cmd)?,
        Command::Init(cmd) => init_workflow(cmd)?,
        Command::List(cmd) => list_workflows(cmd).await?,
        Command::History(cmd) => show_history(cmd).await?,
    }

    Ok(())
}

async fn open_store() -> Result<Arc<dyn RunStore>> {
    #[cfg(feature = "sqlite")]
    {
        Ok(Arc::new(SqliteRunStore::with_default_path().await?))
    }
    #[cfg(not(feature = "sqlite"))]
    {
        Ok(Arc::new(InMemoryRunStore::new()))
    }
}

async fn save_history(cmd: &RunCommand, workflow: &Workflow, event: &Event) -> Result<()> {
    if cmd.no_history {
        return Ok(());
    }
    let store = open_store().await?;
    let summary = create_summary(workflow, event);
    store.save_run(&summary).await?;
    println!(
        "{} Run saved to history (ID: {})",
        INFO,
        style(&summary.run_id.to_string()[..8]).dim()
    );
    Ok(())
}

async fn run_workflow(cmd: &RunCommand) -> Result<()> {
    let config = WorkflowConfig::from_file(&cmd.file)
        .with_context(|| format!("Failed to load workflow {}", cmd.file))?;
    let mut workflow = config.to_workflow();

    for (key, value) in &cmd.env {
        workflow.env.insert(key.clone(), value.clone());
    }

    let event = cmd.to_event()?;

    println!(
        "{} Loaded workflow: {}",
        INFO,
        style(&workflow.name).bold()
    );

    let mut engine = RunEngine::new();
    if cmd.keep_workspace {
        engine = engine.keep_workspaces();
    }

    // Console output via the engine's event stream
    let bar = create_progress_bar(workflow.steps.len());
    let bar_handle = bar.clone();
    engine.add_event_handler(move |event| {
        bar_handle.println(format_run_event(&event));
        if matches!(
            event,
            RunEvent::StepCompleted { .. }
                | RunEvent::StepFailed { .. }
                | RunEvent::StepSkipped { .. }
        ) {
            bar_handle.inc(1);
        }
    });

    println!();
    let source = PathBuf::from(&cmd.source);
    let result = engine.dispatch(&mut workflow, &event, &source).await;
    bar.finish_and_clear();

    let outcome = match result {
        Ok(outcome) => outcome,
        Err(e) => {
            // The run failed before its first step; still record it.
            save_history(cmd, &workflow, &event).await?;
            println!(
                "\n{} {} {}",
                CROSS,
                style(&workflow.name).bold(),
                style("failed").red()
            );
            error!("{}", e);
            std::process::exit(1);
        }
    };

    let kept_workspace = match outcome {
        DispatchOutcome::NotTriggered => {
            println!(
                "{} Event '{}' matches no trigger of '{}'; nothing to run",
                INFO,
                style(event.describe()).cyan(),
                style(&workflow.name).bold()
            );
            return Ok(());
        }
        DispatchOutcome::Ran { kept_workspace } => kept_workspace,
    };

    save_history(cmd, &workflow, &event).await?;

    if let Some(path) = kept_workspace {
        println!(
            "{} Workspace kept at {}",
            INFO,
            style(path.display()).dim()
        );
    }

    if cmd.show_output {
        for step in &workflow.steps {
            if let Some(output) = step.state.output() {
                if !output.is_empty() {
                    println!("\n{} {}:", INFO, style(&step.id).bold());
                    println!("{}", format_output(output, 50));
                }
            }
        }
    }

    if workflow.has_failed() {
        println!(
            "\n{} {} {}",
            CROSS,
            style(&workflow.name).bold(),
            style("failed").red()
        );
        std::process::exit(1);
    }

    println!(
        "\n{} {} completed {}",
        CHECK,
        style(&workflow.name).bold(),
        style("successfully").green()
    );

    Ok(())
}

fn validate_workflow(cmd: &ValidateCommand) -> Result<()> {
    println!("{} Validating workflow...", INFO);

    let result = WorkflowConfig::from_file(&cmd.file);

    match result {
        Ok(config) => {
            println!("{} Workflow configuration is valid!", CHECK);
            println!("  Name: {}", style(&config.name).bold());
            println!("  Steps: {}", style(config.job.steps.len()).cyan());
            let mut triggers = Vec::new();
            if config.on.push.is_some() {
                triggers.push("push");
            }
            if config.on.pull_request.is_some() {
                triggers.push("pull_request");
            }
            if config.on.dispatch.is_some() {
                triggers.push("dispatch");
            }
            println!("  Triggers: {}", style(triggers.join(", ")).cyan());

            if cmd.json {
                let json = serde_json::to_string_pretty(&config)?;
                println!("\n{}", json);
            }
            Ok(())
        }
        Err(e) => {
            println!("{} Validation failed:", CROSS);
            println!("  {}", style(e).red());
            std::process::exit(1);
        }
    }
}

/// Starter workflow: check out, provision Python 3.10, install pycodestyle
/// (plus requirements.txt when present), lint app.py with E501 suppressed.
const STARTER_WORKFLOW: &str = r#"name: lint

on:
  push:
    branches: [main]
  pull_request:
    branches: [main]
  dispatch: {}

job:
  steps:
    - id: checkout
      checkout: true

    - id: setup-python
      setup_python: "3.10"

    - id: install
      run: |
        pip install --upgrade pip
        pip install pycodestyle

    - id: install-deps
      if_exists: requirements.txt
      run: pip install -r requirements.txt

    - id: lint
      run: pycodestyle --ignore=E501 app.py
"#;

fn init_workflow(cmd: &InitCommand) -> Result<()> {
    let path = PathBuf::from(&cmd.path);
    if path.exists() && !cmd.force {
        anyhow::bail!("{} already exists (use --force to overwrite)", cmd.path);
    }

    std::fs::write(&path, STARTER_WORKFLOW)
        .with_context(|| format!("Failed to write {}", cmd.path))?;

    println!("{} Created {}", CHECK, style(&cmd.path).bold());
    println!();
    println!("Next steps:");
    println!("  1. Edit {} to fit your repository", style(&cmd.path).cyan());
    println!(
        "  2. Run {} to check it",
        style(format!("checkrun validate -f {}", cmd.path)).cyan()
    );
    println!(
        "  3. Run {} to execute it",
        style(format!("checkrun run -f {}", cmd.path)).cyan()
    );

    Ok(())
}

async fn list_workflows(cmd: &ListCommand) -> Result<()> {
    let store = open_store().await?;
    let workflows = store.list_workflows().await?;

    if workflows.is_empty() {
        println!("{} No workflows found in history", INFO);
        return Ok(());
    }

    println!("{} Workflows in history:", INFO);

    for workflow_name in &workflows {
        let runs = store.list_runs(workflow_name).await?;

        if cmd.with_counts {
            let succeeded = runs
                .iter()
                .filter(|r| r.status == checkrun::RunStatus::Succeeded)
                .count();
            let failed = runs
                .iter()
                .filter(|r| r.status == checkrun::RunStatus::Failed)
                .count();
            println!(
                "  {} ({} runs: {} succeeded, {} failed)",
                style(workflow_name).bold(),
                style(runs.len()).cyan(),
                style(succeeded).green(),
                style(failed).red()
            );
        } else {
            println!("  {}", style(workflow_name).bold());
        }
    }

    if cmd.json {
        let mut json_data = Vec::new();
        for workflow in &workflows {
            let runs = store.list_runs(workflow).await.ok();
            json_data.push(serde_json::json!({
                "name": workflow,
                "run_count": runs.as_ref().map(|r| r.len()).unwrap_or(0)
            }));
        }
        let data = serde_json::json!({ "workflows": json_data });
        println!("\n{}", serde_json::to_string_pretty(&data)?);
    }

    Ok(())
}

async fn show_history(cmd: &HistoryCommand) -> Result<()> {
    let store = open_store().await?;

    // If a specific run is requested
    if let Some(run_id_str) = &cmd.run_id {
        let run_id = uuid::Uuid::parse_str(run_id_str).context("Invalid run ID format")?;
        let summary = store.load_run(run_id).await?;

        match summary {
            Some(summary) => {
                print_run_details(&summary, cmd.verbose)?;
            }
            None => {
                println!("{} Run not found", WARN);
            }
        }
        return Ok(());
    }

    // List runs for one workflow or across all of them
    let runs = if let Some(workflow_name) = &cmd.workflow {
        store
            .list_runs(workflow_name)
            .await?
            .into_iter()
            .take(cmd.limit)
            .collect::<Vec<_>>()
    } else {
        let workflows = store.list_workflows().await?;
        let mut all_runs = Vec::new();
        for workflow in &workflows {
            all_runs.extend(store.list_runs(workflow).await?);
        }
        all_runs.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        all_runs.into_iter().take(cmd.limit).collect()
    };

    if runs.is_empty() {
        println!("{} No runs found", INFO);
        return Ok(());
    }

    println!("{} Run history (showing latest {}):", INFO, cmd.limit);

    if cmd.json {
        let data = serde_json::json!({ "runs": runs });
        println!("{}", serde_json::to_string_pretty(&data)?);
    } else {
        for summary in &runs {
            println!("  {}", format_run_summary(summary));
        }
    }

    Ok(())
}

fn print_run_details(summary: &checkrun::RunSummary, verbose: bool) -> Result<()> {
    println!("{} Run Details", INFO);
    println!("  ID: {}", style(summary.run_id).cyan());
    println!("  Workflow: {}", style(&summary.workflow_name).bold());
    println!("  Triggered by: {}", style(&summary.triggered_by).cyan());
    println!("  Status: {}", format_status(summary.status));
    println!("  Started: {}", style(summary.started_at.to_rfc3339()).dim());
    if let Some(completed) = summary.completed_at {
        println!("  Completed: {}", style(completed.to_rfc3339()).dim());
        if let Ok(duration) = completed.signed_duration_since(summary.started_at).to_std() {
            println!("  Duration: {}", style(format_duration(duration)).dim());
        }
    }
    println!(
        "  Steps: {} succeeded, {} failed, {} skipped ({} total)",
        style(summary.succeeded_steps).green(),
        style(summary.failed_steps).red(),
        style(summary.skipped_steps).dim(),
        summary.total_steps
    );

    if verbose {
        println!("\n  {}", style("Full details:").bold());
        let json = serde_json::to_string_pretty(summary)?;
        for line in json.lines() {
            println!("    {}", line);
        }
    }

    Ok(())
}

fn format_duration(duration: std::time::Duration) -> String {
    let secs = duration.as_secs();
    if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
