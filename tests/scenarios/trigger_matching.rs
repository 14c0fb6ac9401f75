//! Events either start exactly one run or none at all

use crate::helpers::*;
use checkrun::core::{Event, RunStatus, StepState};
use checkrun::execution::DispatchOutcome;

const MAIN_ONLY_WORKFLOW: &str = r#"
name: lint
on:
  push:
    branches: [main]
  pull_request:
    branches: [main]
  dispatch: {}
job:
  steps:
    - id: hello
      run: echo hello
"#;

#[tokio::test]
async fn push_to_main_triggers_a_run() {
    let source = fixture_source(&[]);
    let result = run_workflow_with_event(MAIN_ONLY_WORKFLOW, push_to("main"), source.path()).await;

    assert!(result.was_triggered());
    assert!(result.is_success());
    result.assert_step_succeeded("hello");
}

#[tokio::test]
async fn push_to_other_branch_triggers_nothing() {
    let source = fixture_source(&[]);
    let result =
        run_workflow_with_event(MAIN_ONLY_WORKFLOW, push_to("feature/login"), source.path()).await;

    assert!(!result.was_triggered());
    assert!(matches!(result.outcome, DispatchOutcome::NotTriggered));
    // Nothing ran: the workflow never left its initial state.
    assert_eq!(result.workflow.state.status, RunStatus::Pending);
    assert!(matches!(result.step_state("hello"), StepState::Pending));
}

#[tokio::test]
async fn pull_request_matches_on_base_branch() {
    let source = fixture_source(&[]);
    let result =
        run_workflow_with_event(MAIN_ONLY_WORKFLOW, pull_request_into("main"), source.path())
            .await;
    assert!(result.was_triggered());

    let source = fixture_source(&[]);
    let result = run_workflow_with_event(
        MAIN_ONLY_WORKFLOW,
        pull_request_into("develop"),
        source.path(),
    )
    .await;
    assert!(!result.was_triggered());
}

#[tokio::test]
async fn manual_dispatch_needs_no_parameters() {
    let source = fixture_source(&[]);
    let result = run_workflow_with_event(MAIN_ONLY_WORKFLOW, Event::Dispatch, source.path()).await;

    assert!(result.was_triggered());
    assert!(result.is_success());
}

#[tokio::test]
async fn dispatch_without_declaration_triggers_nothing() {
    let yaml = r#"
name: push-only
on:
  push:
    branches: [main]
job:
  steps:
    - id: hello
      run: echo hello
"#;
    let source = fixture_source(&[]);
    let result = run_workflow_with_event(yaml, Event::Dispatch, source.path()).await;
    assert!(!result.was_triggered());
}

#[tokio::test]
async fn wildcard_branch_filters_match() {
    let yaml = r#"
name: releases
on:
  push:
    branches: ["releases/*"]
job:
  steps:
    - id: hello
      run: echo hello
"#;
    let source = fixture_source(&[]);
    let result = run_workflow_with_event(yaml, push_to("releases/1.2"), source.path()).await;
    assert!(result.was_triggered());

    let source = fixture_source(&[]);
    let result = run_workflow_with_event(yaml, push_to("main"), source.path()).await;
    assert!(!result.was_triggered());
}

#[tokio::test]
async fn empty_branch_filter_matches_every_branch() {
    let yaml = r#"
name: any-push
on:
  push: {}
job:
  steps:
    - id: hello
      run: echo hello
"#;
    let source = fixture_source(&[]);
    let result = run_workflow_with_event(yaml, push_to("anything/at-all"), source.path()).await;
    assert!(result.was_triggered());
    assert!(result.is_success());
}
