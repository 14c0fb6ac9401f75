//! if_exists gates a step on a file in the checkout

use crate::helpers::*;
use checkrun::core::{Event, StepState};

const DEPS_WORKFLOW: &str = r#"
name: deps
on:
  dispatch: {}
job:
  steps:
    - id: checkout
      checkout: true
    - id: install-deps
      if_exists: requirements.txt
      run: cat requirements.txt
    - id: done
      run: echo done
"#;

#[tokio::test]
async fn step_is_skipped_when_the_file_is_absent() {
    let source = fixture_source(&[("app.py", "x = 1\n")]);
    let result = run_workflow_with_event(DEPS_WORKFLOW, Event::Dispatch, source.path()).await;

    // Skipping is not an error: the run still succeeds.
    assert!(result.is_success());
    result.assert_step_skipped("install-deps");
    result.assert_step_succeeded("done");
    assert_eq!(result.workflow.state.skipped_steps, 1);

    match result.step_state("install-deps") {
        StepState::Skipped { reason } => assert!(reason.contains("requirements.txt")),
        other => panic!("expected skipped state, got {:?}", other),
    }
}

#[tokio::test]
async fn step_runs_when_the_file_is_present() {
    let source = fixture_source(&[
        ("app.py", "x = 1\n"),
        ("requirements.txt", "pycodestyle\n"),
    ]);
    let result = run_workflow_with_event(DEPS_WORKFLOW, Event::Dispatch, source.path()).await;

    assert!(result.is_success());
    result.assert_step_succeeded("install-deps");
    assert_eq!(result.step_output("install-deps"), Some("pycodestyle\n"));
    assert_eq!(result.workflow.state.skipped_steps, 0);
}

#[tokio::test]
async fn condition_sees_files_in_subdirectories() {
    let yaml = r#"
name: nested
on:
  dispatch: {}
job:
  steps:
    - id: checkout
      checkout: true
    - id: guarded
      if_exists: config/settings.toml
      run: echo found
"#;
    let source = fixture_source(&[("config/settings.toml", "[app]\n")]);
    let result = run_workflow_with_event(yaml, Event::Dispatch, source.path()).await;

    assert!(result.is_success());
    result.assert_step_succeeded("guarded");
}

#[tokio::test]
async fn skipped_step_does_not_abort_later_steps() {
    let yaml = r#"
name: skip-chain
on:
  dispatch: {}
job:
  steps:
    - id: checkout
      checkout: true
    - id: optional
      if_exists: missing.txt
      run: exit 1
    - id: after
      run: echo after
"#;
    let source = fixture_source(&[]);
    let result = run_workflow_with_event(yaml, Event::Dispatch, source.path()).await;

    assert!(result.is_success());
    result.assert_step_skipped("optional");
    result.assert_step_succeeded("after");
}
