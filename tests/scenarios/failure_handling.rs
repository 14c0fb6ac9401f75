//! The first fatal failure aborts the run; later steps never execute

use crate::helpers::*;
use checkrun::core::{Event, StepState};

#[tokio::test]
async fn failing_step_fails_the_run_and_skips_the_rest() {
    let yaml = r#"
name: abort
on:
  dispatch: {}
job:
  steps:
    - id: ok
      run: echo ok
    - id: boom
      run: exit 7
    - id: never
      run: touch should-not-exist
"#;
    let source = fixture_source(&[]);
    let result = run_workflow_with_event(yaml, Event::Dispatch, source.path()).await;

    assert!(result.is_failed());
    result.assert_step_succeeded("ok");
    result.assert_step_failed("boom");
    result.assert_step_skipped("never");

    match result.step_state("boom") {
        StepState::Failed {
            error, exit_code, ..
        } => {
            assert_eq!(*exit_code, Some(7));
            assert!(error.contains("code 7"));
        }
        other => panic!("expected failed state, got {:?}", other),
    }
    match result.step_state("never") {
        StepState::Skipped { reason } => assert!(reason.contains("boom")),
        other => panic!("expected skipped state, got {:?}", other),
    }
}

#[tokio::test]
async fn failure_output_is_recorded() {
    let yaml = r#"
name: lint-failure
on:
  dispatch: {}
job:
  steps:
    - id: lint
      run: |
        echo "app.py:5:1: E302 expected 2 blank lines, got 1"
        exit 1
"#;
    let source = fixture_source(&[]);
    let result = run_workflow_with_event(yaml, Event::Dispatch, source.path()).await;

    assert!(result.is_failed());
    let output = result.step_output("lint").expect("failure keeps output");
    assert!(output.contains("E302"));
}

#[tokio::test]
async fn continue_on_error_records_the_failure_without_aborting() {
    let yaml = r#"
name: soft-failure
on:
  dispatch: {}
job:
  steps:
    - id: soft
      run: exit 1
      continue_on_error: true
    - id: after
      run: echo still running
"#;
    let source = fixture_source(&[]);
    let result = run_workflow_with_event(yaml, Event::Dispatch, source.path()).await;

    assert!(result.is_success());
    result.assert_step_failed("soft");
    result.assert_step_succeeded("after");
    assert_eq!(result.workflow.state.failed_steps, 1);
}

#[tokio::test]
async fn missing_interpreter_fails_before_later_steps() {
    let yaml = r#"
name: bad-python
on:
  dispatch: {}
job:
  steps:
    - id: setup-python
      setup_python: "99.99"
    - id: lint
      run: pycodestyle --ignore=E501 app.py
"#;
    let source = fixture_source(&[("app.py", "x = 1\n")]);
    let result = run_workflow_with_event(yaml, Event::Dispatch, source.path()).await;

    assert!(result.is_failed());
    result.assert_step_failed("setup-python");
    // The lint step never executed.
    result.assert_step_skipped("lint");
}

#[tokio::test]
async fn missing_checkout_source_fails_the_run() {
    let yaml = r#"
name: bad-source
on:
  dispatch: {}
job:
  steps:
    - id: checkout
      checkout: true
"#;
    let source = fixture_source(&[]);
    let missing = source.path().join("does-not-exist");
    let result = run_workflow_with_event(yaml, Event::Dispatch, &missing).await;

    assert!(result.is_failed());
    result.assert_step_failed("checkout");
}

#[tokio::test]
async fn step_timeout_fails_the_step() {
    let yaml = r#"
name: timeout
on:
  dispatch: {}
job:
  steps:
    - id: slow
      run: sleep 30
      timeout_secs: 1
"#;
    let source = fixture_source(&[]);
    let result = run_workflow_with_event(yaml, Event::Dispatch, source.path()).await;

    assert!(result.is_failed());
    match result.step_state("slow") {
        StepState::Failed { error, .. } => assert!(error.contains("timed out")),
        other => panic!("expected failed state, got {:?}", other),
    }
}
