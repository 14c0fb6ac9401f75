//! Steps run strictly in order and see each other's effects

use crate::helpers::*;
use checkrun::core::Event;

#[tokio::test]
async fn all_steps_run_in_declaration_order() {
    let yaml = r#"
name: chain
on:
  dispatch: {}
job:
  steps:
    - id: first
      run: echo first >> order.log
    - id: second
      run: echo second >> order.log
    - id: third
      run: cat order.log
"#;
    let source = fixture_source(&[]);
    let result = run_workflow_with_event(yaml, Event::Dispatch, source.path()).await;

    assert!(result.is_success());
    result.assert_step_succeeded("first");
    result.assert_step_succeeded("second");
    // The log file accumulated in order inside the shared workspace.
    assert_eq!(result.step_output("third"), Some("first\nsecond\n"));
    assert_eq!(result.workflow.state.succeeded_steps, 3);
    assert_eq!(result.workflow.state.failed_steps, 0);
}

#[tokio::test]
async fn checkout_makes_the_source_tree_available() {
    let yaml = r#"
name: checkout-chain
on:
  dispatch: {}
job:
  steps:
    - id: checkout
      checkout: true
    - id: read
      run: cat app.py
"#;
    let source = fixture_source(&[("app.py", "x = 1\n")]);
    let result = run_workflow_with_event(yaml, Event::Dispatch, source.path()).await;

    assert!(result.is_success());
    assert_eq!(result.step_output("read"), Some("x = 1\n"));
}

#[tokio::test]
async fn event_variables_are_visible_to_steps() {
    let yaml = r#"
name: env-chain
on:
  push:
    branches: [main]
job:
  steps:
    - id: show
      run: echo "$CHECKRUN_EVENT on $CHECKRUN_REF at $CHECKRUN_SHA"
"#;
    let source = fixture_source(&[]);
    let event = Event::Push {
        branch: "main".to_string(),
        commit: Some("abc1234".to_string()),
    };
    let result = run_workflow_with_event(yaml, event, source.path()).await;

    assert!(result.is_success());
    assert_eq!(result.step_output("show"), Some("push on main at abc1234\n"));
}

#[tokio::test]
async fn workflow_env_applies_and_step_env_overrides() {
    let yaml = r#"
name: env-layering
on:
  dispatch: {}
env:
  GREETING: workflow
job:
  steps:
    - id: from-workflow
      run: echo "$GREETING"
    - id: from-step
      run: echo "$GREETING"
      env:
        GREETING: step
"#;
    let source = fixture_source(&[]);
    let result = run_workflow_with_event(yaml, Event::Dispatch, source.path()).await;

    assert!(result.is_success());
    assert_eq!(result.step_output("from-workflow"), Some("workflow\n"));
    assert_eq!(result.step_output("from-step"), Some("step\n"));
}

#[tokio::test]
async fn run_state_reaches_terminal_success() {
    let yaml = r#"
name: terminal
on:
  dispatch: {}
job:
  steps:
    - id: only
      run: "true"
"#;
    let source = fixture_source(&[]);
    let result = run_workflow_with_event(yaml, Event::Dispatch, source.path()).await;

    assert!(result.is_success());
    assert!(result.workflow.state.status.is_terminal());
    assert!(result.workflow.is_complete());
    assert!(result.workflow.state.started_at.is_some());
    assert!(result.workflow.state.completed_at.is_some());
    assert_eq!(result.workflow.state.progress(), 1.0);
}
