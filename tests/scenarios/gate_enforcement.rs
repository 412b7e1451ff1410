//! Test: quality gate enforcement on coverage output

use crate::helpers::*;
use gantry::core::state::{Severity, StepFailure};

const GATED: &str = r#"
name: gated
on: push

jobs:
  build-and-test:
    runs-on: ubuntu-latest
    steps:
      - name: Test with pytest
        run: coverage run -m pytest --doctest-modules
      - name: Coverage report
        run: coverage report --show-missing
        gate:
          minimum: 99
      - name: Test notebooks
        run: pytest --nbmake docs/notebooks/*.ipynb
"#;

#[tokio::test]
async fn test_metric_above_minimum_passes_the_gate() {
    let executor = MockExecutor::new(vec![ScriptedOutcome::prints(
        "coverage report",
        "Name        Stmts  Miss  Cover\nTOTAL        1200     6  99.5%",
    )]);

    let report = run_workflow(GATED, executor.clone(), "push").await;

    assert_run_succeeded(&report);
    // The notebook step after the gate still ran.
    assert_eq!(executor.invoked_matching("--nbmake"), 1);
}

#[tokio::test]
async fn test_metric_below_minimum_fails_with_threshold_reason() {
    let executor = MockExecutor::new(vec![ScriptedOutcome::prints(
        "coverage report",
        "TOTAL 1200 13 98.9%",
    )]);

    let report = run_workflow(GATED, executor.clone(), "push").await;

    assert_run_failed(&report);
    let build = instance(&report, "build-and-test", "build-and-test");

    let failure = first_failure(build);
    assert!(matches!(
        failure,
        StepFailure::GateBelowThreshold { metric, minimum }
            if *metric == 98.9 && *minimum == 99.0
    ));
    assert_eq!(failure.severity(), Severity::Error);
    assert_eq!(build.exit_code(), 1);

    // Fail-fast: the notebook step never ran.
    assert_eq!(executor.invoked_matching("--nbmake"), 0);
}

/// Output with no parsable metric is a distinct, higher-severity failure:
/// the measurement itself is broken, not the quality.
#[tokio::test]
async fn test_unparsable_metric_is_instrumentation_broken() {
    let executor = MockExecutor::new(vec![ScriptedOutcome::prints(
        "coverage report",
        "wrote coverage data, no table emitted",
    )]);

    let report = run_workflow(GATED, executor, "push").await;

    assert_run_failed(&report);
    let build = instance(&report, "build-and-test", "build-and-test");

    let failure = first_failure(build);
    assert!(matches!(failure, StepFailure::InstrumentationBroken { .. }));
    assert_eq!(failure.severity(), Severity::Critical);
    assert_eq!(build.exit_code(), 2);
}

/// A gated step that itself exits nonzero is a plain step failure; the gate
/// is never consulted.
#[tokio::test]
async fn test_failing_gated_step_reports_command_failure() {
    let executor = MockExecutor::new(vec![ScriptedOutcome::fails("coverage report", 3)]);

    let report = run_workflow(GATED, executor, "push").await;

    let build = instance(&report, "build-and-test", "build-and-test");
    assert!(matches!(
        first_failure(build),
        StepFailure::Command { exit_code: 3 }
    ));
}
