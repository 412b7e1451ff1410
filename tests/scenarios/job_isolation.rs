//! Test: failure isolation across jobs

use crate::helpers::*;
use gantry::core::state::RunStatus;

const LINT_AND_BUILD: &str = r#"
name: build_test
on: [push, pull_request]

env:
  SRC_DIR: discopy

jobs:
  lint:
    runs-on: ubuntu-latest
    steps:
      - uses: checkout
      - name: Check style
        run: pycodestyle ${{ env.SRC_DIR }}

  build-and-test:
    runs-on: ubuntu-latest
    strategy:
      matrix:
        python-version: ["3.8", "3.9"]
    steps:
      - uses: checkout
      - name: Install
        run: pip install .
      - name: Test with pytest
        run: coverage run -m pytest --doctest-modules
"#;

/// The lint job failing while build-and-test succeeds yields overall
/// Failed, with build-and-test's results still individually retrievable.
#[tokio::test]
async fn test_one_jobs_failure_does_not_mask_the_other() {
    let executor = MockExecutor::new(vec![ScriptedOutcome::fails("pycodestyle", 1)]);

    let report = run_workflow(LINT_AND_BUILD, executor.clone(), "push").await;

    assert_run_failed(&report);

    let lint = instance(&report, "lint", "lint");
    assert_eq!(lint.status, RunStatus::Failed);

    // Both matrix instances of the sibling job ran to completion.
    for version in ["3.8", "3.9"] {
        let label = format!("python-version={}", version);
        let build = instance(&report, "build-and-test", &label);
        assert_eq!(build.status, RunStatus::Succeeded);
        assert_eq!(build.steps.len(), 3);
    }

    // Every failing instance is reported independently.
    assert_eq!(report.failed_instances().len(), 1);
    assert_eq!(executor.invoked_matching("pytest"), 2);
}

/// One matrix instance failing does not stop its siblings.
#[tokio::test]
async fn test_sibling_instances_are_isolated() {
    let yaml = r#"
name: matrix_isolation
on: push

jobs:
  build-and-test:
    runs-on: ubuntu-latest
    strategy:
      matrix:
        python-version: ["3.7", "3.8", "3.9"]
    steps:
      - name: Test
        run: pytest --python ${{ matrix.python-version }}
"#;
    let executor = MockExecutor::new(vec![ScriptedOutcome::fails("--python 3.7", 2)]);

    let report = run_workflow(yaml, executor.clone(), "push").await;

    assert_run_failed(&report);
    assert_eq!(report.instances.len(), 3);
    assert_eq!(report.failed_instances().len(), 1);

    assert_eq!(
        instance(&report, "build-and-test", "python-version=3.7").status,
        RunStatus::Failed
    );
    assert_eq!(
        instance(&report, "build-and-test", "python-version=3.8").status,
        RunStatus::Succeeded
    );
    assert_eq!(
        instance(&report, "build-and-test", "python-version=3.9").status,
        RunStatus::Succeeded
    );

    // All three instances were attempted despite the failure.
    assert_eq!(executor.invoked_matching("--python"), 3);
}

#[tokio::test]
async fn test_both_jobs_succeeding_yields_overall_success() {
    let executor = MockExecutor::succeeding();

    let report = run_workflow(LINT_AND_BUILD, executor, "pull_request").await;

    assert_run_succeeded(&report);
    assert_eq!(report.instances.len(), 3);
    assert_eq!(report.exit_code(), 0);
}
