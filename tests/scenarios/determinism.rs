//! Test: identical definitions and tool outcomes yield identical results

use crate::helpers::*;
use gantry::core::state::RunReport;

const WORKFLOW: &str = r#"
name: build_test
on: push

env:
  SRC_DIR: discopy

jobs:
  lint:
    runs-on: ubuntu-latest
    steps:
      - name: Style
        run: pycodestyle ${{ env.SRC_DIR }}

  build-and-test:
    runs-on: ubuntu-latest
    strategy:
      matrix:
        python-version: ["3.7", "3.8", "3.9"]
    steps:
      - name: Test
        run: pytest --python ${{ matrix.python-version }}
      - name: Coverage
        run: coverage report
        gate:
          minimum: 99
"#;

fn outcomes() -> Vec<ScriptedOutcome> {
    vec![
        ScriptedOutcome::fails("--python 3.8", 2),
        ScriptedOutcome::prints("coverage report", "TOTAL 99.5%"),
    ]
}

/// The comparable shape of a report: everything except the run id and
/// wall-clock timestamps.
fn shape(report: &RunReport) -> Vec<(String, String, Vec<(String, i32, bool)>)> {
    report
        .instances
        .iter()
        .map(|instance| {
            (
                instance.job.clone(),
                instance.instance.clone(),
                instance
                    .steps
                    .iter()
                    .map(|step| (step.step.clone(), step.exit_code, step.passed()))
                    .collect(),
            )
        })
        .collect()
}

#[tokio::test]
async fn test_two_identical_runs_produce_identical_reports() {
    let first = run_workflow(WORKFLOW, MockExecutor::new(outcomes()), "push").await;
    let second = run_workflow(WORKFLOW, MockExecutor::new(outcomes()), "push").await;

    assert_eq!(first.status, second.status);
    assert_eq!(first.warnings, second.warnings);
    assert_eq!(shape(&first), shape(&second));

    // Instance order is the preparation order, not completion order.
    let jobs: Vec<&str> = first.instances.iter().map(|i| i.job.as_str()).collect();
    assert_eq!(
        jobs,
        vec!["build-and-test", "build-and-test", "build-and-test", "lint"]
    );
}
