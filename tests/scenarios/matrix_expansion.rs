//! Test: matrix expansion drives instance creation

use crate::helpers::*;
use gantry::core::config::{DefinitionError, WorkflowConfig};

#[tokio::test]
async fn test_each_binding_runs_the_full_step_list() {
    let yaml = r#"
name: matrix
on: push

jobs:
  build-and-test:
    runs-on: ubuntu-latest
    strategy:
      matrix:
        python-version: ["3.7", "3.8", "3.9"]
    steps:
      - uses: checkout
      - uses: setup-python
        with:
          python-version: ${{ matrix.python-version }}
      - name: Test
        run: pytest
"#;
    let executor = MockExecutor::succeeding();

    let report = run_workflow(yaml, executor.clone(), "push").await;

    assert_run_succeeded(&report);
    assert_eq!(report.instances.len(), 3);

    // Each instance got its own resolved setup command.
    for version in ["3.7", "3.8", "3.9"] {
        assert_eq!(
            executor.invoked_matching(&format!("setup-python --version {}", version)),
            1
        );
    }
    assert_eq!(executor.invoked_matching("pytest"), 3);
}

#[tokio::test]
async fn test_two_axes_expand_to_the_product() {
    let yaml = r#"
name: grid
on: push

jobs:
  test:
    runs-on: ubuntu-latest
    strategy:
      matrix:
        python-version: ["3.8", "3.9"]
        profile: ["debug", "release"]
    steps:
      - run: pytest --python ${{ matrix.python-version }} --profile ${{ matrix.profile }}
"#;
    let executor = MockExecutor::succeeding();

    let report = run_workflow(yaml, executor, "push").await;

    assert_eq!(report.instances.len(), 4);
    assert!(report
        .instance("test", "python-version=3.8, profile=release")
        .is_some());
}

#[tokio::test]
async fn test_single_value_axis_yields_one_instance() {
    let yaml = r#"
name: single
on: push

jobs:
  test:
    runs-on: ubuntu-latest
    strategy:
      matrix:
        python-version: ["3.9"]
    steps:
      - run: pytest
"#;
    let report = run_workflow(yaml, MockExecutor::succeeding(), "push").await;

    assert_eq!(report.instances.len(), 1);
    assert_eq!(report.instances[0].instance, "python-version=3.9");
}

#[test]
fn test_empty_axis_is_rejected_before_any_job_starts() {
    let yaml = r#"
name: vacuous
on: push

jobs:
  test:
    runs-on: ubuntu-latest
    strategy:
      matrix:
        python-version: []
    steps:
      - run: pytest
"#;
    let result = WorkflowConfig::from_yaml(yaml);
    assert!(matches!(
        result,
        Err(DefinitionError::EmptyMatrixAxis { ref axis, .. }) if axis == "python-version"
    ));
}
