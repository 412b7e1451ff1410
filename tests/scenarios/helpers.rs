//! Test utility functions for gantry scenarios

use async_trait::async_trait;
use gantry::core::config::WorkflowConfig;
use gantry::core::state::{InstanceResult, RunReport, StepFailure};
use gantry::core::workflow::EventDescriptor;
use gantry::execution::invoker::{CommandExecutor, CommandOutput, InvokeError};
use gantry::execution::WorkflowEngine;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Scripted outcome for commands containing a substring
#[derive(Debug, Clone)]
pub struct ScriptedOutcome {
    pub needle: String,
    pub exit_code: i32,
    pub stdout: String,
}

impl ScriptedOutcome {
    pub fn fails(needle: &str, exit_code: i32) -> Self {
        Self {
            needle: needle.to_string(),
            exit_code,
            stdout: String::new(),
        }
    }

    pub fn prints(needle: &str, stdout: &str) -> Self {
        Self {
            needle: needle.to_string(),
            exit_code: 0,
            stdout: stdout.to_string(),
        }
    }
}

/// Mock executor that matches commands by substring and records every
/// invocation. Commands with no scripted outcome succeed silently.
#[derive(Clone, Default)]
pub struct MockExecutor {
    outcomes: Arc<Vec<ScriptedOutcome>>,
    invocations: Arc<Mutex<Vec<String>>>,
}

impl MockExecutor {
    pub fn new(outcomes: Vec<ScriptedOutcome>) -> Self {
        Self {
            outcomes: Arc::new(outcomes),
            invocations: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Executor where every command succeeds with empty output
    pub fn succeeding() -> Self {
        Self::new(Vec::new())
    }

    /// Every command line this executor was asked to run
    pub fn invocations(&self) -> Vec<String> {
        self.invocations.lock().unwrap().clone()
    }

    pub fn invoked_matching(&self, needle: &str) -> usize {
        self.invocations()
            .iter()
            .filter(|command| command.contains(needle))
            .count()
    }
}

#[async_trait]
impl CommandExecutor for MockExecutor {
    async fn execute(
        &self,
        command: &str,
        _env: &HashMap<String, String>,
    ) -> Result<CommandOutput, InvokeError> {
        self.invocations.lock().unwrap().push(command.to_string());

        for outcome in self.outcomes.iter() {
            if command.contains(&outcome.needle) {
                return Ok(CommandOutput {
                    exit_code: outcome.exit_code,
                    stdout: outcome.stdout.clone(),
                    stderr: String::new(),
                });
            }
        }

        Ok(CommandOutput {
            exit_code: 0,
            stdout: String::new(),
            stderr: String::new(),
        })
    }
}

/// Parse, build, and run a workflow for the given event
pub async fn run_workflow(yaml: &str, executor: MockExecutor, event: &str) -> RunReport {
    let config = WorkflowConfig::from_yaml(yaml).expect("workflow should parse");
    let workflow = config.to_workflow().expect("workflow should build");

    let engine = WorkflowEngine::new(executor);
    engine
        .run(&workflow, &EventDescriptor::new(event))
        .await
        .expect("run should not hit a definition error")
}

/// Assert the run succeeded overall
pub fn assert_run_succeeded(report: &RunReport) {
    assert!(
        report.succeeded(),
        "run should have succeeded, got {:?} with failures: {:?}",
        report.status,
        report
            .failed_instances()
            .iter()
            .map(|i| format!("{} [{}]", i.job, i.instance))
            .collect::<Vec<_>>()
    );
}

/// Assert the run failed overall
pub fn assert_run_failed(report: &RunReport) {
    assert!(
        !report.succeeded(),
        "run should have failed, got {:?}",
        report.status
    );
}

/// Look up an instance, panicking with context when absent
pub fn instance<'a>(report: &'a RunReport, job: &str, label: &str) -> &'a InstanceResult {
    report.instance(job, label).unwrap_or_else(|| {
        panic!(
            "instance {} [{}] not found; have: {:?}",
            job,
            label,
            report
                .instances
                .iter()
                .map(|i| format!("{} [{}]", i.job, i.instance))
                .collect::<Vec<_>>()
        )
    })
}

/// Names of the steps that actually ran, in order
pub fn step_names(result: &InstanceResult) -> Vec<&str> {
    result.steps.iter().map(|s| s.step.as_str()).collect()
}

/// The classified failure of an instance's first failing step
pub fn first_failure(result: &InstanceResult) -> &StepFailure {
    result
        .first_failure()
        .and_then(|step| step.failure.as_ref())
        .unwrap_or_else(|| panic!("instance {} [{}] has no failure", result.job, result.instance))
}
