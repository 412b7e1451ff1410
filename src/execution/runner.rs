//! Instance runner - ordered step execution with fail-fast

use crate::core::action::ActionKind;
use crate::core::gate::{self, GateConfig, GateError};
use crate::core::state::{InstanceResult, RunStatus, StepFailure, StepResult};
use crate::execution::invoker::{CommandExecutor, InvokeError};
use chrono::Utc;
use std::collections::HashMap;
use tracing::{debug, error, info, warn};

/// One fully resolved, runnable job instance
#[derive(Debug, Clone)]
pub struct PreparedInstance {
    pub job: String,

    /// Matrix binding label, or the job name for matrix-less jobs
    pub instance: String,

    /// Environment exported to every invoked command
    pub env: HashMap<String, String>,

    pub steps: Vec<PreparedStep>,
}

/// One step with its command resolved against the instance context
#[derive(Debug, Clone)]
pub struct PreparedStep {
    pub name: String,
    pub invocation: PreparedInvocation,
    pub gate: Option<GateConfig>,
}

#[derive(Debug, Clone)]
pub enum PreparedInvocation {
    Command(String),
    Action(ActionKind),
}

impl PreparedStep {
    fn is_setup(&self) -> bool {
        matches!(self.invocation, PreparedInvocation::Action(_))
    }
}

/// Executes one prepared instance, step by step
pub struct InstanceRunner<'a, E> {
    executor: &'a E,
}

impl<'a, E: CommandExecutor> InstanceRunner<'a, E> {
    pub fn new(executor: &'a E) -> Self {
        Self { executor }
    }

    /// Run every step in order. The first failure ends the instance; later
    /// steps are neither run nor recorded. Sibling instances are unaffected.
    pub async fn run(&self, instance: &PreparedInstance) -> InstanceResult {
        info!("Running instance {} / {}", instance.job, instance.instance);
        let started_at = Utc::now();

        let mut env = instance.env.clone();
        let mut steps = Vec::with_capacity(instance.steps.len());
        let mut failed = false;

        for step in &instance.steps {
            let result = self.run_step(step, &mut env).await;
            let passed = result.passed();
            steps.push(result);

            if !passed {
                failed = true;
                break;
            }
        }

        InstanceResult {
            job: instance.job.clone(),
            instance: instance.instance.clone(),
            steps,
            status: if failed {
                RunStatus::Failed
            } else {
                RunStatus::Succeeded
            },
            started_at,
            finished_at: Utc::now(),
        }
    }

    async fn run_step(
        &self,
        step: &PreparedStep,
        env: &mut HashMap<String, String>,
    ) -> StepResult {
        let started_at = Utc::now();
        let is_setup = step.is_setup();

        let command = match &step.invocation {
            PreparedInvocation::Command(command) => command.clone(),
            PreparedInvocation::Action(action) => action.apply(env),
        };
        debug!("Executing step '{}': {}", step.name, command);

        let (exit_code, output, failure) = match self.executor.execute(&command, env).await {
            Ok(captured) => {
                let output = captured.combined();

                if !captured.success() {
                    let failure = if is_setup {
                        error!(
                            "Setup step '{}' failed with code {}; instance signal is untrustworthy",
                            step.name, captured.exit_code
                        );
                        StepFailure::Infrastructure {
                            reason: format!("setup command exited with code {}", captured.exit_code),
                            exit_code: captured.exit_code,
                        }
                    } else {
                        warn!("Step '{}' failed with code {}", step.name, captured.exit_code);
                        StepFailure::Command {
                            exit_code: captured.exit_code,
                        }
                    };
                    (captured.exit_code, output, Some(failure))
                } else if let Some(config) = &step.gate {
                    match gate::evaluate(config, &output) {
                        Ok(metric) => {
                            debug!(
                                "Gate on '{}' passed: {} >= {}",
                                step.name, metric, config.minimum
                            );
                            (captured.exit_code, output, None)
                        }
                        Err(GateError::BelowThreshold { metric, minimum }) => {
                            warn!("Gate on '{}' failed: {} < {}", step.name, metric, minimum);
                            let failure = StepFailure::GateBelowThreshold { metric, minimum };
                            (failure.exit_code(), output, Some(failure))
                        }
                        Err(GateError::InstrumentationBroken { pattern }) => {
                            error!(
                                "Gate on '{}' found no parsable metric; the measurement itself failed",
                                step.name
                            );
                            let failure = StepFailure::InstrumentationBroken {
                                reason: format!("no metric matching '{}' in step output", pattern),
                            };
                            (failure.exit_code(), output, Some(failure))
                        }
                    }
                } else {
                    (captured.exit_code, output, None)
                }
            }
            Err(err) => {
                error!("Invoker failed for step '{}': {}", step.name, err);
                let exit_code = invoke_exit_code(&err);
                let failure = StepFailure::Infrastructure {
                    reason: err.to_string(),
                    exit_code,
                };
                (exit_code, String::new(), Some(failure))
            }
        };

        StepResult {
            step: step.name.clone(),
            command,
            exit_code,
            output,
            failure,
            started_at,
            finished_at: Utc::now(),
        }
    }
}

fn invoke_exit_code(err: &InvokeError) -> i32 {
    match err {
        InvokeError::Spawn(_) => 127,
        InvokeError::Timeout(_) => 124,
        InvokeError::Decode(_) => -1,
    }
}
