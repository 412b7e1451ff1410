//! Workflow engine - orchestrates a full run

use crate::core::config::DefinitionError;
use crate::core::context::VariableContext;
use crate::core::state::{InstanceResult, RunReport, RunStatus};
use crate::core::workflow::{EventDescriptor, Invocation, Job, Workflow};
use crate::execution::invoker::CommandExecutor;
use crate::execution::runner::{
    InstanceRunner, PreparedInstance, PreparedInvocation, PreparedStep,
};
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

/// Events emitted while a run progresses
#[derive(Debug, Clone)]
pub enum RunEvent {
    RunStarted {
        run_id: Uuid,
        workflow: String,
        event: String,
    },
    /// The incoming event matched no declared trigger
    RunSkipped {
        workflow: String,
        event: String,
    },
    JobExpanded {
        job: String,
        instances: usize,
    },
    InstanceStarted {
        job: String,
        instance: String,
    },
    InstanceCompleted {
        job: String,
        instance: String,
        status: RunStatus,
    },
    StepFailed {
        job: String,
        instance: String,
        step: String,
        error: String,
    },
    RunCompleted {
        run_id: Uuid,
        status: RunStatus,
    },
}

/// Type for event handlers
pub type EventHandler = Arc<dyn Fn(RunEvent) + Send + Sync>;

/// Drives a workflow run end to end
pub struct WorkflowEngine<E> {
    executor: Arc<E>,
    event_handlers: Vec<EventHandler>,
}

impl<E: CommandExecutor + Send + Sync + 'static> WorkflowEngine<E> {
    pub fn new(executor: E) -> Self {
        Self {
            executor: Arc::new(executor),
            event_handlers: Vec::new(),
        }
    }

    /// Register an event handler
    pub fn add_event_handler<F>(&mut self, handler: F)
    where
        F: Fn(RunEvent) + Send + Sync + 'static,
    {
        self.event_handlers.push(Arc::new(handler));
    }

    fn emit(&self, event: RunEvent) {
        for handler in &self.event_handlers {
            handler(event.clone());
        }
    }

    /// Run the workflow against one incoming event.
    ///
    /// Preparation (trigger predicate, matrix expansion, full variable
    /// resolution) completes before any step executes, so definition
    /// problems surface while no job has started. Each prepared instance
    /// then runs as an independent task; results flow to a single collector
    /// and one instance's failure never cancels or masks a sibling's.
    pub async fn run(
        &self,
        workflow: &Workflow,
        event: &EventDescriptor,
    ) -> Result<RunReport, DefinitionError> {
        if !workflow.triggers_on(event) {
            info!(
                "Event '{}' matches no trigger in {:?}; run stays pending",
                event.event, workflow.triggers
            );
            self.emit(RunEvent::RunSkipped {
                workflow: workflow.name.clone(),
                event: event.event.clone(),
            });
            return Ok(RunReport::not_triggered(&workflow.name, &event.event));
        }

        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        info!(
            "Starting run {} of workflow '{}' for event '{}'",
            run_id, workflow.name, event.event
        );
        self.emit(RunEvent::RunStarted {
            run_id,
            workflow: workflow.name.clone(),
            event: event.event.clone(),
        });

        let mut warnings = Vec::new();
        let prepared = self.prepare(workflow, &mut warnings)?;

        let (tx, mut rx) = mpsc::unbounded_channel();
        let total = prepared.len();
        for (index, prepared_instance) in prepared.into_iter().enumerate() {
            self.emit(RunEvent::InstanceStarted {
                job: prepared_instance.job.clone(),
                instance: prepared_instance.instance.clone(),
            });

            let executor = Arc::clone(&self.executor);
            let tx = tx.clone();
            tokio::spawn(async move {
                let runner = InstanceRunner::new(executor.as_ref());
                let result = runner.run(&prepared_instance).await;
                // A closed receiver means the run was torn down externally.
                let _ = tx.send((index, result));
            });
        }
        drop(tx);

        let mut collected: Vec<(usize, InstanceResult)> = Vec::with_capacity(total);
        while let Some((index, result)) = rx.recv().await {
            if let Some(failed_step) = result.first_failure() {
                self.emit(RunEvent::StepFailed {
                    job: result.job.clone(),
                    instance: result.instance.clone(),
                    step: failed_step.step.clone(),
                    error: failed_step
                        .failure
                        .as_ref()
                        .map(|f| f.to_string())
                        .unwrap_or_default(),
                });
            }
            self.emit(RunEvent::InstanceCompleted {
                job: result.job.clone(),
                instance: result.instance.clone(),
                status: result.status,
            });
            collected.push((index, result));
        }

        // Restore preparation order so identical runs yield identical reports.
        collected.sort_by_key(|(index, _)| *index);
        let instances: Vec<InstanceResult> =
            collected.into_iter().map(|(_, result)| result).collect();

        let status = if instances.iter().all(InstanceResult::succeeded) {
            RunStatus::Succeeded
        } else {
            RunStatus::Failed
        };

        let report = RunReport {
            run_id,
            workflow: workflow.name.clone(),
            event: event.event.clone(),
            status,
            instances,
            warnings,
            started_at: Some(started_at),
            finished_at: Some(Utc::now()),
        };

        info!("Run {} finished: {:?}", run_id, report.status);
        self.emit(RunEvent::RunCompleted {
            run_id,
            status: report.status,
        });

        Ok(report)
    }

    /// Expand every job and resolve every step command up front
    fn prepare(
        &self,
        workflow: &Workflow,
        warnings: &mut Vec<String>,
    ) -> Result<Vec<PreparedInstance>, DefinitionError> {
        let mut prepared = Vec::new();

        for job in &workflow.jobs {
            let bindings = job.matrix.expand();
            self.emit(RunEvent::JobExpanded {
                job: job.name.clone(),
                instances: bindings.len(),
            });

            if bindings.is_empty() {
                warn!("Job '{}' expanded to zero instances", job.name);
                warnings.push(format!("job '{}' expanded to zero instances", job.name));
                continue;
            }

            for binding in &bindings {
                let context = VariableContext::new(workflow.defaults.clone(), &job.platform)
                    .with_matrix(binding);

                let mut steps = Vec::with_capacity(job.steps.len());
                for step in &job.steps {
                    let unresolved = |reference: crate::core::context::UnresolvedVariable| {
                        DefinitionError::UnresolvedVariable {
                            job: job.name.clone(),
                            step: step.name.clone(),
                            reference: reference.0,
                        }
                    };

                    let invocation = match &step.invocation {
                        Invocation::Command(template) => PreparedInvocation::Command(
                            context.substitute(template).map_err(unresolved)?,
                        ),
                        Invocation::Action(action) => PreparedInvocation::Action(
                            action.resolved(&context).map_err(unresolved)?,
                        ),
                    };

                    steps.push(PreparedStep {
                        name: step.name.clone(),
                        invocation,
                        gate: step.gate.clone(),
                    });
                }

                prepared.push(PreparedInstance {
                    job: job.name.clone(),
                    instance: instance_label(job, binding),
                    env: context.exported_env(),
                    steps,
                });
            }
        }

        Ok(prepared)
    }
}

fn instance_label(job: &Job, binding: &crate::core::matrix::MatrixBinding) -> String {
    if binding.is_empty() {
        job.name.clone()
    } else {
        binding.label()
    }
}
