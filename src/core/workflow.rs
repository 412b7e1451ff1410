//! Workflow domain model

use crate::core::action::ActionKind;
use crate::core::config::{DefinitionError, StepConfig, WorkflowConfig};
use crate::core::context;
use crate::core::gate::GateConfig;
use crate::core::matrix::MatrixSpec;
use std::collections::HashMap;

/// An incoming event a run is evaluated against
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventDescriptor {
    pub event: String,
}

impl EventDescriptor {
    pub fn new(event: impl Into<String>) -> Self {
        Self {
            event: event.into(),
        }
    }
}

/// Immutable root of a parsed workflow
#[derive(Debug, Clone)]
pub struct Workflow {
    /// Workflow name
    pub name: String,

    /// Event names the workflow triggers on
    pub triggers: Vec<String>,

    /// Default variables shared by every job
    pub defaults: HashMap<String, String>,

    /// Independently scheduled jobs
    pub jobs: Vec<Job>,
}

/// An independently scheduled unit of ordered steps
#[derive(Debug, Clone)]
pub struct Job {
    pub name: String,

    /// Platform tag from `runs-on`
    pub platform: String,

    pub matrix: MatrixSpec,

    /// Ordered steps; order is significant and fixed
    pub steps: Vec<StepDefinition>,
}

/// One ordered step within a job
#[derive(Debug, Clone)]
pub struct StepDefinition {
    pub name: String,
    pub invocation: Invocation,
    pub gate: Option<GateConfig>,
}

/// What a step invokes: an inline command template or a catalog action
#[derive(Debug, Clone)]
pub enum Invocation {
    Command(String),
    Action(ActionKind),
}

impl Workflow {
    /// Build the domain model from a validated configuration.
    ///
    /// Jobs are ordered by name so reports are reproducible regardless of
    /// YAML map iteration order. Every variable reference is checked for
    /// resolvability here, at definition time.
    pub fn from_config(config: &WorkflowConfig) -> Result<Self, DefinitionError> {
        let mut job_names: Vec<String> = config.jobs.keys().cloned().collect();
        job_names.sort();

        let mut jobs = Vec::with_capacity(job_names.len());
        for job_name in job_names {
            let job_config = &config.jobs[&job_name];
            let matrix = job_config.matrix_spec(&job_name)?;

            let mut steps = Vec::with_capacity(job_config.steps.len());
            for (index, step) in job_config.steps.iter().enumerate() {
                steps.push(StepDefinition::from_config(&job_name, index, step)?);
            }

            let job = Job {
                name: job_name,
                platform: job_config.runs_on.clone(),
                matrix,
                steps,
            };
            job.check_references(&config.env)?;
            jobs.push(job);
        }

        Ok(Workflow {
            name: config.name.clone(),
            triggers: config.on.events(),
            defaults: config.env.clone(),
            jobs,
        })
    }

    /// Trigger predicate, evaluated once per incoming event
    pub fn triggers_on(&self, event: &EventDescriptor) -> bool {
        self.triggers.iter().any(|trigger| trigger == &event.event)
    }

    pub fn job(&self, name: &str) -> Option<&Job> {
        self.jobs.iter().find(|job| job.name == name)
    }
}

impl Job {
    /// Verify every variable reference in every step is resolvable before
    /// anything runs.
    fn check_references(&self, defaults: &HashMap<String, String>) -> Result<(), DefinitionError> {
        for step in &self.steps {
            for template in step.templates() {
                for reference in context::scan_references(template) {
                    if !self.reference_resolvable(&reference, defaults) {
                        return Err(DefinitionError::UnresolvedVariable {
                            job: self.name.clone(),
                            step: step.name.clone(),
                            reference,
                        });
                    }
                }
            }
        }
        Ok(())
    }

    fn reference_resolvable(&self, reference: &str, defaults: &HashMap<String, String>) -> bool {
        let axis_exists = |key: &str| self.matrix.axes().iter().any(|axis| axis.name == key);
        let builtin_exists = |key: &str| matches!(key, "platform" | "os");

        if let Some(key) = reference.strip_prefix("matrix.") {
            return axis_exists(key);
        }
        if let Some(key) = reference.strip_prefix("env.") {
            return defaults.contains_key(key);
        }
        if let Some(key) = reference.strip_prefix("runner.") {
            return builtin_exists(key);
        }

        axis_exists(reference) || defaults.contains_key(reference) || builtin_exists(reference)
    }
}

impl StepDefinition {
    fn from_config(job: &str, index: usize, config: &StepConfig) -> Result<Self, DefinitionError> {
        let name = config.display_name(index);

        let invocation = match (&config.run, &config.uses) {
            (Some(run), None) => Invocation::Command(run.clone()),
            (None, Some(uses)) => {
                let action = ActionKind::parse(uses, &config.with).map_err(|source| {
                    DefinitionError::Action {
                        job: job.to_string(),
                        step: name.clone(),
                        source,
                    }
                })?;
                Invocation::Action(action)
            }
            _ => {
                return Err(DefinitionError::AmbiguousStep {
                    job: job.to_string(),
                    step: name,
                })
            }
        };

        Ok(StepDefinition {
            name,
            invocation,
            gate: config.gate.clone(),
        })
    }

    /// Raw templates the step may reference variables from
    pub fn templates(&self) -> Vec<&str> {
        match &self.invocation {
            Invocation::Command(command) => vec![command.as_str()],
            Invocation::Action(action) => action.templates(),
        }
    }

    /// True when the step provisions the environment rather than doing work
    pub fn is_setup(&self) -> bool {
        matches!(self.invocation, Invocation::Action(_))
    }
}
