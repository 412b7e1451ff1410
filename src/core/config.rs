//! Workflow configuration from YAML

use crate::core::action::{ActionError, ActionKind};
use crate::core::gate::{GateConfig, DEFAULT_METRIC_PATTERN};
use crate::core::matrix::{MatrixAxis, MatrixSpec};
use crate::core::workflow::Workflow;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Problems with the workflow definition, caught before any job starts
#[derive(Debug, Error)]
pub enum DefinitionError {
    #[error("failed to read workflow file: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed workflow: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("workflow declares no trigger events")]
    NoTriggers,

    #[error("workflow declares no jobs")]
    NoJobs,

    #[error("job '{job}' declares no steps")]
    NoSteps { job: String },

    #[error("step '{step}' in job '{job}' must declare exactly one of 'run' or 'uses'")]
    AmbiguousStep { job: String, step: String },

    #[error("step '{step}' in job '{job}': {source}")]
    Action {
        job: String,
        step: String,
        source: ActionError,
    },

    #[error("job '{job}' matrix axis '{axis}' must be a list of scalar values")]
    MalformedMatrixAxis { job: String, axis: String },

    #[error("job '{job}' declares an empty matrix axis '{axis}'")]
    EmptyMatrixAxis { job: String, axis: String },

    #[error("unresolved variable '{reference}' in step '{step}' of job '{job}'")]
    UnresolvedVariable {
        job: String,
        step: String,
        reference: String,
    },

    #[error("invalid gate pattern '{pattern}' on step '{step}' of job '{job}'")]
    InvalidGatePattern {
        job: String,
        step: String,
        pattern: String,
    },
}

/// Top-level workflow configuration loaded from YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowConfig {
    /// Workflow name
    pub name: String,

    /// Trigger events the workflow responds to
    pub on: Triggers,

    /// Default variables available to every job
    #[serde(default)]
    pub env: HashMap<String, String>,

    /// Job name to job definition
    pub jobs: HashMap<String, JobConfig>,
}

/// Trigger events: a single name or a list of names
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Triggers {
    One(String),
    Many(Vec<String>),
}

impl Triggers {
    pub fn events(&self) -> Vec<String> {
        match self {
            Triggers::One(event) => vec![event.clone()],
            Triggers::Many(events) => events.clone(),
        }
    }
}

/// Job configuration as defined in YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobConfig {
    /// Platform tag the job runs on
    #[serde(rename = "runs-on")]
    pub runs_on: String,

    /// Matrix strategy, if any
    #[serde(default)]
    pub strategy: Option<StrategyConfig>,

    /// Ordered steps
    pub steps: Vec<StepConfig>,
}

/// Matrix strategy configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StrategyConfig {
    /// Kept as a raw mapping so the declared axis order survives parsing
    #[serde(default)]
    pub matrix: serde_yaml::Mapping,
}

/// Step configuration as defined in YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepConfig {
    /// Human-readable step name
    #[serde(default)]
    pub name: Option<String>,

    /// Reference to a reusable action
    #[serde(default)]
    pub uses: Option<String>,

    /// Inline command, possibly multi-line
    #[serde(default)]
    pub run: Option<String>,

    /// Action parameters
    #[serde(default)]
    pub with: HashMap<String, String>,

    /// Quality gate evaluated over this step's output
    #[serde(default)]
    pub gate: Option<GateConfig>,
}

impl WorkflowConfig {
    /// Load workflow configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, DefinitionError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse workflow configuration from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self, DefinitionError> {
        let config: WorkflowConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the workflow definition
    pub fn validate(&self) -> Result<(), DefinitionError> {
        if self.on.events().is_empty() {
            return Err(DefinitionError::NoTriggers);
        }
        if self.jobs.is_empty() {
            return Err(DefinitionError::NoJobs);
        }

        for (job_name, job) in &self.jobs {
            if job.steps.is_empty() {
                return Err(DefinitionError::NoSteps {
                    job: job_name.clone(),
                });
            }

            job.matrix_spec(job_name)?;

            for (index, step) in job.steps.iter().enumerate() {
                let step_name = step.display_name(index);

                match (&step.run, &step.uses) {
                    (Some(_), None) => {}
                    (None, Some(uses)) => {
                        ActionKind::parse(uses, &step.with).map_err(|source| {
                            DefinitionError::Action {
                                job: job_name.clone(),
                                step: step_name.clone(),
                                source,
                            }
                        })?;
                    }
                    _ => {
                        return Err(DefinitionError::AmbiguousStep {
                            job: job_name.clone(),
                            step: step_name,
                        })
                    }
                }

                if let Some(gate) = &step.gate {
                    let pattern = gate.pattern.as_deref().unwrap_or(DEFAULT_METRIC_PATTERN);
                    if Regex::new(pattern).is_err() {
                        return Err(DefinitionError::InvalidGatePattern {
                            job: job_name.clone(),
                            step: step_name,
                            pattern: pattern.to_string(),
                        });
                    }
                }
            }
        }

        Ok(())
    }

    /// Convert into the validated domain model
    pub fn to_workflow(&self) -> Result<Workflow, DefinitionError> {
        Workflow::from_config(self)
    }
}

impl JobConfig {
    /// Parse `strategy.matrix` preserving the declared axis order
    pub fn matrix_spec(&self, job_name: &str) -> Result<MatrixSpec, DefinitionError> {
        let Some(strategy) = &self.strategy else {
            return Ok(MatrixSpec::default());
        };

        let mut axes = Vec::with_capacity(strategy.matrix.len());
        for (key, value) in &strategy.matrix {
            let axis = key
                .as_str()
                .map(str::to_string)
                .ok_or_else(|| DefinitionError::MalformedMatrixAxis {
                    job: job_name.to_string(),
                    axis: format!("{:?}", key),
                })?;

            let values = match value {
                Value::Sequence(sequence) => sequence
                    .iter()
                    .map(scalar_to_string)
                    .collect::<Option<Vec<_>>>()
                    .ok_or_else(|| DefinitionError::MalformedMatrixAxis {
                        job: job_name.to_string(),
                        axis: axis.clone(),
                    })?,
                _ => {
                    return Err(DefinitionError::MalformedMatrixAxis {
                        job: job_name.to_string(),
                        axis,
                    })
                }
            };

            if values.is_empty() {
                return Err(DefinitionError::EmptyMatrixAxis {
                    job: job_name.to_string(),
                    axis,
                });
            }

            axes.push(MatrixAxis { name: axis, values });
        }

        Ok(MatrixSpec::new(axes))
    }
}

impl StepConfig {
    /// Display name: the explicit name, else the action or command head
    pub fn display_name(&self, index: usize) -> String {
        if let Some(name) = &self.name {
            return name.clone();
        }
        if let Some(uses) = &self.uses {
            return uses.clone();
        }
        self.run
            .as_deref()
            .and_then(|run| run.lines().next())
            .map(|line| line.trim().to_string())
            .filter(|line| !line.is_empty())
            .unwrap_or_else(|| format!("step-{}", index + 1))
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
