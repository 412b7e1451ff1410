//! Run result and report models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Status of a run, an instance, or the aggregate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    /// No matching trigger event has arrived
    Pending,
    /// Instances are executing
    Running,
    /// Every instance of every job succeeded
    Succeeded,
    /// At least one instance failed
    Failed,
}

impl RunStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunStatus::Succeeded | RunStatus::Failed)
    }
}

/// How severely a failure undermines the instance's signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    /// The step's own signal is trustworthy: the work failed
    Error,
    /// The measurement or environment failed; nothing later in the instance
    /// can be trusted
    Critical,
}

/// Classified failure of a single step
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StepFailure {
    /// Invoked tool exited nonzero
    #[error("command exited with code {exit_code}")]
    Command { exit_code: i32 },

    /// Gate metric parsed but fell under the configured minimum
    #[error("gate metric {metric} below minimum {minimum}")]
    GateBelowThreshold { metric: f64, minimum: f64 },

    /// Gate metric missing or malformed after an apparently successful step
    #[error("instrumentation broken: {reason}")]
    InstrumentationBroken { reason: String },

    /// Environment setup failed before the real work could run
    #[error("infrastructure failure: {reason}")]
    Infrastructure { reason: String, exit_code: i32 },
}

impl StepFailure {
    pub fn severity(&self) -> Severity {
        match self {
            StepFailure::Command { .. } | StepFailure::GateBelowThreshold { .. } => Severity::Error,
            StepFailure::InstrumentationBroken { .. } | StepFailure::Infrastructure { .. } => {
                Severity::Critical
            }
        }
    }

    /// Exit code the failure contributes to its instance
    pub fn exit_code(&self) -> i32 {
        match self {
            StepFailure::Command { exit_code } => *exit_code,
            StepFailure::GateBelowThreshold { .. } => 1,
            StepFailure::InstrumentationBroken { .. } => 2,
            StepFailure::Infrastructure { exit_code, .. } => *exit_code,
        }
    }
}

/// Result of one executed step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
    pub step: String,

    /// The resolved command that was invoked
    pub command: String,

    pub exit_code: i32,

    /// Captured output (stdout then stderr)
    pub output: String,

    pub failure: Option<StepFailure>,

    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl StepResult {
    pub fn passed(&self) -> bool {
        self.failure.is_none()
    }
}

/// Result of one job instance: the ordered steps that actually ran.
///
/// Steps after the first failure never run and are not recorded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceResult {
    pub job: String,

    /// Matrix binding label, or the job name for matrix-less jobs
    pub instance: String,

    pub steps: Vec<StepResult>,

    pub status: RunStatus,

    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl InstanceResult {
    pub fn succeeded(&self) -> bool {
        self.status == RunStatus::Succeeded
    }

    /// First failing step, if any
    pub fn first_failure(&self) -> Option<&StepResult> {
        self.steps.iter().find(|step| !step.passed())
    }

    /// Exit code: the first failing step's, else 0
    pub fn exit_code(&self) -> i32 {
        self.first_failure()
            .and_then(|step| step.failure.as_ref())
            .map(StepFailure::exit_code)
            .unwrap_or(0)
    }
}

/// Aggregated outcome of one workflow run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub workflow: String,
    pub event: String,
    pub status: RunStatus,
    pub instances: Vec<InstanceResult>,
    pub warnings: Vec<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl RunReport {
    /// Report for an event that matched no declared trigger: the run never
    /// leaves its initial state.
    pub fn not_triggered(workflow: &str, event: &str) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            workflow: workflow.to_string(),
            event: event.to_string(),
            status: RunStatus::Pending,
            instances: Vec::new(),
            warnings: Vec::new(),
            started_at: None,
            finished_at: None,
        }
    }

    pub fn succeeded(&self) -> bool {
        self.status == RunStatus::Succeeded
    }

    /// Process exit status the run maps to, consumable as a merge gate
    pub fn exit_code(&self) -> i32 {
        match self.status {
            RunStatus::Failed => 1,
            _ => 0,
        }
    }

    /// Look up one instance by job name and instance label
    pub fn instance(&self, job: &str, instance: &str) -> Option<&InstanceResult> {
        self.instances
            .iter()
            .find(|i| i.job == job && i.instance == instance)
    }

    /// Every failing instance, reported independently
    pub fn failed_instances(&self) -> Vec<&InstanceResult> {
        self.instances.iter().filter(|i| !i.succeeded()).collect()
    }
}
