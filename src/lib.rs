//! gantry - a declarative CI workflow runner

pub mod cli;
pub mod core;
pub mod execution;

// Re-export commonly used types
pub use crate::core::config::{DefinitionError, WorkflowConfig};
pub use crate::core::{
    EventDescriptor, InstanceResult, MatrixSpec, RunReport, RunStatus, StepFailure,
    VariableContext, Workflow,
};
pub use crate::execution::{CommandExecutor, RunEvent, ShellExecutor, WorkflowEngine};
