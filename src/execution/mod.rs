//! Workflow execution engine

pub mod engine;
pub mod invoker;
pub mod runner;

pub use engine::{EventHandler, RunEvent, WorkflowEngine};
pub use invoker::{CommandExecutor, CommandOutput, InvokeError, ShellExecutor};
pub use runner::{InstanceRunner, PreparedInstance, PreparedInvocation, PreparedStep};
