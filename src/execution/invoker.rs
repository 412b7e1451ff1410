//! Opaque command invocation - the boundary to external tools

use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Error raised by the invocation layer itself, not by the invoked tool
#[derive(Debug, Error)]
pub enum InvokeError {
    #[error("failed to spawn command: {0}")]
    Spawn(String),

    #[error("timeout after {0} seconds")]
    Timeout(u64),

    #[error("command produced non-UTF-8 output: {0}")]
    Decode(String),
}

/// Captured outcome of one invoked command
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Stdout then stderr, for capture and gate evaluation
    pub fn combined(&self) -> String {
        match (self.stdout.is_empty(), self.stderr.is_empty()) {
            (_, true) => self.stdout.clone(),
            (true, false) => self.stderr.clone(),
            (false, false) => format!("{}\n{}", self.stdout, self.stderr),
        }
    }
}

/// Trait for invoking step commands - allows substituting the real shell
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    /// Run one command in the given environment and capture its outcome
    async fn execute(
        &self,
        command: &str,
        env: &HashMap<String, String>,
    ) -> Result<CommandOutput, InvokeError>;
}

/// Executor that runs commands through `sh -c`
#[derive(Debug, Clone)]
pub struct ShellExecutor {
    /// Shell binary used to interpret commands
    shell: String,

    /// Timeout for command execution in seconds
    timeout_secs: u64,
}

impl Default for ShellExecutor {
    fn default() -> Self {
        Self::new("sh", 600)
    }
}

impl ShellExecutor {
    pub fn new(shell: impl Into<String>, timeout_secs: u64) -> Self {
        Self {
            shell: shell.into(),
            timeout_secs,
        }
    }
}

#[async_trait]
impl CommandExecutor for ShellExecutor {
    async fn execute(
        &self,
        command: &str,
        env: &HashMap<String, String>,
    ) -> Result<CommandOutput, InvokeError> {
        debug!("Spawning `{} -c` for: {}", self.shell, command);

        let result = timeout(
            Duration::from_secs(self.timeout_secs),
            Command::new(&self.shell)
                .arg("-c")
                .arg(command)
                .envs(env)
                .kill_on_drop(true)
                .output(),
        )
        .await
        .map_err(|_| InvokeError::Timeout(self.timeout_secs))?;

        let output = result.map_err(|e| InvokeError::Spawn(e.to_string()))?;

        let exit_code = output.status.code().unwrap_or(-1);
        if exit_code != 0 {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!("command exited with code {}: {}", exit_code, stderr.trim());
        }

        let stdout =
            String::from_utf8(output.stdout).map_err(|e| InvokeError::Decode(e.to_string()))?;
        let stderr =
            String::from_utf8(output.stderr).map_err(|e| InvokeError::Decode(e.to_string()))?;

        Ok(CommandOutput {
            exit_code,
            stdout,
            stderr,
        })
    }
}
