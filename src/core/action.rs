//! Reusable external actions referenced by `uses:` steps
//!
//! The catalog is a closed set of tagged variants; the engine stays
//! decoupled from whatever each action runs underneath.

use crate::core::context::{UnresolvedVariable, VariableContext};
use std::collections::HashMap;
use thiserror::Error;

/// Failure to interpret a `uses:` reference at definition time
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    #[error("unknown action '{0}'")]
    Unknown(String),

    #[error("action '{action}' requires parameter '{parameter}'")]
    MissingParameter { action: String, parameter: String },
}

/// One variant per reusable action kind.
///
/// Parameters hold raw templates until an instance context resolves them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionKind {
    /// Fetch the sources into the execution scope
    Checkout,

    /// Provision a Python interpreter of the requested version
    SetupPython { version: String },
}

impl ActionKind {
    /// Interpret a `uses:` reference and its `with:` parameters
    pub fn parse(uses: &str, with: &HashMap<String, String>) -> Result<Self, ActionError> {
        match uses {
            "checkout" => Ok(ActionKind::Checkout),
            "setup-python" => {
                let version = with.get("python-version").cloned().ok_or_else(|| {
                    ActionError::MissingParameter {
                        action: uses.to_string(),
                        parameter: "python-version".to_string(),
                    }
                })?;
                Ok(ActionKind::SetupPython { version })
            }
            other => Err(ActionError::Unknown(other.to_string())),
        }
    }

    /// Raw parameter templates, for definition-time reference checks
    pub fn templates(&self) -> Vec<&str> {
        match self {
            ActionKind::Checkout => Vec::new(),
            ActionKind::SetupPython { version } => vec![version.as_str()],
        }
    }

    /// The action with its parameters resolved against an instance context
    pub fn resolved(&self, ctx: &VariableContext) -> Result<Self, UnresolvedVariable> {
        match self {
            ActionKind::Checkout => Ok(ActionKind::Checkout),
            ActionKind::SetupPython { version } => Ok(ActionKind::SetupPython {
                version: ctx.substitute(version)?,
            }),
        }
    }

    /// Apply the action to an instance environment: export whatever later
    /// steps depend on and return the command the runner invokes.
    pub fn apply(&self, env: &mut HashMap<String, String>) -> String {
        match self {
            ActionKind::Checkout => "checkout".to_string(),
            ActionKind::SetupPython { version } => {
                env.insert("PYTHON_VERSION".to_string(), version.clone());
                format!("setup-python --version {}", version)
            }
        }
    }

    /// Display name when the step does not declare one
    pub fn display_name(&self) -> &'static str {
        match self {
            ActionKind::Checkout => "checkout",
            ActionKind::SetupPython { .. } => "setup-python",
        }
    }
}
