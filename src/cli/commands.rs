//! CLI command definitions

use clap::Args;

/// Run a workflow
#[derive(Debug, Args, Clone)]
pub struct RunCommand {
    /// Path to workflow YAML file
    #[arg(short, long)]
    pub file: String,

    /// Event to evaluate the workflow triggers against
    #[arg(long, default_value = "push")]
    pub event: String,

    /// Workflow env overrides (key=value)
    #[arg(long = "var", value_parser = parse_key_value)]
    pub var: Vec<(String, String)>,

    /// Shell used to invoke step commands
    #[arg(long, default_value = "sh")]
    pub shell: String,

    /// Per-command timeout in seconds
    #[arg(long, default_value_t = 600)]
    pub timeout_secs: u64,

    /// Output the run report as JSON
    #[arg(long)]
    pub json: bool,
}

/// Validate a workflow configuration
#[derive(Debug, Args, Clone)]
pub struct ValidateCommand {
    /// Path to workflow YAML file
    #[arg(short, long)]
    pub file: String,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Parse key=value pairs
pub fn parse_key_value(s: &str) -> Result<(String, String), String> {
    let parts: Vec<&str> = s.splitn(2, '=').collect();
    if parts.len() != 2 {
        return Err(format!("Invalid key=value pair: {}", s));
    }
    Ok((parts[0].to_string(), parts[1].to_string()))
}
