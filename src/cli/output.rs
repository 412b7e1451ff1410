//! CLI output formatting

use crate::core::state::{InstanceResult, RunStatus};
use crate::execution::RunEvent;
use console::Emoji;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

// Re-export style
pub use console::style;

// Emojis for output
pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "✓ ");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "✗ ");
pub static SPINNER: Emoji<'_, '_> = Emoji("⏳ ", "~ ");
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "i ");
pub static WARN: Emoji<'_, '_> = Emoji("⚠️  ", "!");
pub static ROCKET: Emoji<'_, '_> = Emoji("🚀 ", "> ");

/// Create a progress bar sized as jobs expand
pub fn create_progress_bar() -> ProgressBar {
    let progress = ProgressBar::new(0);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("#>-"),
    );
    progress.enable_steady_tick(Duration::from_millis(100));
    progress
}

/// Format a run status for display
pub fn format_status(status: RunStatus) -> String {
    match status {
        RunStatus::Pending => style("PENDING").dim().to_string(),
        RunStatus::Running => style("RUNNING").yellow().to_string(),
        RunStatus::Succeeded => style("SUCCEEDED").green().to_string(),
        RunStatus::Failed => style("FAILED").red().to_string(),
    }
}

/// Format one instance result line
pub fn format_instance_result(result: &InstanceResult) -> String {
    let icon = if result.succeeded() { CHECK } else { CROSS };
    format!(
        "{} {} [{}] - {} ({} steps, exit {})",
        icon,
        style(&result.job).bold(),
        style(&result.instance).cyan(),
        format_status(result.status),
        result.steps.len(),
        result.exit_code()
    )
}

/// Format a run event for display
pub fn format_run_event(event: &RunEvent) -> String {
    match event {
        RunEvent::RunStarted {
            run_id,
            workflow,
            event,
        } => format!(
            "{} Starting {} for '{}' ({})",
            ROCKET,
            style(workflow).bold(),
            style(event).cyan(),
            style(&run_id.to_string()[..8]).dim()
        ),
        RunEvent::RunSkipped { workflow, event } => format!(
            "{} {} not triggered by '{}'",
            INFO,
            style(workflow).bold(),
            style(event).cyan()
        ),
        RunEvent::JobExpanded { job, instances } => format!(
            "{} {} expanded to {} instance{}",
            INFO,
            style(job).bold(),
            style(instances).cyan(),
            if *instances == 1 { "" } else { "s" }
        ),
        RunEvent::InstanceStarted { job, instance } => {
            format!("{} {} [{}]", SPINNER, style(job).cyan(), style(instance).dim())
        }
        RunEvent::InstanceCompleted {
            job,
            instance,
            status,
        } => {
            let icon = if *status == RunStatus::Succeeded {
                CHECK
            } else {
                CROSS
            };
            format!(
                "{} {} [{}] {}",
                icon,
                style(job).bold(),
                style(instance).dim(),
                format_status(*status)
            )
        }
        RunEvent::StepFailed {
            job,
            instance,
            step,
            error,
        } => format!(
            "{} {} [{}] step {}: {}",
            CROSS,
            style(job).red(),
            style(instance).dim(),
            style(step).red(),
            style(error).dim()
        ),
        RunEvent::RunCompleted { run_id, status } => format!(
            "{} Run ({}) {}",
            INFO,
            style(&run_id.to_string()[..8]).dim(),
            format_status(*status)
        ),
    }
}

/// Format step output with truncation
pub fn format_output(output: &str, max_lines: usize) -> String {
    let lines: Vec<&str> = output.lines().collect();

    if lines.len() <= max_lines {
        output.to_string()
    } else {
        let truncated = lines[..max_lines].join("\n");
        format!(
            "{}\n{} ({} more lines)",
            truncated,
            style("[truncated]").dim(),
            lines.len() - max_lines
        )
    }
}
