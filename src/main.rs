use anyhow::{Context, Result};
use gantry::cli::commands::{RunCommand, ValidateCommand};
use gantry::cli::output::*;
use gantry::cli::{Cli, Command};
use gantry::core::config::WorkflowConfig;
use gantry::core::state::{RunReport, RunStatus};
use gantry::core::workflow::EventDescriptor;
use gantry::execution::{RunEvent, ShellExecutor, WorkflowEngine};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::from_args();

    // Initialize logging
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set logging subscriber")?;

    match &cli.command {
        Command::Run(cmd) => run_workflow(cmd).await?,
        Command::Validate(cmd) => validate_workflow(cmd)?,
    }

    Ok(())
}

async fn run_workflow(cmd: &RunCommand) -> Result<()> {
    // Load workflow config
    let mut config =
        WorkflowConfig::from_file(&cmd.file).context("Failed to load workflow config")?;

    println!("{} Loaded workflow: {}", INFO, style(&config.name).bold());

    // Apply variable overrides
    for (key, value) in &cmd.var {
        config.env.insert(key.clone(), value.clone());
        println!(
            "{} Variable override: {} = {}",
            INFO,
            style(key).cyan(),
            style(value).dim()
        );
    }

    let workflow = config.to_workflow()?;

    // Create execution engine over the real shell
    let executor = ShellExecutor::new(&cmd.shell, cmd.timeout_secs);
    let mut engine = WorkflowEngine::new(executor);

    // Console output plus a progress bar that grows as jobs expand
    let progress = create_progress_bar();
    let progress_handle = progress.clone();
    engine.add_event_handler(move |event| {
        match &event {
            RunEvent::JobExpanded { instances, .. } => {
                progress_handle.inc_length(*instances as u64);
            }
            RunEvent::InstanceCompleted { .. } => progress_handle.inc(1),
            RunEvent::RunCompleted { .. } => progress_handle.finish_and_clear(),
            _ => {}
        }
        progress_handle.println(format_run_event(&event));
    });

    // Execute
    println!();
    let report = engine
        .run(&workflow, &EventDescriptor::new(&cmd.event))
        .await?;

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    if report.exit_code() != 0 {
        std::process::exit(report.exit_code());
    }

    Ok(())
}

fn print_report(report: &RunReport) {
    for warning in &report.warnings {
        println!("{} {}", WARN, style(warning).yellow());
    }

    println!();
    for instance in &report.instances {
        println!("{}", format_instance_result(instance));
        if let Some(step) = instance.first_failure() {
            if let Some(failure) = &step.failure {
                println!(
                    "    first failing step: {} ({})",
                    style(&step.step).red(),
                    style(failure).dim()
                );
            }
            if !step.output.is_empty() {
                for line in format_output(&step.output, 10).lines() {
                    println!("    {}", line);
                }
            }
        }
    }

    match report.status {
        RunStatus::Succeeded => println!(
            "\n{} {} {}",
            CHECK,
            style(&report.workflow).bold(),
            style("succeeded").green()
        ),
        RunStatus::Failed => println!(
            "\n{} {} {} ({} failing instance{})",
            CROSS,
            style(&report.workflow).bold(),
            style("failed").red(),
            report.failed_instances().len(),
            if report.failed_instances().len() == 1 { "" } else { "s" }
        ),
        RunStatus::Pending => println!(
            "\n{} {} was not triggered by '{}'",
            INFO,
            style(&report.workflow).bold(),
            style(&report.event).cyan()
        ),
        RunStatus::Running => {}
    }
}

fn validate_workflow(cmd: &ValidateCommand) -> Result<()> {
    println!("{} Validating workflow...", INFO);

    let result = WorkflowConfig::from_file(&cmd.file).and_then(|config| {
        // Reference checks run during domain conversion.
        config.to_workflow()?;
        Ok(config)
    });

    match result {
        Ok(config) => {
            println!("{} Workflow configuration is valid!", CHECK);
            println!("  Name: {}", style(&config.name).bold());
            println!("  Triggers: {}", style(config.on.events().join(", ")).cyan());
            println!("  Jobs: {}", style(config.jobs.len()).cyan());
            println!("  Variables: {}", style(config.env.len()).cyan());

            if cmd.json {
                let json = serde_json::to_string_pretty(&config)?;
                println!("\n{}", json);
            }
            Ok(())
        }
        Err(e) => {
            println!("{} Validation failed:", CROSS);
            println!("  {}", style(e).red());
            std::process::exit(1);
        }
    }
}
