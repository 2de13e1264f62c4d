//! Run command implementation.

use std::path::Path;

use anyhow::Result;
use console::style;
use serde::Serialize;

use qfract_adapter_sim::{BlochVector, bloch_vectors_for};
use qfract_exec::{Execution, Executor, ExperimentConfig, Report, render_bloch};
use qfract_ir::fractal;

use super::common::{OutputFormat, Overrides, connect_remote, load_config, print_execution, spinner};

#[derive(Serialize)]
struct RunOutput<'a> {
    config: &'a ExperimentConfig,
    simulation: Section<'a>,
    bloch: &'a [BlochVector],
    #[serde(skip_serializing_if = "Option::is_none")]
    remote: Option<Section<'a>>,
}

#[derive(Serialize)]
struct Section<'a> {
    report: Report,
    execution: &'a Execution,
}

impl<'a> Section<'a> {
    fn new(execution: &'a Execution) -> Self {
        Self {
            report: Report::from_counts(&execution.counts, execution.shots),
            execution,
        }
    }
}

/// Execute the run command.
pub async fn execute(
    config_path: Option<&Path>,
    overrides: Overrides,
    format: OutputFormat,
) -> Result<()> {
    let config = load_config(config_path, overrides)?;
    let circuit = fractal(config.n_qubits, config.fractal_depth)?;

    if format == OutputFormat::Table {
        println!(
            "{} Fractal circuit: {} qubits, depth {} ({} rotations, {} entangling, {} shots)",
            style("→").cyan().bold(),
            style(config.n_qubits).green(),
            style(config.fractal_depth).green(),
            circuit.num_rotations(),
            circuit.num_entangling(),
            config.shots
        );
    }

    let mut executor = Executor::new()
        .with_seed(config.seed)
        .with_wait_policy(config.wait.policy());

    let simulation = executor
        .execute(&circuit, config.shots, false, &config.backend_name)
        .await?;
    let bloch = bloch_vectors_for(&circuit)?;

    let remote = if config.use_real {
        if let Some(service) = connect_remote().await {
            executor = executor.with_remote(service);
        }
        let progress = spinner(format!("Running on {}...", config.backend_name));
        let execution = executor
            .execute(&circuit, config.shots, true, &config.backend_name)
            .await;
        progress.finish_and_clear();
        Some(execution?)
    } else {
        None
    };

    match format {
        OutputFormat::Json => {
            let output = RunOutput {
                config: &config,
                simulation: Section::new(&simulation),
                bloch: &bloch,
                remote: remote.as_ref().map(Section::new),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Table => {
            println!("\n{} Simulation", style("✓").green().bold());
            print_execution(&simulation);

            println!("\n{} Bloch vectors", style("✓").green().bold());
            print!("{}", render_bloch(&bloch));

            if let Some(execution) = &remote {
                println!(
                    "\n{} Remote run ({})",
                    style("✓").green().bold(),
                    style(&config.backend_name).yellow()
                );
                print_execution(execution);
            }
        }
    }

    Ok(())
}
