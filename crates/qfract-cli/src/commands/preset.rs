//! Preset command implementation.

use anyhow::Result;
use console::style;

use qfract_exec::Executor;
use qfract_ir::presets::{PRESET_NAMES, by_name};

use super::common::print_execution;

/// Execute the preset command.
pub async fn execute(name: &str, shots: u32, seed: Option<u64>) -> Result<()> {
    let Some(circuit) = by_name(name) else {
        anyhow::bail!(
            "Unknown preset: '{name}'. Available: {}",
            PRESET_NAMES.join(", ")
        );
    };
    let circuit = circuit?;

    println!(
        "{} Running preset {} ({} qubits, {} shots)",
        style("→").cyan().bold(),
        style(name).green(),
        circuit.num_qubits(),
        shots
    );

    let execution = Executor::new()
        .with_seed(seed)
        .execute(&circuit, shots, false, "")
        .await?;
    print_execution(&execution);
    Ok(())
}
