//! Bloch command implementation.

use anyhow::Result;
use console::style;

use qfract_adapter_sim::bloch_vectors_for;
use qfract_exec::render_bloch;
use qfract_ir::fractal;

use super::common::OutputFormat;

/// Execute the bloch command.
pub fn execute(qubits: u32, depth: u32, format: OutputFormat) -> Result<()> {
    let circuit = fractal(qubits, depth)?;
    let vectors = bloch_vectors_for(&circuit)?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&vectors)?),
        OutputFormat::Table => {
            println!(
                "{} Bloch vectors for fractal({qubits}, {depth}):",
                style("→").cyan().bold()
            );
            print!("{}", render_bloch(&vectors));
        }
    }
    Ok(())
}
