//! Backends command implementation.

use anyhow::Result;
use console::style;

use qfract_adapter_ibm::IbmService;
use qfract_adapter_sim::SimulatorBackend;
use qfract_hal::RemoteService;

/// Execute the backends command.
pub async fn execute() -> Result<()> {
    println!("{} Available backends:\n", style("qfract").cyan().bold());

    let sim = SimulatorBackend::new();
    println!(
        "  {} {} (local)",
        style("●").green(),
        style(sim.name()).bold()
    );
    println!("    Qubits: up to {}", sim.max_qubits());
    println!();

    match IbmService::from_env().await {
        Ok(ibm) => match ibm.list_backends().await {
            Ok(names) if names.is_empty() => {
                println!("  {} {} (no backends online)", style("○").yellow(), style("ibm").bold());
            }
            Ok(names) => {
                println!("  {} IBM Quantum:", style("─").dim());
                for name in names {
                    println!("  {} {}", style("●").green(), style(name).bold());
                }
            }
            Err(e) => {
                println!("  {} {} (unreachable)", style("○").red(), style("ibm").bold());
                println!("    {e}");
            }
        },
        Err(_) => {
            println!(
                "  {} {} (not configured)",
                style("○").dim(),
                style("ibm").dim()
            );
            println!("    Set IBM_API_KEY + IBM_SERVICE_CRN (or IBM_QUANTUM_TOKEN) to enable");
        }
    }
    println!();

    Ok(())
}
