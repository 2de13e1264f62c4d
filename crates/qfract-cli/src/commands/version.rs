//! Version command implementation.

use console::style;

/// Execute the version command.
pub fn execute() {
    let version = env!("CARGO_PKG_VERSION");

    println!(
        "{} {} - layered entangling circuit experiments",
        style("qfract").cyan().bold(),
        style(format!("v{version}")).yellow()
    );
    println!();
    println!("Components:");
    println!("  qfract-ir           Circuit model, fractal builder, OpenQASM 3 emitter");
    println!("  qfract-hal          Histograms, job lifecycle, remote service trait");
    println!("  qfract-adapter-sim  Statevector simulator and Bloch vectors");
    println!("  qfract-adapter-ibm  IBM Quantum remote service");
    println!("  qfract-exec         Backend selection with simulator fallback, reports");
    println!("  qfract-cli          Command-line interface");
    println!();
    println!("License:    {}", style("Apache-2.0").dim());
}
