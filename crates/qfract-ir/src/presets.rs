//! Fixed demonstration circuits.

use crate::circuit::QuantumCircuit;
use crate::error::IrResult;
use crate::qubit::{ClbitId, QubitId};

/// One qubit in equal superposition, measured.
pub fn superposition() -> IrResult<QuantumCircuit> {
    let mut circuit = QuantumCircuit::with_size("superposition", 1)?;
    circuit.h(QubitId(0))?.measure(QubitId(0), ClbitId(0))?;
    Ok(circuit)
}

/// Bell pair with barriers around the entangling step.
pub fn bell_pair() -> IrResult<QuantumCircuit> {
    let q0 = QubitId(0);
    let q1 = QubitId(1);
    let mut circuit = QuantumCircuit::with_size("bell_pair", 2)?;
    circuit
        .h(q0)?
        .barrier()?
        .cx(q0, q1)?
        .barrier()?
        .measure(q0, ClbitId(0))?
        .measure(q1, ClbitId(1))?;
    Ok(circuit)
}

/// Three-qubit teleportation of `|+⟩` from qubit 0 to qubit 2.
///
/// The corrections are applied as controlled gates after the Bell
/// measurement, so the circuit stays simulable by deferring measurement.
pub fn teleportation() -> IrResult<QuantumCircuit> {
    let (q0, q1, q2) = (QubitId(0), QubitId(1), QubitId(2));
    let mut circuit = QuantumCircuit::with_size("teleportation", 3)?;
    circuit
        .h(q0)?
        .h(q1)?
        .cx(q1, q2)?
        .cx(q0, q1)?
        .h(q0)?
        .measure(q0, ClbitId(0))?
        .measure(q1, ClbitId(1))?
        .cx(q1, q2)?
        .cz(q0, q2)?
        .measure(q2, ClbitId(2))?;
    Ok(circuit)
}

/// Look up a preset by name.
pub fn by_name(name: &str) -> Option<IrResult<QuantumCircuit>> {
    match name {
        "superposition" => Some(superposition()),
        "bell" | "bell_pair" => Some(bell_pair()),
        "teleportation" => Some(teleportation()),
        _ => None,
    }
}

/// Names accepted by [`by_name`].
pub const PRESET_NAMES: &[&str] = &["superposition", "bell", "teleportation"];
