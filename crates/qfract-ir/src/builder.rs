//! Layered "fractal" circuit construction.
//!
//! Each layer `d` rotates every qubit about Y by `π / 2^d` and chains a CNOT
//! from each qubit to its successor, so successive layers repeat the same
//! entangling pattern at half the angular scale of the one before.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::circuit::QuantumCircuit;
use crate::error::{IrError, IrResult};
use crate::qubit::{ClbitId, QubitId};

/// Structural parameters of a fractal circuit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FractalSpec {
    /// Register width.
    pub n_qubits: u32,
    /// Number of rotation/entangle layers.
    pub fractal_depth: u32,
}

impl FractalSpec {
    pub fn new(n_qubits: u32, fractal_depth: u32) -> Self {
        Self {
            n_qubits,
            fractal_depth,
        }
    }

    /// Build the circuit these parameters describe.
    pub fn build(&self) -> IrResult<QuantumCircuit> {
        fractal(self.n_qubits, self.fractal_depth)
    }
}

/// Rotation angle used by layer `layer`.
#[inline]
pub fn layer_angle(layer: u32) -> f64 {
    // powi keeps very deep layers finite (the angle underflows towards 0)
    PI / 2f64.powi(layer.min(i32::MAX as u32) as i32)
}

/// Build the fractal circuit for `n_qubits` qubits and `fractal_depth` layers.
///
/// The result has `n_qubits` measurements (qubit `i` into classical bit `i`),
/// `fractal_depth * n_qubits` Y rotations and `fractal_depth * (n_qubits - 1)`
/// CNOTs. A depth of zero yields a circuit that only measures `|0…0⟩`.
pub fn fractal(n_qubits: u32, fractal_depth: u32) -> IrResult<QuantumCircuit> {
    if n_qubits == 0 {
        return Err(IrError::InvalidCircuitSpec(
            "fractal circuit needs at least one qubit".into(),
        ));
    }

    let mut circuit =
        QuantumCircuit::with_size(format!("fractal_{n_qubits}x{fractal_depth}"), n_qubits)?;

    for layer in 0..fractal_depth {
        let angle = layer_angle(layer);
        for i in 0..n_qubits {
            circuit.ry(angle, QubitId(i))?;
            if i > 0 {
                circuit.cx(QubitId(i - 1), QubitId(i))?;
            }
        }
    }

    for i in 0..n_qubits {
        circuit.measure(QubitId(i), ClbitId(i))?;
    }

    Ok(circuit)
}
