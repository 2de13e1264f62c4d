//! Bloch-vector extraction from reduced single-qubit states.

use serde::{Deserialize, Serialize};
use std::fmt;

use qfract_ir::QuantumCircuit;

use crate::density::{DensityMatrix, pauli_x, pauli_y, pauli_z};
use crate::error::SimResult;
use crate::statevector::Statevector;

/// Pauli expectation values `(⟨σx⟩, ⟨σy⟩, ⟨σz⟩)` of one qubit.
///
/// The norm is 1 for a qubit in a pure product state and shrinks as the
/// qubit becomes entangled with the rest of the register.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlochVector {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl BlochVector {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// `x = Re tr(ρσx)`, `y = Re tr(ρσy)`, `z = Re tr(ρσz)`.
    pub fn from_density(rho: &DensityMatrix) -> Self {
        Self {
            x: rho.expectation(&pauli_x()).re,
            y: rho.expectation(&pauli_y()).re,
            z: rho.expectation(&pauli_z()).re,
        }
    }

    /// Euclidean length.
    pub fn norm(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Whether the vector lies on the sphere surface within `tolerance`.
    pub fn is_pure(&self, tolerance: f64) -> bool {
        (self.norm() - 1.0).abs() <= tolerance
    }

    pub fn as_array(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }
}

impl fmt::Display for BlochVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:+.4}, {:+.4}, {:+.4})", self.x, self.y, self.z)
    }
}

/// One Bloch vector per qubit of `state`, in ascending qubit order.
pub fn bloch_vectors(state: &Statevector) -> Vec<BlochVector> {
    (0..state.num_qubits() as usize)
        .map(|q| BlochVector::from_density(&state.reduce(q)))
        .collect()
}

/// Bloch vectors of the pre-measurement state of `circuit`.
pub fn bloch_vectors_for(circuit: &QuantumCircuit) -> SimResult<Vec<BlochVector>> {
    let state = Statevector::evolve(&circuit.strip_measurements())?;
    Ok(bloch_vectors(&state))
}
