//! Error types for the IR crate.

use crate::qubit::{ClbitId, QubitId};
use thiserror::Error;

/// Errors that can occur while constructing circuits.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum IrError {
    /// Structural parameters do not describe a valid circuit.
    #[error("Invalid circuit specification: {0}")]
    InvalidCircuitSpec(String),

    /// Qubit index outside the register.
    #[error(
        "Qubit {qubit} out of range for {num_qubits}-qubit register{}",
        format_gate_context(.gate_name)
    )]
    QubitOutOfRange {
        /// The offending qubit.
        qubit: QubitId,
        /// Size of the quantum register.
        num_qubits: u32,
        /// Optional gate name for context.
        gate_name: Option<String>,
    },

    /// Classical bit index outside the register.
    #[error(
        "Classical bit {clbit} out of range for {num_clbits}-bit register{}",
        format_gate_context(.gate_name)
    )]
    ClbitOutOfRange {
        /// The offending classical bit.
        clbit: ClbitId,
        /// Size of the classical register.
        num_clbits: u32,
        /// Optional gate name for context.
        gate_name: Option<String>,
    },

    /// Control and target of a two-qubit operation coincide.
    #[error("Duplicate qubit {qubit} in operation{}", format_gate_context(.gate_name))]
    DuplicateQubit {
        /// The duplicate qubit.
        qubit: QubitId,
        /// Optional gate name for context.
        gate_name: Option<String>,
    },

    /// Rotation angle is NaN or infinite.
    #[error("Rotation angle {angle} on {qubit} is not finite")]
    NonFiniteAngle {
        /// The rejected angle.
        angle: f64,
        /// Target qubit.
        qubit: QubitId,
    },
}

impl IrError {
    /// Whether this error is an index error rather than a malformed spec.
    pub fn is_index_error(&self) -> bool {
        matches!(self, IrError::QubitOutOfRange { .. })
    }
}

/// Helper function to format optional gate context.
#[allow(clippy::ref_option)]
fn format_gate_context(gate_name: &Option<String>) -> String {
    match gate_name {
        Some(name) => format!(" (gate: {name})"),
        None => String::new(),
    }
}

/// Result type for IR operations.
pub type IrResult<T> = Result<T, IrError>;
