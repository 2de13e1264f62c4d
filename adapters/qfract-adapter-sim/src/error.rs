//! Error types for the simulator.

use qfract_ir::{GateOp, IrError};
use thiserror::Error;

/// Errors raised by local simulation, partial trace and sampling.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum SimError {
    /// Circuit construction failed.
    #[error(transparent)]
    Circuit(#[from] IrError),

    /// Qubit index outside the state's register.
    #[error("Qubit {qubit} out of range for {num_qubits}-qubit state")]
    InvalidQubitIndex {
        /// The requested qubit.
        qubit: u32,
        /// Register width.
        num_qubits: u32,
    },

    /// State would not fit in memory.
    #[error("Cannot simulate {requested} qubits (max {max})")]
    TooManyQubits {
        /// Requested width.
        requested: u32,
        /// Supported width.
        max: u32,
    },

    /// A statevector needs at least one qubit.
    #[error("Statevector needs at least one qubit")]
    EmptyRegister,

    /// Amplitude vector length is not a power of two.
    #[error("Amplitude vector of length {0} is not a power of two")]
    InvalidDimension(usize),

    /// Norm left the unit sphere after an operation.
    #[error("State norm drifted to {norm_sqr:.12} after {op}")]
    NormDrift {
        /// Squared norm observed.
        norm_sqr: f64,
        /// Operation that was just applied.
        op: String,
    },

    /// Unitary evolution was handed a measurement.
    #[error("Measurement at position {position} in a circuit passed to unitary evolution")]
    MeasurementInUnitary {
        /// Index of the measurement in the op list.
        position: usize,
    },

    /// A measured qubit is later acted on in a way deferral cannot express.
    #[error("Qubit q{qubit} is used by '{op}' after being measured")]
    MidCircuitMeasurement {
        /// The measured qubit.
        qubit: u32,
        /// The offending operation.
        op: String,
    },

    /// Circuit has no classical bits to report.
    #[error("Circuit '{0}' has no classical bits to sample into")]
    NoMeasurements(String),

    /// Zero shots requested.
    #[error("Shot count must be at least 1")]
    InvalidShots,

    /// Probability weights cannot be sampled.
    #[error("Invalid probability distribution: {0}")]
    InvalidDistribution(String),
}

impl SimError {
    pub(crate) fn mid_circuit(qubit: u32, op: &GateOp) -> Self {
        SimError::MidCircuitMeasurement {
            qubit,
            op: op.to_string(),
        }
    }

    /// True for numerical failures, which indicate a bug rather than bad input.
    pub fn is_numerical(&self) -> bool {
        matches!(
            self,
            SimError::NormDrift { .. } | SimError::InvalidDistribution(_)
        )
    }
}

/// Result type for simulator operations.
pub type SimResult<T> = Result<T, SimError>;
