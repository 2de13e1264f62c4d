//! Gate operations.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::qubit::{ClbitId, QubitId};

/// Axis of a single-qubit rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RotationAxis {
    X,
    Y,
    Z,
}

/// Kind of two-qubit entangling operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntangleKind {
    /// Controlled-X (CNOT).
    Cx,
    /// Controlled-Z.
    Cz,
}

/// A single operation in a circuit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum GateOp {
    /// Rotation by `angle` radians about `axis`.
    Rotation {
        /// Rotation axis.
        axis: RotationAxis,
        /// Angle in radians.
        angle: f64,
        /// Target qubit.
        qubit: QubitId,
    },
    /// Controlled two-qubit gate.
    Entangle {
        /// CX or CZ.
        kind: EntangleKind,
        /// Control qubit.
        control: QubitId,
        /// Target qubit.
        target: QubitId,
    },
    /// Computational-basis measurement of `qubit` into `clbit`.
    Measurement {
        /// Measured qubit.
        qubit: QubitId,
        /// Classical bit receiving the outcome.
        clbit: ClbitId,
    },
    /// Ordering fence across the whole register. No effect on the state.
    Barrier,
}

impl GateOp {
    /// Shorthand for a Y rotation.
    pub fn ry(angle: f64, qubit: impl Into<QubitId>) -> Self {
        GateOp::Rotation {
            axis: RotationAxis::Y,
            angle,
            qubit: qubit.into(),
        }
    }

    /// Shorthand for a CNOT.
    pub fn cx(control: impl Into<QubitId>, target: impl Into<QubitId>) -> Self {
        GateOp::Entangle {
            kind: EntangleKind::Cx,
            control: control.into(),
            target: target.into(),
        }
    }

    /// Shorthand for a measurement.
    pub fn measure(qubit: impl Into<QubitId>, clbit: impl Into<ClbitId>) -> Self {
        GateOp::Measurement {
            qubit: qubit.into(),
            clbit: clbit.into(),
        }
    }

    /// Lowercase mnemonic, matching OpenQASM gate names.
    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            GateOp::Rotation { axis, .. } => match axis {
                RotationAxis::X => "rx",
                RotationAxis::Y => "ry",
                RotationAxis::Z => "rz",
            },
            GateOp::Entangle { kind, .. } => match kind {
                EntangleKind::Cx => "cx",
                EntangleKind::Cz => "cz",
            },
            GateOp::Measurement { .. } => "measure",
            GateOp::Barrier => "barrier",
        }
    }

    /// Qubits this operation touches. Empty for a barrier.
    pub fn qubits(&self) -> Vec<QubitId> {
        match self {
            GateOp::Rotation { qubit, .. } | GateOp::Measurement { qubit, .. } => vec![*qubit],
            GateOp::Entangle {
                control, target, ..
            } => vec![*control, *target],
            GateOp::Barrier => vec![],
        }
    }

    /// True for rotations and entangling gates.
    #[inline]
    pub fn is_unitary(&self) -> bool {
        matches!(self, GateOp::Rotation { .. } | GateOp::Entangle { .. })
    }

    #[inline]
    pub fn is_measurement(&self) -> bool {
        matches!(self, GateOp::Measurement { .. })
    }

    #[inline]
    pub fn is_entangling(&self) -> bool {
        matches!(self, GateOp::Entangle { .. })
    }
}

impl fmt::Display for GateOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GateOp::Rotation { angle, qubit, .. } => write!(f, "{}({angle}) {qubit}", self.name()),
            GateOp::Entangle {
                control, target, ..
            } => write!(f, "{} {control}, {target}", self.name()),
            GateOp::Measurement { qubit, clbit } => write!(f, "measure {qubit} -> {clbit}"),
            GateOp::Barrier => write!(f, "barrier"),
        }
    }
}
