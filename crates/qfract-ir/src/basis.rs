//! Translation into the native gate set of superconducting hardware.
//!
//! IBM Heron devices execute `rz`, `sx`, `x` and `cz` only; the V2 sampler
//! rejects anything else. Rotations are rewritten with the identities
//!
//! ```text
//! rx(θ) = rz(π/2) · sx · rz(θ + π) · sx · rz(5π/2)
//! ry(θ) = sx · rz(θ + π) · sx · rz(π)
//! h     = rz(π/2) · sx · rz(π/2)
//! cx    = h(t) · cz · h(t)
//! ```
//!
//! listed in application order and exact up to global phase.

use std::f64::consts::{FRAC_PI_2, PI, TAU};
use std::fmt;

use crate::circuit::QuantumCircuit;
use crate::gate::{EntangleKind, GateOp, RotationAxis};
use crate::qubit::{ClbitId, QubitId};

/// Gate names the translated program may contain.
pub const NATIVE_GATES: &[&str] = &["rz", "sx", "x", "cz"];

/// One operation of a translated program.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NativeOp {
    /// Virtual Z rotation, angle wrapped into (-π, π].
    Rz { angle: f64, qubit: QubitId },
    /// Square root of X.
    Sx { qubit: QubitId },
    Cz { control: QubitId, target: QubitId },
    Measurement { qubit: QubitId, clbit: ClbitId },
    Barrier,
}

impl NativeOp {
    /// OpenQASM mnemonic.
    pub fn name(&self) -> &'static str {
        match self {
            NativeOp::Rz { .. } => "rz",
            NativeOp::Sx { .. } => "sx",
            NativeOp::Cz { .. } => "cz",
            NativeOp::Measurement { .. } => "measure",
            NativeOp::Barrier => "barrier",
        }
    }

    /// An equivalent [`GateOp`], equal up to global phase (`sx` becomes `rx(π/2)`).
    pub fn to_gate(&self) -> GateOp {
        match *self {
            NativeOp::Rz { angle, qubit } => GateOp::Rotation {
                axis: RotationAxis::Z,
                angle,
                qubit,
            },
            NativeOp::Sx { qubit } => GateOp::Rotation {
                axis: RotationAxis::X,
                angle: FRAC_PI_2,
                qubit,
            },
            NativeOp::Cz { control, target } => GateOp::Entangle {
                kind: EntangleKind::Cz,
                control,
                target,
            },
            NativeOp::Measurement { qubit, clbit } => GateOp::Measurement { qubit, clbit },
            NativeOp::Barrier => GateOp::Barrier,
        }
    }
}

impl fmt::Display for NativeOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_gate())
    }
}

/// Rewrite every operation of `circuit` into [`NATIVE_GATES`], keeping order.
pub fn translate(circuit: &QuantumCircuit) -> Vec<NativeOp> {
    let mut out = Vec::with_capacity(circuit.len() * 4);
    for op in circuit.ops() {
        translate_op(op, &mut out);
    }
    out
}

fn translate_op(op: &GateOp, out: &mut Vec<NativeOp>) {
    match *op {
        GateOp::Rotation { axis, angle, qubit } => match axis {
            RotationAxis::Z => push_rz(out, angle, qubit),
            RotationAxis::X => {
                push_rz(out, FRAC_PI_2, qubit);
                out.push(NativeOp::Sx { qubit });
                push_rz(out, angle + PI, qubit);
                out.push(NativeOp::Sx { qubit });
                push_rz(out, 5.0 * FRAC_PI_2, qubit);
            }
            RotationAxis::Y => {
                out.push(NativeOp::Sx { qubit });
                push_rz(out, angle + PI, qubit);
                out.push(NativeOp::Sx { qubit });
                push_rz(out, PI, qubit);
            }
        },
        GateOp::Entangle {
            kind,
            control,
            target,
        } => match kind {
            EntangleKind::Cz => out.push(NativeOp::Cz { control, target }),
            EntangleKind::Cx => {
                push_h(out, target);
                out.push(NativeOp::Cz { control, target });
                push_h(out, target);
            }
        },
        GateOp::Measurement { qubit, clbit } => out.push(NativeOp::Measurement { qubit, clbit }),
        GateOp::Barrier => out.push(NativeOp::Barrier),
    }
}

fn push_h(out: &mut Vec<NativeOp>, qubit: QubitId) {
    push_rz(out, FRAC_PI_2, qubit);
    out.push(NativeOp::Sx { qubit });
    push_rz(out, FRAC_PI_2, qubit);
}

/// Identity rotations are dropped.
fn push_rz(out: &mut Vec<NativeOp>, angle: f64, qubit: QubitId) {
    let angle = wrap_angle(angle);
    if angle != 0.0 {
        out.push(NativeOp::Rz { angle, qubit });
    }
}

/// Wrap into (-π, π]. Shifting an rz angle by 2π only changes global phase.
fn wrap_angle(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(TAU);
    if wrapped > PI { wrapped - TAU } else { wrapped }
}
