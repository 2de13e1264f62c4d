//! OpenQASM 3 emission, used when handing circuits to remote services.

use std::fmt::Write as _;

use crate::basis::{self, NativeOp};
use crate::circuit::QuantumCircuit;
use crate::gate::GateOp;

/// Emit a circuit as OpenQASM 3 source.
pub fn emit(circuit: &QuantumCircuit) -> String {
    let mut emitter = Emitter::default();
    emitter.emit_header(circuit);
    for op in circuit.ops() {
        emitter.emit_op(op);
    }
    emitter.output
}

/// Emit a circuit as OpenQASM 3 after translating it to the native basis.
///
/// Only gates in [`basis::NATIVE_GATES`] appear in the output, which is what
/// hardware samplers accept.
pub fn emit_native(circuit: &QuantumCircuit) -> String {
    let mut emitter = Emitter::default();
    emitter.emit_header(circuit);
    for op in basis::translate(circuit) {
        emitter.emit_native_op(op);
    }
    emitter.output
}

#[derive(Default)]
struct Emitter {
    output: String,
}

impl Emitter {
    fn emit_header(&mut self, circuit: &QuantumCircuit) {
        self.writeln("OPENQASM 3.0;");
        self.writeln("include \"stdgates.inc\";");
        self.writeln("");

        self.writeln(&format!("qubit[{}] q;", circuit.num_qubits()));
        if circuit.num_clbits() > 0 {
            self.writeln(&format!("bit[{}] c;", circuit.num_clbits()));
        }
        self.writeln("");
    }

    fn emit_op(&mut self, op: &GateOp) {
        match op {
            GateOp::Rotation { angle, qubit, .. } => {
                self.writeln(&format!("{}({}) q[{}];", op.name(), fmt_angle(*angle), qubit.0));
            }
            GateOp::Entangle {
                control, target, ..
            } => {
                self.writeln(&format!("{} q[{}], q[{}];", op.name(), control.0, target.0));
            }
            GateOp::Measurement { qubit, clbit } => {
                self.writeln(&format!("c[{}] = measure q[{}];", clbit.0, qubit.0));
            }
            GateOp::Barrier => self.writeln("barrier q;"),
        }
    }

    fn emit_native_op(&mut self, op: NativeOp) {
        match op {
            NativeOp::Rz { angle, qubit } => {
                self.writeln(&format!("rz({}) q[{}];", fmt_angle(angle), qubit.0));
            }
            NativeOp::Sx { qubit } => self.writeln(&format!("sx q[{}];", qubit.0)),
            NativeOp::Cz { control, target } => {
                self.writeln(&format!("cz q[{}], q[{}];", control.0, target.0));
            }
            NativeOp::Measurement { qubit, clbit } => {
                self.writeln(&format!("c[{}] = measure q[{}];", clbit.0, qubit.0));
            }
            NativeOp::Barrier => self.writeln("barrier q;"),
        }
    }

    fn writeln(&mut self, line: &str) {
        // Writing into a String cannot fail
        let _ = writeln!(self.output, "{line}");
    }
}

/// Full round-trip precision, with `pi` fractions where they are exact.
fn fmt_angle(angle: f64) -> String {
    use std::f64::consts::PI;
    for denom in [1u32, 2, 4, 8, 16] {
        let value = PI / f64::from(denom);
        if angle == value {
            return if denom == 1 { "pi".into() } else { format!("pi/{denom}") };
        }
        if angle == -value {
            return if denom == 1 { "-pi".into() } else { format!("-pi/{denom}") };
        }
    }
    format!("{angle:?}")
}
