//! Circuit model with validated, fluent construction.

use rustc_hash::FxHashMap;
use serde::Serialize;
use std::f64::consts::{FRAC_PI_2, PI};

use crate::error::{IrError, IrResult};
use crate::gate::{EntangleKind, GateOp, RotationAxis};
use crate::qubit::{ClbitId, QubitId};

/// An ordered sequence of operations over one quantum and one classical register.
///
/// Every operation is validated when appended, so a `QuantumCircuit` value
/// never references an index outside its registers. Callers that only hold a
/// shared reference cannot change it; [`strip_measurements`](Self::strip_measurements)
/// produces a new circuit rather than editing this one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuantumCircuit {
    name: String,
    num_qubits: u32,
    num_clbits: u32,
    ops: Vec<GateOp>,
}

impl QuantumCircuit {
    /// Create an empty circuit with `num_qubits` qubits and `num_clbits` classical bits.
    ///
    /// Requires `num_qubits >= 1` and `num_clbits <= num_qubits`.
    pub fn new(name: impl Into<String>, num_qubits: u32, num_clbits: u32) -> IrResult<Self> {
        if num_qubits == 0 {
            return Err(IrError::InvalidCircuitSpec(
                "circuit needs at least one qubit".into(),
            ));
        }
        if num_clbits > num_qubits {
            return Err(IrError::InvalidCircuitSpec(format!(
                "classical register ({num_clbits}) larger than quantum register ({num_qubits})"
            )));
        }
        Ok(Self {
            name: name.into(),
            num_qubits,
            num_clbits,
            ops: Vec::new(),
        })
    }

    /// Circuit with equally sized quantum and classical registers.
    pub fn with_size(name: impl Into<String>, num_qubits: u32) -> IrResult<Self> {
        Self::new(name, num_qubits, num_qubits)
    }

    // =========================================================================
    // Construction
    // =========================================================================

    /// Validate and append an operation.
    pub fn push(&mut self, op: GateOp) -> IrResult<&mut Self> {
        self.validate(&op)?;
        self.ops.push(op);
        Ok(self)
    }

    fn validate(&self, op: &GateOp) -> IrResult<()> {
        let gate_name = || Some(op.name().to_string());
        for qubit in op.qubits() {
            if qubit.0 >= self.num_qubits {
                return Err(IrError::QubitOutOfRange {
                    qubit,
                    num_qubits: self.num_qubits,
                    gate_name: gate_name(),
                });
            }
        }
        match op {
            GateOp::Rotation { angle, qubit, .. } if !angle.is_finite() => {
                Err(IrError::NonFiniteAngle {
                    angle: *angle,
                    qubit: *qubit,
                })
            }
            GateOp::Entangle {
                control, target, ..
            } if control == target => Err(IrError::DuplicateQubit {
                qubit: *control,
                gate_name: gate_name(),
            }),
            GateOp::Measurement { clbit, .. } if clbit.0 >= self.num_clbits => {
                Err(IrError::ClbitOutOfRange {
                    clbit: *clbit,
                    num_clbits: self.num_clbits,
                    gate_name: gate_name(),
                })
            }
            _ => Ok(()),
        }
    }

    fn rotation(&mut self, axis: RotationAxis, angle: f64, qubit: QubitId) -> IrResult<&mut Self> {
        self.push(GateOp::Rotation { axis, angle, qubit })
    }

    /// Apply Rx rotation.
    pub fn rx(&mut self, theta: f64, qubit: QubitId) -> IrResult<&mut Self> {
        self.rotation(RotationAxis::X, theta, qubit)
    }

    /// Apply Ry rotation.
    pub fn ry(&mut self, theta: f64, qubit: QubitId) -> IrResult<&mut Self> {
        self.rotation(RotationAxis::Y, theta, qubit)
    }

    /// Apply Rz rotation.
    pub fn rz(&mut self, theta: f64, qubit: QubitId) -> IrResult<&mut Self> {
        self.rotation(RotationAxis::Z, theta, qubit)
    }

    /// Hadamard, up to a global phase: `Rz(π)` then `Ry(π/2)`.
    pub fn h(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.rz(PI, qubit)?.ry(FRAC_PI_2, qubit)
    }

    /// Pauli-X, up to a global phase: `Rx(π)`.
    pub fn x(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.rx(PI, qubit)
    }

    /// Apply CNOT.
    pub fn cx(&mut self, control: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.push(GateOp::Entangle {
            kind: EntangleKind::Cx,
            control,
            target,
        })
    }

    /// Apply controlled-Z.
    pub fn cz(&mut self, control: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.push(GateOp::Entangle {
            kind: EntangleKind::Cz,
            control,
            target,
        })
    }

    /// Measure a qubit to a classical bit.
    pub fn measure(&mut self, qubit: QubitId, clbit: ClbitId) -> IrResult<&mut Self> {
        self.push(GateOp::Measurement { qubit, clbit })
    }

    /// Measure qubit `i` into classical bit `i` for every classical bit.
    pub fn measure_all(&mut self) -> IrResult<&mut Self> {
        for i in 0..self.num_clbits {
            self.measure(QubitId(i), ClbitId(i))?;
        }
        Ok(self)
    }

    /// Append a barrier across the whole register.
    pub fn barrier(&mut self) -> IrResult<&mut Self> {
        self.push(GateOp::Barrier)
    }

    // =========================================================================
    // Transforms
    // =========================================================================

    /// A copy of this circuit with every measurement removed.
    pub fn strip_measurements(&self) -> Self {
        Self {
            name: self.name.clone(),
            num_qubits: self.num_qubits,
            num_clbits: self.num_clbits,
            ops: self
                .ops
                .iter()
                .filter(|op| !op.is_measurement())
                .cloned()
                .collect(),
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Get the circuit name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the number of qubits.
    pub fn num_qubits(&self) -> u32 {
        self.num_qubits
    }

    /// Get the number of classical bits.
    pub fn num_clbits(&self) -> u32 {
        self.num_clbits
    }

    /// Operations in program order.
    pub fn ops(&self) -> &[GateOp] {
        &self.ops
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Number of operations per mnemonic.
    pub fn count_ops(&self) -> FxHashMap<&'static str, usize> {
        let mut counts = FxHashMap::default();
        for op in &self.ops {
            *counts.entry(op.name()).or_insert(0) += 1;
        }
        counts
    }

    pub fn num_rotations(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, GateOp::Rotation { .. }))
            .count()
    }

    pub fn num_entangling(&self) -> usize {
        self.ops.iter().filter(|op| op.is_entangling()).count()
    }

    pub fn num_measurements(&self) -> usize {
        self.ops.iter().filter(|op| op.is_measurement()).count()
    }

    /// `(qubit, clbit)` pairs of every measurement, in program order.
    pub fn measurement_map(&self) -> Vec<(QubitId, ClbitId)> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                GateOp::Measurement { qubit, clbit } => Some((*qubit, *clbit)),
                _ => None,
            })
            .collect()
    }

    /// Circuit depth: longest chain of operations sharing a qubit.
    ///
    /// A barrier aligns every qubit to the current maximum without adding a layer.
    pub fn depth(&self) -> usize {
        let mut layers = vec![0usize; self.num_qubits as usize];
        for op in &self.ops {
            match op {
                GateOp::Barrier => {
                    let max = layers.iter().copied().max().unwrap_or(0);
                    layers.iter_mut().for_each(|l| *l = max);
                }
                _ => {
                    let qubits = op.qubits();
                    let next = qubits
                        .iter()
                        .map(|q| layers[q.index()])
                        .max()
                        .unwrap_or(0)
                        + 1;
                    for q in qubits {
                        layers[q.index()] = next;
                    }
                }
            }
        }
        layers.into_iter().max().unwrap_or(0)
    }
}
