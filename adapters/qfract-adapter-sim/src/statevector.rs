//! Statevector simulation engine.

use num_complex::Complex64;
use std::fmt;
use tracing::trace;

use qfract_ir::{EntangleKind, GateOp, QuantumCircuit, QubitId, RotationAxis};

use crate::density::DensityMatrix;
use crate::distribution::Probabilities;
use crate::error::{SimError, SimResult};

/// Widest register the engine will allocate (2^24 amplitudes, 256 MiB).
pub const MAX_QUBITS: u32 = 24;

/// Allowed deviation of the squared norm from 1 after any operation.
pub const NORM_TOLERANCE: f64 = 1e-9;

/// A pure quantum state of `n` qubits.
///
/// Amplitude `i` belongs to the basis state in which qubit `k` is bit `k` of
/// `i`. Values are immutable from the outside: [`apply`](Self::apply) consumes
/// the state and hands back the evolved one.
#[derive(Debug, Clone, PartialEq)]
pub struct Statevector {
    /// The state amplitudes (2^n complex numbers).
    amplitudes: Vec<Complex64>,
    /// Number of qubits.
    num_qubits: u32,
}

impl Statevector {
    /// The all-zeros state `|0…0⟩`.
    pub fn zero(num_qubits: u32) -> SimResult<Self> {
        if num_qubits == 0 {
            return Err(SimError::EmptyRegister);
        }
        if num_qubits > MAX_QUBITS {
            return Err(SimError::TooManyQubits {
                requested: num_qubits,
                max: MAX_QUBITS,
            });
        }
        let mut amplitudes = vec![Complex64::new(0.0, 0.0); 1 << num_qubits];
        amplitudes[0] = Complex64::new(1.0, 0.0);
        Ok(Self {
            amplitudes,
            num_qubits,
        })
    }

    /// Wrap explicit amplitudes. The length must be a power of two and the
    /// vector must be normalized.
    pub fn from_amplitudes(amplitudes: Vec<Complex64>) -> SimResult<Self> {
        let dim = amplitudes.len();
        if dim < 2 || !dim.is_power_of_two() {
            return Err(SimError::InvalidDimension(dim));
        }
        let num_qubits = dim.trailing_zeros();
        if num_qubits > MAX_QUBITS {
            return Err(SimError::TooManyQubits {
                requested: num_qubits,
                max: MAX_QUBITS,
            });
        }
        let state = Self {
            amplitudes,
            num_qubits,
        };
        state.check_norm(&"initialization")?;
        Ok(state)
    }

    /// Evolve `|0…0⟩` through a measurement-free circuit.
    ///
    /// Operations are applied in program order; barriers are skipped.
    pub fn evolve(circuit: &QuantumCircuit) -> SimResult<Self> {
        let initial = Self::zero(circuit.num_qubits())?;
        circuit
            .ops()
            .iter()
            .enumerate()
            .try_fold(initial, |state, (position, op)| {
                if op.is_measurement() {
                    return Err(SimError::MeasurementInUnitary { position });
                }
                state.apply(op)
            })
    }

    /// Apply one operation, returning the evolved state.
    pub fn apply(mut self, op: &GateOp) -> SimResult<Self> {
        match op {
            GateOp::Rotation { axis, angle, qubit } => {
                let q = self.check_qubit(*qubit)?;
                match axis {
                    RotationAxis::X => self.apply_rx(q, *angle),
                    RotationAxis::Y => self.apply_ry(q, *angle),
                    RotationAxis::Z => self.apply_rz(q, *angle),
                }
            }
            GateOp::Entangle {
                kind,
                control,
                target,
            } => {
                let c = self.check_qubit(*control)?;
                let t = self.check_qubit(*target)?;
                if c == t {
                    return Err(SimError::Circuit(qfract_ir::IrError::DuplicateQubit {
                        qubit: *control,
                        gate_name: Some(op.name().to_string()),
                    }));
                }
                match kind {
                    EntangleKind::Cx => self.apply_cx(c, t),
                    EntangleKind::Cz => self.apply_cz(c, t),
                }
            }
            GateOp::Barrier => return Ok(self),
            GateOp::Measurement { .. } => {
                return Err(SimError::MeasurementInUnitary { position: 0 });
            }
        }
        trace!(%op, "applied");
        self.check_norm(op)?;
        Ok(self)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Get the number of qubits.
    pub fn num_qubits(&self) -> u32 {
        self.num_qubits
    }

    /// Length of the amplitude vector, `2^n`.
    pub fn dim(&self) -> usize {
        self.amplitudes.len()
    }

    pub fn amplitudes(&self) -> &[Complex64] {
        &self.amplitudes
    }

    pub fn amplitude(&self, index: usize) -> Option<Complex64> {
        self.amplitudes.get(index).copied()
    }

    /// `Σ|a_i|²`.
    pub fn norm_sqr(&self) -> f64 {
        self.amplitudes.iter().map(Complex64::norm_sqr).sum()
    }

    /// Squared amplitude magnitudes keyed by basis bitstring.
    pub fn probabilities(&self) -> Probabilities {
        Probabilities::from_dense(self.num_qubits, &self.probability_vector())
    }

    /// Squared amplitude magnitudes indexed by basis index.
    pub fn probability_vector(&self) -> Vec<f64> {
        self.amplitudes.iter().map(Complex64::norm_sqr).collect()
    }

    /// Reduced density matrix of `keep_qubit`, tracing out every other qubit.
    pub fn partial_trace(&self, keep_qubit: u32) -> SimResult<DensityMatrix> {
        let q = self.check_qubit(QubitId(keep_qubit))?;
        Ok(self.reduce(q))
    }

    /// `ρ_ab = Σ_k ψ(a,k) ψ*(b,k)` for an index already known to be in range.
    pub(crate) fn reduce(&self, qubit: usize) -> DensityMatrix {
        let mask = 1 << qubit;
        let mut r00 = 0.0;
        let mut r11 = 0.0;
        let mut r01 = Complex64::new(0.0, 0.0);
        for i in 0..self.dim() {
            if i & mask == 0 {
                let a = self.amplitudes[i];
                let b = self.amplitudes[i | mask];
                r00 += a.norm_sqr();
                r11 += b.norm_sqr();
                r01 += a * b.conj();
            }
        }
        DensityMatrix::from_entries(
            Complex64::new(r00, 0.0),
            r01,
            r01.conj(),
            Complex64::new(r11, 0.0),
        )
    }

    fn check_qubit(&self, qubit: QubitId) -> SimResult<usize> {
        if qubit.0 >= self.num_qubits {
            return Err(SimError::InvalidQubitIndex {
                qubit: qubit.0,
                num_qubits: self.num_qubits,
            });
        }
        Ok(qubit.index())
    }

    fn check_norm(&self, after: &dyn fmt::Display) -> SimResult<()> {
        let norm_sqr = self.norm_sqr();
        if (norm_sqr - 1.0).abs() > NORM_TOLERANCE || !norm_sqr.is_finite() {
            return Err(SimError::NormDrift {
                norm_sqr,
                op: after.to_string(),
            });
        }
        Ok(())
    }

    // =========================================================================
    // Gate kernels
    // =========================================================================

    fn apply_rx(&mut self, qubit: usize, theta: f64) {
        let mask = 1 << qubit;
        let c = (theta / 2.0).cos();
        let neg_i_s = Complex64::new(0.0, -(theta / 2.0).sin());
        for i in 0..self.dim() {
            if i & mask == 0 {
                let j = i | mask;
                let a = self.amplitudes[i];
                let b = self.amplitudes[j];
                self.amplitudes[i] = c * a + neg_i_s * b;
                self.amplitudes[j] = neg_i_s * a + c * b;
            }
        }
    }

    fn apply_ry(&mut self, qubit: usize, theta: f64) {
        let mask = 1 << qubit;
        let c = (theta / 2.0).cos();
        let s = (theta / 2.0).sin();
        for i in 0..self.dim() {
            if i & mask == 0 {
                let j = i | mask;
                let a = self.amplitudes[i];
                let b = self.amplitudes[j];
                self.amplitudes[i] = c * a - s * b;
                self.amplitudes[j] = s * a + c * b;
            }
        }
    }

    fn apply_rz(&mut self, qubit: usize, theta: f64) {
        let mask = 1 << qubit;
        let phase_0 = Complex64::from_polar(1.0, -theta / 2.0);
        let phase_1 = Complex64::from_polar(1.0, theta / 2.0);
        for (i, amp) in self.amplitudes.iter_mut().enumerate() {
            *amp *= if i & mask == 0 { phase_0 } else { phase_1 };
        }
    }

    fn apply_cx(&mut self, control: usize, target: usize) {
        let ctrl_mask = 1 << control;
        let tgt_mask = 1 << target;
        for i in 0..self.dim() {
            if (i & ctrl_mask != 0) && (i & tgt_mask == 0) {
                self.amplitudes.swap(i, i | tgt_mask);
            }
        }
    }

    fn apply_cz(&mut self, control: usize, target: usize) {
        let both = (1 << control) | (1 << target);
        for (i, amp) in self.amplitudes.iter_mut().enumerate() {
            if i & both == both {
                *amp = -*amp;
            }
        }
    }
}
