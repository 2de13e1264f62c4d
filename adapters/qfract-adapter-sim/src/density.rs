//! Single-qubit density matrices and Pauli observables.

use ndarray::{Array2, array};
use num_complex::Complex64;

use crate::error::{SimError, SimResult};

const ZERO: Complex64 = Complex64::new(0.0, 0.0);
const ONE: Complex64 = Complex64::new(1.0, 0.0);
const I: Complex64 = Complex64::new(0.0, 1.0);

/// Pauli X.
pub fn pauli_x() -> Array2<Complex64> {
    array![[ZERO, ONE], [ONE, ZERO]]
}

/// Pauli Y.
pub fn pauli_y() -> Array2<Complex64> {
    array![[ZERO, -I], [I, ZERO]]
}

/// Pauli Z.
pub fn pauli_z() -> Array2<Complex64> {
    array![[ONE, ZERO], [ZERO, -ONE]]
}

/// Reduced state of one qubit.
///
/// Built by [`Statevector::partial_trace`](crate::Statevector::partial_trace),
/// which guarantees a Hermitian, unit-trace, positive semidefinite matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct DensityMatrix {
    data: Array2<Complex64>,
}

impl DensityMatrix {
    /// Assemble from the four entries `ρ[row][col]`.
    pub(crate) fn from_entries(
        r00: Complex64,
        r01: Complex64,
        r10: Complex64,
        r11: Complex64,
    ) -> Self {
        Self {
            data: array![[r00, r01], [r10, r11]],
        }
    }

    /// Wrap an arbitrary 2×2 matrix after checking it is a valid density matrix.
    pub fn from_array(data: Array2<Complex64>, tolerance: f64) -> SimResult<Self> {
        if data.dim() != (2, 2) {
            return Err(SimError::InvalidDimension(data.len()));
        }
        let rho = Self { data };
        if !rho.is_hermitian(tolerance) {
            return Err(SimError::InvalidDistribution(
                "density matrix is not Hermitian".into(),
            ));
        }
        if (rho.trace().re - 1.0).abs() > tolerance {
            return Err(SimError::InvalidDistribution(format!(
                "density matrix trace is {}",
                rho.trace()
            )));
        }
        let [low, _] = rho.eigenvalues();
        if low < -tolerance {
            return Err(SimError::InvalidDistribution(format!(
                "density matrix has negative eigenvalue {low}"
            )));
        }
        Ok(rho)
    }

    /// Entry `ρ[row][col]`.
    pub fn get(&self, row: usize, col: usize) -> Complex64 {
        self.data[[row, col]]
    }

    pub fn as_array(&self) -> &Array2<Complex64> {
        &self.data
    }

    pub fn trace(&self) -> Complex64 {
        self.data.diag().sum()
    }

    /// `ρ == ρ†` within `tolerance` per entry.
    pub fn is_hermitian(&self, tolerance: f64) -> bool {
        self.data
            .indexed_iter()
            .all(|((r, c), v)| (v - self.data[[c, r]].conj()).norm() <= tolerance)
    }

    /// Eigenvalues in ascending order, treating the matrix as Hermitian.
    pub fn eigenvalues(&self) -> [f64; 2] {
        let a = self.data[[0, 0]].re;
        let d = self.data[[1, 1]].re;
        let b = self.data[[0, 1]];
        let mean = (a + d) / 2.0;
        let radius = (((a - d) / 2.0).powi(2) + b.norm_sqr()).sqrt();
        [mean - radius, mean + radius]
    }

    /// `tr(ρ²)`: 1 for a pure state, 1/2 for the maximally mixed one.
    pub fn purity(&self) -> f64 {
        self.data.dot(&self.data).diag().sum().re
    }

    /// `tr(ρ·O)`.
    pub fn expectation(&self, observable: &Array2<Complex64>) -> Complex64 {
        self.data.dot(observable).diag().sum()
    }
}
