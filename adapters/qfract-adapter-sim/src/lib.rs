//! qfract local statevector simulator
//!
//! Exact pure-state simulation of qfract circuits, plus the analysis built on
//! it: outcome distributions, shot sampling, single-qubit partial traces and
//! Bloch vectors.
//!
//! # Memory
//!
//! | Qubits | Memory |
//! |--------|--------|
//! | 10 | ~16 KB |
//! | 15 | ~512 KB |
//! | 20 | ~16 MB |
//! | 24 | ~256 MB |
//!
//! # Example
//!
//! ```rust
//! use qfract_adapter_sim::{Sampler, SimulatorBackend, bloch_vectors_for};
//! use qfract_ir::fractal;
//!
//! let circuit = fractal(3, 2).unwrap();
//!
//! let result = SimulatorBackend::new()
//!     .run(&circuit, 1000, &mut Sampler::seeded(7))
//!     .unwrap();
//! assert_eq!(result.counts.total_shots(), 1000);
//!
//! for v in bloch_vectors_for(&circuit).unwrap() {
//!     assert!(v.norm() <= 1.0 + 1e-9);
//! }
//! ```

pub mod density;
pub mod distribution;
pub mod error;
pub mod observable;
pub mod sampler;
pub mod simulator;
pub mod statevector;

pub use density::{DensityMatrix, pauli_x, pauli_y, pauli_z};
pub use distribution::{Probabilities, SUPPORT_EPSILON, bitstring};
pub use error::{SimError, SimResult};
pub use observable::{BlochVector, bloch_vectors, bloch_vectors_for};
pub use sampler::Sampler;
pub use simulator::{SimulatorBackend, measured_distribution};
pub use statevector::{MAX_QUBITS, NORM_TOLERANCE, Statevector};
