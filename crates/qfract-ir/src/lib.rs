//! qfract circuit model
//!
//! Data structures for the circuits that drive a qfract experiment: a single
//! contiguous quantum register, a classical register no wider than it, and an
//! ordered list of [`GateOp`]s validated as they are appended.
//!
//! # Example: the two-qubit fractal circuit
//!
//! ```rust
//! use qfract_ir::{builder, GateOp};
//!
//! let circuit = builder::fractal(2, 1).unwrap();
//!
//! assert_eq!(circuit.num_rotations(), 2);
//! assert_eq!(circuit.num_entangling(), 1);
//! assert_eq!(circuit.num_measurements(), 2);
//!
//! // Measurements are removed before pure-state analysis
//! let unitary = circuit.strip_measurements();
//! assert!(unitary.ops().iter().all(GateOp::is_unitary));
//! ```

pub mod basis;
pub mod builder;
pub mod circuit;
pub mod error;
pub mod gate;
pub mod presets;
pub mod qasm;
pub mod qubit;

pub use basis::{NATIVE_GATES, NativeOp};
pub use builder::{FractalSpec, fractal};
pub use circuit::QuantumCircuit;
pub use error::{IrError, IrResult};
pub use gate::{EntangleKind, GateOp, RotationAxis};
pub use qubit::{ClbitId, QubitId};
