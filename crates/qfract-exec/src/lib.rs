//! qfract experiment execution
//!
//! Ties the pieces together: an [`Executor`] runs a circuit on the local
//! simulator or, when asked, on a remote [`RemoteService`] backend with a
//! single fallback hop to simulation; [`Report`] turns the resulting
//! histogram into a deterministic summary; [`ExperimentConfig`] carries the
//! experiment parameters.
//!
//! ```rust
//! use qfract_exec::{Executor, Report};
//! use qfract_ir::fractal;
//!
//! let rt = tokio::runtime::Runtime::new().unwrap();
//! let execution = rt
//!     .block_on(Executor::new().execute(&fractal(2, 1).unwrap(), 1000, false, "ibm_torino"))
//!     .unwrap();
//!
//! let report = Report::from_counts(&execution.counts, execution.shots);
//! assert_eq!(report.most_probable.unwrap().bitstring, "01");
//! ```
//!
//! [`RemoteService`]: qfract_hal::RemoteService

pub mod config;
pub mod error;
pub mod executor;
pub mod report;

pub use config::{ConfigError, ExperimentConfig, WaitConfig};
pub use error::{ExecError, ExecResult};
pub use executor::{Execution, Executor, FallbackReason};
pub use report::{Report, ReportEntry, render_bloch};
