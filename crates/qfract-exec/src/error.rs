//! Error types for experiment execution.

use thiserror::Error;

use qfract_adapter_sim::SimError;
use qfract_ir::IrError;

use crate::config::ConfigError;

/// Fatal execution errors.
///
/// Remote failures never appear here; they end up in
/// [`FallbackReason`](crate::FallbackReason) instead.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ExecError {
    #[error("Invalid circuit: {0}")]
    InvalidCircuitSpec(#[from] IrError),

    #[error("Shot count must be at least 1")]
    InvalidShots,

    /// Local simulation failed; this is the baseline and is not retried.
    #[error("Simulation failed: {0}")]
    Simulation(#[from] SimError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Result type for execution.
pub type ExecResult<T> = Result<T, ExecError>;
