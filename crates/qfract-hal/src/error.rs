//! Error types for the HAL crate.

use thiserror::Error;

/// Errors raised while talking to a remote execution service.
///
/// None of these abort an experiment: the executor turns every one of them
/// into a fallback to local simulation.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum HalError {
    /// Named backend is not among those the service reports.
    #[error("Backend not available: {0}")]
    BackendUnavailable(String),

    /// Credentials missing or rejected.
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Job submission failed.
    #[error("Job submission failed: {0}")]
    SubmissionFailed(String),

    /// Job execution failed.
    #[error("Job failed: {0}")]
    JobFailed(String),

    /// Job was cancelled.
    #[error("Job cancelled")]
    JobCancelled,

    /// Job not found.
    #[error("Job not found: {0}")]
    JobNotFound(String),

    /// Network error.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Result payload could not be turned into counts.
    #[error("Malformed result payload: {0}")]
    MalformedPayload(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Timeout waiting for job.
    #[error("Timeout waiting for job {0}")]
    Timeout(String),

    /// Generic backend error.
    #[error("Backend error: {0}")]
    Backend(String),
}

impl HalError {
    /// Short machine-friendly label for logs and reports.
    pub fn kind(&self) -> &'static str {
        match self {
            HalError::BackendUnavailable(_) => "backend_unavailable",
            HalError::AuthenticationFailed(_) => "authentication",
            HalError::SubmissionFailed(_) => "submission",
            HalError::JobFailed(_) => "job_failed",
            HalError::JobCancelled => "job_cancelled",
            HalError::JobNotFound(_) => "job_not_found",
            HalError::Network(_) => "network",
            HalError::Serialization(_) => "serialization",
            HalError::MalformedPayload(_) => "malformed_payload",
            HalError::Configuration(_) => "configuration",
            HalError::Timeout(_) => "timeout",
            HalError::Backend(_) => "backend",
        }
    }
}

/// Result type for HAL operations.
pub type HalResult<T> = Result<T, HalError>;
