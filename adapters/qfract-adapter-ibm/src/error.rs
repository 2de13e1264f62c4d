//! Error types for the IBM Quantum service.

use qfract_hal::HalError;
use thiserror::Error;

/// Result type for IBM operations.
pub type IbmResult<T> = Result<T, IbmError>;

/// Errors that can occur when using IBM Quantum.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum IbmError {
    /// Missing API token.
    #[error(
        "IBM Quantum API token not found. Set IBM_API_KEY or IBM_QUANTUM_TOKEN environment variable."
    )]
    MissingToken,

    /// Token cannot be used as a header value.
    #[error("Invalid IBM Quantum API token")]
    InvalidToken,

    /// IAM token exchange failed.
    #[error("IAM token exchange failed: {0}")]
    IamTokenExchange(String),

    /// API key given without a service CRN.
    #[error("IBM_SERVICE_CRN environment variable is required when using IBM_API_KEY")]
    MissingServiceCrn,

    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// API returned an error.
    #[error("IBM Quantum API error: {message}")]
    ApiError {
        /// Error code from API.
        code: Option<String>,
        /// Error message.
        message: String,
    },

    #[error("Job not found: {0}")]
    JobNotFound(String),

    #[error("Job failed: {0}")]
    JobFailed(String),

    #[error("Job was cancelled: {0}")]
    JobCancelled(String),

    /// Result document did not have a shape we understand.
    #[error("Unexpected result format: {0}")]
    ResultFormat(String),

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

impl From<IbmError> for HalError {
    fn from(e: IbmError) -> Self {
        match e {
            IbmError::MissingToken
            | IbmError::InvalidToken
            | IbmError::IamTokenExchange(_)
            | IbmError::MissingServiceCrn => HalError::AuthenticationFailed(e.to_string()),
            IbmError::HttpError(err) => HalError::Network(err),
            IbmError::JobNotFound(id) => HalError::JobNotFound(id),
            IbmError::JobFailed(msg) => HalError::JobFailed(msg),
            IbmError::JobCancelled(_) => HalError::JobCancelled,
            IbmError::ResultFormat(msg) => HalError::MalformedPayload(msg),
            IbmError::JsonError(err) => HalError::Serialization(err),
            IbmError::InvalidParameter(msg) => HalError::Configuration(msg),
            IbmError::ApiError { .. } => HalError::Backend(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -- Display message tests --

    #[test]
    fn test_missing_token_display() {
        let err = IbmError::MissingToken;
        assert!(err.to_string().contains("IBM_API_KEY"));
        assert!(err.to_string().contains("IBM_QUANTUM_TOKEN"));
    }

    #[test]
    fn test_api_error_display() {
        let err = IbmError::ApiError {
            code: Some("ERR_401".into()),
            message: "Unauthorized".into(),
        };
        assert!(err.to_string().contains("Unauthorized"));
    }

    #[test]
    fn test_job_failed_display() {
        let err = IbmError::JobFailed("circuit too deep".into());
        assert!(err.to_string().contains("circuit too deep"));
    }

    #[test]
    fn test_missing_service_crn_display() {
        let err = IbmError::MissingServiceCrn;
        assert!(err.to_string().contains("IBM_SERVICE_CRN"));
    }

    #[test]
    fn test_result_format_display() {
        let err = IbmError::ResultFormat("no results".into());
        assert!(err.to_string().contains("no results"));
    }

    // -- HalError conversion tests --

    #[test]
    fn test_credential_errors_to_hal_auth_failed() {
        for err in [
            IbmError::MissingToken,
            IbmError::InvalidToken,
            IbmError::IamTokenExchange("401".into()),
            IbmError::MissingServiceCrn,
        ] {
            let hal: HalError = err.into();
            assert!(matches!(hal, HalError::AuthenticationFailed(_)));
        }
    }

    #[test]
    fn test_job_errors_to_hal() {
        let hal: HalError = IbmError::JobNotFound("j1".into()).into();
        assert!(matches!(hal, HalError::JobNotFound(id) if id == "j1"));

        let hal: HalError = IbmError::JobFailed("boom".into()).into();
        assert!(matches!(hal, HalError::JobFailed(msg) if msg == "boom"));

        let hal: HalError = IbmError::JobCancelled("user".into()).into();
        assert!(matches!(hal, HalError::JobCancelled));
    }

    #[test]
    fn test_result_format_to_hal_malformed() {
        let hal: HalError = IbmError::ResultFormat("bad".into()).into();
        assert!(matches!(hal, HalError::MalformedPayload(msg) if msg == "bad"));
    }

    #[test]
    fn test_api_error_to_hal_backend() {
        let hal: HalError = IbmError::ApiError {
            code: None,
            message: "server error".into(),
        }
        .into();
        assert!(matches!(hal, HalError::Backend(msg) if msg.contains("server error")));
    }

    #[test]
    fn test_json_error_to_hal_serialization() {
        let err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let hal: HalError = IbmError::from(err).into();
        assert!(matches!(hal, HalError::Serialization(_)));
    }
}
