//! IBM Quantum Platform REST client.
//!
//! Covers the calls the remote execution path needs:
//! - Authentication, either by IAM exchange of an API key or with a legacy
//!   bearer token
//! - Listing backends
//! - Submitting Sampler jobs
//! - Polling job status and fetching results
//!
//! Both the IBM Cloud API (`quantum.cloud.ibm.com/api`) and the legacy
//! endpoint (`api.quantum-computing.ibm.com`) are supported.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use reqwest::{Client, header};
use serde::Deserialize;

use qfract_hal::JobStatus;

use crate::error::{IbmError, IbmResult};

/// Default IBM Quantum Cloud API endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://quantum.cloud.ibm.com/api";

/// Legacy IBM Quantum API endpoint.
pub const LEGACY_ENDPOINT: &str = "https://api.quantum-computing.ibm.com";

/// IBM Cloud IAM token endpoint.
const IAM_TOKEN_URL: &str = "https://iam.cloud.ibm.com/identity/token";

/// IBM API version header value.
const IBM_API_VERSION: &str = "2026-02-01";

/// Cloudflare in front of the API rejects the default reqwest UA.
const USER_AGENT: &str = concat!("qfract/", env!("CARGO_PKG_VERSION"));

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// IBM Quantum API client.
pub struct IbmClient {
    client: Client,
    endpoint: String,
    /// Hub/group/project, legacy mode only.
    instance: Option<String>,
    cloud_api: bool,
}

impl fmt::Debug for IbmClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IbmClient")
            .field("endpoint", &self.endpoint)
            .field("token", &"[REDACTED]")
            .field("instance", &self.instance)
            .field("cloud_api", &self.cloud_api)
            .finish()
    }
}

#[derive(Deserialize)]
struct IamTokenResponse {
    access_token: String,
}

impl IbmClient {
    /// Client for the legacy direct-token API.
    ///
    /// For the IBM Cloud API, use [`IbmClient::connect`] instead.
    pub fn new(endpoint: impl Into<String>, token: &str) -> IbmResult<Self> {
        let client = build_http_client(json_headers(token)?)?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            instance: None,
            cloud_api: false,
        })
    }

    /// Client for the IBM Cloud API.
    ///
    /// Exchanges `api_key` for an IAM bearer token and attaches the
    /// `Service-CRN` header every Cloud API request requires.
    pub async fn connect(endpoint: &str, api_key: &str, service_crn: &str) -> IbmResult<Self> {
        let iam_client = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(CONNECT_TIMEOUT)
            .build()?;

        let iam_response = iam_client
            .post(IAM_TOKEN_URL)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(format!(
                "grant_type=urn:ibm:params:oauth:grant-type:apikey&apikey={api_key}"
            ))
            .send()
            .await
            .map_err(|e| IbmError::IamTokenExchange(e.to_string()))?;

        if !iam_response.status().is_success() {
            let status = iam_response.status();
            let body = iam_response
                .text()
                .await
                .unwrap_or_else(|_| "no body".to_string());
            return Err(IbmError::IamTokenExchange(format!(
                "IAM returned {status}: {body}"
            )));
        }

        let iam_token: IamTokenResponse = iam_response.json().await.map_err(|e| {
            IbmError::IamTokenExchange(format!("failed to parse IAM response: {e}"))
        })?;

        let mut headers = json_headers(&iam_token.access_token)?;
        headers.insert(
            header::HeaderName::from_static("service-crn"),
            header::HeaderValue::from_str(service_crn)
                .map_err(|_| IbmError::InvalidParameter("invalid Service-CRN value".into()))?,
        );
        headers.insert(
            header::HeaderName::from_static("ibm-api-version"),
            header::HeaderValue::from_static(IBM_API_VERSION),
        );

        Ok(Self {
            client: build_http_client(headers)?,
            endpoint: endpoint.to_string(),
            instance: None,
            cloud_api: true,
        })
    }

    /// Set the instance (hub/group/project) for legacy job submission.
    pub fn with_instance(mut self, instance: impl Into<String>) -> Self {
        self.instance = Some(instance.into());
        self
    }

    pub fn is_cloud_api(&self) -> bool {
        self.cloud_api
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Names of the backends that are currently online.
    pub async fn list_backends(&self) -> IbmResult<Vec<String>> {
        let url = format!("{}/v1/backends", self.endpoint);
        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(api_error(response, "list backends failed").await);
        }

        if self.cloud_api {
            let devices: DevicesResponse = response.json().await?;
            Ok(devices.online_names())
        } else {
            let backends: LegacyBackendsResponse = response.json().await?;
            Ok(backends.operational_names())
        }
    }

    /// Submit one circuit to the Sampler primitive.
    ///
    /// Uses the V2 PUB format on the Cloud API and the V1 format on the
    /// legacy endpoint.
    pub async fn submit_sampler_job(
        &self,
        backend: &str,
        program: &str,
        shots: u32,
    ) -> IbmResult<SubmitResponse> {
        let url = format!("{}/v1/jobs", self.endpoint);
        let body = sampler_request(
            backend,
            program,
            shots,
            self.cloud_api,
            self.instance.as_deref(),
        );

        let response = self.client.post(&url).json(&body).send().await?;

        if !response.status().is_success() {
            return Err(api_error(response, "job submission failed").await);
        }

        response.json().await.map_err(IbmError::from)
    }

    pub async fn get_job_status(&self, job_id: &str) -> IbmResult<JobStatusResponse> {
        let url = format!("{}/v1/jobs/{}", self.endpoint, job_id);
        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            if response.status() == reqwest::StatusCode::NOT_FOUND {
                return Err(IbmError::JobNotFound(job_id.to_string()));
            }
            return Err(api_error(response, "job status failed").await);
        }

        response.json().await.map_err(IbmError::from)
    }

    /// Raw result document of a finished job.
    pub async fn get_job_results(&self, job_id: &str) -> IbmResult<serde_json::Value> {
        let url = format!("{}/v1/jobs/{}/results", self.endpoint, job_id);
        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            if response.status() == reqwest::StatusCode::NOT_FOUND {
                return Err(IbmError::JobNotFound(job_id.to_string()));
            }
            return Err(api_error(response, "job results failed").await);
        }

        response.json().await.map_err(IbmError::from)
    }
}

fn json_headers(token: &str) -> IbmResult<header::HeaderMap> {
    let mut headers = header::HeaderMap::new();
    headers.insert(
        header::AUTHORIZATION,
        header::HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|_| IbmError::InvalidToken)?,
    );
    headers.insert(
        header::CONTENT_TYPE,
        header::HeaderValue::from_static("application/json"),
    );
    headers.insert(
        header::ACCEPT,
        header::HeaderValue::from_static("application/json"),
    );
    Ok(headers)
}

fn build_http_client(headers: header::HeaderMap) -> IbmResult<Client> {
    Ok(Client::builder()
        .user_agent(USER_AGENT)
        .default_headers(headers)
        .timeout(REQUEST_TIMEOUT)
        .connect_timeout(CONNECT_TIMEOUT)
        .build()?)
}

/// Turn a non-success response into an [`IbmError::ApiError`].
///
/// The legacy API sends `{code, message}`; the Cloud API sends free text.
async fn api_error(response: reqwest::Response, context: &str) -> IbmError {
    let status = response.status();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "no body".to_string());

    match serde_json::from_str::<ApiErrorResponse>(&body) {
        Ok(err) if !err.message.is_empty() => IbmError::ApiError {
            code: err.code,
            message: format!("{context}: {}", err.message),
        },
        _ => IbmError::ApiError {
            code: Some(status.as_u16().to_string()),
            message: format!("{context}: {body}"),
        },
    }
}

/// Sampler job body.
///
/// V2 wraps each circuit in a PUB `(circuit, params, shots)`. Programs arrive
/// already in the device basis; optimization level 1 lets IBM map logical
/// qubits onto the device.
fn sampler_request(
    backend: &str,
    program: &str,
    shots: u32,
    cloud_api: bool,
    instance: Option<&str>,
) -> serde_json::Value {
    if cloud_api {
        serde_json::json!({
            "program_id": "sampler",
            "backend": backend,
            "params": {
                "version": 2,
                "pubs": [[program, {}, shots]],
                "options": { "optimization_level": 1 }
            }
        })
    } else {
        let mut request = serde_json::json!({
            "program_id": "sampler",
            "backend": backend,
            "params": {
                "circuits": [program],
                "shots": shots,
                "skip_transpilation": false
            }
        });
        if let Some(hub) = instance {
            request["hub"] = serde_json::json!(hub);
        }
        request
    }
}

// ============================================================================
// Response types
// ============================================================================

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: String,
}

/// Cloud API device list (`{"devices": [...]}`).
#[derive(Debug, Deserialize)]
struct DevicesResponse {
    devices: Vec<DeviceEntry>,
}

#[derive(Debug, Deserialize)]
struct DeviceEntry {
    name: String,
    #[serde(default)]
    status: Option<DeviceStatus>,
}

#[derive(Debug, Deserialize)]
struct DeviceStatus {
    name: String,
}

impl DevicesResponse {
    /// Devices without a status are assumed online.
    fn online_names(self) -> Vec<String> {
        self.devices
            .into_iter()
            .filter(|d| {
                d.status
                    .as_ref()
                    .is_none_or(|s| s.name.eq_ignore_ascii_case("online"))
            })
            .map(|d| d.name)
            .collect()
    }
}

/// Legacy backend list (`{"backends": [...]}`).
#[derive(Debug, Deserialize)]
struct LegacyBackendsResponse {
    backends: Vec<LegacyBackend>,
}

#[derive(Debug, Deserialize)]
struct LegacyBackend {
    name: String,
    #[serde(default)]
    status: Option<LegacyBackendStatus>,
}

#[derive(Debug, Deserialize)]
struct LegacyBackendStatus {
    operational: bool,
}

impl LegacyBackendsResponse {
    fn operational_names(self) -> Vec<String> {
        self.backends
            .into_iter()
            .filter(|b| b.status.as_ref().is_none_or(|s| s.operational))
            .map(|b| b.name)
            .collect()
    }
}

/// Job submission response.
#[derive(Debug, Deserialize)]
pub struct SubmitResponse {
    pub id: String,
    #[serde(default)]
    pub status: String,
}

/// Job status response.
#[derive(Debug, Clone, Deserialize)]
pub struct JobStatusResponse {
    pub id: String,
    /// Top-level status; mixed case on the Cloud API.
    pub status: String,
    #[serde(default)]
    pub backend: Option<String>,
    /// Legacy API failure detail.
    #[serde(default)]
    pub error: Option<JobError>,
    /// Cloud API failure detail.
    #[serde(default)]
    pub state: Option<JobState>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JobError {
    #[serde(default)]
    pub code: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JobState {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub reason_code: Option<u32>,
}

impl JobStatusResponse {
    /// Failure reason, preferring the Cloud API's `state.reason`.
    pub fn error_message(&self) -> Option<String> {
        self.state
            .as_ref()
            .and_then(|s| s.reason.clone())
            .or_else(|| self.error.as_ref().map(|e| e.message.clone()))
    }

    /// Map onto the shared job lifecycle. Unknown states count as running.
    pub fn job_status(&self) -> JobStatus {
        match self.status.to_uppercase().as_str() {
            "QUEUED" | "INITIALIZING" => JobStatus::Queued,
            "COMPLETED" | "DONE" => JobStatus::Completed,
            "FAILED" | "ERROR" => JobStatus::Failed(
                self.error_message()
                    .unwrap_or_else(|| "Unknown error".to_string()),
            ),
            "CANCELLED" => JobStatus::Cancelled,
            _ => JobStatus::Running,
        }
    }
}

/// Sampler result document.
#[derive(Debug, Deserialize)]
pub struct JobResultResponse {
    /// Absent on the V2 results endpoint.
    #[serde(default)]
    pub id: Option<String>,
    pub results: Vec<SamplerResult>,
}

/// Sampler result for one circuit.
#[derive(Debug, Deserialize)]
pub struct SamplerResult {
    /// V2: classical register name to per-shot hex samples.
    #[serde(default)]
    pub data: Option<BTreeMap<String, ClassicalRegisterData>>,
    /// V1: quasi-probability distributions.
    #[serde(default)]
    pub quasi_dists: Option<Vec<BTreeMap<String, f64>>>,
    /// V1: pre-aggregated counts.
    #[serde(default)]
    pub counts: Option<BTreeMap<String, u64>>,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

/// Classical register data from V2 Sampler results.
#[derive(Debug, Deserialize)]
pub struct ClassicalRegisterData {
    /// One hex string per shot, e.g. `["0x0", "0x2", ...]`.
    pub samples: Vec<String>,
}
