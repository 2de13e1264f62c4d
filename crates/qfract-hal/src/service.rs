//! Remote execution service abstraction.
//!
//! A [`RemoteService`] fronts a provider that runs circuits on named hardware
//! backends. The lifecycle an executor drives is:
//!
//! ```text
//!   list_backends() ──→ compile() ──→ submit() ──→ await_result() ──→ extract_counts()
//!      (async)           (async)       (async)       (async, bounded)     (sync)
//! ```
//!
//! | Method | Kind | Required | Returns |
//! |--------|------|----------|---------|
//! | `provider()` | sync | yes | `&str` |
//! | `list_backends()` | async | yes | `HalResult<Vec<String>>` |
//! | `compile()` | async | yes | `HalResult<JobSpec>` |
//! | `submit()` | async | yes | `HalResult<JobId>` |
//! | `status()` | async | yes | `HalResult<JobStatus>` |
//! | `fetch_payload()` | async | yes | `HalResult<RawPayload>` |
//! | `await_result()` | async | provided | `HalResult<RawPayload>` |
//! | `extract_counts()` | sync | yes | `HalResult<Counts>` |

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use qfract_ir::QuantumCircuit;

use crate::error::{HalError, HalResult};
use crate::job::{JobId, JobStatus};
use crate::result::Counts;

/// Where an execution request runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "name", rename_all = "lowercase")]
pub enum BackendTarget {
    /// Local statevector simulation.
    Simulator,
    /// Named hardware backend of the remote service.
    Remote(String),
}

impl BackendTarget {
    pub fn is_remote(&self) -> bool {
        matches!(self, BackendTarget::Remote(_))
    }
}

impl fmt::Display for BackendTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendTarget::Simulator => write!(f, "simulator"),
            BackendTarget::Remote(name) => write!(f, "{name}"),
        }
    }
}

/// A circuit prepared for one remote backend.
///
/// Produced by [`RemoteService::compile`]; the program text is whatever the
/// provider accepts and is not inspected by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSpec {
    /// Target backend name.
    pub backend: String,
    /// Program in the provider's input language.
    pub program: String,
    /// Register width of the source circuit.
    pub num_qubits: u32,
    /// Classical register width; extracted bitstrings are padded to this.
    pub num_clbits: u32,
}

/// Unparsed result document returned by a remote service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawPayload(pub serde_json::Value);

/// How long and how often to poll a remote job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitPolicy {
    /// Delay between status polls.
    pub poll_interval: Duration,
    /// Upper bound on the whole wait.
    pub timeout: Duration,
}

impl WaitPolicy {
    pub fn new(poll_interval: Duration, timeout: Duration) -> Self {
        Self {
            poll_interval,
            timeout,
        }
    }
}

impl Default for WaitPolicy {
    /// 500ms polls for up to 5 minutes.
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(500),
            timeout: Duration::from_secs(300),
        }
    }
}

/// A provider of remote quantum hardware.
///
/// Implementations own their credentials; they must never log tokens.
#[async_trait]
pub trait RemoteService: Send + Sync {
    /// Provider name, for logs.
    fn provider(&self) -> &str;

    /// Names of the backends currently accepting work.
    async fn list_backends(&self) -> HalResult<Vec<String>>;

    /// Adapt a circuit for `backend`.
    async fn compile(&self, circuit: &QuantumCircuit, backend: &str) -> HalResult<JobSpec>;

    /// Submit a compiled job for `shots` repetitions.
    async fn submit(&self, spec: &JobSpec, shots: u32) -> HalResult<JobId>;

    /// Get the status of a job.
    async fn status(&self, job_id: &JobId) -> HalResult<JobStatus>;

    /// Fetch the result document of a completed job.
    async fn fetch_payload(&self, job_id: &JobId) -> HalResult<RawPayload>;

    /// Turn a result document into a histogram over `spec.num_clbits` bits.
    fn extract_counts(&self, payload: &RawPayload, spec: &JobSpec) -> HalResult<Counts>;

    /// Poll until the job is terminal and return its payload.
    ///
    /// Gives up with [`HalError::Timeout`] once `policy.timeout` has elapsed.
    async fn await_result(&self, job_id: &JobId, policy: &WaitPolicy) -> HalResult<RawPayload> {
        use tokio::time::{Instant, sleep};

        let deadline = Instant::now() + policy.timeout;
        loop {
            let status = self.status(job_id).await?;
            debug!(job = %job_id, %status, "polled remote job");
            match status {
                JobStatus::Completed => return self.fetch_payload(job_id).await,
                JobStatus::Failed(msg) => return Err(HalError::JobFailed(msg)),
                JobStatus::Cancelled => return Err(HalError::JobCancelled),
                JobStatus::Queued | JobStatus::Running => {
                    if Instant::now() + policy.poll_interval > deadline {
                        return Err(HalError::Timeout(job_id.0.clone()));
                    }
                    sleep(policy.poll_interval).await;
                }
            }
        }
    }
}
