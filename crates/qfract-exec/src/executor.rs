//! Backend selection with one-hop fallback to local simulation.
//!
//! ```text
//!            use_real
//!   Start ─────────────→ TryRemote ──(any failure)──┐
//!     │                      │                      ▼
//!     └──── !use_real ───────┼──────────────────→ Simulate
//!                            │ ok                   │
//!                            ▼                      ▼
//!                          Done ←───────────────────┘
//! ```
//!
//! `Simulate` has no edge back to `TryRemote`, so an execution makes at most
//! one remote attempt.
//! The whole remote attempt, from listing backends to the final poll, runs
//! under a single deadline taken from the [`WaitPolicy`] timeout.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use qfract_adapter_sim::{Sampler, SimulatorBackend};
use qfract_hal::{
    BackendTarget, Counts, HalError, HalResult, Job, JobStatus, RemoteService, WaitPolicy,
};
use qfract_ir::QuantumCircuit;

use crate::error::{ExecError, ExecResult};

/// Why a remote request ended up on the simulator.
#[derive(Debug)]
pub enum FallbackReason {
    /// The requested backend is not among those the service lists.
    BackendUnavailable {
        requested: String,
        available: Vec<String>,
    },
    /// Any failure or timeout while listing, compiling, submitting, waiting or extracting.
    RemoteExecutionFailure(HalError),
}

impl FallbackReason {
    pub fn kind(&self) -> &'static str {
        match self {
            FallbackReason::BackendUnavailable { .. } => "backend_unavailable",
            FallbackReason::RemoteExecutionFailure(_) => "remote_execution_failure",
        }
    }
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FallbackReason::BackendUnavailable {
                requested,
                available,
            } if available.is_empty() => {
                write!(f, "backend '{requested}' not available (no backends listed)")
            }
            FallbackReason::BackendUnavailable {
                requested,
                available,
            } => write!(
                f,
                "backend '{requested}' not available (available: {})",
                available.join(", ")
            ),
            FallbackReason::RemoteExecutionFailure(err) => {
                write!(f, "remote execution failed: {err}")
            }
        }
    }
}

impl Serialize for FallbackReason {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("FallbackReason", 3)?;
        s.serialize_field("reason", self.kind())?;
        s.serialize_field("detail", &self.to_string())?;
        match self {
            FallbackReason::BackendUnavailable { available, .. } => {
                s.serialize_field("available", available)?;
            }
            FallbackReason::RemoteExecutionFailure(err) => {
                s.serialize_field("error_kind", err.kind())?;
            }
        }
        s.end()
    }
}

/// Outcome of one [`Executor::execute`] call.
#[derive(Debug, Serialize)]
pub struct Execution {
    pub run_id: Uuid,
    pub requested: BackendTarget,
    /// Where the counts actually came from.
    pub executed_on: BackendTarget,
    pub counts: Counts,
    pub shots: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback: Option<FallbackReason>,
    /// The remote job, if one was submitted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_job: Option<Job>,
    pub started_at: DateTime<Utc>,
    #[serde(rename = "elapsed_ms", serialize_with = "serialize_millis")]
    pub elapsed: Duration,
}

impl Execution {
    pub fn fell_back(&self) -> bool {
        self.fallback.is_some()
    }

    pub fn into_counts(self) -> Counts {
        self.counts
    }
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn serialize_millis<S: Serializer>(d: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
}

enum State {
    Start,
    TryRemote,
    Simulate(Option<FallbackReason>),
    Done {
        counts: Counts,
        executed_on: BackendTarget,
        fallback: Option<FallbackReason>,
    },
}

/// Runs circuits on the simulator or a remote service.
///
/// Each call builds its own sampler, so an `Executor` holds no mutable state
/// and can be shared across tasks behind an `Arc`.
pub struct Executor {
    simulator: SimulatorBackend,
    remote: Option<Arc<dyn RemoteService>>,
    wait: WaitPolicy,
    seed: Option<u64>,
}

impl Executor {
    /// Simulator-only executor.
    pub fn new() -> Self {
        Self {
            simulator: SimulatorBackend::new(),
            remote: None,
            wait: WaitPolicy::default(),
            seed: None,
        }
    }

    pub fn with_remote(mut self, remote: Arc<dyn RemoteService>) -> Self {
        self.remote = Some(remote);
        self
    }

    pub fn with_wait_policy(mut self, wait: WaitPolicy) -> Self {
        self.wait = wait;
        self
    }

    /// Seed every sampler this executor creates.
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_simulator(mut self, simulator: SimulatorBackend) -> Self {
        self.simulator = simulator;
        self
    }

    pub fn remote(&self) -> Option<&Arc<dyn RemoteService>> {
        self.remote.as_ref()
    }

    pub fn wait_policy(&self) -> &WaitPolicy {
        &self.wait
    }

    /// Run `circuit` for `shots` shots.
    ///
    /// With `use_real` the named remote backend is tried first; whatever goes
    /// wrong there is recorded in [`Execution::fallback`] and the circuit is
    /// simulated instead. Only invalid input and simulation failures are
    /// returned as errors.
    #[instrument(
        skip(self, circuit),
        fields(circuit = circuit.name(), qubits = circuit.num_qubits())
    )]
    pub async fn execute(
        &self,
        circuit: &QuantumCircuit,
        shots: u32,
        use_real: bool,
        backend_name: &str,
    ) -> ExecResult<Execution> {
        if shots == 0 {
            return Err(ExecError::InvalidShots);
        }

        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let start = Instant::now();
        let requested = if use_real {
            BackendTarget::Remote(backend_name.to_string())
        } else {
            BackendTarget::Simulator
        };
        let mut remote_job = None;

        let mut state = State::Start;
        let (counts, executed_on, fallback) = loop {
            state = match state {
                State::Start if use_real => State::TryRemote,
                State::Start => State::Simulate(None),
                State::TryRemote => {
                    match self
                        .try_remote(circuit, shots, backend_name, &mut remote_job)
                        .await
                    {
                        Ok(counts) => State::Done {
                            counts,
                            executed_on: requested.clone(),
                            fallback: None,
                        },
                        Err(reason) => {
                            warn!(reason = reason.kind(), "{reason}; falling back to simulator");
                            State::Simulate(Some(reason))
                        }
                    }
                }
                State::Simulate(fallback) => State::Done {
                    counts: self.simulate(circuit, shots)?,
                    executed_on: BackendTarget::Simulator,
                    fallback,
                },
                State::Done {
                    counts,
                    executed_on,
                    fallback,
                } => break (counts, executed_on, fallback),
            };
        };

        info!(%run_id, %executed_on, shots, outcomes = counts.len(), "execution finished");

        Ok(Execution {
            run_id,
            requested,
            executed_on,
            counts,
            shots,
            fallback,
            remote_job,
            started_at,
            elapsed: start.elapsed(),
        })
    }

    /// [`execute`](Self::execute), keeping only the histogram.
    pub async fn execute_counts(
        &self,
        circuit: &QuantumCircuit,
        shots: u32,
        use_real: bool,
        backend_name: &str,
    ) -> ExecResult<Counts> {
        Ok(self
            .execute(circuit, shots, use_real, backend_name)
            .await?
            .into_counts())
    }

    fn simulate(&self, circuit: &QuantumCircuit, shots: u32) -> ExecResult<Counts> {
        let mut sampler = Sampler::from_seed(self.seed);
        let result = self.simulator.run(circuit, shots, &mut sampler)?;
        Ok(result.counts)
    }

    async fn try_remote(
        &self,
        circuit: &QuantumCircuit,
        shots: u32,
        backend_name: &str,
        remote_job: &mut Option<Job>,
    ) -> Result<Counts, FallbackReason> {
        use FallbackReason::RemoteExecutionFailure;

        let Some(service) = &self.remote else {
            return Err(RemoteExecutionFailure(HalError::AuthenticationFailed(
                "no remote service credentials configured".into(),
            )));
        };

        // One deadline covers listing, compiling, submitting and waiting
        let deadline = tokio::time::Instant::now() + self.wait.timeout;

        let available = within(deadline, service.list_backends(), || "backend listing".into())
            .await
            .map_err(RemoteExecutionFailure)?;
        if !available.iter().any(|name| name == backend_name) {
            info!(
                provider = service.provider(),
                requested = backend_name,
                "backend not available; available backends: [{}]",
                available.join(", ")
            );
            return Err(FallbackReason::BackendUnavailable {
                requested: backend_name.to_string(),
                available,
            });
        }

        let spec = within(deadline, service.compile(circuit, backend_name), || {
            format!("compilation for {backend_name}")
        })
        .await
        .map_err(RemoteExecutionFailure)?;
        let job_id = within(deadline, service.submit(&spec, shots), || {
            format!("submission to {backend_name}")
        })
        .await
        .map_err(RemoteExecutionFailure)?;
        info!(
            provider = service.provider(),
            job = %job_id,
            backend = backend_name,
            "remote job submitted"
        );
        let job = remote_job.insert(Job::new(job_id.clone(), backend_name, shots));

        let waited = within(deadline, service.await_result(&job_id, &self.wait), || {
            job_id.0.clone()
        })
        .await;
        let payload = match waited {
            Ok(payload) => {
                job.update(JobStatus::Completed);
                payload
            }
            Err(err) => {
                job.update(terminal_status(&err));
                return Err(RemoteExecutionFailure(err));
            }
        };

        let counts = service
            .extract_counts(&payload, &spec)
            .map_err(RemoteExecutionFailure)?;
        check_counts(&counts, shots, spec.num_clbits).map_err(RemoteExecutionFailure)?;

        debug!(outcomes = counts.len(), "remote counts extracted");
        Ok(counts)
    }
}

impl Default for Executor {
    fn default() -> Self {
        Self::new()
    }
}

/// Await one remote step, failing with [`HalError::Timeout`] past `deadline`.
async fn within<T>(
    deadline: tokio::time::Instant,
    step: impl Future<Output = HalResult<T>>,
    waiting_for: impl FnOnce() -> String,
) -> HalResult<T> {
    match tokio::time::timeout_at(deadline, step).await {
        Ok(result) => result,
        Err(_) => Err(HalError::Timeout(waiting_for())),
    }
}

/// Job status implied by an error from the wait.
fn terminal_status(err: &HalError) -> JobStatus {
    match err {
        HalError::JobCancelled => JobStatus::Cancelled,
        HalError::JobFailed(msg) => JobStatus::Failed(msg.clone()),
        other => JobStatus::Failed(other.to_string()),
    }
}

/// A remote histogram must account for every shot over the full register.
fn check_counts(counts: &Counts, shots: u32, width: u32) -> Result<(), HalError> {
    let total = counts.total_shots();
    if total != u64::from(shots) {
        return Err(HalError::MalformedPayload(format!(
            "histogram sums to {total}, expected {shots}"
        )));
    }
    if let Some((bits, _)) = counts.iter().find(|(bits, _)| bits.len() != width as usize) {
        return Err(HalError::MalformedPayload(format!(
            "bitstring '{bits}' does not match the {width}-bit register"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use qfract_ir::fractal;

    #[tokio::test]
    async fn test_simulator_path() {
        let executor = Executor::new().with_seed(Some(3));
        let execution = executor
            .execute(&fractal(2, 1).unwrap(), 1000, false, "ibm_torino")
            .await
            .unwrap();
        assert_eq!(execution.requested, BackendTarget::Simulator);
        assert_eq!(execution.executed_on, BackendTarget::Simulator);
        assert!(!execution.fell_back());
        assert!(execution.remote_job.is_none());
        assert_eq!(execution.counts.get("01"), 1000);
    }

    #[tokio::test]
    async fn test_zero_shots_is_fatal() {
        let err = Executor::new()
            .execute(&fractal(2, 1).unwrap(), 0, true, "ibm_torino")
            .await
            .unwrap_err();
        assert!(matches!(err, ExecError::InvalidShots));
    }

    #[tokio::test]
    async fn test_missing_remote_falls_back() {
        let execution = Executor::new()
            .execute(&fractal(3, 2).unwrap(), 500, true, "ibm_torino")
            .await
            .unwrap();
        assert_eq!(
            execution.requested,
            BackendTarget::Remote("ibm_torino".into())
        );
        assert_eq!(execution.executed_on, BackendTarget::Simulator);
        assert!(matches!(
            execution.fallback,
            Some(FallbackReason::RemoteExecutionFailure(
                HalError::AuthenticationFailed(_)
            ))
        ));
        assert_eq!(execution.counts.total_shots(), 500);
    }

    #[test]
    fn test_check_counts() {
        let counts: Counts = [("01", 600), ("10", 400)].into_iter().collect();
        assert!(check_counts(&counts, 1000, 2).is_ok());
        assert!(matches!(
            check_counts(&counts, 999, 2),
            Err(HalError::MalformedPayload(_))
        ));
        assert!(matches!(
            check_counts(&counts, 1000, 3),
            Err(HalError::MalformedPayload(_))
        ));
    }

    #[test]
    fn test_terminal_status() {
        assert_eq!(terminal_status(&HalError::JobCancelled), JobStatus::Cancelled);
        assert_eq!(
            terminal_status(&HalError::JobFailed("boom".into())),
            JobStatus::Failed("boom".into())
        );
    }

    #[test]
    fn test_fallback_reason_display() {
        let reason = FallbackReason::BackendUnavailable {
            requested: "nonexistent".into(),
            available: vec!["ibm_fez".into(), "ibm_torino".into()],
        };
        assert_eq!(
            reason.to_string(),
            "backend 'nonexistent' not available (available: ibm_fez, ibm_torino)"
        );

        let json = serde_json::to_value(&reason).unwrap();
        assert_eq!(json["reason"], "backend_unavailable");
        assert_eq!(json["available"][1], "ibm_torino");
    }

    #[tokio::test]
    async fn test_execution_serializes() {
        let execution = Executor::new()
            .with_seed(Some(1))
            .execute(&fractal(2, 1).unwrap(), 10, false, "ibm_torino")
            .await
            .unwrap();
        let json = serde_json::to_value(&execution).unwrap();
        assert_eq!(json["executed_on"]["kind"], "simulator");
        assert_eq!(json["counts"]["01"], 10);
        assert!(json.get("fallback").is_none());
        assert!(json["elapsed_ms"].is_u64());
    }
}
