//! [`RemoteService`] implementation for IBM Quantum.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, info};

use qfract_hal::{
    Counts, HalError, HalResult, JobId, JobSpec, JobStatus, RawPayload, RemoteService,
    ServiceConfig,
};
use qfract_ir::{QuantumCircuit, qasm};

use crate::api::{DEFAULT_ENDPOINT, IbmClient, JobResultResponse, LEGACY_ENDPOINT};
use crate::error::{IbmError, IbmResult};

/// How long a backend listing is reused before asking the API again.
const BACKEND_LIST_TTL: Duration = Duration::from_secs(5 * 60);

/// Key in [`ServiceConfig::extra`] that selects the IBM Cloud IAM flow.
pub const SERVICE_CRN_KEY: &str = "service_crn";

/// IBM Quantum as a remote execution service.
#[derive(Debug)]
pub struct IbmService {
    client: IbmClient,
    backends: RwLock<Option<(Vec<String>, Instant)>>,
}

impl IbmService {
    pub fn new(client: IbmClient) -> Self {
        Self {
            client,
            backends: RwLock::new(None),
        }
    }

    /// Credentials from the environment.
    ///
    /// `IBM_API_KEY` together with `IBM_SERVICE_CRN` selects the Cloud API;
    /// otherwise `IBM_QUANTUM_TOKEN` selects the legacy endpoint.
    pub fn config_from_env() -> IbmResult<ServiceConfig> {
        if let Ok(api_key) = std::env::var("IBM_API_KEY") {
            let service_crn =
                std::env::var("IBM_SERVICE_CRN").map_err(|_| IbmError::MissingServiceCrn)?;
            return Ok(ServiceConfig::new("ibm")
                .with_endpoint(DEFAULT_ENDPOINT)
                .with_token(api_key)
                .with_extra(SERVICE_CRN_KEY, serde_json::Value::String(service_crn)));
        }

        if let Ok(token) = std::env::var("IBM_QUANTUM_TOKEN") {
            return Ok(ServiceConfig::new("ibm")
                .with_endpoint(LEGACY_ENDPOINT)
                .with_token(token));
        }

        Err(IbmError::MissingToken)
    }

    /// Connect with explicit settings.
    ///
    /// A `service_crn` entry in `extra` triggers the IAM exchange with the
    /// token as API key; without it the token is used directly.
    pub async fn connect(config: &ServiceConfig) -> IbmResult<Self> {
        if !config.has_credentials() {
            return Err(IbmError::MissingToken);
        }
        let token = config.token.as_deref().unwrap_or_default();

        let service_crn = config.extra.get(SERVICE_CRN_KEY).and_then(|v| v.as_str());
        let client = match service_crn {
            Some(crn) => {
                info!("connecting to IBM Cloud API (IAM key exchange)");
                let endpoint = config.endpoint.as_deref().unwrap_or(DEFAULT_ENDPOINT);
                IbmClient::connect(endpoint, token, crn).await?
            }
            None => {
                info!("using legacy IBM Quantum token");
                let endpoint = config.endpoint.as_deref().unwrap_or(LEGACY_ENDPOINT);
                let client = IbmClient::new(endpoint, token)?;
                match &config.instance {
                    Some(instance) => client.with_instance(instance),
                    None => client,
                }
            }
        };

        Ok(Self::new(client))
    }

    /// [`config_from_env`](Self::config_from_env) followed by [`connect`](Self::connect).
    pub async fn from_env() -> IbmResult<Self> {
        Self::connect(&Self::config_from_env()?).await
    }

    pub fn client(&self) -> &IbmClient {
        &self.client
    }
}

#[async_trait]
impl RemoteService for IbmService {
    #[allow(clippy::unnecessary_literal_bound)]
    fn provider(&self) -> &str {
        "ibm"
    }

    async fn list_backends(&self) -> HalResult<Vec<String>> {
        if let Some((names, fetched)) = self.backends.read().await.as_ref() {
            if fetched.elapsed() < BACKEND_LIST_TTL {
                return Ok(names.clone());
            }
        }

        let names = self.client.list_backends().await?;
        debug!(count = names.len(), "fetched IBM backend list");
        *self.backends.write().await = Some((names.clone(), Instant::now()));
        Ok(names)
    }

    async fn compile(&self, circuit: &QuantumCircuit, backend: &str) -> HalResult<JobSpec> {
        // The V2 sampler only accepts circuits already in the device basis
        Ok(JobSpec {
            backend: backend.to_string(),
            program: qasm::emit_native(circuit),
            num_qubits: circuit.num_qubits(),
            num_clbits: circuit.num_clbits(),
        })
    }

    async fn submit(&self, spec: &JobSpec, shots: u32) -> HalResult<JobId> {
        let response = self
            .client
            .submit_sampler_job(&spec.backend, &spec.program, shots)
            .await
            .map_err(|e| match e {
                IbmError::ApiError { .. } => HalError::SubmissionFailed(e.to_string()),
                other => other.into(),
            })?;

        info!(job = %response.id, backend = %spec.backend, shots, "submitted IBM job");
        Ok(JobId(response.id))
    }

    async fn status(&self, job_id: &JobId) -> HalResult<JobStatus> {
        let status = self.client.get_job_status(&job_id.0).await?;
        Ok(status.job_status())
    }

    async fn fetch_payload(&self, job_id: &JobId) -> HalResult<RawPayload> {
        let value = self.client.get_job_results(&job_id.0).await?;
        Ok(RawPayload(value))
    }

    fn extract_counts(&self, payload: &RawPayload, spec: &JobSpec) -> HalResult<Counts> {
        let results: JobResultResponse =
            serde_json::from_value(payload.0.clone()).map_err(IbmError::from)?;
        Ok(results_to_counts(&results, spec.num_clbits as usize)?)
    }
}

/// Convert a Sampler result document to counts over `width` classical bits.
///
/// V2 per-shot samples are preferred, then V1 counts, then V1
/// quasi-distributions scaled by the shot count recorded in the metadata.
/// A `width` of 0 infers the width from the largest observed value.
pub(crate) fn results_to_counts(results: &JobResultResponse, width: usize) -> IbmResult<Counts> {
    let result = results
        .results
        .first()
        .ok_or_else(|| IbmError::ResultFormat("no results in payload".into()))?;

    if let Some(data) = &result.data {
        let register = match data.get("c") {
            Some(register) => register,
            None if data.len() == 1 => data
                .values()
                .next()
                .ok_or_else(|| IbmError::ResultFormat("empty data section".into()))?,
            None => {
                return Err(IbmError::ResultFormat(format!(
                    "expected one classical register, found {}",
                    data.len()
                )));
            }
        };

        let width = if width > 0 {
            width
        } else {
            infer_bit_width(&register.samples)
        };
        let mut counts = Counts::new();
        for sample in &register.samples {
            counts.insert(hex_to_binary(sample, width)?, 1);
        }
        return Ok(counts);
    }

    if let Some(raw_counts) = &result.counts {
        let mut counts = Counts::new();
        for (key, &count) in raw_counts {
            counts.insert(outcome_to_binary(key, width)?, count);
        }
        return Ok(counts);
    }

    if let Some(dist) = result.quasi_dists.as_ref().and_then(|d| d.first()) {
        let shots = result
            .metadata
            .as_ref()
            .and_then(|m| m.get("shots"))
            .and_then(serde_json::Value::as_u64)
            .ok_or_else(|| IbmError::ResultFormat("quasi_dists without shot count".into()))?;

        let mut counts = Counts::new();
        for (key, &prob) in dist {
            #[allow(
                clippy::cast_possible_truncation,
                clippy::cast_sign_loss,
                clippy::cast_precision_loss
            )]
            let count = (prob * shots as f64).max(0.0).round() as u64;
            if count > 0 {
                counts.insert(outcome_to_binary(key, width)?, count);
            }
        }
        return Ok(counts);
    }

    Err(IbmError::ResultFormat(
        "result carries neither samples, counts nor quasi_dists".into(),
    ))
}

/// Bit width needed for the largest hex sample, at least 1.
fn infer_bit_width(samples: &[String]) -> usize {
    let max_val = samples
        .iter()
        .filter_map(|s| u64::from_str_radix(s.strip_prefix("0x").unwrap_or(s), 16).ok())
        .max()
        .unwrap_or(0);

    if max_val == 0 {
        1
    } else {
        64 - max_val.leading_zeros() as usize
    }
}

/// Hex sample to a `width`-character bitstring, bit 0 rightmost.
fn hex_to_binary(hex: &str, width: usize) -> IbmResult<String> {
    let digits = hex.strip_prefix("0x").unwrap_or(hex);
    let value = u64::from_str_radix(digits, 16)
        .map_err(|_| IbmError::ResultFormat(format!("invalid hex sample '{hex}'")))?;
    pad_binary(value, width, hex)
}

/// V1 outcome keys are either `0x`-prefixed hex or plain bitstrings.
fn outcome_to_binary(key: &str, width: usize) -> IbmResult<String> {
    if key.starts_with("0x") {
        return hex_to_binary(key, width);
    }
    if key.is_empty() || !key.bytes().all(|b| b == b'0' || b == b'1') {
        return Err(IbmError::ResultFormat(format!("invalid outcome key '{key}'")));
    }
    let value = u64::from_str_radix(key, 2)
        .map_err(|_| IbmError::ResultFormat(format!("outcome '{key}' too wide")))?;
    pad_binary(value, if width > 0 { width } else { key.len() }, key)
}

/// A `width` of 0 uses the value's own bit length.
fn pad_binary(value: u64, width: usize, source: &str) -> IbmResult<String> {
    let width = if width == 0 {
        (64 - value.leading_zeros() as usize).max(1)
    } else {
        width
    };
    if width < 64 && value >> width != 0 {
        return Err(IbmError::ResultFormat(format!(
            "outcome '{source}' does not fit in {width} classical bits"
        )));
    }
    Ok(format!("{value:0width$b}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use qfract_ir::{NATIVE_GATES, fractal};

    fn payload(json: serde_json::Value) -> JobResultResponse {
        serde_json::from_value(json).unwrap()
    }

    fn service() -> IbmService {
        IbmService::new(IbmClient::new("https://example.com", "test-token").unwrap())
    }

    #[test]
    fn test_hex_to_binary() {
        assert_eq!(hex_to_binary("0x0", 4).unwrap(), "0000");
        assert_eq!(hex_to_binary("0x1", 5).unwrap(), "00001");
        assert_eq!(hex_to_binary("0x3", 8).unwrap(), "00000011");
        assert_eq!(hex_to_binary("f", 4).unwrap(), "1111");
        assert!(hex_to_binary("0x4", 2).is_err());
        assert!(hex_to_binary("0xzz", 2).is_err());
    }

    #[test]
    fn test_infer_bit_width() {
        assert_eq!(infer_bit_width(&["0x0".into(), "0x3".into()]), 2);
        assert_eq!(infer_bit_width(&["0x0".into(), "0x7".into()]), 3);
        assert_eq!(infer_bit_width(&["0x0".into(), "0x0".into()]), 1);
        assert_eq!(infer_bit_width(&["0x1".into()]), 1);
    }

    #[test]
    fn test_results_to_counts_v2_samples() {
        // 6x "00" and 4x "11"
        let results = payload(serde_json::json!({
            "results": [{
                "data": { "c": { "samples": [
                    "0x0", "0x3", "0x0", "0x3", "0x0", "0x0", "0x3", "0x0", "0x3", "0x0"
                ] } },
                "metadata": { "version": 2 }
            }]
        }));

        let counts = results_to_counts(&results, 2).unwrap();
        assert_eq!(counts.get("00"), 6);
        assert_eq!(counts.get("11"), 4);
        assert_eq!(counts.total_shots(), 10);
        // first-seen order
        assert_eq!(counts.iter().next().unwrap().0, "00");
    }

    #[test]
    fn test_results_to_counts_v2_pads_to_register_width() {
        let results = payload(serde_json::json!({
            "results": [{ "data": { "c": { "samples": ["0x0", "0x0", "0x1"] } } }]
        }));
        let counts = results_to_counts(&results, 4).unwrap();
        assert_eq!(counts.get("0000"), 2);
        assert_eq!(counts.get("0001"), 1);
    }

    #[test]
    fn test_results_to_counts_v2_inferred_width() {
        let results = payload(serde_json::json!({
            "results": [{ "data": { "meas": { "samples": ["0x0", "0x0", "0x0"] } } }]
        }));
        let counts = results_to_counts(&results, 0).unwrap();
        assert_eq!(counts.get("0"), 3);
    }

    #[test]
    fn test_results_to_counts_v1_counts() {
        let results = payload(serde_json::json!({
            "id": "test",
            "results": [{ "counts": { "0x0": 500, "0x3": 500 } }]
        }));
        let counts = results_to_counts(&results, 4).unwrap();
        assert_eq!(counts.get("0000"), 500);
        assert_eq!(counts.get("0011"), 500);
        assert_eq!(counts.total_shots(), 1000);
    }

    #[test]
    fn test_results_to_counts_v1_binary_keys() {
        let results = payload(serde_json::json!({
            "results": [{ "counts": { "01": 7, "10": 3 } }]
        }));
        let counts = results_to_counts(&results, 2).unwrap();
        assert_eq!(counts.get("01"), 7);
        assert_eq!(counts.get("10"), 3);
    }

    #[test]
    fn test_results_to_counts_quasi_dists() {
        let results = payload(serde_json::json!({
            "results": [{
                "quasi_dists": [{ "0x0": 0.25, "0x1": 0.75, "0x2": -0.001 }],
                "metadata": { "shots": 1000 }
            }]
        }));
        let counts = results_to_counts(&results, 2).unwrap();
        assert_eq!(counts.get("00"), 250);
        assert_eq!(counts.get("01"), 750);
        assert_eq!(counts.get("10"), 0);
    }

    #[test]
    fn test_quasi_dists_need_shot_count() {
        let results = payload(serde_json::json!({
            "results": [{ "quasi_dists": [{ "0x0": 1.0 }] }]
        }));
        assert!(matches!(
            results_to_counts(&results, 1),
            Err(IbmError::ResultFormat(_))
        ));
    }

    #[test]
    fn test_empty_results_rejected() {
        let results = payload(serde_json::json!({ "results": [] }));
        assert!(matches!(
            results_to_counts(&results, 1),
            Err(IbmError::ResultFormat(_))
        ));
    }

    #[test]
    fn test_extract_counts_maps_to_malformed_payload() {
        let service = service();
        let spec = JobSpec {
            backend: "ibm_torino".into(),
            program: String::new(),
            num_qubits: 2,
            num_clbits: 2,
        };

        let ok = RawPayload(serde_json::json!({
            "results": [{ "data": { "c": { "samples": ["0x1", "0x1"] } } }]
        }));
        assert_eq!(service.extract_counts(&ok, &spec).unwrap().get("01"), 2);

        let wrong_shape = RawPayload(serde_json::json!({ "unexpected": true }));
        assert!(matches!(
            service.extract_counts(&wrong_shape, &spec),
            Err(HalError::Serialization(_))
        ));

        let too_wide = RawPayload(serde_json::json!({
            "results": [{ "data": { "c": { "samples": ["0x7"] } } }]
        }));
        assert!(matches!(
            service.extract_counts(&too_wide, &spec),
            Err(HalError::MalformedPayload(_))
        ));
    }

    #[tokio::test]
    async fn test_compile_emits_native_qasm() {
        let circuit = fractal(3, 2).unwrap();
        let spec = service().compile(&circuit, "ibm_torino").await.unwrap();
        assert_eq!(spec.backend, "ibm_torino");
        assert_eq!(spec.num_qubits, 3);
        assert_eq!(spec.num_clbits, 3);
        assert!(spec.program.starts_with("OPENQASM 3.0;"));
        assert!(spec.program.contains("cz q[0], q[1];"));

        for line in spec.program.lines().filter(|l| l.ends_with(';')) {
            let head = line.split(['(', ' ']).next().unwrap();
            let native = NATIVE_GATES.contains(&head)
                || matches!(head, "OPENQASM" | "include" | "qubit[3]" | "bit[3]" | "barrier")
                || line.contains("= measure");
            assert!(native, "rejected by the sampler: {line}");
        }
    }

    #[tokio::test]
    async fn test_connect_without_token_fails() {
        let err = IbmService::connect(&ServiceConfig::new("ibm")).await.unwrap_err();
        assert!(matches!(err, IbmError::MissingToken));
    }

    #[tokio::test]
    async fn test_connect_legacy_config() {
        let config = ServiceConfig::new("ibm")
            .with_endpoint("https://example.com")
            .with_token("t")
            .with_instance("hub/group/project");
        let service = IbmService::connect(&config).await.unwrap();
        assert!(!service.client().is_cloud_api());
        assert_eq!(service.client().endpoint(), "https://example.com");
        assert_eq!(service.provider(), "ibm");
    }
}
