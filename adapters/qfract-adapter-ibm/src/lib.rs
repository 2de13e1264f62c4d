//! IBM Quantum remote service for qfract
//!
//! Implements [`qfract_hal::RemoteService`] over the IBM Quantum REST API.
//! Circuits are sent as OpenQASM 3 to the Sampler primitive and results are
//! read back as per-shot samples (V2) or aggregated counts (V1).
//!
//! # Authentication
//!
//! | Variables | API |
//! |-----------|-----|
//! | `IBM_API_KEY` + `IBM_SERVICE_CRN` | IBM Cloud (`quantum.cloud.ibm.com`), IAM token exchange |
//! | `IBM_QUANTUM_TOKEN` | legacy (`api.quantum-computing.ibm.com`), bearer token |
//!
//! ```no_run
//! use qfract_adapter_ibm::IbmService;
//! use qfract_hal::RemoteService;
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let service = IbmService::from_env().await?;
//! for name in service.list_backends().await? {
//!     println!("{name}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod error;
pub mod service;

pub use api::{DEFAULT_ENDPOINT, IbmClient, LEGACY_ENDPOINT};
pub use error::{IbmError, IbmResult};
pub use service::{IbmService, SERVICE_CRN_KEY};
