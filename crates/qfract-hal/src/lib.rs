//! qfract hardware abstraction layer
//!
//! Shared result types ([`Counts`], [`ExecutionResult`]) and the
//! [`RemoteService`] trait through which circuits reach remote hardware.
//! Local simulation lives in `qfract-adapter-sim`; provider clients live in
//! their own adapter crates and implement [`RemoteService`].

pub mod config;
pub mod error;
pub mod job;
pub mod result;
pub mod service;

pub use config::ServiceConfig;
pub use error::{HalError, HalResult};
pub use job::{Job, JobId, JobStatus};
pub use result::{Counts, ExecutionResult};
pub use service::{BackendTarget, JobSpec, RawPayload, RemoteService, WaitPolicy};
