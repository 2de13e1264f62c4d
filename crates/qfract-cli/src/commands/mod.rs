//! CLI command implementations.

pub mod backends;
pub mod bloch;
pub mod common;
pub mod preset;
pub mod run;
pub mod version;
