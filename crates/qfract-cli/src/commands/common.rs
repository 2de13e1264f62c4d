//! Shared helpers for CLI commands.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::ValueEnum;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::warn;

use qfract_adapter_ibm::IbmService;
use qfract_exec::{Execution, ExperimentConfig, Report};
use qfract_hal::RemoteService;

/// How results are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

/// Command-line values that take precedence over the config file and
/// environment.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub qubits: Option<u32>,
    pub depth: Option<u32>,
    pub shots: Option<u32>,
    pub real: bool,
    pub backend: Option<String>,
    pub seed: Option<u64>,
}

impl Overrides {
    pub fn apply(self, mut config: ExperimentConfig) -> ExperimentConfig {
        if let Some(qubits) = self.qubits {
            config.n_qubits = qubits;
        }
        if let Some(depth) = self.depth {
            config.fractal_depth = depth;
        }
        if let Some(shots) = self.shots {
            config.shots = shots;
        }
        if self.real {
            config.use_real = true;
        }
        if let Some(backend) = self.backend {
            config.backend_name = backend;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        config
    }
}

/// Defaults < config file < `QFRACT_*` environment < command line.
pub fn load_config(path: Option<&Path>, overrides: Overrides) -> Result<ExperimentConfig> {
    let config = ExperimentConfig::load(path).context("Failed to load configuration")?;
    let config = overrides.apply(config);
    config.validate()?;
    Ok(config)
}

/// Connect to IBM Quantum from the environment, or `None` when no
/// credentials are configured or the connection fails.
pub async fn connect_remote() -> Option<Arc<dyn RemoteService>> {
    match IbmService::from_env().await {
        Ok(service) => Some(Arc::new(service)),
        Err(e) => {
            warn!("IBM Quantum unavailable: {e}");
            None
        }
    }
}

pub fn spinner(message: impl Into<String>) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(template) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        spinner.set_style(template);
    }
    spinner.set_message(message.into());
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

/// Print an execution's report, noting a fallback if one happened.
pub fn print_execution(execution: &Execution) {
    if let Some(reason) = &execution.fallback {
        println!(
            "{} {} - results are from the simulator",
            style("!").yellow().bold(),
            reason
        );
    }
    let report = Report::from_counts(&execution.counts, execution.shots);
    print!("{}", report.render_text());
    println!(
        "  {} {} in {} ms",
        style("ran on").dim(),
        style(&execution.executed_on).yellow(),
        execution.elapsed.as_millis()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_take_precedence() {
        let base = ExperimentConfig {
            n_qubits: 6,
            seed: Some(1),
            ..ExperimentConfig::default()
        };
        let config = Overrides {
            qubits: Some(2),
            shots: Some(10),
            real: true,
            backend: Some("ibm_fez".into()),
            ..Overrides::default()
        }
        .apply(base);

        assert_eq!(config.n_qubits, 2);
        assert_eq!(config.fractal_depth, 3);
        assert_eq!(config.shots, 10);
        assert!(config.use_real);
        assert_eq!(config.backend_name, "ibm_fez");
        assert_eq!(config.seed, Some(1));
    }

    #[test]
    fn test_real_flag_does_not_clear_config() {
        let base = ExperimentConfig {
            use_real: true,
            ..ExperimentConfig::default()
        };
        assert!(Overrides::default().apply(base).use_real);
    }

    #[test]
    fn test_load_config_rejects_invalid_override() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("qfract.yaml");
        std::fs::write(&path, "n_qubits: 3\n").unwrap();

        let config = load_config(Some(&path), Overrides::default()).unwrap();
        assert_eq!(config.n_qubits, 3);

        let err = load_config(
            Some(&path),
            Overrides {
                shots: Some(0),
                ..Overrides::default()
            },
        );
        assert!(err.is_err());
    }
}
