//! Experiment configuration.
//!
//! Sources, lowest precedence first:
//! 1. Default values
//! 2. A YAML file (`--config`, or `~/.qfract/config.yaml` when present)
//! 3. Environment variables with the `QFRACT_` prefix
//!
//! Command-line flags are applied on top by the binary.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use qfract_adapter_sim::MAX_QUBITS;
use qfract_hal::WaitPolicy;

/// Parameters of one fractal experiment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExperimentConfig {
    #[serde(default = "default_qubits")]
    pub n_qubits: u32,

    #[serde(default = "default_depth")]
    pub fractal_depth: u32,

    #[serde(default = "default_shots")]
    pub shots: u32,

    /// Attempt the remote backend before simulating.
    #[serde(default)]
    pub use_real: bool,

    #[serde(default = "default_backend")]
    pub backend_name: String,

    /// Sampler seed; entropy-seeded when absent.
    #[serde(default)]
    pub seed: Option<u64>,

    #[serde(default)]
    pub wait: WaitConfig,
}

/// Remote job polling settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitConfig {
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_qubits() -> u32 {
    4
}

fn default_depth() -> u32 {
    3
}

fn default_shots() -> u32 {
    1024
}

fn default_backend() -> String {
    "ibm_torino".to_string()
}

fn default_poll_interval() -> u64 {
    500
}

fn default_timeout() -> u64 {
    300 // 5 minutes
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            n_qubits: default_qubits(),
            fractal_depth: default_depth(),
            shots: default_shots(),
            use_real: false,
            backend_name: default_backend(),
            seed: None,
            wait: WaitConfig::default(),
        }
    }
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval(),
            timeout_secs: default_timeout(),
        }
    }
}

impl WaitConfig {
    pub fn policy(&self) -> WaitPolicy {
        WaitPolicy::new(
            Duration::from_millis(self.poll_interval_ms),
            Duration::from_secs(self.timeout_secs),
        )
    }
}

impl ExperimentConfig {
    /// Load and validate a YAML file. Missing keys take their defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(format!("{}: {e}", path.display())))?;

        let config: ExperimentConfig = serde_yaml_ng::from_str(&contents)
            .map_err(|e| ConfigError::ParseError(format!("{}: {e}", path.display())))?;

        config.validate()?;
        Ok(config)
    }

    /// `~/.qfract/config.yaml`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".qfract").join("config.yaml"))
    }

    /// Defaults, then `config_file` (or the default path if it exists), then
    /// environment overrides.
    pub fn load(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match config_file {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path().filter(|p| p.exists()) {
                Some(path) => Self::from_file(path)?,
                None => Self::default(),
            },
        };

        let config = config.merge_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `QFRACT_*` environment variables.
    pub fn merge_env(self) -> Result<Self, ConfigError> {
        self.merge_vars(|key| std::env::var(key).ok())
    }

    /// Apply overrides from `lookup`, which maps a variable name to its value.
    ///
    /// Only variables that are present override; values that fail to parse
    /// are rejected.
    pub fn merge_vars<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("QFRACT_QUBITS") {
            self.n_qubits = parse_var("QFRACT_QUBITS", &v)?;
        }
        if let Some(v) = lookup("QFRACT_DEPTH") {
            self.fractal_depth = parse_var("QFRACT_DEPTH", &v)?;
        }
        if let Some(v) = lookup("QFRACT_SHOTS") {
            self.shots = parse_var("QFRACT_SHOTS", &v)?;
        }
        if let Some(v) = lookup("QFRACT_USE_REAL") {
            self.use_real = parse_bool("QFRACT_USE_REAL", &v)?;
        }
        if let Some(v) = lookup("QFRACT_BACKEND") {
            self.backend_name = v;
        }
        if let Some(v) = lookup("QFRACT_SEED") {
            self.seed = Some(parse_var("QFRACT_SEED", &v)?);
        }
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.n_qubits == 0 {
            return Err(ConfigError::ValidationError(
                "n_qubits must be at least 1".to_string(),
            ));
        }
        if self.n_qubits > MAX_QUBITS {
            return Err(ConfigError::ValidationError(format!(
                "n_qubits {} exceeds the simulator limit of {MAX_QUBITS}",
                self.n_qubits
            )));
        }
        if self.shots == 0 {
            return Err(ConfigError::ValidationError(
                "shots must be at least 1".to_string(),
            ));
        }
        if self.backend_name.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "backend_name must not be empty".to_string(),
            ));
        }
        if self.wait.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "wait.timeout_secs must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::ParseError(format!("{key}: invalid value '{value}'")))
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError::ParseError(format!(
            "{key}: invalid boolean '{value}'"
        ))),
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = ExperimentConfig::default();
        assert_eq!(config.n_qubits, 4);
        assert_eq!(config.fractal_depth, 3);
        assert_eq!(config.shots, 1024);
        assert!(!config.use_real);
        assert_eq!(config.backend_name, "ibm_torino");
        assert_eq!(config.seed, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_wait_policy() {
        let policy = WaitConfig::default().policy();
        assert_eq!(policy, WaitPolicy::default());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = ExperimentConfig::default();
        config.n_qubits = 0;
        assert!(config.validate().is_err());

        let mut config = ExperimentConfig::default();
        config.n_qubits = MAX_QUBITS + 1;
        assert!(config.validate().is_err());

        let mut config = ExperimentConfig::default();
        config.shots = 0;
        assert!(config.validate().is_err());

        let mut config = ExperimentConfig::default();
        config.wait.timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_env_overrides() {
        let config = ExperimentConfig::default()
            .merge_vars(vars(&[
                ("QFRACT_QUBITS", "6"),
                ("QFRACT_DEPTH", "2"),
                ("QFRACT_SHOTS", "100"),
                ("QFRACT_USE_REAL", "true"),
                ("QFRACT_BACKEND", "ibm_fez"),
                ("QFRACT_SEED", "42"),
            ]))
            .unwrap();
        assert_eq!(config.n_qubits, 6);
        assert_eq!(config.fractal_depth, 2);
        assert_eq!(config.shots, 100);
        assert!(config.use_real);
        assert_eq!(config.backend_name, "ibm_fez");
        assert_eq!(config.seed, Some(42));
    }

    #[test]
    fn test_absent_env_leaves_values() {
        let base = ExperimentConfig {
            n_qubits: 7,
            ..ExperimentConfig::default()
        };
        let merged = base.clone().merge_vars(vars(&[])).unwrap();
        assert_eq!(merged, base);
    }

    #[test]
    fn test_invalid_env_value_rejected() {
        let err = ExperimentConfig::default()
            .merge_vars(vars(&[("QFRACT_SHOTS", "many")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(msg) if msg.contains("QFRACT_SHOTS")));

        assert!(
            ExperimentConfig::default()
                .merge_vars(vars(&[("QFRACT_USE_REAL", "maybe")]))
                .is_err()
        );
    }

    #[test]
    fn test_from_file_partial_yaml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "n_qubits: 3\nshots: 2000\nwait:\n  timeout_secs: 10").unwrap();

        let config = ExperimentConfig::from_file(file.path()).unwrap();
        assert_eq!(config.n_qubits, 3);
        assert_eq!(config.shots, 2000);
        assert_eq!(config.fractal_depth, 3);
        assert_eq!(config.wait.timeout_secs, 10);
        assert_eq!(config.wait.poll_interval_ms, 500);
    }

    #[test]
    fn test_from_file_invalid() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "n_qubits: 0").unwrap();
        assert!(matches!(
            ExperimentConfig::from_file(file.path()),
            Err(ConfigError::ValidationError(_))
        ));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "n_qubits: [1, 2").unwrap();
        assert!(matches!(
            ExperimentConfig::from_file(file.path()),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            ExperimentConfig::from_file("/nonexistent/qfract.yaml"),
            Err(ConfigError::IoError(_))
        ));
    }
}
