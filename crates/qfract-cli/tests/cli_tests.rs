//! End-to-end tests of the `qfract` binary.
//!
//! Each invocation runs with an empty home directory and no `QFRACT_*` or
//! IBM credentials in the environment, so results depend only on the flags.

use std::path::Path;
use std::process::{Command, Output};

use serde_json::Value;

const ISOLATED_VARS: &[&str] = &[
    "QFRACT_QUBITS",
    "QFRACT_DEPTH",
    "QFRACT_SHOTS",
    "QFRACT_USE_REAL",
    "QFRACT_BACKEND",
    "QFRACT_SEED",
    "IBM_API_KEY",
    "IBM_SERVICE_CRN",
    "IBM_QUANTUM_TOKEN",
    "RUST_LOG",
];

fn qfract(home: &Path, args: &[&str]) -> Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_qfract"));
    cmd.args(args).env("HOME", home);
    for var in ISOLATED_VARS {
        cmd.env_remove(var);
    }
    cmd.output().expect("failed to launch qfract")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn json(output: &Output) -> Value {
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    serde_json::from_slice(&output.stdout).expect("stdout is not JSON")
}

// ============================================================================
// run
// ============================================================================

mod run {
    use super::*;

    #[test]
    fn test_two_qubit_single_layer() {
        let home = tempfile::tempdir().unwrap();
        let out = json(&qfract(
            home.path(),
            &["run", "-q", "2", "-d", "1", "-s", "1000", "-f", "json"],
        ));

        let report = &out["simulation"]["report"];
        assert_eq!(report["total_shots"], 1000);
        assert_eq!(report["unique_states"], 1);
        assert_eq!(report["most_probable"]["bitstring"], "01");
        assert_eq!(report["most_probable"]["count"], 1000);
        assert_eq!(out["bloch"].as_array().unwrap().len(), 2);
        assert!(out.get("remote").is_none());
    }

    #[test]
    fn test_real_without_credentials_falls_back() {
        let home = tempfile::tempdir().unwrap();
        let out = json(&qfract(
            home.path(),
            &[
                "run", "-q", "3", "-d", "2", "-s", "100", "--real", "-b", "nonexistent", "-f",
                "json",
            ],
        ));

        let remote = &out["remote"];
        assert_eq!(remote["execution"]["requested"]["kind"], "remote");
        assert_eq!(remote["execution"]["requested"]["name"], "nonexistent");
        assert_eq!(remote["execution"]["executed_on"]["kind"], "simulator");
        assert_eq!(
            remote["execution"]["fallback"]["reason"],
            "remote_execution_failure"
        );
        assert_eq!(remote["report"]["total_shots"], 100);

        let summed: u64 = remote["report"]["entries"]
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["count"].as_u64().unwrap())
            .sum();
        assert_eq!(summed, 100);
    }

    #[test]
    fn test_table_output() {
        let home = tempfile::tempdir().unwrap();
        let output = qfract(home.path(), &["run", "-q", "2", "-d", "1", "-s", "1000"]);
        assert!(output.status.success());

        let text = stdout(&output);
        assert!(text.contains("===== Quantum Fractal Experiment Results ====="));
        assert!(text.contains("Most probable     : 01 (1000 counts)"));
        assert!(text.contains("Qubit 0: ("));
        assert!(text.contains("Qubit 1: ("));
    }

    #[test]
    fn test_config_file_then_flags() {
        let home = tempfile::tempdir().unwrap();
        let path = home.path().join("exp.yaml");
        std::fs::write(&path, "n_qubits: 3\nfractal_depth: 1\nshots: 50\n").unwrap();

        let out = json(&qfract(
            home.path(),
            &["run", "-c", path.to_str().unwrap(), "-s", "70", "-f", "json"],
        ));
        assert_eq!(out["config"]["n_qubits"], 3);
        assert_eq!(out["config"]["fractal_depth"], 1);
        assert_eq!(out["config"]["shots"], 70);
        assert_eq!(out["simulation"]["report"]["total_shots"], 70);
    }

    #[test]
    fn test_seed_is_reproducible() {
        let home = tempfile::tempdir().unwrap();
        let args = ["run", "-q", "4", "-d", "3", "--seed", "42", "-f", "json"];
        let a = json(&qfract(home.path(), &args));
        let b = json(&qfract(home.path(), &args));
        assert_eq!(a["simulation"]["report"], b["simulation"]["report"]);
    }

    #[test]
    fn test_invalid_qubits_exit_code() {
        let home = tempfile::tempdir().unwrap();
        let output = qfract(home.path(), &["run", "-q", "0"]);
        assert_eq!(output.status.code(), Some(1));
        assert!(String::from_utf8_lossy(&output.stderr).contains("Error:"));
    }
}

// ============================================================================
// bloch / preset / version
// ============================================================================

mod other_commands {
    use super::*;

    #[test]
    fn test_single_qubit_bloch_is_pure() {
        let home = tempfile::tempdir().unwrap();
        let out = json(&qfract(home.path(), &["bloch", "-q", "1", "-d", "5", "-f", "json"]));
        let v = &out[0];
        let norm = (v["x"].as_f64().unwrap().powi(2)
            + v["y"].as_f64().unwrap().powi(2)
            + v["z"].as_f64().unwrap().powi(2))
        .sqrt();
        assert!((norm - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_preset_bell() {
        let home = tempfile::tempdir().unwrap();
        let output = qfract(home.path(), &["preset", "bell", "-s", "200", "--seed", "3"]);
        assert!(output.status.success());
        let text = stdout(&output);
        assert!(text.contains("Total shots       : 200"));
        assert!(!text.contains("  01 :"));
        assert!(!text.contains("  10 :"));
    }

    #[test]
    fn test_unknown_preset() {
        let home = tempfile::tempdir().unwrap();
        let output = qfract(home.path(), &["preset", "ghz"]);
        assert_eq!(output.status.code(), Some(1));
        let err = String::from_utf8_lossy(&output.stderr);
        assert!(err.contains("Unknown preset"));
        assert!(err.contains("teleportation"));
    }

    #[test]
    fn test_version() {
        let home = tempfile::tempdir().unwrap();
        let output = qfract(home.path(), &["version"]);
        assert!(output.status.success());
        assert!(stdout(&output).contains(concat!("v", env!("CARGO_PKG_VERSION"))));
    }
}
