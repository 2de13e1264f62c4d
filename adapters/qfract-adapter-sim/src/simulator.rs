//! Simulator backend implementation.

use std::time::Instant;
use tracing::{debug, instrument};

use qfract_hal::{Counts, ExecutionResult};
use qfract_ir::{EntangleKind, GateOp, QuantumCircuit};

use crate::distribution::Probabilities;
use crate::error::{SimError, SimResult};
use crate::sampler::Sampler;
use crate::statevector::{MAX_QUBITS, Statevector};

/// Local statevector backend.
///
/// Measurements are deferred to the end of the circuit: the unitary part is
/// evolved once, the qubit distribution is mapped onto the classical
/// register, and shots are drawn from that single distribution.
#[derive(Debug, Clone)]
pub struct SimulatorBackend {
    name: String,
    max_qubits: u32,
}

impl SimulatorBackend {
    /// Create a new simulator backend with default settings.
    pub fn new() -> Self {
        Self::with_max_qubits(MAX_QUBITS)
    }

    /// Create a simulator with custom max qubits.
    pub fn with_max_qubits(max_qubits: u32) -> Self {
        Self {
            name: "statevector_simulator".into(),
            max_qubits: max_qubits.min(MAX_QUBITS),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn max_qubits(&self) -> u32 {
        self.max_qubits
    }

    /// Check that the circuit fits and its measurements can be deferred.
    pub fn validate(&self, circuit: &QuantumCircuit) -> SimResult<()> {
        if circuit.num_qubits() > self.max_qubits {
            return Err(SimError::TooManyQubits {
                requested: circuit.num_qubits(),
                max: self.max_qubits,
            });
        }
        if circuit.num_clbits() == 0 || circuit.num_measurements() == 0 {
            return Err(SimError::NoMeasurements(circuit.name().to_string()));
        }
        check_deferrable(circuit)
    }

    /// Outcome distribution over the classical register.
    pub fn distribution(&self, circuit: &QuantumCircuit) -> SimResult<Probabilities> {
        self.validate(circuit)?;
        measured_distribution(circuit)
    }

    /// Run `shots` shots of `circuit`, drawing outcomes from `sampler`.
    #[instrument(skip(self, circuit, sampler), fields(circuit = circuit.name()))]
    pub fn run(
        &self,
        circuit: &QuantumCircuit,
        shots: u32,
        sampler: &mut Sampler,
    ) -> SimResult<ExecutionResult> {
        let start = Instant::now();
        debug!(
            "Starting simulation: {} qubits, {} shots",
            circuit.num_qubits(),
            shots
        );

        let distribution = self.distribution(circuit)?;
        let counts: Counts = sampler.sample(&distribution, shots)?;

        let elapsed = start.elapsed();
        debug!("Simulation completed in {:?}", elapsed);

        Ok(ExecutionResult::new(counts, shots)
            .with_execution_time(u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)))
    }
}

impl Default for SimulatorBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Reject circuits where deferring a measurement would change the outcome.
///
/// After a qubit is measured it may still act as a CX control, as either
/// side of a CZ, or sit under a barrier. Anything else would act on the
/// post-measurement state and is refused.
fn check_deferrable(circuit: &QuantumCircuit) -> SimResult<()> {
    let mut measured = vec![false; circuit.num_qubits() as usize];
    for op in circuit.ops() {
        match op {
            GateOp::Measurement { qubit, .. } => measured[qubit.index()] = true,
            GateOp::Rotation { qubit, .. } if measured[qubit.index()] => {
                return Err(SimError::mid_circuit(qubit.0, op));
            }
            GateOp::Entangle {
                kind: EntangleKind::Cx,
                target,
                ..
            } if measured[target.index()] => {
                return Err(SimError::mid_circuit(target.0, op));
            }
            _ => {}
        }
    }
    Ok(())
}

/// Distribution over classical-register bitstrings for a measured circuit.
///
/// Evolves the measurement-free circuit, then routes each qubit's value into
/// its classical bit following the measurement map in program order (a later
/// measurement into the same bit wins). Unwritten classical bits read 0.
pub fn measured_distribution(circuit: &QuantumCircuit) -> SimResult<Probabilities> {
    check_deferrable(circuit)?;
    let state = Statevector::evolve(&circuit.strip_measurements())?;
    let map = circuit.measurement_map();
    let width = circuit.num_clbits();

    let mut outcomes = Vec::new();
    for (index, p) in state.probability_vector().into_iter().enumerate() {
        if p == 0.0 {
            continue;
        }
        let mut outcome = 0usize;
        for (qubit, clbit) in &map {
            let bit = 1usize << clbit.index();
            if index & (1 << qubit.index()) != 0 {
                outcome |= bit;
            } else {
                outcome &= !bit;
            }
        }
        outcomes.push((outcome, p));
    }

    Ok(Probabilities::from_sparse(width, outcomes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distribution::bitstring;
    use qfract_ir::{ClbitId, QubitId, fractal, presets};

    #[test]
    fn test_simulator_bell_state() {
        let backend = SimulatorBackend::new();
        let circuit = presets::bell_pair().unwrap();
        let result = backend
            .run(&circuit, 1000, &mut Sampler::seeded(5))
            .unwrap();

        assert_eq!(result.shots, 1000);
        assert!(result.is_complete());
        let counts = &result.counts;
        assert_eq!(counts.get("00") + counts.get("11"), 1000);
        assert_eq!(counts.get("01") + counts.get("10"), 0);
    }

    #[test]
    fn test_two_qubit_fractal_is_deterministic() {
        let backend = SimulatorBackend::new();
        let result = backend
            .run(&fractal(2, 1).unwrap(), 1000, &mut Sampler::seeded(1))
            .unwrap();
        assert_eq!(result.counts.get("01"), 1000);
    }

    #[test]
    fn test_simulator_too_many_qubits() {
        let backend = SimulatorBackend::with_max_qubits(5);
        let circuit = fractal(10, 1).unwrap();
        assert!(matches!(
            backend.run(&circuit, 100, &mut Sampler::seeded(0)),
            Err(SimError::TooManyQubits { requested: 10, max: 5 })
        ));
    }

    #[test]
    fn test_no_measurements_rejected() {
        let circuit = fractal(2, 1).unwrap().strip_measurements();
        assert!(matches!(
            SimulatorBackend::new().distribution(&circuit),
            Err(SimError::NoMeasurements(_))
        ));
    }

    #[test]
    fn test_partial_measurement_width() {
        // Only qubit 1 is measured, into a one-bit register
        let mut circuit = QuantumCircuit::new("partial", 2, 1).unwrap();
        circuit.x(QubitId(1)).unwrap();
        circuit.measure(QubitId(1), ClbitId(0)).unwrap();
        let dist = measured_distribution(&circuit).unwrap();
        assert_eq!(dist.width(), 1);
        assert!((dist.get("1") - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_rotation_after_measure_rejected() {
        let mut circuit = QuantumCircuit::with_size("bad", 1).unwrap();
        circuit.measure(QubitId(0), ClbitId(0)).unwrap();
        circuit.ry(1.0, QubitId(0)).unwrap();
        assert!(matches!(
            measured_distribution(&circuit),
            Err(SimError::MidCircuitMeasurement { qubit: 0, .. })
        ));
    }

    #[test]
    fn test_cx_onto_measured_target_rejected() {
        let mut circuit = QuantumCircuit::with_size("bad", 2).unwrap();
        circuit.measure(QubitId(1), ClbitId(1)).unwrap();
        circuit.cx(QubitId(0), QubitId(1)).unwrap();
        assert!(matches!(
            measured_distribution(&circuit),
            Err(SimError::MidCircuitMeasurement { qubit: 1, .. })
        ));
    }

    #[test]
    fn test_teleportation_delivers_plus_state() {
        let dist = measured_distribution(&presets::teleportation().unwrap()).unwrap();
        assert_eq!(dist.width(), 3);
        assert!((dist.total() - 1.0).abs() < 1e-9);

        // Qubit 2 carries |+⟩, so c2 is an unbiased coin independent of c0, c1
        let c2_one: f64 = dist
            .iter()
            .filter(|(bits, _)| bits.starts_with('1'))
            .map(|(_, p)| p)
            .sum();
        assert!((c2_one - 0.5).abs() < 1e-9);
        for (_, p) in dist.iter() {
            assert!((p - 0.125).abs() < 1e-9);
        }
    }

    #[test]
    fn test_wide_register_keeps_only_support() {
        // Without any ry layer the register stays in |0…0⟩
        let dist = measured_distribution(&fractal(20, 0).unwrap()).unwrap();
        assert_eq!(dist.width(), 20);
        assert_eq!(dist.len(), 1);
        assert_eq!(dist.get(&"0".repeat(20)), 1.0);
        assert_eq!(dist.get(&format!("{}1", "0".repeat(19))), 0.0);

        let counts = Sampler::seeded(9).sample(&dist, 100).unwrap();
        assert_eq!(counts.len(), 1);
        assert_eq!(counts.get(&"0".repeat(20)), 100);
    }

    #[test]
    fn test_wide_fractal_samples_from_support() {
        // A single π layer alternates the chain, so only "0101…01" survives
        let dist = measured_distribution(&fractal(20, 1).unwrap()).unwrap();
        let expected = "01".repeat(10);
        assert!((dist.total() - 1.0).abs() < 1e-9);
        assert!((dist.get(&expected) - 1.0).abs() < 1e-9);

        let support: Vec<_> = dist.support().collect();
        assert_eq!(support.len(), 1);
        assert_eq!(bitstring(support[0].0, 20), expected);

        let counts = Sampler::seeded(4).sample(&dist, 500).unwrap();
        assert_eq!(counts.get(&expected), 500);
    }
}
