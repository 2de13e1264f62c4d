//! Property-based tests for evolution, partial trace, sampling and Bloch vectors.

use proptest::prelude::*;
use qfract_adapter_sim::{
    Sampler, SimulatorBackend, Statevector, bloch_vectors, measured_distribution,
};
use num_complex::Complex64;
use qfract_ir::{QuantumCircuit, basis, fractal, presets};

/// |⟨a|b⟩|, which is 1 when the states agree up to global phase.
fn overlap(a: &Statevector, b: &Statevector) -> f64 {
    a.amplitudes()
        .iter()
        .zip(b.amplitudes())
        .map(|(x, y)| x.conj() * y)
        .sum::<Complex64>()
        .norm()
}

/// Evolve `circuit` and its native-basis translation side by side.
fn native_overlap(circuit: &QuantumCircuit) -> f64 {
    let unitary = circuit.strip_measurements();
    let mut native = QuantumCircuit::new("native", unitary.num_qubits(), 0).unwrap();
    for op in basis::translate(&unitary) {
        native.push(op.to_gate()).unwrap();
    }
    overlap(
        &Statevector::evolve(&unitary).unwrap(),
        &Statevector::evolve(&native).unwrap(),
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn probabilities_sum_to_one(n in 1_u32..=6, d in 0_u32..=6) {
        let circuit = fractal(n, d).unwrap();
        let state = Statevector::evolve(&circuit.strip_measurements()).unwrap();
        prop_assert!((state.probabilities().total() - 1.0).abs() < 1e-9);
        prop_assert!((measured_distribution(&circuit).unwrap().total() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn partial_trace_is_a_density_matrix(n in 1_u32..=6, d in 0_u32..=6) {
        let state = Statevector::evolve(&fractal(n, d).unwrap().strip_measurements()).unwrap();
        for q in 0..n {
            let rho = state.partial_trace(q).unwrap();
            prop_assert!(rho.is_hermitian(1e-9));
            prop_assert!((rho.trace().re - 1.0).abs() < 1e-9);
            prop_assert!(rho.trace().im.abs() < 1e-9);
            let [low, high] = rho.eigenvalues();
            prop_assert!(low >= -1e-9 && high <= 1.0 + 1e-9);
        }
    }

    #[test]
    fn bloch_norm_bounded(n in 1_u32..=6, d in 0_u32..=6) {
        let state = Statevector::evolve(&fractal(n, d).unwrap().strip_measurements()).unwrap();
        let vectors = bloch_vectors(&state);
        prop_assert_eq!(vectors.len(), n as usize);
        for v in vectors {
            prop_assert!(v.norm() <= 1.0 + 1e-9);
        }
    }

    #[test]
    fn sample_total_matches_shots(
        n in 1_u32..=5,
        d in 0_u32..=4,
        shots in 1_u32..=4096,
        seed: u64,
    ) {
        let result = SimulatorBackend::new()
            .run(&fractal(n, d).unwrap(), shots, &mut Sampler::seeded(seed))
            .unwrap();
        prop_assert_eq!(result.counts.total_shots(), u64::from(shots));
        for (bits, _) in result.counts.iter() {
            prop_assert_eq!(bits.len(), n as usize);
        }
    }

    #[test]
    fn depth_zero_yields_all_zeros(n in 1_u32..=8, shots in 1_u32..=2048) {
        let result = SimulatorBackend::new()
            .run(&fractal(n, 0).unwrap(), shots, &mut Sampler::new())
            .unwrap();
        prop_assert_eq!(result.counts.len(), 1);
        prop_assert_eq!(result.counts.get(&"0".repeat(n as usize)), u64::from(shots));
    }

    #[test]
    fn native_translation_preserves_the_state(n in 1_u32..=5, d in 0_u32..=5) {
        prop_assert!((native_overlap(&fractal(n, d).unwrap()) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn single_qubit_is_always_pure(d in 0_u32..=12) {
        let state = Statevector::evolve(&fractal(1, d).unwrap().strip_measurements()).unwrap();
        prop_assert!(bloch_vectors(&state)[0].is_pure(1e-9));
    }
}

#[test]
fn repeated_large_runs_converge() {
    let circuit = fractal(3, 3).unwrap();
    let backend = SimulatorBackend::new();
    let shots = 100_000;
    let a = backend.run(&circuit, shots, &mut Sampler::seeded(1)).unwrap().counts;
    let b = backend.run(&circuit, shots, &mut Sampler::seeded(2)).unwrap().counts;

    for (bits, p) in measured_distribution(&circuit).unwrap().iter() {
        let fa = a.get(&bits) as f64 / f64::from(shots);
        let fb = b.get(&bits) as f64 / f64::from(shots);
        assert!((fa - p).abs() < 0.01, "{bits}: {fa} vs {p}");
        assert!((fa - fb).abs() < 0.015, "{bits}: {fa} vs {fb}");
    }
}

#[test]
fn entangled_qubits_lose_purity() {
    // The π/4 layer no longer commutes with the CX chain, leaving both
    // qubits at |r| = √3/2
    let state = Statevector::evolve(&fractal(2, 3).unwrap().strip_measurements()).unwrap();
    for v in bloch_vectors(&state) {
        assert!((v.norm() - 3f64.sqrt() / 2.0).abs() < 1e-9);
    }
}

#[test]
fn native_translation_of_presets() {
    for circuit in [presets::bell_pair().unwrap(), presets::teleportation().unwrap()] {
        assert!((native_overlap(&circuit) - 1.0).abs() < 1e-9, "{}", circuit.name());
    }
}
