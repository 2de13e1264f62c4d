//! Categorical sampling of measurement outcomes.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use qfract_hal::Counts;

use crate::distribution::{Probabilities, bitstring};
use crate::error::{SimError, SimResult};

/// Draws independent shots from a [`Probabilities`] table.
///
/// Entries at or below [`SUPPORT_EPSILON`](crate::distribution::SUPPORT_EPSILON)
/// are never emitted. The remaining weights are renormalized, so small
/// floating-point drift in the table does not bias the draw.
pub struct Sampler {
    rng: StdRng,
}

impl Sampler {
    /// Sampler seeded from the operating system.
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Reproducible sampler.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Seeded when `seed` is given, entropy-seeded otherwise.
    pub fn from_seed(seed: Option<u64>) -> Self {
        seed.map_or_else(Self::new, Self::seeded)
    }

    /// Draw `shots` outcomes and tally them.
    ///
    /// Bitstrings appear in the histogram in the order they were first drawn.
    /// Only drawn outcomes are formatted as bitstrings.
    pub fn sample(&mut self, probabilities: &Probabilities, shots: u32) -> SimResult<Counts> {
        if shots == 0 {
            return Err(SimError::InvalidShots);
        }

        let support: Vec<(usize, f64)> = probabilities.support().collect();
        if support.iter().any(|(_, p)| !p.is_finite()) {
            return Err(SimError::InvalidDistribution(
                "non-finite probability".into(),
            ));
        }
        if support.is_empty() {
            return Err(SimError::InvalidDistribution(
                "no outcome has non-zero probability".into(),
            ));
        }

        let cumulative: Vec<f64> = support
            .iter()
            .scan(0.0, |acc, (_, p)| {
                *acc += p;
                Some(*acc)
            })
            .collect();
        let total = cumulative[cumulative.len() - 1];

        let mut tally = vec![0u64; support.len()];
        let mut first_seen = Vec::new();
        for _ in 0..shots {
            let r = self.rng.r#gen::<f64>() * total;
            let idx = cumulative
                .partition_point(|&c| c <= r)
                .min(support.len() - 1);
            if tally[idx] == 0 {
                first_seen.push(idx);
            }
            tally[idx] += 1;
        }

        debug!(
            shots,
            outcomes = first_seen.len(),
            support = support.len(),
            "sampled distribution"
        );

        let width = probabilities.width();
        Ok(first_seen
            .into_iter()
            .map(|idx| (bitstring(support[idx].0, width), tally[idx]))
            .collect())
    }
}

impl Default for Sampler {
    fn default() -> Self {
        Self::new()
    }
}
