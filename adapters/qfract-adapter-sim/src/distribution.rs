//! Outcome probability distributions.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// Probabilities below this are treated as zero when sampling.
pub const SUPPORT_EPSILON: f64 = 1e-12;

/// Render basis index `index` as a `width`-character bitstring, bit 0 rightmost.
pub fn bitstring(index: usize, width: u32) -> String {
    format!("{index:0width$b}", width = width as usize)
}

/// Probability per basis index over a `width`-bit register.
///
/// Only non-zero entries are stored, in ascending index order. Bitstrings
/// are formatted on demand, so a wide register with a small support costs
/// memory in proportion to the support.
#[derive(Debug, Clone, PartialEq)]
pub struct Probabilities {
    width: u32,
    entries: Vec<(usize, f64)>,
}

impl Probabilities {
    /// Build from a dense vector where entry `i` is the probability of index `i`.
    pub fn from_dense(width: u32, probs: &[f64]) -> Self {
        let entries = probs
            .iter()
            .enumerate()
            .filter(|&(_, &p)| p != 0.0)
            .map(|(i, &p)| (i, p))
            .collect();
        Self { width, entries }
    }

    /// Build from `(index, probability)` pairs; repeated indices accumulate.
    pub fn from_sparse(width: u32, mut entries: Vec<(usize, f64)>) -> Self {
        entries.sort_by_key(|&(i, _)| i);
        let mut merged: Vec<(usize, f64)> = Vec::with_capacity(entries.len());
        for (i, p) in entries {
            match merged.last_mut() {
                Some((last, acc)) if *last == i => *acc += p,
                _ => merged.push((i, p)),
            }
        }
        merged.retain(|&(_, p)| p != 0.0);
        Self {
            width,
            entries: merged,
        }
    }

    /// Bitstring length.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Number of stored (non-zero) outcomes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Non-zero `(basis index, probability)` pairs.
    pub fn indexed(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.entries.iter().copied()
    }

    /// Non-zero `(bitstring, probability)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (String, f64)> + '_ {
        self.indexed().map(|(i, p)| (bitstring(i, self.width), p))
    }

    /// Probability of basis index `index`.
    pub fn get_index(&self, index: usize) -> f64 {
        self.entries
            .binary_search_by_key(&index, |&(i, _)| i)
            .map_or(0.0, |pos| self.entries[pos].1)
    }

    /// Probability of `bitstring`, zero if absent or malformed.
    pub fn get(&self, bitstring: &str) -> f64 {
        if bitstring.len() != self.width as usize {
            return 0.0;
        }
        usize::from_str_radix(bitstring, 2).map_or(0.0, |i| self.get_index(i))
    }

    /// Sum of all probabilities.
    pub fn total(&self) -> f64 {
        self.entries.iter().map(|(_, p)| p).sum()
    }

    /// Indexed entries with probability above [`SUPPORT_EPSILON`].
    pub fn support(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.indexed().filter(|&(_, p)| p > SUPPORT_EPSILON)
    }
}

impl Serialize for Probabilities {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (bitstring, p) in self.iter() {
            map.serialize_entry(&bitstring, &p)?;
        }
        map.end()
    }
}
