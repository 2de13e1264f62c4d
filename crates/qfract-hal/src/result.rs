//! Measurement histograms and execution results.

use rustc_hash::FxHashMap;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Histogram of measured bitstrings.
///
/// Bitstrings are written with classical bit 0 as the rightmost character.
/// Entries keep the order in which each bitstring was first recorded, which
/// makes [`sorted`](Self::sorted) deterministic when counts tie.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Counts {
    entries: Vec<(String, u64)>,
    index: FxHashMap<String, usize>,
}

impl Counts {
    /// Create an empty histogram.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `count` occurrences of `bitstring`, accumulating onto any existing entry.
    pub fn insert(&mut self, bitstring: impl Into<String>, count: u64) {
        let bitstring = bitstring.into();
        match self.index.get(&bitstring) {
            Some(&pos) => self.entries[pos].1 += count,
            None => {
                self.index.insert(bitstring.clone(), self.entries.len());
                self.entries.push((bitstring, count));
            }
        }
    }

    /// Count for `bitstring`, zero if never observed.
    pub fn get(&self, bitstring: &str) -> u64 {
        self.index
            .get(bitstring)
            .map_or(0, |&pos| self.entries[pos].1)
    }

    /// Sum of all counts.
    pub fn total_shots(&self) -> u64 {
        self.entries.iter().map(|(_, c)| c).sum()
    }

    /// Number of distinct bitstrings.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in first-insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.entries.iter().map(|(b, c)| (b.as_str(), *c))
    }

    /// Entries by descending count; ties keep insertion order.
    pub fn sorted(&self) -> Vec<(&str, u64)> {
        let mut sorted: Vec<_> = self.iter().collect();
        sorted.sort_by(|a, b| b.1.cmp(&a.1));
        sorted
    }

    /// The mode, ties broken by insertion order.
    pub fn most_frequent(&self) -> Option<(&str, u64)> {
        self.sorted().into_iter().next()
    }
}

impl<S: Into<String>> FromIterator<(S, u64)> for Counts {
    fn from_iter<I: IntoIterator<Item = (S, u64)>>(iter: I) -> Self {
        let mut counts = Counts::new();
        for (bitstring, count) in iter {
            counts.insert(bitstring, count);
        }
        counts
    }
}

impl Serialize for Counts {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (bitstring, count) in &self.entries {
            map.serialize_entry(bitstring, count)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Counts {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct CountsVisitor;

        impl<'de> Visitor<'de> for CountsVisitor {
            type Value = Counts;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of bitstring to count")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Counts, A::Error> {
                let mut counts = Counts::new();
                while let Some((bitstring, count)) = access.next_entry::<String, u64>()? {
                    counts.insert(bitstring, count);
                }
                Ok(counts)
            }
        }

        deserializer.deserialize_map(CountsVisitor)
    }
}

/// Outcome of running a circuit for a number of shots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Measured histogram.
    pub counts: Counts,
    /// Shots requested.
    pub shots: u32,
    /// Wall-clock time spent executing, if measured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution_time_ms: Option<u64>,
}

impl ExecutionResult {
    pub fn new(counts: Counts, shots: u32) -> Self {
        Self {
            counts,
            shots,
            execution_time_ms: None,
        }
    }

    pub fn with_execution_time(mut self, ms: u64) -> Self {
        self.execution_time_ms = Some(ms);
        self
    }

    /// Whether the histogram accounts for exactly the requested shots.
    pub fn is_complete(&self) -> bool {
        self.counts.total_shots() == u64::from(self.shots)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_accumulates() {
        let mut counts = Counts::new();
        counts.insert("01", 3);
        counts.insert("10", 1);
        counts.insert("01", 2);

        assert_eq!(counts.get("01"), 5);
        assert_eq!(counts.get("11"), 0);
        assert_eq!(counts.len(), 2);
        assert_eq!(counts.total_shots(), 6);
    }

    #[test]
    fn test_sorted_is_stable_on_ties() {
        let counts: Counts = [("11", 4), ("00", 7), ("10", 4), ("01", 7)]
            .into_iter()
            .collect();
        assert_eq!(
            counts.sorted(),
            vec![("00", 7), ("01", 7), ("11", 4), ("10", 4)]
        );
        assert_eq!(counts.most_frequent(), Some(("00", 7)));
    }

    #[test]
    fn test_empty() {
        let counts = Counts::new();
        assert!(counts.most_frequent().is_none());
        assert_eq!(counts.total_shots(), 0);
    }

    #[test]
    fn test_json_preserves_order() {
        let counts: Counts = [("1", 10), ("0", 30)].into_iter().collect();
        let json = serde_json::to_string(&counts).unwrap();
        assert_eq!(json, r#"{"1":10,"0":30}"#);

        let back: Counts = serde_json::from_str(&json).unwrap();
        assert_eq!(back.iter().collect::<Vec<_>>(), vec![("1", 10), ("0", 30)]);
    }

    #[test]
    fn test_execution_result_completeness() {
        let counts: Counts = [("00", 600), ("11", 400)].into_iter().collect();
        let result = ExecutionResult::new(counts, 1000).with_execution_time(12);
        assert!(result.is_complete());
        assert_eq!(result.execution_time_ms, Some(12));
    }
}
