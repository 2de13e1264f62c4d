//! Text and JSON summaries of a measurement histogram.

use serde::Serialize;
use std::fmt::Write as _;

use qfract_adapter_sim::BlochVector;
use qfract_hal::Counts;

const TITLE: &str = "===== Quantum Fractal Experiment Results =====";
const RULE: &str = "=============================================";

/// One histogram row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportEntry {
    pub bitstring: String,
    pub count: u64,
}

/// Summary of a histogram.
///
/// Entries are sorted by descending count; ties keep the order in which the
/// bitstrings were first recorded, so the same `Counts` always renders the
/// same way.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub total_shots: u64,
    pub unique_states: usize,
    pub most_probable: Option<ReportEntry>,
    pub entries: Vec<ReportEntry>,
}

impl Report {
    pub fn from_counts(counts: &Counts, shots: u32) -> Self {
        let entries: Vec<ReportEntry> = counts
            .sorted()
            .into_iter()
            .map(|(bitstring, count)| ReportEntry {
                bitstring: bitstring.to_string(),
                count,
            })
            .collect();

        Self {
            total_shots: u64::from(shots),
            unique_states: entries.len(),
            most_probable: counts
                .most_frequent()
                .map(|(bitstring, count)| ReportEntry {
                    bitstring: bitstring.to_string(),
                    count,
                }),
            entries,
        }
    }

    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{TITLE}");
        let _ = writeln!(out, "Total shots       : {}", self.total_shots);
        let _ = writeln!(out, "Unique states     : {}", self.unique_states);
        match &self.most_probable {
            Some(entry) => {
                let _ = writeln!(
                    out,
                    "Most probable     : {} ({} counts)",
                    entry.bitstring, entry.count
                );
            }
            None => {
                let _ = writeln!(out, "Most probable     : -");
            }
        }
        let _ = writeln!(out);
        let _ = writeln!(out, "State counts:");
        for entry in &self.entries {
            let _ = writeln!(out, "  {} : {}", entry.bitstring, entry.count);
        }
        let _ = writeln!(out, "{RULE}");
        out
    }
}

/// One `Qubit i: (x, y, z) |r| = …` line per qubit.
pub fn render_bloch(vectors: &[BlochVector]) -> String {
    let mut out = String::new();
    for (i, v) in vectors.iter().enumerate() {
        let _ = writeln!(out, "Qubit {i}: {v} |r| = {:.4}", v.norm());
    }
    out
}
