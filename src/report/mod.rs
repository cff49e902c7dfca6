pub mod json;
pub mod table;

use serde::Serialize;
use thiserror::Error;

use crate::model::combined::CombinedTable;
use crate::prune::PruneOutcome;
use crate::stats::median;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Serialize)]
pub struct ReferenceSummary {
    pub name: String,
    pub n_labels: usize,
    pub n_wins: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct LabelCount {
    pub label: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct PruneSummary {
    pub mode: String,
    pub n_pruned: usize,
    pub pruned_fraction: f32,
    pub skipped_groups: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub tool_name: String,
    pub tool_version: String,
    pub test_id: String,
    pub n_cells: usize,
    pub n_shared_genes: usize,
    pub references: Vec<ReferenceSummary>,
    pub label_counts: Vec<LabelCount>,
    pub delta_median: f32,
    pub pruning: Option<PruneSummary>,
}

pub fn format_f32_6(v: f32) -> String {
    format!("{:.6}", v)
}

/// Aggregates the combined table (and per-reference prune outcomes, when
/// pruning ran) into the summary document.
pub fn build_summary(
    test_id: &str,
    n_shared_genes: usize,
    table: &CombinedTable,
    ref_label_counts: &[usize],
    prune: Option<(&str, &[PruneOutcome])>,
) -> RunSummary {
    let n_cells = table.n_cells();

    let mut wins = vec![0usize; table.references.len()];
    let mut deltas = Vec::with_capacity(n_cells);
    let mut counts: std::collections::BTreeMap<&str, usize> = std::collections::BTreeMap::new();
    for result in &table.results {
        wins[result.winner] += 1;
        let call = result.winning_call();
        deltas.push(call.delta);
        *counts.entry(call.label.as_str()).or_insert(0) += 1;
    }

    let references = table
        .references
        .iter()
        .zip(ref_label_counts.iter())
        .zip(wins.iter())
        .map(|((name, &n_labels), &n_wins)| ReferenceSummary {
            name: name.clone(),
            n_labels,
            n_wins,
        })
        .collect();

    let label_counts = counts
        .into_iter()
        .map(|(label, count)| LabelCount {
            label: label.to_string(),
            count,
        })
        .collect();

    let pruning = prune.map(|(mode, outcomes)| {
        // a cell counts as pruned when its winning reference pruned it
        let mut n_pruned = 0usize;
        for (cell, result) in table.results.iter().enumerate() {
            if outcomes[result.winner].kept[cell].is_none() {
                n_pruned += 1;
            }
        }
        let mut skipped: Vec<String> = outcomes
            .iter()
            .flat_map(|o| o.skipped_groups.iter().cloned())
            .collect();
        skipped.sort();
        skipped.dedup();
        PruneSummary {
            mode: mode.to_string(),
            n_pruned,
            pruned_fraction: if n_cells > 0 {
                n_pruned as f32 / n_cells as f32
            } else {
                0.0
            },
            skipped_groups: skipped,
        }
    });

    RunSummary {
        tool_name: "cellanno".to_string(),
        tool_version: env!("CARGO_PKG_VERSION").to_string(),
        test_id: test_id.to_string(),
        n_cells,
        n_shared_genes,
        references,
        label_counts,
        delta_median: median(&deltas),
        pruning,
    }
}
