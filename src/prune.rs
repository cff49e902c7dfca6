use crate::error::AnnotError;
use crate::model::scores::RefResult;
use crate::stats::{mad, median};

/// Label written in place of a pruned assignment.
pub const UNKNOWN_LABEL: &str = "unknown";

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PruneMode {
    /// Flag a cell when its delta is a low outlier within the distribution
    /// of deltas of all cells assigned the same label. Groups smaller than
    /// `min_group` are skipped and reported rather than tested.
    Outliers { nmads: f32, min_group: usize },
    /// Prune any cell whose delta falls below a fixed threshold.
    MinDelta { threshold: f32 },
    /// Prune any cell whose best-vs-second-best score gap falls below a
    /// fixed threshold.
    MinGap { threshold: f32 },
}

impl PruneMode {
    pub fn default_outliers() -> Self {
        PruneMode::Outliers {
            nmads: 3.0,
            min_group: 20,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PruneOutcome {
    /// Per cell: `Some(label index)` when the assignment survives, `None`
    /// when it is pruned. The source assignment is never modified.
    pub kept: Vec<Option<usize>>,
    pub n_pruned: usize,
    /// Labels whose groups were too small for the outlier test.
    pub skipped_groups: Vec<String>,
}

impl PruneOutcome {
    pub fn label<'a>(&self, result: &'a RefResult, cell: usize) -> &'a str {
        match self.kept[cell] {
            Some(idx) => &result.scores.labels[idx],
            None => UNKNOWN_LABEL,
        }
    }
}

/// Flags low-confidence assignments. Requires at least 2 labels in the score
/// matrix; with a single label the delta is identically zero and the test is
/// meaningless.
pub fn prune(result: &RefResult, mode: &PruneMode) -> Result<PruneOutcome, AnnotError> {
    if result.scores.n_labels() < 2 {
        return Err(AnnotError::TooFewLabels {
            reference: result.reference.clone(),
            n: result.scores.n_labels(),
        });
    }

    let n_cells = result.n_cells();
    let mut kept: Vec<Option<usize>> = result.assigned.iter().map(|&a| Some(a)).collect();
    let mut skipped_groups = Vec::new();

    match *mode {
        PruneMode::MinDelta { threshold } => {
            for cell in 0..n_cells {
                if result.deltas[cell] < threshold {
                    kept[cell] = None;
                }
            }
        }
        PruneMode::MinGap { threshold } => {
            for cell in 0..n_cells {
                if result.scores.best_gap(cell) < threshold {
                    kept[cell] = None;
                }
            }
        }
        PruneMode::Outliers { nmads, min_group } => {
            let n_labels = result.scores.n_labels();
            let mut groups: Vec<Vec<usize>> = vec![Vec::new(); n_labels];
            for (cell, &label) in result.assigned.iter().enumerate() {
                groups[label].push(cell);
            }
            for (label, cells) in groups.iter().enumerate() {
                if cells.is_empty() {
                    continue;
                }
                if cells.len() < min_group {
                    tracing::warn!(
                        label = %result.scores.labels[label],
                        group_size = cells.len(),
                        min_group,
                        "label group too small for outlier pruning; skipped"
                    );
                    skipped_groups.push(result.scores.labels[label].clone());
                    continue;
                }
                let deltas: Vec<f32> = cells.iter().map(|&c| result.deltas[c]).collect();
                let center = median(&deltas);
                let spread = mad(&deltas, center);
                let cutoff = center - nmads * spread;
                for (&cell, &delta) in cells.iter().zip(deltas.iter()) {
                    if delta < cutoff {
                        kept[cell] = None;
                    }
                }
            }
        }
    }

    let n_pruned = kept.iter().filter(|k| k.is_none()).count();
    tracing::info!(
        reference = %result.reference,
        n_cells,
        n_pruned,
        "pruned low-confidence assignments"
    );

    Ok(PruneOutcome {
        kept,
        n_pruned,
        skipped_groups,
    })
}

#[cfg(test)]
#[path = "../tests/src_inline/prune.rs"]
mod tests;
