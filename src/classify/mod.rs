pub mod finetune;
pub mod score;

use crate::error::AnnotError;
use crate::input::{Dataset, Reference};
use crate::model::markers::MarkerSet;
use crate::model::scores::{RefResult, ScoreMatrix};
use finetune::fine_tune_cell;
use score::{LabelScorer, rank_subset};

#[derive(Debug, Clone, Copy)]
pub struct ScoreParams {
    /// Quantile of per-sample correlations used as the label score.
    pub quantile: f32,
    pub fine_tune: bool,
    /// Labels within this margin of the per-cell maximum enter fine-tuning.
    pub tune_thresh: f32,
    pub markers_per_pair: usize,
}

impl Default for ScoreParams {
    fn default() -> Self {
        ScoreParams {
            quantile: 0.8,
            fine_tune: false,
            tune_thresh: 0.05,
            markers_per_pair: 10,
        }
    }
}

/// Classifies every cell of the test dataset against one reference: scores
/// each vocabulary label on the reference's marker union, assigns the best
/// label (optionally refined by fine-tuning), and records the per-cell delta
/// against the median score. Inputs must already share a gene space.
pub fn classify(
    test: &Dataset,
    reference: &Reference,
    markers: &MarkerSet,
    params: &ScoreParams,
) -> Result<RefResult, AnnotError> {
    if reference.vocab.is_empty() {
        return Err(AnnotError::EmptyScores);
    }

    let all_labels: Vec<usize> = (0..reference.vocab.len()).collect();
    let mut subset = markers.subset_union(&all_labels);
    if subset.len() < 2 {
        tracing::warn!(
            reference = %reference.name,
            "marker union has fewer than 2 genes; scoring over all shared genes"
        );
        subset = (0..reference.expr.n_genes() as u32).collect();
    }

    let by_label = reference.samples_by_label();
    let scorer = LabelScorer::new(&reference.expr, &by_label, &subset, params.quantile);

    let n_cells = test.expr.n_samples();
    let mut rows = Vec::with_capacity(n_cells);
    let mut assigned = Vec::with_capacity(n_cells);
    let mut deltas = Vec::with_capacity(n_cells);

    for cell in 0..n_cells {
        let cell_ranks = rank_subset(&test.expr.columns[cell], &subset);
        let row: Vec<f32> = (0..reference.vocab.len())
            .map(|label| scorer.score(&cell_ranks, label))
            .collect();
        rows.push(row);
    }

    let scores = ScoreMatrix {
        labels: reference.vocab.clone(),
        rows,
    };

    for cell in 0..n_cells {
        let mut best = scores.best_label(cell);
        if params.fine_tune && scores.n_labels() > 1 {
            best = fine_tune_cell(
                &test.expr.columns[cell],
                reference,
                markers,
                &by_label,
                &scores.rows[cell],
                params,
            );
        }
        deltas.push(scores.delta(cell, best));
        assigned.push(best);
    }

    tracing::info!(
        reference = %reference.name,
        n_cells,
        n_labels = scores.n_labels(),
        n_marker_genes = subset.len(),
        "classified test cells"
    );

    Ok(RefResult {
        reference: reference.name.clone(),
        scores,
        assigned,
        deltas,
        markers: markers.clone(),
    })
}

#[cfg(test)]
#[path = "../../tests/src_inline/classify/classify.rs"]
mod tests;
