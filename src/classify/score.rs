use crate::input::ExprMatrix;
use crate::stats::{average_ranks, pearson, quantile_interpolated, spearman};

/// Values of one expression column restricted to a gene subset, rank
/// transformed. Spearman correlation between two columns over the same
/// subset is then Pearson over these ranks.
pub fn rank_subset(column: &[f32], subset: &[u32]) -> Vec<f32> {
    let values: Vec<f32> = subset.iter().map(|&g| column[g as usize]).collect();
    average_ranks(&values)
}

/// Scores labels for one reference over a fixed gene subset. Reference
/// sample ranks are computed once and reused for every test cell.
pub struct LabelScorer {
    sample_ranks: Vec<Vec<f32>>,
    by_label: Vec<Vec<usize>>,
    quantile: f32,
}

impl LabelScorer {
    pub fn new(
        expr: &ExprMatrix,
        by_label: &[Vec<usize>],
        subset: &[u32],
        quantile: f32,
    ) -> Self {
        let sample_ranks = expr
            .columns
            .iter()
            .map(|col| rank_subset(col, subset))
            .collect();
        LabelScorer {
            sample_ranks,
            by_label: by_label.to_vec(),
            quantile,
        }
    }

    /// Label score: quantile of Spearman correlations between the cell and
    /// each reference sample carrying the label.
    pub fn score(&self, cell_ranks: &[f32], label: usize) -> f32 {
        let correlations: Vec<f32> = self.by_label[label]
            .iter()
            .map(|&s| pearson(cell_ranks, &self.sample_ranks[s]))
            .collect();
        quantile_interpolated(&correlations, self.quantile)
    }
}

/// One-off scoring of a cell against one label over an ad-hoc gene subset.
/// Fine-tuning and combiner recomputation use this; the subset changes per
/// call, so there is nothing to precompute.
pub fn score_on_subset(
    cell_column: &[f32],
    expr: &ExprMatrix,
    label_samples: &[usize],
    subset: &[u32],
    quantile: f32,
) -> f32 {
    let cell_values: Vec<f32> = subset.iter().map(|&g| cell_column[g as usize]).collect();
    let correlations: Vec<f32> = label_samples
        .iter()
        .map(|&s| {
            let sample_values: Vec<f32> =
                subset.iter().map(|&g| expr.columns[s][g as usize]).collect();
            spearman(&cell_values, &sample_values)
        })
        .collect();
    quantile_interpolated(&correlations, quantile)
}
