use crate::classify::ScoreParams;
use crate::classify::score::score_on_subset;
use crate::input::Reference;
use crate::model::markers::MarkerSet;

/// Iterative fine-tuning of one cell's assignment: keep the labels within
/// `tune_thresh` of the running maximum, re-score them on only the markers
/// that distinguish the surviving labels from each other, and repeat until a
/// single label remains or the candidate set stops shrinking. The initial
/// candidate set comes from the full score row.
pub fn fine_tune_cell(
    cell_column: &[f32],
    reference: &Reference,
    markers: &MarkerSet,
    by_label: &[Vec<usize>],
    initial_row: &[f32],
    params: &ScoreParams,
) -> usize {
    let mut candidates = keep_top(initial_row, &(0..initial_row.len()).collect::<Vec<_>>(), params.tune_thresh);
    let mut best = best_of(initial_row, &candidates);

    while candidates.len() > 1 {
        let subset = markers.subset_union(&candidates);
        if subset.len() < 2 {
            break;
        }
        let scores: Vec<f32> = candidates
            .iter()
            .map(|&label| {
                score_on_subset(
                    cell_column,
                    &reference.expr,
                    &by_label[label],
                    &subset,
                    params.quantile,
                )
            })
            .collect();
        let kept = keep_top(&scores, &candidates, params.tune_thresh);
        best = best_of_pairs(&scores, &candidates);
        if kept.len() == candidates.len() {
            break;
        }
        candidates = kept;
    }

    best
}

/// Labels whose score is within `thresh` of the maximum, preserving order.
fn keep_top(scores: &[f32], labels: &[usize], thresh: f32) -> Vec<usize> {
    let max = scores.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    labels
        .iter()
        .zip(scores.iter())
        .filter(|&(_, &s)| s >= max - thresh)
        .map(|(&l, _)| l)
        .collect()
}

fn best_of(row: &[f32], candidates: &[usize]) -> usize {
    let mut best = candidates[0];
    for &label in candidates {
        if row[label] > row[best] {
            best = label;
        }
    }
    best
}

fn best_of_pairs(scores: &[f32], labels: &[usize]) -> usize {
    let mut best = 0usize;
    for i in 1..scores.len() {
        if scores[i] > scores[best] {
            best = i;
        }
    }
    labels[best]
}
