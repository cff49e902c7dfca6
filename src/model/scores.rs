use crate::model::markers::MarkerSet;
use crate::stats::median;

/// Cells x labels similarity scores for one reference. The label set always
/// equals the vocabulary of the reference the scores were computed against.
#[derive(Debug, Clone)]
pub struct ScoreMatrix {
    pub labels: Vec<String>,
    pub rows: Vec<Vec<f32>>,
}

impl ScoreMatrix {
    pub fn n_cells(&self) -> usize {
        self.rows.len()
    }

    pub fn n_labels(&self) -> usize {
        self.labels.len()
    }

    /// Index of the best-scoring label; earlier label wins an exact tie.
    pub fn best_label(&self, cell: usize) -> usize {
        let row = &self.rows[cell];
        let mut best = 0usize;
        for (idx, &score) in row.iter().enumerate() {
            if score > row[best] {
                best = idx;
            }
        }
        best
    }

    /// Gap between the best and second-best score for a cell.
    pub fn best_gap(&self, cell: usize) -> f32 {
        let row = &self.rows[cell];
        let mut best = f32::NEG_INFINITY;
        let mut second = f32::NEG_INFINITY;
        for &score in row {
            if score > best {
                second = best;
                best = score;
            } else if score > second {
                second = score;
            }
        }
        if second == f32::NEG_INFINITY {
            0.0
        } else {
            best - second
        }
    }

    /// delta = assigned-label score minus the median score across all labels.
    pub fn delta(&self, cell: usize, assigned: usize) -> f32 {
        self.rows[cell][assigned] - median(&self.rows[cell])
    }
}

/// Output of classifying one test dataset against one reference. Immutable
/// once produced; the pruner and combiner only derive new structures from it.
#[derive(Debug, Clone)]
pub struct RefResult {
    pub reference: String,
    pub scores: ScoreMatrix,
    pub assigned: Vec<usize>,
    pub deltas: Vec<f32>,
    pub markers: MarkerSet,
}

impl RefResult {
    pub fn n_cells(&self) -> usize {
        self.assigned.len()
    }

    pub fn assigned_label(&self, cell: usize) -> &str {
        &self.scores.labels[self.assigned[cell]]
    }
}
