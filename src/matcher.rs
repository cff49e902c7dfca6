use serde::Serialize;

use crate::classify::{ScoreParams, classify};
use crate::error::AnnotError;
use crate::input::{Dataset, InputError, Reference, align};
use crate::markers::detect_classic;

/// Mutual-assignment probabilities between two independently labeled
/// references. Entry `a_to_b[i][j]` is the fraction of A-samples labeled
/// `labels_a[i]` that are assigned `labels_b[j]` when classified against B;
/// `b_to_a[i][j]` is the fraction of B-samples labeled `labels_b[j]` that
/// come back as `labels_a[i]` against A. Diagnostic only: pairs near 1 in
/// both directions suggest a 1:1 correspondence, all-near-zero rows or
/// columns suggest reference-unique labels. Ambiguous or many-to-one matches
/// are left to human judgment.
#[derive(Debug, Clone, Serialize)]
pub struct MatchTable {
    pub reference_a: String,
    pub reference_b: String,
    pub labels_a: Vec<String>,
    pub labels_b: Vec<String>,
    pub a_to_b: Vec<Vec<f32>>,
    pub b_to_a: Vec<Vec<f32>>,
}

impl MatchTable {
    /// Elementwise minimum of the two directed probabilities.
    pub fn mutual(&self) -> Vec<Vec<f32>> {
        let mut out = Vec::with_capacity(self.labels_a.len());
        for i in 0..self.labels_a.len() {
            let row = (0..self.labels_b.len())
                .map(|j| self.a_to_b[i][j].min(self.b_to_a[i][j]))
                .collect();
            out.push(row);
        }
        out
    }
}

#[derive(Debug, thiserror::Error)]
pub enum MatchError {
    #[error(transparent)]
    Input(#[from] InputError),
    #[error(transparent)]
    Annot(#[from] AnnotError),
}

/// Classifies each reference's samples against the other and tabulates the
/// directed assignment probabilities for every label pair.
pub fn cross_match(
    ref_a: &Reference,
    ref_b: &Reference,
    params: &ScoreParams,
) -> Result<MatchTable, MatchError> {
    // align the pair to their own shared gene space
    let a_as_test = Dataset {
        id: ref_a.name.clone(),
        expr: ref_a.expr.clone(),
    };
    let (a_aligned, b_aligned) = {
        let (test, refs) = align(&a_as_test, std::slice::from_ref(ref_b))?;
        let b = refs.into_iter().next().expect("one reference in, one out");
        let a = Reference {
            name: ref_a.name.clone(),
            expr: test.expr,
            labels: ref_a.labels.clone(),
            vocab: ref_a.vocab.clone(),
        };
        (a, b)
    };

    let markers_a = detect_classic(&a_aligned, params.markers_per_pair);
    let markers_b = detect_classic(&b_aligned, params.markers_per_pair);

    let a_samples = Dataset {
        id: a_aligned.name.clone(),
        expr: a_aligned.expr.clone(),
    };
    let b_samples = Dataset {
        id: b_aligned.name.clone(),
        expr: b_aligned.expr.clone(),
    };

    let a_against_b = classify(&a_samples, &b_aligned, &markers_b, params)?;
    let b_against_a = classify(&b_samples, &a_aligned, &markers_a, params)?;

    let a_to_b = assignment_fractions(
        &a_aligned.labels,
        &a_aligned.vocab,
        &a_against_b.assigned,
        b_aligned.vocab.len(),
    );
    // tabulated as [a][b] to line up with a_to_b
    let b_to_a_by_b = assignment_fractions(
        &b_aligned.labels,
        &b_aligned.vocab,
        &b_against_a.assigned,
        a_aligned.vocab.len(),
    );
    let mut b_to_a = vec![vec![0.0f32; b_aligned.vocab.len()]; a_aligned.vocab.len()];
    for (b_idx, row) in b_to_a_by_b.iter().enumerate() {
        for (a_idx, &p) in row.iter().enumerate() {
            b_to_a[a_idx][b_idx] = p;
        }
    }

    Ok(MatchTable {
        reference_a: a_aligned.name,
        reference_b: b_aligned.name,
        labels_a: a_aligned.vocab,
        labels_b: b_aligned.vocab,
        a_to_b,
        b_to_a,
    })
}

/// Per true label, the fraction of its samples assigned to each target
/// label. Rows sum to 1 for every label with at least one sample.
fn assignment_fractions(
    true_labels: &[String],
    vocab: &[String],
    assigned: &[usize],
    n_target_labels: usize,
) -> Vec<Vec<f32>> {
    let mut counts = vec![vec![0usize; n_target_labels]; vocab.len()];
    let mut totals = vec![0usize; vocab.len()];
    for (sample, label) in true_labels.iter().enumerate() {
        if let Ok(idx) = vocab.binary_search(label) {
            counts[idx][assigned[sample]] += 1;
            totals[idx] += 1;
        }
    }
    counts
        .iter()
        .zip(totals.iter())
        .map(|(row, &total)| {
            row.iter()
                .map(|&c| if total > 0 { c as f32 / total as f32 } else { 0.0 })
                .collect()
        })
        .collect()
}

#[cfg(test)]
#[path = "../tests/src_inline/matcher.rs"]
mod tests;
