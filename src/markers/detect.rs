use crate::error::AnnotError;
use crate::input::Reference;
use crate::model::markers::MarkerSet;
use crate::stats::median;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerMethod {
    /// Pairwise median-difference markers within a single reference.
    Classic,
    /// Markers recurring across references sharing a harmonized vocabulary.
    Consistent,
}

/// Per-label median expression profiles, vocabulary order, one genes-length
/// vector per label.
pub fn label_profiles(reference: &Reference) -> Vec<Vec<f32>> {
    let n_genes = reference.expr.n_genes();
    let by_label = reference.samples_by_label();
    let mut profiles = Vec::with_capacity(by_label.len());
    for samples in &by_label {
        let mut profile = Vec::with_capacity(n_genes);
        for gene in 0..n_genes {
            let values: Vec<f32> = samples
                .iter()
                .map(|&s| reference.expr.columns[s][gene])
                .collect();
            profile.push(median(&values));
        }
        profiles.push(profile);
    }
    profiles
}

/// Classic marker detection: for each ordered label pair (a, b), the top
/// `per_pair` genes by positive difference of per-label median expression.
pub fn detect_classic(reference: &Reference, per_pair: usize) -> MarkerSet {
    let profiles = label_profiles(reference);
    let n_labels = reference.vocab.len();
    let mut set = MarkerSet::empty(reference.vocab.clone());

    for a in 0..n_labels {
        for b in 0..n_labels {
            if a == b {
                continue;
            }
            set.pairwise[a][b] = top_positive_diffs(&profiles[a], &profiles[b], per_pair);
        }
    }
    set
}

/// Consistent marker detection across references that share a harmonized
/// vocabulary. A gene earns a pair's slot by appearing as a classic marker
/// for that pair in as many references as possible; recurrence wins over
/// within-reference effect size.
pub fn detect_consistent(
    references: &[Reference],
    per_pair: usize,
) -> Result<MarkerSet, AnnotError> {
    let first = references.first().ok_or(AnnotError::NoReferences)?;
    let vocab = first.vocab.clone();
    for reference in references {
        if reference.vocab != vocab {
            return Err(AnnotError::VocabularyMismatch {
                reference: reference.name.clone(),
                expected: vocab.len(),
                found: reference.vocab.len(),
            });
        }
    }

    let all_profiles: Vec<Vec<Vec<f32>>> = references.iter().map(label_profiles).collect();
    let n_genes = first.expr.n_genes();
    let n_labels = vocab.len();
    // candidate pool twice as deep as the final cut
    let pool = per_pair * 2;

    let mut set = MarkerSet::empty(vocab);
    for a in 0..n_labels {
        for b in 0..n_labels {
            if a == b {
                continue;
            }
            let mut count = vec![0u32; n_genes];
            let mut diff_sum = vec![0.0f32; n_genes];
            for profiles in &all_profiles {
                for &gene in &top_positive_diffs(&profiles[a], &profiles[b], pool) {
                    count[gene as usize] += 1;
                    diff_sum[gene as usize] +=
                        profiles[a][gene as usize] - profiles[b][gene as usize];
                }
            }
            let mut candidates: Vec<u32> = (0..n_genes as u32)
                .filter(|&g| count[g as usize] > 0)
                .collect();
            candidates.sort_by(|&x, &y| {
                count[y as usize]
                    .cmp(&count[x as usize])
                    .then(
                        diff_sum[y as usize]
                            .partial_cmp(&diff_sum[x as usize])
                            .unwrap_or(std::cmp::Ordering::Equal),
                    )
                    .then(x.cmp(&y))
            });
            candidates.truncate(per_pair);
            candidates.sort_unstable();
            set.pairwise[a][b] = candidates;
        }
    }
    Ok(set)
}

fn top_positive_diffs(profile_a: &[f32], profile_b: &[f32], per_pair: usize) -> Vec<u32> {
    let mut diffs: Vec<(u32, f32)> = profile_a
        .iter()
        .zip(profile_b.iter())
        .enumerate()
        .filter_map(|(gene, (&a, &b))| {
            let d = a - b;
            if d > 0.0 { Some((gene as u32, d)) } else { None }
        })
        .collect();
    diffs.sort_by(|x, y| {
        y.1.partial_cmp(&x.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(x.0.cmp(&y.0))
    });
    diffs.truncate(per_pair);
    let mut genes: Vec<u32> = diffs.into_iter().map(|(g, _)| g).collect();
    genes.sort_unstable();
    genes
}

#[cfg(test)]
#[path = "../../tests/src_inline/markers/detect.rs"]
mod tests;
