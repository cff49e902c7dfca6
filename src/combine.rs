use std::collections::BTreeSet;
use std::sync::Arc;

use rayon::prelude::*;

use crate::cache::ResultCache;
use crate::classify::{ScoreParams, classify};
use crate::classify::score::score_on_subset;
use crate::error::AnnotError;
use crate::input::{Dataset, Reference};
use crate::markers::{MarkerMethod, detect_classic, detect_consistent};
use crate::model::combined::{CombinedCell, CombinedTable, RefCall};
use crate::model::markers::MarkerSet;
use crate::model::scores::RefResult;

#[derive(Debug, Clone, Copy)]
pub struct CombineParams {
    pub score: ScoreParams,
    pub method: MarkerMethod,
}

impl Default for CombineParams {
    fn default() -> Self {
        CombineParams {
            score: ScoreParams::default(),
            method: MarkerMethod::Classic,
        }
    }
}

/// Annotates a test dataset against N references and combines the results
/// into one call per cell.
///
/// Each reference is classified independently (in parallel; results are
/// merged in declared input order, so completion order never affects the
/// outcome). Per cell, every reference's winning label is then re-scored on
/// the union of the winners' marker genes, so the scores being compared are
/// computed over identical features. The maximal recomputed score wins; an
/// exact tie goes to the earliest reference in input order.
///
/// Inputs must already be aligned to a shared gene space (`input::align`).
pub fn combine(
    test: &Dataset,
    references: &[Reference],
    params: &CombineParams,
    cache: Option<&mut ResultCache>,
) -> Result<(CombinedTable, Vec<Arc<RefResult>>), AnnotError> {
    if references.is_empty() {
        return Err(AnnotError::NoReferences);
    }

    let marker_sets = build_marker_sets(references, params)?;
    let results = classify_all(test, references, &marker_sets, &params.score, cache)?;

    let by_label: Vec<Vec<Vec<usize>>> = references.iter().map(|r| r.samples_by_label()).collect();
    let n_cells = test.expr.n_samples();

    let combined: Result<Vec<CombinedCell>, AnnotError> = (0..n_cells)
        .into_par_iter()
        .map(|cell| combine_cell(cell, test, references, &results, &by_label, params))
        .collect();
    let combined = combined?;

    let table = CombinedTable {
        cells: test.expr.samples.clone(),
        references: references.iter().map(|r| r.name.clone()).collect(),
        results: combined,
    };

    tracing::info!(
        n_cells,
        n_references = references.len(),
        "combined multi-reference annotation"
    );

    Ok((table, results))
}

fn build_marker_sets(
    references: &[Reference],
    params: &CombineParams,
) -> Result<Vec<MarkerSet>, AnnotError> {
    match params.method {
        MarkerMethod::Classic => Ok(references
            .iter()
            .map(|r| detect_classic(r, params.score.markers_per_pair))
            .collect()),
        MarkerMethod::Consistent => {
            let shared = detect_consistent(references, params.score.markers_per_pair)?;
            Ok(vec![shared; references.len()])
        }
    }
}

fn classify_all(
    test: &Dataset,
    references: &[Reference],
    marker_sets: &[MarkerSet],
    params: &ScoreParams,
    cache: Option<&mut ResultCache>,
) -> Result<Vec<Arc<RefResult>>, AnnotError> {
    let mut slots: Vec<Option<Arc<RefResult>>> = vec![None; references.len()];
    if let Some(cache) = &cache {
        for (idx, reference) in references.iter().enumerate() {
            slots[idx] = cache.get(&reference.name, &test.id);
        }
    }

    let misses: Vec<usize> = (0..references.len())
        .filter(|&i| slots[i].is_none())
        .collect();
    let computed: Result<Vec<(usize, Arc<RefResult>)>, AnnotError> = misses
        .par_iter()
        .map(|&i| {
            classify(test, &references[i], &marker_sets[i], params)
                .map(|result| (i, Arc::new(result)))
        })
        .collect();

    let mut cache = cache;
    for (i, result) in computed? {
        if let Some(cache) = cache.as_deref_mut() {
            cache.insert(&references[i].name, &test.id, result.clone());
        }
        slots[i] = Some(result);
    }

    Ok(slots
        .into_iter()
        .map(|s| s.expect("every slot is filled by cache or classification"))
        .collect())
}

fn combine_cell(
    cell: usize,
    test: &Dataset,
    references: &[Reference],
    results: &[Arc<RefResult>],
    by_label: &[Vec<Vec<usize>>],
    params: &CombineParams,
) -> Result<CombinedCell, AnnotError> {
    // union of the marker genes of every reference's winning label
    let mut union: BTreeSet<u32> = BTreeSet::new();
    for result in results {
        let assigned = result.assigned[cell];
        let label_markers = result.markers.label_union(assigned);
        if label_markers.is_empty() {
            return Err(AnnotError::MissingMarkers {
                reference: result.reference.clone(),
                label: result.scores.labels[assigned].clone(),
            });
        }
        union.extend(label_markers);
    }
    let union: Vec<u32> = union.into_iter().collect();

    let cell_column = &test.expr.columns[cell];
    let mut calls = Vec::with_capacity(results.len());
    for (idx, result) in results.iter().enumerate() {
        let assigned = result.assigned[cell];
        let recomputed = score_on_subset(
            cell_column,
            &references[idx].expr,
            &by_label[idx][assigned],
            &union,
            params.score.quantile,
        );
        calls.push(RefCall {
            reference: result.reference.clone(),
            label: result.scores.labels[assigned].clone(),
            score: result.scores.rows[cell][assigned],
            delta: result.deltas[cell],
            recomputed,
        });
    }

    // strict comparison keeps the earliest reference on an exact tie
    let mut winner = 0usize;
    for (idx, call) in calls.iter().enumerate() {
        if call.recomputed > calls[winner].recomputed {
            winner = idx;
        }
    }

    Ok(CombinedCell { winner, calls })
}

#[cfg(test)]
#[path = "../tests/src_inline/combine.rs"]
mod tests;
