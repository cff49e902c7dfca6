use std::collections::{BTreeSet, HashMap};
use std::path::Path;

pub mod labels;
pub mod matrix;

use labels::{apply_label_map, read_label_map, read_labels};
use matrix::read_expr_tsv;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("missing input: {0}")]
    MissingInput(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("parse error: {0}")]
    Parse(String),
    #[error("no shared genes between test dataset and reference '{reference}'")]
    NoSharedGenes { reference: String },
}

/// Dense genes x samples expression matrix, column-major: one `Vec<f32>` per
/// sample, indexed by gene row. Values are expected to be non-negative and
/// typically log-transformed; the scorer is rank-based, so any monotone
/// transform of the same data produces identical scores.
#[derive(Debug, Clone)]
pub struct ExprMatrix {
    pub genes: Vec<String>,
    pub samples: Vec<String>,
    pub columns: Vec<Vec<f32>>,
}

impl ExprMatrix {
    pub fn n_genes(&self) -> usize {
        self.genes.len()
    }

    pub fn n_samples(&self) -> usize {
        self.samples.len()
    }

    pub fn gene_index(&self) -> HashMap<&str, usize> {
        self.genes
            .iter()
            .enumerate()
            .map(|(i, g)| (g.as_str(), i))
            .collect()
    }

    /// Projects the matrix onto `genes`, which must all be present.
    pub fn project(&self, genes: &[String]) -> Result<ExprMatrix, InputError> {
        let index = self.gene_index();
        let mut rows = Vec::with_capacity(genes.len());
        for gene in genes {
            match index.get(gene.as_str()) {
                Some(&i) => rows.push(i),
                None => {
                    return Err(InputError::InvalidInput(format!(
                        "gene {} not present in matrix during projection",
                        gene
                    )));
                }
            }
        }
        let columns = self
            .columns
            .iter()
            .map(|col| rows.iter().map(|&r| col[r]).collect())
            .collect();
        Ok(ExprMatrix {
            genes: genes.to_vec(),
            samples: self.samples.clone(),
            columns,
        })
    }
}

/// Test dataset: the cells to annotate.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub id: String,
    pub expr: ExprMatrix,
}

/// Labeled reference: expression matrix plus one label per sample column.
#[derive(Debug, Clone)]
pub struct Reference {
    pub name: String,
    pub expr: ExprMatrix,
    pub labels: Vec<String>,
    pub vocab: Vec<String>,
}

impl Reference {
    pub fn new(name: String, expr: ExprMatrix, labels: Vec<String>) -> Result<Self, InputError> {
        if labels.len() != expr.n_samples() {
            return Err(InputError::InvalidInput(format!(
                "reference {}: {} labels for {} samples",
                name,
                labels.len(),
                expr.n_samples()
            )));
        }
        let vocab = label_vocabulary(&labels);
        if vocab.is_empty() {
            return Err(InputError::InvalidInput(format!(
                "reference {}: empty label vocabulary",
                name
            )));
        }
        Ok(Reference {
            name,
            expr,
            labels,
            vocab,
        })
    }

    /// Sample column indices per vocabulary label, in vocabulary order.
    pub fn samples_by_label(&self) -> Vec<Vec<usize>> {
        let mut out = vec![Vec::new(); self.vocab.len()];
        for (sample, label) in self.labels.iter().enumerate() {
            if let Ok(idx) = self.vocab.binary_search(label) {
                out[idx].push(sample);
            }
        }
        out
    }
}

pub fn label_vocabulary(labels: &[String]) -> Vec<String> {
    let set: BTreeSet<&String> = labels.iter().collect();
    set.into_iter().cloned().collect()
}

pub fn load_dataset(id: &str, expr_path: &Path) -> Result<Dataset, InputError> {
    let expr = read_expr_tsv(expr_path)?;
    tracing::info!(
        dataset = id,
        n_genes = expr.n_genes(),
        n_cells = expr.n_samples(),
        "loaded test dataset"
    );
    Ok(Dataset {
        id: id.to_string(),
        expr,
    })
}

pub fn load_reference(
    name: &str,
    expr_path: &Path,
    labels_path: &Path,
    harmonize_path: Option<&Path>,
) -> Result<Reference, InputError> {
    let expr = read_expr_tsv(expr_path)?;
    let mut labels = read_labels(labels_path, &expr.samples)?;
    if let Some(map_path) = harmonize_path {
        let map = read_label_map(map_path)?;
        labels = apply_label_map(name, &labels, &map)?;
    }
    let reference = Reference::new(name.to_string(), expr, labels)?;
    tracing::info!(
        reference = name,
        n_genes = reference.expr.n_genes(),
        n_samples = reference.expr.n_samples(),
        n_labels = reference.vocab.len(),
        "loaded reference"
    );
    Ok(reference)
}

/// Intersection of gene symbols across the test dataset and every reference,
/// in sorted order. The whole run operates in this shared gene space so that
/// scores recomputed across references use identical features.
pub fn shared_gene_space(
    test: &ExprMatrix,
    references: &[Reference],
) -> Result<Vec<String>, InputError> {
    let mut shared: BTreeSet<&str> = test.genes.iter().map(|g| g.as_str()).collect();
    for reference in references {
        let ref_genes: BTreeSet<&str> = reference.expr.genes.iter().map(|g| g.as_str()).collect();
        shared = shared.intersection(&ref_genes).copied().collect();
        if shared.is_empty() {
            return Err(InputError::NoSharedGenes {
                reference: reference.name.clone(),
            });
        }
    }
    Ok(shared.into_iter().map(|g| g.to_string()).collect())
}

/// Projects the test dataset and all references onto their shared gene space.
pub fn align(
    test: &Dataset,
    references: &[Reference],
) -> Result<(Dataset, Vec<Reference>), InputError> {
    let shared = shared_gene_space(&test.expr, references)?;
    tracing::info!(n_shared_genes = shared.len(), "aligned gene space");
    let test_aligned = Dataset {
        id: test.id.clone(),
        expr: test.expr.project(&shared)?,
    };
    let mut refs_aligned = Vec::with_capacity(references.len());
    for reference in references {
        refs_aligned.push(Reference {
            name: reference.name.clone(),
            expr: reference.expr.project(&shared)?,
            labels: reference.labels.clone(),
            vocab: reference.vocab.clone(),
        });
    }
    Ok((test_aligned, refs_aligned))
}

#[cfg(test)]
#[path = "../../tests/src_inline/input/tests.rs"]
mod tests;
