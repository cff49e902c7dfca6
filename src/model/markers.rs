use std::collections::BTreeSet;

/// Per-reference marker genes: for each ordered label pair (a, b), the genes
/// upregulated in a relative to b, as sorted indices into the shared gene
/// space. `pairwise[a][a]` is always empty.
#[derive(Debug, Clone)]
pub struct MarkerSet {
    pub labels: Vec<String>,
    pub pairwise: Vec<Vec<Vec<u32>>>,
}

impl MarkerSet {
    pub fn empty(labels: Vec<String>) -> Self {
        let n = labels.len();
        MarkerSet {
            labels,
            pairwise: vec![vec![Vec::new(); n]; n],
        }
    }

    pub fn n_labels(&self) -> usize {
        self.labels.len()
    }

    /// Markers for one label against every other label.
    pub fn label_union(&self, label: usize) -> Vec<u32> {
        let mut set = BTreeSet::new();
        for (other, genes) in self.pairwise[label].iter().enumerate() {
            if other == label {
                continue;
            }
            set.extend(genes.iter().copied());
        }
        set.into_iter().collect()
    }

    /// Markers distinguishing the given label subset from each other, in both
    /// directions. Used by fine-tuning to re-score within a shrinking
    /// candidate set.
    pub fn subset_union(&self, labels: &[usize]) -> Vec<u32> {
        let mut set = BTreeSet::new();
        for &a in labels {
            for &b in labels {
                if a == b {
                    continue;
                }
                set.extend(self.pairwise[a][b].iter().copied());
            }
        }
        set.into_iter().collect()
    }
}
