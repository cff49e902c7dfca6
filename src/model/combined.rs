use serde::Serialize;

/// One reference's own call for a cell, kept alongside the combined winner
/// for introspection. `recomputed` is the score over the cross-reference
/// marker union; it exists only for the label this reference assigned.
#[derive(Debug, Clone, Serialize)]
pub struct RefCall {
    pub reference: String,
    pub label: String,
    pub score: f32,
    pub delta: f32,
    pub recomputed: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct CombinedCell {
    /// Index into `calls` of the winning reference.
    pub winner: usize,
    pub calls: Vec<RefCall>,
}

impl CombinedCell {
    pub fn winning_call(&self) -> &RefCall {
        &self.calls[self.winner]
    }
}

/// Combined annotation of a test dataset against N references. `results` is
/// aligned to `cells`; `calls` within each cell follow the declared reference
/// input order.
#[derive(Debug, Clone)]
pub struct CombinedTable {
    pub cells: Vec<String>,
    pub references: Vec<String>,
    pub results: Vec<CombinedCell>,
}

impl CombinedTable {
    pub fn n_cells(&self) -> usize {
        self.results.len()
    }

    /// Recomputed score for (cell, reference, label). Defined only when
    /// `label` is the label that reference assigned to the cell; anything
    /// else is absent, never zero.
    pub fn recomputed_score(&self, cell: usize, reference: &str, label: &str) -> Option<f32> {
        let result = self.results.get(cell)?;
        result
            .calls
            .iter()
            .find(|c| c.reference == reference && c.label == label)
            .map(|c| c.recomputed)
    }

    pub fn winning_labels(&self) -> Vec<&str> {
        self.results
            .iter()
            .map(|r| r.winning_call().label.as_str())
            .collect()
    }
}
