use std::collections::HashMap;
use std::sync::Arc;

use crate::model::scores::RefResult;

/// Explicit memoization of per-reference classification results, keyed by
/// (reference id, test dataset id). Invalidation is caller-controlled; there
/// is no hidden process-wide state. Callers that change scoring options
/// between runs must invalidate the affected entries themselves.
#[derive(Debug, Default)]
pub struct ResultCache {
    entries: HashMap<(String, String), Arc<RefResult>>,
}

impl ResultCache {
    pub fn new() -> Self {
        ResultCache::default()
    }

    pub fn get(&self, reference: &str, test_id: &str) -> Option<Arc<RefResult>> {
        self.entries
            .get(&(reference.to_string(), test_id.to_string()))
            .cloned()
    }

    pub fn insert(&mut self, reference: &str, test_id: &str, result: Arc<RefResult>) {
        self.entries
            .insert((reference.to_string(), test_id.to_string()), result);
    }

    /// Drops every entry computed against the named reference.
    pub fn invalidate_reference(&mut self, reference: &str) {
        self.entries.retain(|(r, _), _| r != reference);
    }

    /// Drops every entry computed for the named test dataset.
    pub fn invalidate_test(&mut self, test_id: &str) {
        self.entries.retain(|(_, t), _| t != test_id);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
