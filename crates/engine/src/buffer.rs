//! Write buffer
//!
//! Pending row mutations keyed by row. The buffer holds at most one mutation
//! per key: a later `put` for the same key replaces the earlier one. It is
//! cleared only by a fully successful flush, so a failed flush can be retried
//! with exactly the same batch.
//!
//! The buffer has no internal locking. The context keeps it behind a single
//! mutex; callers that need put-then-flush atomicity hold that guard across
//! both steps.

use bhc_core::{RowKey, RowMutation};
use std::collections::BTreeMap;

/// Pending mutations, ordered by row key
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteBuffer {
    puts: BTreeMap<RowKey, RowMutation>,
}

impl WriteBuffer {
    /// Empty buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the pending mutation for the mutation's row key.
    ///
    /// Returns the mutation it replaced, if any.
    pub fn put(&mut self, mutation: RowMutation) -> Option<RowMutation> {
        self.puts.insert(mutation.key().clone(), mutation)
    }

    /// Pending mutation for `key`
    pub fn get(&self, key: &RowKey) -> Option<&RowMutation> {
        self.puts.get(key)
    }

    /// Every pending mutation in key order
    pub fn get_all(&self) -> &BTreeMap<RowKey, RowMutation> {
        &self.puts
    }

    /// Owned batch of every pending mutation, in key order
    pub fn mutations(&self) -> Vec<RowMutation> {
        self.puts.values().cloned().collect()
    }

    /// Number of pending rows
    pub fn len(&self) -> usize {
        self.puts.len()
    }

    /// Whether nothing is pending
    pub fn is_empty(&self) -> bool {
        self.puts.is_empty()
    }

    /// Drop every pending mutation
    pub fn reset(&mut self) {
        self.puts.clear();
    }
}
