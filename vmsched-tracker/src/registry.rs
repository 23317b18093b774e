//! Completion registry
//!
//! Append-only record of operations that reached a terminal state during
//! one polling session. Its size is the session's convergence signal.

use std::collections::{BTreeSet, HashMap};
use tracing::debug;
use vmsched_core::domain::operation::{OperationHandle, OperationState};

/// Operation id to the handle observed when the operation became terminal
///
/// Entries are never removed or replaced.
#[derive(Debug, Clone, Default)]
pub struct CompletionRegistry {
    completed: HashMap<String, OperationHandle>,
}

impl CompletionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a terminal handle under its operation id
    ///
    /// Returns false without touching the registry if the id is already
    /// present or the handle is not terminal.
    pub fn try_add(&mut self, handle: OperationHandle) -> bool {
        if !handle.is_terminal() {
            debug!(
                "Ignoring non-terminal operation {} ({})",
                handle.operation_id, handle.state
            );
            return false;
        }

        match self.completed.entry(handle.operation_id.clone()) {
            std::collections::hash_map::Entry::Occupied(_) => false,
            std::collections::hash_map::Entry::Vacant(slot) => {
                slot.insert(handle);
                true
            }
        }
    }

    /// Number of completed operations
    pub fn len(&self) -> usize {
        self.completed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.completed.is_empty()
    }

    pub fn contains(&self, operation_id: &str) -> bool {
        self.completed.contains_key(operation_id)
    }

    pub fn get(&self, operation_id: &str) -> Option<&OperationHandle> {
        self.completed.get(operation_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &OperationHandle> {
        self.completed.values()
    }

    /// Number of completed operations that ended in `state`
    pub fn count_in(&self, state: OperationState) -> usize {
        self.completed.values().filter(|h| h.state == state).count()
    }

    /// The subset of `operation_ids` that has not completed yet
    pub fn exclude_completed(&self, operation_ids: &BTreeSet<String>) -> BTreeSet<String> {
        operation_ids
            .iter()
            .filter(|id| !self.completed.contains_key(id.as_str()))
            .cloned()
            .collect()
    }
}
