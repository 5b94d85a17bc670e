//! Previously-known-identifiers working set
//!
//! Seeded from every local identifier tagged with the account's datasource
//! scope before a pass begins, and drained as the pass re-observes entries.
//! Whatever remains at pass end is the deletion candidate set, handed to an
//! external deletion collaborator; the engine never deletes anything
//! itself.
//!
//! The set is mutated only by removal and is shared across concurrently
//! crawled collections, hence the concurrent set underneath.

use std::collections::HashSet;

use dashmap::DashSet;

use metamir_core::domain::newtypes::LocalId;

/// Per-pass working set of identifiers known before the pass
#[derive(Debug, Default)]
pub struct PreviousResourceSet {
    ids: DashSet<LocalId>,
}

impl PreviousResourceSet {
    /// Seeds the set from the store's known identifiers
    #[must_use]
    pub fn new(known: HashSet<LocalId>) -> Self {
        let ids = DashSet::with_capacity(known.len());
        for id in known {
            ids.insert(id);
        }
        Self { ids }
    }

    /// Marks an identifier as re-observed, removing it from the set
    ///
    /// Returns true when the identifier was present.
    pub fn observe(&self, id: &LocalId) -> bool {
        self.ids.remove(id).is_some()
    }

    /// Number of identifiers not yet re-observed
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// True when every seeded identifier has been re-observed
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// The identifiers never re-observed during the pass
    pub fn remaining(&self) -> HashSet<LocalId> {
        self.ids.iter().map(|id| id.clone()).collect()
    }
}
