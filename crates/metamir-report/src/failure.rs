//! Per-item failure records
//!
//! Item-level errors are contained by the reconciliation driver: the item is
//! skipped, its siblings continue, and the failure lands here with enough
//! context to identify the offending remote entry.

use std::fmt;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

/// Stage of item processing at which a failure occurred
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStage {
    /// Creating or looking up the local resource
    Upsert,
    /// Rewriting the resource's descriptive properties
    Properties,
    /// Resolving parent containers
    Hierarchy,
    /// Resolving author contacts
    Authors,
    /// Resolving camera equipment
    Equipment,
    /// Fetching or resolving access rules
    Sharing,
    /// Listing or processing container children
    Children,
    /// Advancing the modification clock
    Clock,
}

impl fmt::Display for FailureStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FailureStage::Upsert => "upsert",
            FailureStage::Properties => "properties",
            FailureStage::Hierarchy => "hierarchy",
            FailureStage::Authors => "authors",
            FailureStage::Equipment => "equipment",
            FailureStage::Sharing => "sharing",
            FailureStage::Children => "children",
            FailureStage::Clock => "clock",
        };
        write!(f, "{s}")
    }
}

/// One recorded item-level failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemFailure {
    /// Provider-assigned id of the offending entry
    pub provider_id: String,
    /// Processing stage that failed
    pub stage: FailureStage,
    /// Error description (anyhow chain, `{:#}`-formatted)
    pub message: String,
}

/// Thread-safe append-only collector of item failures
///
/// Shared between concurrently-crawled collections; drained into the
/// [`crate::PassReport`] when the pass ends.
#[derive(Debug, Default)]
pub struct FailureLog {
    entries: Mutex<Vec<ItemFailure>>,
}

impl FailureLog {
    /// Creates an empty log
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a failure
    pub fn record(&self, provider_id: &str, stage: FailureStage, message: String) {
        tracing::warn!(
            provider_id,
            stage = %stage,
            error = %message,
            "Item-level failure recorded"
        );
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(ItemFailure {
                provider_id: provider_id.to_string(),
                stage,
                message,
            });
    }

    /// Number of recorded failures
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    /// True when nothing has been recorded
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drains the recorded failures, leaving the log empty
    pub fn drain(&self) -> Vec<ItemFailure> {
        std::mem::take(
            &mut *self
                .entries
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner()),
        )
    }
}
