//! Pass reports
//!
//! The durable record of one reconciliation pass: what each collection did,
//! how many resources were touched, and which items failed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use metamir_core::domain::newtypes::{DatasourceId, PassId};
use metamir_core::domain::remote_item::CollectionKind;

use crate::failure::ItemFailure;

// ============================================================================
// Per-collection outcome
// ============================================================================

/// Terminal status of one collection's crawl
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum CollectionStatus {
    /// The listing was walked to exhaustion
    Completed,
    /// A page after the first failed; the pass kept what it had
    Truncated {
        /// Pages successfully fetched before the failure
        pages_fetched: u32,
        /// Error description of the failed fetch
        error: String,
    },
    /// The first page failed; nothing of this collection was crawled
    Failed {
        /// Error description of the failed fetch
        error: String,
    },
}

impl CollectionStatus {
    /// True for the `Failed` terminal
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, CollectionStatus::Failed { .. })
    }
}

/// Counters and status for one collection's part of a pass
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionSummary {
    /// Which collection this summarizes
    pub collection: CollectionKind,
    /// Terminal crawl status
    pub status: CollectionStatus,
    /// Pages fetched (including the page a truncation failed after)
    pub pages: u32,
    /// Resources created this pass
    pub created: u32,
    /// Existing resources whose properties were rewritten
    pub updated: u32,
    /// Resources skipped because their clock was current
    pub skipped: u32,
    /// Items abandoned due to item-level failures
    pub failed: u32,
}

impl CollectionSummary {
    /// Creates an empty summary for a collection
    #[must_use]
    pub fn new(collection: CollectionKind) -> Self {
        Self {
            collection,
            status: CollectionStatus::Completed,
            pages: 0,
            created: 0,
            updated: 0,
            skipped: 0,
            failed: 0,
        }
    }
}

// ============================================================================
// Pass report
// ============================================================================

/// The full record of one reconciliation pass
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PassReport {
    /// Identifier of this pass
    pub pass_id: PassId,
    /// Datasource scope the pass ran against
    pub datasource: DatasourceId,
    /// When the pass started
    pub started_at: DateTime<Utc>,
    /// When the pass finished
    pub finished_at: Option<DateTime<Utc>>,
    /// One summary per configured collection
    pub collections: Vec<CollectionSummary>,
    /// Item-level failures, in recording order
    pub failures: Vec<ItemFailure>,
    /// True when deletion candidates were withheld because a collection
    /// ended fatal (an uncrawled collection would be flagged wholesale)
    pub candidates_withheld: bool,
}

impl PassReport {
    /// Starts a report for a new pass
    #[must_use]
    pub fn begin(datasource: DatasourceId) -> Self {
        Self {
            pass_id: PassId::new(),
            datasource,
            started_at: Utc::now(),
            finished_at: None,
            collections: Vec::new(),
            failures: Vec::new(),
            candidates_withheld: false,
        }
    }

    /// Marks the pass finished
    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// True when any collection ended fatal
    #[must_use]
    pub fn any_collection_failed(&self) -> bool {
        self.collections.iter().any(|c| c.status.is_fatal())
    }

    /// Total resources created across collections
    #[must_use]
    pub fn total_created(&self) -> u32 {
        self.collections.iter().map(|c| c.created).sum()
    }

    /// Total resources rewritten across collections
    #[must_use]
    pub fn total_updated(&self) -> u32 {
        self.collections.iter().map(|c| c.updated).sum()
    }

    /// Total skip-on-unchanged decisions across collections
    #[must_use]
    pub fn total_skipped(&self) -> u32 {
        self.collections.iter().map(|c| c.skipped).sum()
    }

    /// Total items abandoned across collections
    #[must_use]
    pub fn total_failed(&self) -> u32 {
        self.collections.iter().map(|c| c.failed).sum()
    }

    /// Emits a one-line tracing summary of the pass
    pub fn log_summary(&self) {
        tracing::info!(
            pass_id = %self.pass_id,
            datasource = %self.datasource,
            created = self.total_created(),
            updated = self.total_updated(),
            skipped = self.total_skipped(),
            failed = self.total_failed(),
            failures = self.failures.len(),
            candidates_withheld = self.candidates_withheld,
            "Reconciliation pass finished"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::failure::FailureStage;

    fn datasource() -> DatasourceId {
        DatasourceId::new("account:test".to_string()).unwrap()
    }

    #[test]
    fn test_begin_and_finish() {
        let mut report = PassReport::begin(datasource());
        assert!(report.finished_at.is_none());
        report.finish();
        assert!(report.finished_at.is_some());
    }

    #[test]
    fn test_aggregate_counters() {
        let mut report = PassReport::begin(datasource());

        let mut docs = CollectionSummary::new(CollectionKind::Documents);
        docs.created = 2;
        docs.updated = 3;
        docs.skipped = 10;

        let mut photos = CollectionSummary::new(CollectionKind::Photos);
        photos.created = 1;
        photos.failed = 1;
        photos.status = CollectionStatus::Truncated {
            pages_fetched: 2,
            error: "timeout".to_string(),
        };

        report.collections.push(docs);
        report.collections.push(photos);

        assert_eq!(report.total_created(), 3);
        assert_eq!(report.total_updated(), 3);
        assert_eq!(report.total_skipped(), 10);
        assert_eq!(report.total_failed(), 1);
        assert!(!report.any_collection_failed());
    }

    #[test]
    fn test_fatal_detection() {
        let mut report = PassReport::begin(datasource());
        let mut docs = CollectionSummary::new(CollectionKind::Documents);
        docs.status = CollectionStatus::Failed {
            error: "401".to_string(),
        };
        report.collections.push(docs);

        assert!(report.any_collection_failed());
        assert!(docs_status_is_fatal(&report));
    }

    fn docs_status_is_fatal(report: &PassReport) -> bool {
        report.collections[0].status.is_fatal()
    }

    #[test]
    fn test_report_serialization() {
        let mut report = PassReport::begin(datasource());
        report.failures.push(ItemFailure {
            provider_id: "doc-3".to_string(),
            stage: FailureStage::Upsert,
            message: "boom".to_string(),
        });
        report.finish();

        let json = serde_json::to_string(&report).unwrap();
        let parsed: PassReport = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.failures.len(), 1);
        assert_eq!(parsed.pass_id, report.pass_id);
    }
}
