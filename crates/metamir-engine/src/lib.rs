//! Metamir Engine - Incremental metadata reconciliation
//!
//! Walks the paginated listings of a remote account's content collections
//! and mirrors their metadata into the local graph store, skipping items
//! whose modification clock is current, deduplicating auxiliary entities
//! (people, equipment, containers), and producing the set of identifiers
//! that have disappeared remotely.
//!
//! ## Modules
//!
//! - [`driver`] - The reconciliation driver orchestrating one full pass
//! - [`crawler`] - Paginated crawler over one remote collection
//! - [`upserter`] - Change-detection upserter (ensure + mtime-skip)
//! - [`auxiliary`] - Idempotent resolver for people and equipment
//! - [`hierarchy`] - Containment relation linker
//! - [`sharing`] - Access-rule to contributor-relation resolver
//! - [`previous`] - The per-pass previously-known-identifiers working set

pub mod auxiliary;
pub mod crawler;
pub mod driver;
pub mod hierarchy;
pub mod previous;
pub mod sharing;
pub mod upserter;

#[cfg(test)]
pub(crate) mod testing;

use thiserror::Error;

pub use driver::{AccountContext, PassOutcome, ReconciliationDriver};

/// Errors that abort a whole pass
///
/// Everything else is contained: per-item failures land in the failure log,
/// per-collection failures in the collection status.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The cancellation token was triggered; the pass unwound without
    /// advancing any modification clock past unwritten properties
    #[error("Reconciliation pass cancelled")]
    Cancelled,

    /// A domain-level error propagated from metamir-core
    #[error("Domain error: {0}")]
    Domain(#[from] metamir_core::domain::DomainError),
}
