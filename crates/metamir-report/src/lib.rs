//! Metamir Report - Structured pass observability
//!
//! Provides:
//! - [`FailureLog`] / [`ItemFailure`]: thread-safe collection of per-item
//!   failures (provider id, stage, message)
//! - [`CollectionSummary`] / [`CollectionStatus`]: per-collection outcome
//! - [`PassReport`]: the full record of one reconciliation pass
//!
//! The engine records into these types as it runs; callers read the report
//! from the pass outcome. Nothing here is fatal: reporting never interferes
//! with reconciliation.

pub mod failure;
pub mod report;

pub use failure::{FailureLog, FailureStage, ItemFailure};
pub use report::{CollectionStatus, CollectionSummary, PassReport};
