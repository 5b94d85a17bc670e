//! Metadata store port (driven/secondary port)
//!
//! This module defines the interface for the local indexed graph store.
//! The engine is format-agnostic: it writes named properties and relations
//! against opaque resource handles and never sees the store's query
//! language.
//!
//! ## Design Notes
//!
//! - Uses `anyhow::Result` because storage errors are adapter-specific
//!   (SQLite, RDF endpoint, ...) and don't need domain-level classification.
//! - `ensure_resource` is the concurrency-critical operation: it must be a
//!   compare-and-swap-style idempotent create-if-absent, safe when two
//!   tasks race on the same identifier (auxiliary entities are resolved
//!   from concurrently-crawled collections).
//! - `set_property` is a single-valued upsert; `set_relation` is an
//!   idempotent insert (re-recording a relation must not duplicate it).

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::newtypes::{DatasourceId, LocalId};

// ============================================================================
// Store-side value types
// ============================================================================

/// Opaque handle to a store resource
///
/// Returned by [`IMetadataStore::ensure_resource`] and passed back for all
/// subsequent writes against that resource. The inner key is
/// adapter-defined (a row id for the SQLite adapter); the [`LocalId`] rides
/// along for logging.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceRef {
    /// Adapter-defined storage key
    pub key: i64,
    /// The deterministic local identifier this resource was ensured under
    pub local_id: LocalId,
}

/// Closed value type for resource properties
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyValue {
    /// Free-form text
    Text(String),
    /// Boolean flag
    Bool(bool),
    /// Integer value
    Int(i64),
    /// UTC timestamp
    Time(DateTime<Utc>),
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        PropertyValue::Text(s.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        PropertyValue::Text(s)
    }
}

impl From<bool> for PropertyValue {
    fn from(b: bool) -> Self {
        PropertyValue::Bool(b)
    }
}

impl From<i64> for PropertyValue {
    fn from(i: i64) -> Self {
        PropertyValue::Int(i)
    }
}

impl From<DateTime<Utc>> for PropertyValue {
    fn from(t: DateTime<Utc>) -> Self {
        PropertyValue::Time(t)
    }
}

// ============================================================================
// IMetadataStore trait
// ============================================================================

/// Port trait for the local indexed graph store
///
/// All writes are scoped to a datasource (the graph partition owned by one
/// account) through the resource they target; `ensure_resource` and
/// `list_known_identifiers` take the scope explicitly.
#[async_trait::async_trait]
pub trait IMetadataStore: Send + Sync {
    /// Creates the resource if absent, tagged with the given type tags,
    /// else returns the existing one
    ///
    /// Idempotent create-if-absent: safe to call repeatedly and from
    /// concurrent tasks. The second element reports whether the resource
    /// already existed.
    async fn ensure_resource(
        &self,
        datasource: &DatasourceId,
        local_id: &LocalId,
        type_tags: &[&str],
    ) -> anyhow::Result<(ResourceRef, bool)>;

    /// Returns the resource's last-synced modification clock, if any
    async fn get_modification_clock(
        &self,
        resource: &ResourceRef,
    ) -> anyhow::Result<Option<DateTime<Utc>>>;

    /// Advances the resource's modification clock
    async fn set_modification_clock(
        &self,
        resource: &ResourceRef,
        timestamp: DateTime<Utc>,
    ) -> anyhow::Result<()>;

    /// Writes a single-valued property (upsert)
    async fn set_property(
        &self,
        resource: &ResourceRef,
        name: &str,
        value: PropertyValue,
    ) -> anyhow::Result<()>;

    /// Records a relation from `resource` to `target` (idempotent insert)
    async fn set_relation(
        &self,
        resource: &ResourceRef,
        relation: &str,
        target: &ResourceRef,
    ) -> anyhow::Result<()>;

    /// Lists the identifiers of all remote-object resources in the
    /// datasource scope
    ///
    /// Seeds the previous-resource set at the start of a pass. Auxiliary
    /// entities (contacts, equipment) are not remote objects: they are
    /// excluded here and can therefore never become deletion candidates.
    async fn list_known_identifiers(
        &self,
        datasource: &DatasourceId,
    ) -> anyhow::Result<HashSet<LocalId>>;
}
