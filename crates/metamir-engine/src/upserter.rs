//! Change-detection upserter
//!
//! Ensures a local resource exists for a remote entry and decides whether
//! its descriptive properties need rewriting at all. The decision is the
//! engine's core performance lever: a pass over an unchanged account must
//! not issue a single property write.
//!
//! The modification clock is deliberately not advanced here. Comparison
//! happens up front; [`ResourceUpserter::commit_clock`] runs only after the
//! caller has finished the full property rewrite, so a failed or cancelled
//! item keeps its old clock and is retried by the next pass.

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tracing::debug;

use metamir_core::domain::identity;
use metamir_core::domain::newtypes::{DatasourceId, LocalId};
use metamir_core::domain::remote_item::ItemKind;
use metamir_core::ports::metadata_store::{IMetadataStore, ResourceRef};

/// Idempotent create-if-absent plus strict-newer change detection
pub struct ResourceUpserter {
    store: Arc<dyn IMetadataStore>,
    datasource: DatasourceId,
}

impl ResourceUpserter {
    /// Creates an upserter writing into the given datasource scope
    pub fn new(store: Arc<dyn IMetadataStore>, datasource: DatasourceId) -> Self {
        Self { store, datasource }
    }

    /// Ensures a resource for a remote entry of the given kind
    ///
    /// Tags the resource with the base tag plus the kind tag from the kind
    /// table. Safe to call repeatedly; the second element reports whether
    /// the resource already existed.
    pub async fn ensure(&self, local_id: &LocalId, kind: ItemKind) -> Result<(ResourceRef, bool)> {
        self.store
            .ensure_resource(&self.datasource, local_id, &identity::type_tags(kind))
            .await
            .with_context(|| format!("Failed to ensure resource {local_id}"))
    }

    /// Reports whether the entry's properties need rewriting
    ///
    /// A resource that did not exist before always needs a rewrite, as does
    /// one without a stored clock. An existing resource needs one only when
    /// `remote_mtime` is strictly newer than the stored clock.
    pub async fn modification_changed(
        &self,
        resource: &ResourceRef,
        remote_mtime: DateTime<Utc>,
        existed_before: bool,
    ) -> Result<bool> {
        if !existed_before {
            return Ok(true);
        }

        let stored = self
            .store
            .get_modification_clock(resource)
            .await
            .with_context(|| format!("Failed to read clock of {}", resource.local_id))?;

        let changed = match stored {
            Some(clock) => remote_mtime > clock,
            None => true,
        };

        if !changed {
            debug!(local_id = %resource.local_id, "Entry unchanged since last pass");
        }

        Ok(changed)
    }

    /// Advances the stored clock to the entry's modification time
    ///
    /// Must be called only after the property rewrite succeeded.
    pub async fn commit_clock(
        &self,
        resource: &ResourceRef,
        remote_mtime: DateTime<Utc>,
    ) -> Result<()> {
        self.store
            .set_modification_clock(resource, remote_mtime)
            .await
            .with_context(|| format!("Failed to advance clock of {}", resource.local_id))
    }
}
