//! Hierarchy linker
//!
//! Records containment relations from items to their parent containers.
//! Parents named by a reference are not necessarily visited as first-class
//! entries in the same pass, so only a minimal container resource is
//! ensured for them; no property resync is attempted here.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::debug;

use metamir_core::domain::identity;
use metamir_core::domain::newtypes::{DatasourceId, ProviderNamespace};
use metamir_core::domain::remote_item::ParentRef;
use metamir_core::domain::vocab::{relations, tags};
use metamir_core::ports::metadata_store::{IMetadataStore, ResourceRef};

/// Records `part-of` relations against minimally-ensured containers
pub struct HierarchyLinker {
    store: Arc<dyn IMetadataStore>,
    datasource: DatasourceId,
}

impl HierarchyLinker {
    /// Creates a linker writing into the given datasource scope
    pub fn new(store: Arc<dyn IMetadataStore>, datasource: DatasourceId) -> Self {
        Self { store, datasource }
    }

    /// Links an item to every referenced parent container
    ///
    /// Duplicate references collapse onto the same relation (the store's
    /// relation insert is idempotent); ordering among parents carries no
    /// meaning.
    pub async fn link_parents(
        &self,
        item: &ResourceRef,
        ns: &ProviderNamespace,
        parents: &[ParentRef],
    ) -> Result<()> {
        for parent in parents {
            let parent_id = identity::container_id(ns, &parent.id);

            let (parent_resource, _) = self
                .store
                .ensure_resource(
                    &self.datasource,
                    &parent_id,
                    &[tags::REMOTE_OBJECT, tags::CONTAINER],
                )
                .await
                .with_context(|| format!("Failed to ensure parent container {parent_id}"))?;

            self.link_to_container(item, &parent_resource).await?;
        }
        Ok(())
    }

    /// Records a single containment relation
    ///
    /// Used directly by the driver to parent album children to the album's
    /// already-ensured resource.
    pub async fn link_to_container(
        &self,
        item: &ResourceRef,
        container: &ResourceRef,
    ) -> Result<()> {
        debug!(
            item = %item.local_id,
            container = %container.local_id,
            "Recording containment relation"
        );
        self.store
            .set_relation(item, relations::PART_OF, container)
            .await
            .with_context(|| {
                format!(
                    "Failed to link {} into {}",
                    item.local_id, container.local_id
                )
            })
    }
}
