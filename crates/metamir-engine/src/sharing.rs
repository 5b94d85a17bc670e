//! Sharing resolver
//!
//! Maps an item's access-control rule list into contributor relations.
//! Public-default and domain scopes convey no addressable individual and
//! are filtered out; every other scope value is resolved as a person (the
//! rule carries no display name). One broken rule never blocks the rest.

use std::sync::Arc;

use anyhow::Context;
use tracing::warn;

use metamir_core::domain::remote_item::AccessRule;
use metamir_core::domain::vocab::relations;
use metamir_core::ports::metadata_store::{IMetadataStore, ResourceRef};

use crate::auxiliary::AuxiliaryResolver;

/// Resolves access rules into contributor relations
pub struct SharingResolver {
    store: Arc<dyn IMetadataStore>,
    auxiliary: Arc<AuxiliaryResolver>,
}

impl SharingResolver {
    /// Creates a resolver backed by the shared auxiliary resolver
    pub fn new(store: Arc<dyn IMetadataStore>, auxiliary: Arc<AuxiliaryResolver>) -> Self {
        Self { store, auxiliary }
    }

    /// Records contributor relations for the item's rule list
    ///
    /// Returns the number of relations recorded. Errors on individual rules
    /// are logged and skipped; they abort only the relation being built.
    pub async fn link_contributors(&self, item: &ResourceRef, rules: &[AccessRule]) -> u32 {
        let mut linked = 0;

        for rule in rules {
            if rule.scope.is_anonymous() {
                continue;
            }

            match self.link_one(item, rule).await {
                Ok(()) => linked += 1,
                Err(e) => {
                    warn!(
                        item = %item.local_id,
                        scope_value = %rule.value,
                        error = format!("{e:#}"),
                        "Failed to record contributor, skipping rule"
                    );
                }
            }
        }

        linked
    }

    async fn link_one(&self, item: &ResourceRef, rule: &AccessRule) -> anyhow::Result<()> {
        let contact = self
            .auxiliary
            .ensure_person(Some(&rule.value), "")
            .await
            .context("Failed to resolve contributor identity")?;

        self.store
            .set_relation(item, relations::CONTRIBUTOR, &contact)
            .await
            .context("Failed to record contributor relation")
    }
}
