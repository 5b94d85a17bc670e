//! Auxiliary entity resolver
//!
//! People and equipment are referenced by many items; this resolver maps
//! their natural keys (email address, make+model pair) to local resources
//! exactly once. Idempotence has two layers: a per-pass memo short-circuits
//! repeat resolutions, and the store's compare-and-swap `ensure_resource`
//! guarantees no duplicates even when concurrently-crawled collections race
//! on the same key.
//!
//! Several providers expose only a display name for contributors. In that
//! case the resolver synthesizes a deterministic pseudo-identifier from a
//! SHA-256 digest of the name: the same name maps to the same contact
//! across runs, different names to different contacts with overwhelming
//! probability.

use std::sync::Arc;

use anyhow::{Context, Result};
use dashmap::DashMap;
use sha2::{Digest, Sha256};
use tracing::debug;

use metamir_core::domain::errors::DomainError;
use metamir_core::domain::newtypes::{DatasourceId, LocalId};
use metamir_core::domain::vocab::{properties, tags};
use metamir_core::ports::metadata_store::{IMetadataStore, ResourceRef};

/// Length of the hex-encoded name digest kept in pseudo-identifiers
const NAME_DIGEST_LEN: usize = 32;

/// Idempotent resolver for people and equipment
pub struct AuxiliaryResolver {
    store: Arc<dyn IMetadataStore>,
    datasource: DatasourceId,
    resolved: DashMap<LocalId, ResourceRef>,
}

impl AuxiliaryResolver {
    /// Creates a resolver writing into the given datasource scope
    pub fn new(store: Arc<dyn IMetadataStore>, datasource: DatasourceId) -> Self {
        Self {
            store,
            datasource,
            resolved: DashMap::new(),
        }
    }

    /// Resolves a person by email, falling back to a name digest
    ///
    /// The email is the natural key when present (lowercased); the display
    /// name only contributes descriptive properties then. Without an email
    /// the display name becomes the key through its digest.
    ///
    /// # Errors
    /// Returns [`DomainError::MissingNaturalKey`] when both email and
    /// display name are empty, and any store error otherwise.
    pub async fn ensure_person(
        &self,
        email: Option<&str>,
        display_name: &str,
    ) -> Result<ResourceRef> {
        let email = email.map(str::trim).filter(|e| !e.is_empty());
        let name = display_name.trim();

        let local_id = match email {
            Some(addr) => contact_email_id(addr),
            None if !name.is_empty() => contact_name_id(name),
            None => {
                return Err(DomainError::MissingNaturalKey(
                    "person without email or display name".to_string(),
                )
                .into())
            }
        };

        if let Some(found) = self.resolved.get(&local_id) {
            return Ok(found.clone());
        }

        let (resource, existed) = self
            .store
            .ensure_resource(&self.datasource, &local_id, &[tags::CONTACT])
            .await
            .with_context(|| format!("Failed to ensure contact {local_id}"))?;

        if !existed {
            debug!(local_id = %local_id, "Created contact resource");
            if !name.is_empty() {
                self.store
                    .set_property(&resource, properties::FULLNAME, name.into())
                    .await
                    .context("Failed to set contact fullname")?;
            }
            if let Some(addr) = email {
                self.store
                    .set_property(
                        &resource,
                        properties::EMAIL_ADDRESS,
                        addr.to_lowercase().into(),
                    )
                    .await
                    .context("Failed to set contact email")?;
            }
        }

        self.resolved.insert(local_id, resource.clone());
        Ok(resource)
    }

    /// Resolves camera equipment by its (make, model) pair
    ///
    /// # Errors
    /// Returns [`DomainError::MissingNaturalKey`] when both attributes are
    /// absent; the caller is expected to skip the equipment link then.
    pub async fn ensure_equipment(
        &self,
        make: Option<&str>,
        model: Option<&str>,
    ) -> Result<ResourceRef> {
        let make = make.map(str::trim).filter(|s| !s.is_empty());
        let model = model.map(str::trim).filter(|s| !s.is_empty());

        if make.is_none() && model.is_none() {
            return Err(DomainError::MissingNaturalKey(
                "equipment without make or model".to_string(),
            )
            .into());
        }

        let local_id = equipment_id(make.unwrap_or(""), model.unwrap_or(""));

        if let Some(found) = self.resolved.get(&local_id) {
            return Ok(found.clone());
        }

        let (resource, existed) = self
            .store
            .ensure_resource(&self.datasource, &local_id, &[tags::EQUIPMENT])
            .await
            .with_context(|| format!("Failed to ensure equipment {local_id}"))?;

        if !existed {
            debug!(local_id = %local_id, "Created equipment resource");
            if let Some(make) = make {
                self.store
                    .set_property(&resource, properties::MAKER, make.into())
                    .await
                    .context("Failed to set equipment maker")?;
            }
            if let Some(model) = model {
                self.store
                    .set_property(&resource, properties::MODEL, model.into())
                    .await
                    .context("Failed to set equipment model")?;
            }
        }

        self.resolved.insert(local_id, resource.clone());
        Ok(resource)
    }
}

// ============================================================================
// Natural-key derivation
// ============================================================================

fn contact_email_id(email: &str) -> LocalId {
    LocalId::new(format!("contact:email:{}", email.to_lowercase()))
        .unwrap_or_else(|_| unreachable!())
}

fn contact_name_id(name: &str) -> LocalId {
    LocalId::new(format!("contact:name:{}", name_digest(name))).unwrap_or_else(|_| unreachable!())
}

fn equipment_id(make: &str, model: &str) -> LocalId {
    LocalId::new(format!("equipment:{make}:{model}")).unwrap_or_else(|_| unreachable!())
}

/// One-way digest of a display name, hex-encoded and truncated
fn name_digest(name: &str) -> String {
    let digest = Sha256::digest(name.as_bytes());
    let mut hex = String::with_capacity(digest.len() * 2);
    for byte in digest {
        hex.push_str(&format!("{byte:02x}"));
    }
    hex.truncate(NAME_DIGEST_LEN);
    hex
}
