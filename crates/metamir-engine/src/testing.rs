//! Shared in-memory store for unit tests

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use metamir_core::domain::newtypes::{DatasourceId, LocalId};
use metamir_core::ports::metadata_store::{IMetadataStore, PropertyValue, ResourceRef};

/// In-memory `IMetadataStore` with inspection helpers
#[derive(Default)]
pub(crate) struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    next_key: i64,
    resources: HashMap<(String, String), i64>,
    tags: HashMap<i64, HashSet<String>>,
    clocks: HashMap<i64, DateTime<Utc>>,
    properties: HashMap<(i64, String), PropertyValue>,
    relations: HashSet<(i64, String, i64)>,
    property_writes: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of `set_property` calls seen
    pub fn property_write_count(&self) -> usize {
        self.inner.lock().unwrap().property_writes
    }

    /// Current value of a property, if set
    pub fn property(&self, resource: &ResourceRef, name: &str) -> Option<PropertyValue> {
        self.inner
            .lock()
            .unwrap()
            .properties
            .get(&(resource.key, name.to_string()))
            .cloned()
    }

    /// Number of outgoing relations with the given name
    pub fn relation_count(&self, resource: &ResourceRef, relation: &str) -> usize {
        self.inner
            .lock()
            .unwrap()
            .relations
            .iter()
            .filter(|(s, n, _)| *s == resource.key && n == relation)
            .count()
    }

    /// True when the relation triple is recorded
    pub fn has_relation(&self, resource: &ResourceRef, relation: &str, target: &ResourceRef) -> bool {
        self.inner
            .lock()
            .unwrap()
            .relations
            .contains(&(resource.key, relation.to_string(), target.key))
    }

    /// Tag set of a resource
    pub fn tags_of(&self, resource: &ResourceRef) -> HashSet<String> {
        self.inner
            .lock()
            .unwrap()
            .tags
            .get(&resource.key)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl IMetadataStore for MemoryStore {
    async fn ensure_resource(
        &self,
        datasource: &DatasourceId,
        local_id: &LocalId,
        type_tags: &[&str],
    ) -> anyhow::Result<(ResourceRef, bool)> {
        let mut inner = self.inner.lock().unwrap();
        let slot = (datasource.as_str().to_string(), local_id.as_str().to_string());

        if let Some(&key) = inner.resources.get(&slot) {
            return Ok((
                ResourceRef {
                    key,
                    local_id: local_id.clone(),
                },
                true,
            ));
        }

        inner.next_key += 1;
        let key = inner.next_key;
        inner.resources.insert(slot, key);
        inner
            .tags
            .insert(key, type_tags.iter().map(|t| t.to_string()).collect());

        Ok((
            ResourceRef {
                key,
                local_id: local_id.clone(),
            },
            false,
        ))
    }

    async fn get_modification_clock(
        &self,
        resource: &ResourceRef,
    ) -> anyhow::Result<Option<DateTime<Utc>>> {
        Ok(self.inner.lock().unwrap().clocks.get(&resource.key).copied())
    }

    async fn set_modification_clock(
        &self,
        resource: &ResourceRef,
        timestamp: DateTime<Utc>,
    ) -> anyhow::Result<()> {
        self.inner
            .lock()
            .unwrap()
            .clocks
            .insert(resource.key, timestamp);
        Ok(())
    }

    async fn set_property(
        &self,
        resource: &ResourceRef,
        name: &str,
        value: PropertyValue,
    ) -> anyhow::Result<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.property_writes += 1;
        inner
            .properties
            .insert((resource.key, name.to_string()), value);
        Ok(())
    }

    async fn set_relation(
        &self,
        resource: &ResourceRef,
        relation: &str,
        target: &ResourceRef,
    ) -> anyhow::Result<()> {
        self.inner
            .lock()
            .unwrap()
            .relations
            .insert((resource.key, relation.to_string(), target.key));
        Ok(())
    }

    async fn list_known_identifiers(
        &self,
        datasource: &DatasourceId,
    ) -> anyhow::Result<HashSet<LocalId>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .resources
            .iter()
            .filter(|((ds, _), key)| {
                ds == datasource.as_str()
                    && inner
                        .tags
                        .get(*key)
                        .is_some_and(|tags| tags.contains("remote-object"))
            })
            .filter_map(|((_, id), _)| LocalId::new(id.clone()).ok())
            .collect())
    }
}
