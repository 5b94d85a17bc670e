//! Shared fixtures for the engine integration suite:
//! a recording in-memory store and a scriptable remote source.
#![allow(dead_code)]

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};

use metamir_core::domain::newtypes::{DatasourceId, LocalId, ProviderId};
use metamir_core::domain::remote_item::{
    AccessRule, AccessScope, Author, CollectionKind, ItemKind, ParentRef, RemoteItem,
};
use metamir_core::ports::metadata_store::{IMetadataStore, PropertyValue, ResourceRef};
use metamir_core::ports::remote_source::{IRemoteSource, ItemPage, PageCursor};

// ============================================================================
// Builders
// ============================================================================

pub fn ds() -> DatasourceId {
    DatasourceId::new("account:test".to_string()).unwrap()
}

pub fn ts(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).unwrap()
}

pub fn entry(id: &str, kind: ItemKind, mtime: i64) -> RemoteItem {
    RemoteItem {
        id: ProviderId::new(id.to_string()).unwrap(),
        kind,
        title: id.to_string(),
        description: None,
        created: None,
        modified: ts(mtime),
        view_url: Some(format!("https://remote.example/view/{id}")),
        parents: vec![],
        categories: vec![],
        authors: vec![],
        media: None,
    }
}

pub fn doc(id: &str, mtime: i64) -> RemoteItem {
    entry(id, ItemKind::Text, mtime)
}

pub fn folder(id: &str, mtime: i64) -> RemoteItem {
    entry(id, ItemKind::Folder, mtime)
}

pub fn photo(id: &str, mtime: i64) -> RemoteItem {
    entry(id, ItemKind::Photo, mtime)
}

pub fn album(id: &str, mtime: i64) -> RemoteItem {
    entry(id, ItemKind::Album, mtime)
}

pub fn author(name: &str, email: Option<&str>) -> Author {
    Author {
        name: name.to_string(),
        email: email.map(str::to_string),
    }
}

pub fn parent(id: &str) -> ParentRef {
    ParentRef {
        id: ProviderId::new(id.to_string()).unwrap(),
    }
}

pub fn rule(scope: AccessScope, value: &str) -> AccessRule {
    AccessRule {
        scope,
        value: value.to_string(),
    }
}

pub fn page(items: Vec<RemoteItem>, next: Option<&str>) -> ItemPage {
    ItemPage {
        items,
        next: next.map(|c| PageCursor(c.to_string())),
    }
}

// ============================================================================
// Recording store
// ============================================================================

#[derive(Default)]
struct StoreInner {
    next_key: i64,
    resources: HashMap<(String, String), i64>,
    local_ids: HashMap<i64, String>,
    tags: HashMap<i64, HashSet<String>>,
    clocks: HashMap<i64, DateTime<Utc>>,
    properties: HashMap<(i64, String), PropertyValue>,
    relations: HashSet<(i64, String, i64)>,
    property_writes: Vec<(String, String)>,
    fail_ensure: HashSet<String>,
}

/// In-memory `IMetadataStore` recording every write for assertions
#[derive(Default)]
pub struct RecordingStore {
    inner: Mutex<StoreInner>,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `ensure_resource` fail for the given local identifier
    pub fn fail_ensure_for(&self, local_id: &str) {
        self.inner
            .lock()
            .unwrap()
            .fail_ensure
            .insert(local_id.to_string());
    }

    /// Pre-creates a remote-object resource, as if left by an earlier pass
    pub fn seed(&self, datasource: &DatasourceId, local_id: &str) {
        let mut inner = self.inner.lock().unwrap();
        let slot = (datasource.as_str().to_string(), local_id.to_string());
        if inner.resources.contains_key(&slot) {
            return;
        }
        inner.next_key += 1;
        let key = inner.next_key;
        inner.resources.insert(slot, key);
        inner.local_ids.insert(key, local_id.to_string());
        inner
            .tags
            .insert(key, HashSet::from(["remote-object".to_string()]));
    }

    /// Pre-creates a resource with a committed clock
    pub fn seed_with_clock(&self, datasource: &DatasourceId, local_id: &str, clock: DateTime<Utc>) {
        self.seed(datasource, local_id);
        let mut inner = self.inner.lock().unwrap();
        let slot = (datasource.as_str().to_string(), local_id.to_string());
        let key = inner.resources[&slot];
        inner.clocks.insert(key, clock);
    }

    fn key_of(&self, local_id: &str) -> Option<i64> {
        let inner = self.inner.lock().unwrap();
        inner
            .resources
            .iter()
            .find(|((_, id), _)| id == local_id)
            .map(|(_, &key)| key)
    }

    /// True when a resource exists under the local identifier
    pub fn has_resource(&self, local_id: &str) -> bool {
        self.key_of(local_id).is_some()
    }

    /// Committed clock of a resource
    pub fn clock_of(&self, local_id: &str) -> Option<DateTime<Utc>> {
        let key = self.key_of(local_id)?;
        self.inner.lock().unwrap().clocks.get(&key).copied()
    }

    /// Current value of a property
    pub fn property_of(&self, local_id: &str, name: &str) -> Option<PropertyValue> {
        let key = self.key_of(local_id)?;
        self.inner
            .lock()
            .unwrap()
            .properties
            .get(&(key, name.to_string()))
            .cloned()
    }

    /// Every `set_property` call seen, as (local id, property name)
    pub fn property_writes(&self) -> Vec<(String, String)> {
        self.inner.lock().unwrap().property_writes.clone()
    }

    /// Local ids of relation targets from a resource
    pub fn relation_targets(&self, local_id: &str, relation: &str) -> Vec<String> {
        let Some(key) = self.key_of(local_id) else {
            return vec![];
        };
        let inner = self.inner.lock().unwrap();
        inner
            .relations
            .iter()
            .filter(|(s, n, _)| *s == key && n == relation)
            .filter_map(|(_, _, t)| inner.local_ids.get(t).cloned())
            .collect()
    }

    /// Number of resources whose local id starts with the prefix
    pub fn resources_with_prefix(&self, prefix: &str) -> usize {
        self.inner
            .lock()
            .unwrap()
            .local_ids
            .values()
            .filter(|id| id.starts_with(prefix))
            .count()
    }
}

#[async_trait]
impl IMetadataStore for RecordingStore {
    async fn ensure_resource(
        &self,
        datasource: &DatasourceId,
        local_id: &LocalId,
        type_tags: &[&str],
    ) -> anyhow::Result<(ResourceRef, bool)> {
        let mut inner = self.inner.lock().unwrap();

        if inner.fail_ensure.contains(local_id.as_str()) {
            anyhow::bail!("injected ensure failure for {local_id}");
        }

        let slot = (datasource.as_str().to_string(), local_id.as_str().to_string());
        if let Some(&key) = inner.resources.get(&slot) {
            inner
                .tags
                .entry(key)
                .or_default()
                .extend(type_tags.iter().map(|t| t.to_string()));
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
        inner.local_ids.insert(key, local_id.as_str().to_string());
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
        inner
            .property_writes
            .push((resource.local_id.as_str().to_string(), name.to_string()));
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

// ============================================================================
// Scriptable remote source
// ============================================================================

#[derive(Default)]
struct SourceInner {
    pages: HashMap<CollectionKind, VecDeque<Result<ItemPage, String>>>,
    children: HashMap<String, Vec<RemoteItem>>,
    fail_children: HashSet<String>,
    rules: HashMap<String, Vec<AccessRule>>,
    fail_rules: HashSet<String>,
}

/// `IRemoteSource` replaying scripted pages, children and rules
#[derive(Default)]
pub struct MockSource {
    inner: Mutex<SourceInner>,
}

impl MockSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a page to a collection's listing
    pub fn push_page(&self, collection: CollectionKind, page: ItemPage) {
        self.inner
            .lock()
            .unwrap()
            .pages
            .entry(collection)
            .or_default()
            .push_back(Ok(page));
    }

    /// Appends a failing fetch to a collection's listing
    pub fn push_page_error(&self, collection: CollectionKind, error: &str) {
        self.inner
            .lock()
            .unwrap()
            .pages
            .entry(collection)
            .or_default()
            .push_back(Err(error.to_string()));
    }

    /// Sets the child listing of a container
    pub fn set_children(&self, container: &str, children: Vec<RemoteItem>) {
        self.inner
            .lock()
            .unwrap()
            .children
            .insert(container.to_string(), children);
    }

    /// Makes the child listing of a container fail
    pub fn fail_children_for(&self, container: &str) {
        self.inner
            .lock()
            .unwrap()
            .fail_children
            .insert(container.to_string());
    }

    /// Sets the access rules of an entry
    pub fn set_rules(&self, item: &str, rules: Vec<AccessRule>) {
        self.inner
            .lock()
            .unwrap()
            .rules
            .insert(item.to_string(), rules);
    }

    /// Makes the rules fetch of an entry fail
    pub fn fail_rules_for(&self, item: &str) {
        self.inner
            .lock()
            .unwrap()
            .fail_rules
            .insert(item.to_string());
    }
}

#[async_trait]
impl IRemoteSource for MockSource {
    async fn list_page(
        &self,
        collection: CollectionKind,
        _cursor: Option<&PageCursor>,
    ) -> anyhow::Result<ItemPage> {
        let next = self
            .inner
            .lock()
            .unwrap()
            .pages
            .entry(collection)
            .or_default()
            .pop_front();
        match next {
            Some(Ok(page)) => Ok(page),
            Some(Err(message)) => Err(anyhow::anyhow!("{message}")),
            None => Ok(ItemPage::default()),
        }
    }

    async fn list_children(&self, container: &ProviderId) -> anyhow::Result<Vec<RemoteItem>> {
        let inner = self.inner.lock().unwrap();
        if inner.fail_children.contains(container.as_str()) {
            anyhow::bail!("injected children failure for {container}");
        }
        Ok(inner
            .children
            .get(container.as_str())
            .cloned()
            .unwrap_or_default())
    }

    async fn list_access_rules(&self, item: &ProviderId) -> anyhow::Result<Vec<AccessRule>> {
        let inner = self.inner.lock().unwrap();
        if inner.fail_rules.contains(item.as_str()) {
            anyhow::bail!("injected rules failure for {item}");
        }
        Ok(inner.rules.get(item.as_str()).cloned().unwrap_or_default())
    }
}
