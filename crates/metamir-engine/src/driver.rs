//! Reconciliation driver
//!
//! Orchestrates one full pass over an account's configured collections:
//! seed the previously-known-identifiers set, crawl every collection, run
//! each emitted entry through the upsert/mtime-skip pipeline, nest into
//! container children where the kind table says so, and hand back whatever
//! was never re-observed as the deletion candidate set.
//!
//! ## Containment of failures
//!
//! - An entry failing at any stage is recorded and skipped; its siblings
//!   and later pages are unaffected.
//! - Author/equipment resolution failures abort only the relation being
//!   built, never the entry.
//! - A first-page fetch failure fails only that collection; the others
//!   still run. Deletion candidates are withheld for the pass then, since
//!   an uncrawled collection would surface wholesale as candidates.
//! - Only cancellation aborts the whole pass.

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use metamir_core::domain::identity;
use metamir_core::domain::newtypes::{DatasourceId, LocalId, ProviderNamespace};
use metamir_core::domain::remote_item::{CollectionKind, RemoteItem};
use metamir_core::domain::vocab::{properties, relations};
use metamir_core::ports::metadata_store::{IMetadataStore, ResourceRef};
use metamir_core::ports::remote_source::IRemoteSource;
use metamir_report::{CollectionStatus, CollectionSummary, FailureLog, FailureStage, PassReport};

use crate::auxiliary::AuxiliaryResolver;
use crate::crawler::{CrawlOutcome, PageCrawler};
use crate::hierarchy::HierarchyLinker;
use crate::previous::PreviousResourceSet;
use crate::sharing::SharingResolver;
use crate::upserter::ResourceUpserter;
use crate::EngineError;

// ============================================================================
// Pass inputs and outputs
// ============================================================================

/// Per-pass account context injected by the caller
///
/// The authenticated session itself lives inside the `IRemoteSource`
/// adapter; the driver holds no account state across passes.
#[derive(Debug, Clone)]
pub struct AccountContext {
    /// Graph partition owned by this account
    pub datasource: DatasourceId,
    /// Collections to reconcile, each crawled independently
    pub collections: Vec<CollectionKind>,
}

/// Result of one reconciliation pass
#[derive(Debug)]
pub struct PassOutcome {
    /// Identifiers present locally before the pass but never re-observed.
    /// Empty (and flagged in the report) when a collection ended fatal.
    pub deletion_candidates: HashSet<LocalId>,
    /// Full structured record of the pass
    pub report: PassReport,
}

// ============================================================================
// Driver
// ============================================================================

/// Orchestrates reconciliation passes against one account's adapters
pub struct ReconciliationDriver {
    source: Arc<dyn IRemoteSource>,
    store: Arc<dyn IMetadataStore>,
}

impl ReconciliationDriver {
    /// Creates a driver over the given remote source and store adapters
    pub fn new(source: Arc<dyn IRemoteSource>, store: Arc<dyn IMetadataStore>) -> Self {
        Self { source, store }
    }

    /// Runs one full reconciliation pass
    ///
    /// Collections run concurrently when more than one is configured; they
    /// share the previous-resource set and the auxiliary resolver, both of
    /// which are safe for that.
    ///
    /// # Errors
    /// Returns an error on cancellation or when the previous-resource set
    /// cannot be seeded. Collection- and item-level failures are contained
    /// and land in the report instead.
    pub async fn run_pass(
        &self,
        ctx: &AccountContext,
        cancel: &CancellationToken,
    ) -> Result<PassOutcome> {
        let mut report = PassReport::begin(ctx.datasource.clone());
        info!(
            pass_id = %report.pass_id,
            datasource = %ctx.datasource,
            collections = ctx.collections.len(),
            "Starting reconciliation pass"
        );

        let known = self
            .store
            .list_known_identifiers(&ctx.datasource)
            .await
            .context("Failed to seed previous-resource set")?;
        debug!(known = known.len(), "Seeded previous-resource set");

        let previous = Arc::new(PreviousResourceSet::new(known));
        let auxiliary = Arc::new(AuxiliaryResolver::new(
            self.store.clone(),
            ctx.datasource.clone(),
        ));
        let failures = Arc::new(FailureLog::new());

        let mut summaries = Vec::with_capacity(ctx.collections.len());
        if ctx.collections.len() <= 1 {
            for &collection in &ctx.collections {
                let run =
                    self.collection_run(collection, ctx, &previous, &auxiliary, &failures, cancel);
                summaries.push(run.run().await?);
            }
        } else {
            let mut tasks = JoinSet::new();
            for &collection in &ctx.collections {
                let run =
                    self.collection_run(collection, ctx, &previous, &auxiliary, &failures, cancel);
                tasks.spawn(run.run());
            }
            while let Some(joined) = tasks.join_next().await {
                let summary = joined.context("Collection task panicked")??;
                summaries.push(summary);
            }
            // Join order is arbitrary; restore the configured order.
            summaries.sort_by_key(|s: &CollectionSummary| {
                ctx.collections
                    .iter()
                    .position(|c| *c == s.collection)
                    .unwrap_or(usize::MAX)
            });
        }

        report.collections = summaries;
        report.failures = failures.drain();
        report.candidates_withheld = report.any_collection_failed();

        let deletion_candidates = if report.candidates_withheld {
            warn!(
                unobserved = previous.len(),
                "A collection failed fatally, withholding deletion candidates"
            );
            HashSet::new()
        } else {
            previous.remaining()
        };

        report.finish();
        report.log_summary();

        Ok(PassOutcome {
            deletion_candidates,
            report,
        })
    }

    fn collection_run(
        &self,
        collection: CollectionKind,
        ctx: &AccountContext,
        previous: &Arc<PreviousResourceSet>,
        auxiliary: &Arc<AuxiliaryResolver>,
        failures: &Arc<FailureLog>,
        cancel: &CancellationToken,
    ) -> CollectionRun {
        CollectionRun {
            collection,
            source: self.source.clone(),
            store: self.store.clone(),
            previous: previous.clone(),
            failures: failures.clone(),
            upserter: ResourceUpserter::new(self.store.clone(), ctx.datasource.clone()),
            hierarchy: HierarchyLinker::new(self.store.clone(), ctx.datasource.clone()),
            sharing: SharingResolver::new(self.store.clone(), auxiliary.clone()),
            auxiliary: auxiliary.clone(),
            cancel: cancel.clone(),
        }
    }
}

// ============================================================================
// Per-collection worker
// ============================================================================

/// What happened to one entry
enum ItemAction {
    Created,
    Updated,
    Skipped,
}

/// An item-level failure tagged with the stage it occurred at
struct StageError {
    stage: FailureStage,
    source: anyhow::Error,
}

fn stage(stage: FailureStage) -> impl FnOnce(anyhow::Error) -> StageError {
    move |source| StageError { stage, source }
}

/// Owns everything one collection's crawl needs, so it can run as a task
struct CollectionRun {
    collection: CollectionKind,
    source: Arc<dyn IRemoteSource>,
    store: Arc<dyn IMetadataStore>,
    previous: Arc<PreviousResourceSet>,
    failures: Arc<FailureLog>,
    upserter: ResourceUpserter,
    hierarchy: HierarchyLinker,
    sharing: SharingResolver,
    auxiliary: Arc<AuxiliaryResolver>,
    cancel: CancellationToken,
}

impl CollectionRun {
    async fn run(self) -> Result<CollectionSummary> {
        let ns = self.collection.namespace();
        let mut summary = CollectionSummary::new(self.collection);
        let mut crawler = PageCrawler::new(self.source.clone(), self.collection);
        info!(collection = %self.collection, "Crawling collection");

        loop {
            let items = match crawler.next_page(&self.cancel).await {
                Ok(Some(items)) => items,
                Ok(None) => break,
                Err(e) => {
                    if is_cancelled(&e) {
                        return Err(e);
                    }
                    error!(
                        collection = %self.collection,
                        error = format!("{e:#}"),
                        "Collection pass failed on its first page"
                    );
                    summary.status = CollectionStatus::Failed {
                        error: format!("{e:#}"),
                    };
                    summary.pages = crawler.pages_fetched();
                    return Ok(summary);
                }
            };

            for item in items {
                if self.cancel.is_cancelled() {
                    return Err(EngineError::Cancelled.into());
                }
                self.reconcile_entry(&ns, &item, &mut summary).await?;
            }
        }

        summary.pages = crawler.pages_fetched();
        if let CrawlOutcome::Truncated {
            pages_fetched,
            error,
        } = crawler.outcome()
        {
            summary.status = CollectionStatus::Truncated {
                pages_fetched,
                error,
            };
        }

        Ok(summary)
    }

    /// Reconciles one first-class entry, nesting into children if it is a
    /// child-listing container
    ///
    /// Item-level failures are contained here; only cancellation errors out.
    async fn reconcile_entry(
        &self,
        ns: &ProviderNamespace,
        item: &RemoteItem,
        summary: &mut CollectionSummary,
    ) -> Result<()> {
        let resource = self.settle_item(ns, item, None, summary).await;

        if let Some(resource) = resource {
            if identity::has_children(item.kind) {
                self.reconcile_children(ns, item, &resource, summary).await?;
            }
        }
        Ok(())
    }

    /// Runs the child sub-pass of a container entry
    async fn reconcile_children(
        &self,
        ns: &ProviderNamespace,
        container: &RemoteItem,
        container_resource: &ResourceRef,
        summary: &mut CollectionSummary,
    ) -> Result<()> {
        let children = match self.source.list_children(&container.id).await {
            Ok(children) => children,
            Err(e) => {
                self.failures.record(
                    container.id.as_str(),
                    FailureStage::Children,
                    format!("{e:#}"),
                );
                return Ok(());
            }
        };
        debug!(
            container = %container.id,
            children = children.len(),
            "Reconciling container children"
        );

        for child in children {
            if self.cancel.is_cancelled() {
                return Err(EngineError::Cancelled.into());
            }
            self.settle_item(ns, &child, Some(container_resource), summary)
                .await;
        }
        Ok(())
    }

    /// Processes one entry, counting the outcome and recording any failure
    ///
    /// Returns the entry's resource when the pipeline ran to completion (or
    /// skipped on an unchanged clock); `None` when the entry failed, which
    /// also suppresses its child sub-pass.
    async fn settle_item(
        &self,
        ns: &ProviderNamespace,
        item: &RemoteItem,
        parent: Option<&ResourceRef>,
        summary: &mut CollectionSummary,
    ) -> Option<ResourceRef> {
        match self.process_item(ns, item, parent).await {
            Ok((action, resource)) => {
                match action {
                    ItemAction::Created => summary.created += 1,
                    ItemAction::Updated => summary.updated += 1,
                    ItemAction::Skipped => summary.skipped += 1,
                }
                Some(resource)
            }
            Err(failure) => {
                self.failures.record(
                    item.id.as_str(),
                    failure.stage,
                    format!("{:#}", failure.source),
                );
                summary.failed += 1;
                None
            }
        }
    }

    /// The per-entry pipeline: identity → observe → ensure → mtime-skip →
    /// property rewrite → links → clock
    async fn process_item(
        &self,
        ns: &ProviderNamespace,
        item: &RemoteItem,
        parent: Option<&ResourceRef>,
    ) -> std::result::Result<(ItemAction, ResourceRef), StageError> {
        let local_id = identity::local_id(ns, item.kind, &item.id);

        // Re-observed: whatever else happens, this entry still exists
        // remotely and must not be flagged as deleted. Its parent
        // containers are implied present too, even if the entry itself is
        // skipped below and they are never listed first-class.
        self.previous.observe(&local_id);
        for parent in &item.parents {
            self.previous.observe(&identity::container_id(ns, &parent.id));
        }

        let (resource, existed) = self
            .upserter
            .ensure(&local_id, item.kind)
            .await
            .map_err(stage(FailureStage::Upsert))?;

        let changed = self
            .upserter
            .modification_changed(&resource, item.modified, existed)
            .await
            .map_err(stage(FailureStage::Upsert))?;

        if !changed {
            return Ok((ItemAction::Skipped, resource));
        }

        self.write_properties(&resource, item)
            .await
            .map_err(stage(FailureStage::Properties))?;

        self.hierarchy
            .link_parents(&resource, ns, &item.parents)
            .await
            .map_err(stage(FailureStage::Hierarchy))?;
        if let Some(container) = parent {
            self.hierarchy
                .link_to_container(&resource, container)
                .await
                .map_err(stage(FailureStage::Hierarchy))?;
        }

        self.link_authors(&resource, item).await;
        self.link_equipment(&resource, item).await;

        match self.source.list_access_rules(&item.id).await {
            Ok(rules) => {
                self.sharing.link_contributors(&resource, &rules).await;
            }
            Err(e) => {
                // Degrades to "no contributor refresh this pass"; the rest
                // of the entry stands.
                self.failures
                    .record(item.id.as_str(), FailureStage::Sharing, format!("{e:#}"));
            }
        }

        // The clock moves last: an entry that failed above keeps its old
        // clock and is retried by the next pass.
        self.upserter
            .commit_clock(&resource, item.modified)
            .await
            .map_err(stage(FailureStage::Clock))?;

        let action = if existed {
            ItemAction::Updated
        } else {
            ItemAction::Created
        };
        Ok((action, resource))
    }

    /// Full descriptive property rewrite for a changed entry
    async fn write_properties(&self, resource: &ResourceRef, item: &RemoteItem) -> Result<()> {
        if let Some(url) = &item.view_url {
            self.store
                .set_property(resource, properties::SOURCE_URL, url.as_str().into())
                .await?;
        }

        let mime = identity::mime_override(item.kind)
            .map(str::to_string)
            .or_else(|| item.media.as_ref().and_then(|m| m.mime_type.clone()));
        if let Some(mime) = mime {
            self.store
                .set_property(resource, properties::MIME_TYPE, mime.into())
                .await?;
        }

        self.store
            .set_property(resource, properties::FAVORITE, item.is_starred().into())
            .await?;

        self.store
            .set_property(resource, properties::TITLE, item.title.as_str().into())
            .await?;

        if let Some(description) = &item.description {
            self.store
                .set_property(resource, properties::DESCRIPTION, description.as_str().into())
                .await?;
        }

        if let Some(created) = item.created {
            self.store
                .set_property(resource, properties::CONTENT_CREATED, created.into())
                .await?;
        }

        if let Some(media) = &item.media {
            if let Some(width) = media.width {
                self.store
                    .set_property(resource, properties::WIDTH, i64::from(width).into())
                    .await?;
            }
            if let Some(height) = media.height {
                self.store
                    .set_property(resource, properties::HEIGHT, i64::from(height).into())
                    .await?;
            }
        }

        Ok(())
    }

    /// Records creator relations; a failed author aborts only its relation
    async fn link_authors(&self, resource: &ResourceRef, item: &RemoteItem) {
        for author in &item.authors {
            if author.email.is_none() && author.name.trim().is_empty() {
                continue;
            }
            match self
                .auxiliary
                .ensure_person(author.email.as_deref(), &author.name)
                .await
            {
                Ok(contact) => {
                    if let Err(e) = self
                        .store
                        .set_relation(resource, relations::CREATOR, &contact)
                        .await
                    {
                        self.failures.record(
                            item.id.as_str(),
                            FailureStage::Authors,
                            format!("{e:#}"),
                        );
                    }
                }
                Err(e) => {
                    self.failures
                        .record(item.id.as_str(), FailureStage::Authors, format!("{e:#}"));
                }
            }
        }
    }

    /// Records the equipment relation; skipped entirely without a natural key
    async fn link_equipment(&self, resource: &ResourceRef, item: &RemoteItem) {
        let Some(camera) = item.media.as_ref().and_then(|m| m.camera.as_ref()) else {
            return;
        };
        if camera.make.is_none() && camera.model.is_none() {
            return;
        }

        match self
            .auxiliary
            .ensure_equipment(camera.make.as_deref(), camera.model.as_deref())
            .await
        {
            Ok(equipment) => {
                if let Err(e) = self
                    .store
                    .set_relation(resource, relations::EQUIPMENT, &equipment)
                    .await
                {
                    self.failures
                        .record(item.id.as_str(), FailureStage::Equipment, format!("{e:#}"));
                }
            }
            Err(e) => {
                self.failures
                    .record(item.id.as_str(), FailureStage::Equipment, format!("{e:#}"));
            }
        }
    }
}

fn is_cancelled(e: &anyhow::Error) -> bool {
    matches!(e.downcast_ref::<EngineError>(), Some(EngineError::Cancelled))
}
