//! Paginated crawler
//!
//! Pull-based state machine over one remote collection:
//! `Start -> Fetching(cursor) -> { items -> Fetching(next) | empty -> Done }`
//! with a `Failed` terminal.
//!
//! Failure policy: the very first page failing is fatal to the collection's
//! pass and propagates to the driver. A later page failing only truncates
//! the crawl, since partial progress beats none and the next scheduled pass
//! resumes coverage. An empty page always terminates the loop; no provider
//! is assumed to signal exhaustion any other way.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use metamir_core::domain::remote_item::{CollectionKind, RemoteItem};
use metamir_core::ports::remote_source::{IRemoteSource, PageCursor};

use crate::EngineError;

/// Terminal outcome of a crawl, for the pass report
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrawlOutcome {
    /// The listing was walked to exhaustion
    Completed,
    /// A page after the first failed; already-fetched items stand
    Truncated {
        /// Pages fetched before the failure
        pages_fetched: u32,
        /// Description of the failed fetch
        error: String,
    },
}

enum CrawlState {
    Start,
    Fetching(PageCursor),
    Done,
    Failed,
}

/// Pull-based crawler over one collection's paginated listing
pub struct PageCrawler {
    source: Arc<dyn IRemoteSource>,
    collection: CollectionKind,
    state: CrawlState,
    pages_fetched: u32,
    truncation: Option<String>,
}

impl PageCrawler {
    /// Creates a crawler positioned before the first page
    pub fn new(source: Arc<dyn IRemoteSource>, collection: CollectionKind) -> Self {
        Self {
            source,
            collection,
            state: CrawlState::Start,
            pages_fetched: 0,
            truncation: None,
        }
    }

    /// Fetches the next page of items
    ///
    /// Returns `Ok(None)` when the listing is exhausted or was truncated by
    /// a later-page failure.
    ///
    /// # Errors
    /// Propagates a first-page fetch failure (fatal to this collection) and
    /// cancellation.
    pub async fn next_page(
        &mut self,
        cancel: &CancellationToken,
    ) -> Result<Option<Vec<RemoteItem>>> {
        if cancel.is_cancelled() {
            return Err(EngineError::Cancelled.into());
        }

        let cursor = match &self.state {
            CrawlState::Done | CrawlState::Failed => return Ok(None),
            CrawlState::Start => None,
            CrawlState::Fetching(cursor) => Some(cursor.clone()),
        };

        let first_page = matches!(self.state, CrawlState::Start);
        let page = match self
            .source
            .list_page(self.collection, cursor.as_ref())
            .await
        {
            Ok(page) => page,
            Err(e) if first_page => {
                self.state = CrawlState::Failed;
                return Err(e).with_context(|| {
                    format!("First page of collection '{}' failed", self.collection)
                });
            }
            Err(e) => {
                warn!(
                    collection = %self.collection,
                    pages_fetched = self.pages_fetched,
                    error = format!("{e:#}"),
                    "Page fetch failed after partial progress, truncating crawl"
                );
                self.truncation = Some(format!("{e:#}"));
                self.state = CrawlState::Failed;
                return Ok(None);
            }
        };

        self.pages_fetched += 1;

        if page.items.is_empty() {
            debug!(
                collection = %self.collection,
                pages = self.pages_fetched,
                "Empty page, listing exhausted"
            );
            self.state = CrawlState::Done;
            return Ok(None);
        }

        debug!(
            collection = %self.collection,
            page = self.pages_fetched,
            items = page.items.len(),
            has_next = page.next.is_some(),
            "Fetched collection page"
        );

        self.state = match page.next {
            Some(next) => CrawlState::Fetching(next),
            None => CrawlState::Done,
        };

        Ok(Some(page.items))
    }

    /// Pages fetched so far
    #[must_use]
    pub fn pages_fetched(&self) -> u32 {
        self.pages_fetched
    }

    /// Terminal outcome, meaningful once `next_page` returned `Ok(None)`
    #[must_use]
    pub fn outcome(&self) -> CrawlOutcome {
        match &self.truncation {
            Some(error) => CrawlOutcome::Truncated {
                pages_fetched: self.pages_fetched,
                error: error.clone(),
            },
            None => CrawlOutcome::Completed,
        }
    }
}
