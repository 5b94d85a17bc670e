//! Remote collection source port (driven/secondary port)
//!
//! This module defines the interface for retrieving a remote account's
//! content listing. Adapters implement it against a concrete provider API;
//! the engine only sees pages of [`RemoteItem`]s and never a wire format.
//!
//! ## Design Notes
//!
//! - Uses `anyhow::Result` because errors at port boundaries are
//!   adapter-specific and don't need domain-level classification.
//! - Pagination is cursor-driven: the adapter returns an opaque
//!   [`PageCursor`] until the listing is exhausted. The engine additionally
//!   treats an empty page as end-of-listing regardless of the cursor, since
//!   not every provider signals exhaustion explicitly.

use serde::{Deserialize, Serialize};

use crate::domain::newtypes::ProviderId;
use crate::domain::remote_item::{AccessRule, CollectionKind, RemoteItem};

// ============================================================================
// Pagination types
// ============================================================================

/// Opaque continuation cursor for a collection listing
///
/// The engine never interprets the inner value; it only hands it back to
/// the adapter for the next page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageCursor(pub String);

impl PageCursor {
    /// Get the inner cursor string
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// One page of a collection listing
#[derive(Debug, Clone, Default)]
pub struct ItemPage {
    /// Entries on this page; empty means the listing is exhausted
    pub items: Vec<RemoteItem>,
    /// Cursor for the next page, absent on the last page
    pub next: Option<PageCursor>,
}

// ============================================================================
// IRemoteSource trait
// ============================================================================

/// Port trait for the remote collection source
///
/// One implementation wraps one authenticated account session; the session
/// lifecycle (tokens, refresh) is entirely the adapter's concern. All
/// methods are read-only with respect to the remote side.
#[async_trait::async_trait]
pub trait IRemoteSource: Send + Sync {
    /// Fetches one page of a collection listing
    ///
    /// # Arguments
    /// * `collection` - Which configured collection to list
    /// * `cursor` - Continuation cursor from the previous page, or `None`
    ///   for the first page
    async fn list_page(
        &self,
        collection: CollectionKind,
        cursor: Option<&PageCursor>,
    ) -> anyhow::Result<ItemPage>;

    /// Fetches the children of a container entry (e.g. photos of an album)
    ///
    /// Only called for container kinds with listable children.
    async fn list_children(&self, container: &ProviderId) -> anyhow::Result<Vec<RemoteItem>>;

    /// Fetches the access-control rule list of an entry
    async fn list_access_rules(&self, item: &ProviderId) -> anyhow::Result<Vec<AccessRule>>;
}
