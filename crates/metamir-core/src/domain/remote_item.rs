//! Remote item model
//!
//! Port-level DTOs describing entries of a remote content collection as the
//! engine consumes them. Adapters are responsible for mapping their wire
//! format into these types; nothing here knows about transports.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::newtypes::{ProviderId, ProviderNamespace};

/// Category term used by providers to mark an entry as starred
///
/// An item carrying this term among its categories is flagged favorite
/// in the local store.
pub const STARRED_CATEGORY: &str = "starred";

// ============================================================================
// Kinds and collections
// ============================================================================

/// Closed set of remote entry subtypes
///
/// Subtype dispatch (type tag selection, mimetype overrides, container
/// behavior) is resolved through the lookup table in [`crate::domain::identity`],
/// not through trait objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    /// Paginated text document
    Text,
    /// Spreadsheet
    Spreadsheet,
    /// Presentation
    Presentation,
    /// Drawing (rendered as a text document with a faked mimetype)
    Drawing,
    /// PDF document
    Pdf,
    /// Photo or other media leaf
    Photo,
    /// Folder container (listed inline with documents)
    Folder,
    /// Album container (children fetched through a nested listing)
    Album,
}

/// A configured remote collection, and the registry key for its handler
///
/// Each collection is crawled independently; each carries the provider
/// namespace its raw ids live in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionKind {
    /// Documents and folders
    Documents,
    /// Photos and albums
    Photos,
}

impl CollectionKind {
    /// The provider namespace this collection's raw ids belong to
    #[must_use]
    pub fn namespace(&self) -> ProviderNamespace {
        let ns = match self {
            CollectionKind::Documents => "drive",
            CollectionKind::Photos => "photos",
        };
        // Static namespace tags are valid by construction.
        ProviderNamespace::new(ns.to_string()).unwrap_or_else(|_| unreachable!())
    }

    /// Short name used in logs and reports
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            CollectionKind::Documents => "documents",
            CollectionKind::Photos => "photos",
        }
    }
}

impl std::fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

// ============================================================================
// Item attributes
// ============================================================================

/// An author record attached to a remote entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    /// Display name as reported by the provider
    pub name: String,
    /// Email address; several providers expose only the display name
    pub email: Option<String>,
}

/// Reference to a parent container of an entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParentRef {
    /// Provider-assigned id of the parent container
    pub id: ProviderId,
}

/// Camera metadata attached to media entries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraInfo {
    /// Equipment manufacturer
    pub make: Option<String>,
    /// Equipment model
    pub model: Option<String>,
}

/// Media-specific attributes of a remote entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaInfo {
    /// Mime type reported by the provider
    pub mime_type: Option<String>,
    /// Pixel width
    pub width: Option<u32>,
    /// Pixel height
    pub height: Option<u32>,
    /// Camera metadata, when the provider exposes it
    pub camera: Option<CameraInfo>,
}

// ============================================================================
// Access rules
// ============================================================================

/// Scope type of an access-control rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessScope {
    /// Default scope: the entry is completely public
    Public,
    /// Whole organizational domain
    Domain,
    /// An individual user
    User,
    /// A named group
    Group,
}

impl AccessScope {
    /// True when the scope conveys no addressable individual
    ///
    /// Public-default and domain scopes are filtered out before
    /// contributor resolution.
    #[must_use]
    pub fn is_anonymous(&self) -> bool {
        matches!(self, AccessScope::Public | AccessScope::Domain)
    }
}

/// One access-control rule of a remote entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessRule {
    /// Scope type of the rule
    pub scope: AccessScope,
    /// Scope value (an address for user/group scopes; may be empty for
    /// anonymous scopes)
    pub value: String,
}

// ============================================================================
// RemoteItem
// ============================================================================

/// A single entry of a remote content collection
///
/// This is a port-level DTO: adapters fill it from their wire format, the
/// engine consumes it. Deleted entries are never represented; absence from
/// the listing is what marks deletion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteItem {
    /// Provider-assigned identifier
    pub id: ProviderId,
    /// Entry subtype
    pub kind: ItemKind,
    /// Entry title
    pub title: String,
    /// Free-form description or summary
    pub description: Option<String>,
    /// Creation timestamp
    pub created: Option<DateTime<Utc>>,
    /// Last-modified timestamp; drives the skip-on-unchanged decision
    pub modified: DateTime<Utc>,
    /// Canonical browser-facing URI of the entry
    pub view_url: Option<String>,
    /// Parent container references (an entry may live in several)
    pub parents: Vec<ParentRef>,
    /// Category terms attached by the provider
    pub categories: Vec<String>,
    /// Author records
    pub authors: Vec<Author>,
    /// Media attributes, present for photo entries
    pub media: Option<MediaInfo>,
}

impl RemoteItem {
    /// True when the entry's categories carry the starred marker
    #[must_use]
    pub fn is_starred(&self) -> bool {
        self.categories.iter().any(|c| c == STARRED_CATEGORY)
    }
}
