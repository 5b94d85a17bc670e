//! Identity mapper
//!
//! Derives the stable local identifier for any remote entity, and resolves
//! entry kinds through a closed lookup table (type tag, mimetype override,
//! container behavior).
//!
//! The derivation is a pure function of (provider namespace, entity class,
//! provider id): running it twice on the same remote entity always yields
//! the same [`LocalId`]. Containers get a distinct `collection` class marker
//! so that a provider reusing a raw id across object types can never collide
//! in the local store. Invalid input (empty id or namespace) is unrepresentable
//! here: the [`ProviderId`] and [`ProviderNamespace`] newtypes reject it at
//! construction.

use super::newtypes::{LocalId, ProviderId, ProviderNamespace};
use super::remote_item::ItemKind;
use super::vocab::tags;

/// Class marker for leaf entries in derived identifiers
const ITEM_MARKER: &str = "item";

/// Class marker for containers in derived identifiers
const COLLECTION_MARKER: &str = "collection";

// ============================================================================
// Identifier derivation
// ============================================================================

/// Derive the local identifier for a remote entry of the given kind
///
/// Container kinds derive the `collection` form, leaves the `item` form.
#[must_use]
pub fn local_id(ns: &ProviderNamespace, kind: ItemKind, id: &ProviderId) -> LocalId {
    if is_container(kind) {
        container_id(ns, id)
    } else {
        item_id(ns, id)
    }
}

/// Derive the leaf-item form: `<ns>:item:<id>`
#[must_use]
pub fn item_id(ns: &ProviderNamespace, id: &ProviderId) -> LocalId {
    derive(ns, ITEM_MARKER, id)
}

/// Derive the container form: `<ns>:collection:<id>`
///
/// Used both for container entries themselves and for parent references,
/// which name containers that may never be visited as first-class entries
/// in a pass.
#[must_use]
pub fn container_id(ns: &ProviderNamespace, id: &ProviderId) -> LocalId {
    derive(ns, COLLECTION_MARKER, id)
}

fn derive(ns: &ProviderNamespace, marker: &str, id: &ProviderId) -> LocalId {
    // Inputs are validated non-empty, so the derived string is too.
    LocalId::new(format!("{}:{}:{}", ns.as_str(), marker, id.as_str()))
        .unwrap_or_else(|_| unreachable!())
}

// ============================================================================
// Kind table
// ============================================================================

/// Type tag recorded for a kind, alongside the base `remote-object` tag
#[must_use]
pub fn type_tag(kind: ItemKind) -> &'static str {
    match kind {
        ItemKind::Text | ItemKind::Drawing | ItemKind::Pdf => tags::TEXT_DOCUMENT,
        ItemKind::Spreadsheet => tags::SPREADSHEET,
        ItemKind::Presentation => tags::PRESENTATION,
        ItemKind::Photo => tags::PHOTO,
        ItemKind::Folder | ItemKind::Album => tags::CONTAINER,
    }
}

/// The full tag set for a kind: base tag plus the kind tag
#[must_use]
pub fn type_tags(kind: ItemKind) -> [&'static str; 2] {
    [tags::REMOTE_OBJECT, type_tag(kind)]
}

/// Mimetype forced for kinds whose provider reports none or a misleading one
///
/// Drawings get a drawing mimetype so indexers pick the right icon; PDFs
/// are reported as generic documents by some providers.
#[must_use]
pub fn mime_override(kind: ItemKind) -> Option<&'static str> {
    match kind {
        ItemKind::Drawing => Some("application/vnd.sun.xml.draw"),
        ItemKind::Pdf => Some("application/pdf"),
        _ => None,
    }
}

/// True for kinds that group other entries
#[must_use]
pub fn is_container(kind: ItemKind) -> bool {
    matches!(kind, ItemKind::Folder | ItemKind::Album)
}

/// True for containers whose children are fetched through a nested listing
///
/// Folders appear inline in the documents feed; albums require a child
/// sub-pass.
#[must_use]
pub fn has_children(kind: ItemKind) -> bool {
    matches!(kind, ItemKind::Album)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ns(s: &str) -> ProviderNamespace {
        ProviderNamespace::new(s.to_string()).unwrap()
    }

    fn pid(s: &str) -> ProviderId {
        ProviderId::new(s.to_string()).unwrap()
    }

    #[test]
    fn test_derivation_is_deterministic() {
        let a = local_id(&ns("drive"), ItemKind::Text, &pid("doc-1"));
        let b = local_id(&ns("drive"), ItemKind::Text, &pid("doc-1"));
        assert_eq!(a, b);
    }

    #[test]
    fn test_container_and_item_forms_differ_for_same_raw_id() {
        let item = local_id(&ns("drive"), ItemKind::Text, &pid("shared-raw"));
        let folder = local_id(&ns("drive"), ItemKind::Folder, &pid("shared-raw"));
        assert_ne!(item, folder);
    }

    #[test]
    fn test_namespaces_keep_raw_ids_apart() {
        let doc = local_id(&ns("drive"), ItemKind::Text, &pid("42"));
        let photo = local_id(&ns("photos"), ItemKind::Photo, &pid("42"));
        assert_ne!(doc, photo);
    }

    #[test]
    fn test_parent_refs_derive_the_container_form() {
        let album = local_id(&ns("photos"), ItemKind::Album, &pid("a1"));
        let parent = container_id(&ns("photos"), &pid("a1"));
        assert_eq!(album, parent);
    }

    #[test]
    fn test_expected_shapes() {
        assert_eq!(
            item_id(&ns("drive"), &pid("d9")).as_str(),
            "drive:item:d9"
        );
        assert_eq!(
            container_id(&ns("photos"), &pid("a7")).as_str(),
            "photos:collection:a7"
        );
    }

    #[test]
    fn test_kind_table() {
        assert_eq!(type_tag(ItemKind::Text), tags::TEXT_DOCUMENT);
        assert_eq!(type_tag(ItemKind::Drawing), tags::TEXT_DOCUMENT);
        assert_eq!(type_tag(ItemKind::Pdf), tags::TEXT_DOCUMENT);
        assert_eq!(type_tag(ItemKind::Spreadsheet), tags::SPREADSHEET);
        assert_eq!(type_tag(ItemKind::Presentation), tags::PRESENTATION);
        assert_eq!(type_tag(ItemKind::Photo), tags::PHOTO);
        assert_eq!(type_tag(ItemKind::Folder), tags::CONTAINER);
        assert_eq!(type_tag(ItemKind::Album), tags::CONTAINER);
    }

    #[test]
    fn test_mime_overrides() {
        assert_eq!(
            mime_override(ItemKind::Drawing),
            Some("application/vnd.sun.xml.draw")
        );
        assert_eq!(mime_override(ItemKind::Pdf), Some("application/pdf"));
        assert_eq!(mime_override(ItemKind::Text), None);
        assert_eq!(mime_override(ItemKind::Photo), None);
    }

    #[test]
    fn test_container_flags() {
        assert!(is_container(ItemKind::Folder));
        assert!(is_container(ItemKind::Album));
        assert!(!is_container(ItemKind::Photo));

        assert!(has_children(ItemKind::Album));
        assert!(!has_children(ItemKind::Folder));
    }

    #[test]
    fn test_type_tags_include_base_tag() {
        let tags = type_tags(ItemKind::Spreadsheet);
        assert_eq!(tags[0], "remote-object");
        assert_eq!(tags[1], "spreadsheet");
    }
}
