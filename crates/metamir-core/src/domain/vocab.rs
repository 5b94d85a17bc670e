//! Store vocabulary
//!
//! Well-known type tags, property names and relation names written to the
//! local graph store. Adapters persist these verbatim; keeping them in one
//! place is what makes the engine format-agnostic over the store port.

/// Resource type tags
pub mod tags {
    /// Base tag carried by every mirrored remote entity
    pub const REMOTE_OBJECT: &str = "remote-object";
    /// Paginated text documents (plain text, drawings, PDFs)
    pub const TEXT_DOCUMENT: &str = "text-document";
    /// Spreadsheets
    pub const SPREADSHEET: &str = "spreadsheet";
    /// Presentations
    pub const PRESENTATION: &str = "presentation";
    /// Photos and other media leaves
    pub const PHOTO: &str = "photo";
    /// Containers (folders, albums)
    pub const CONTAINER: &str = "container";
    /// People (authors, contributors)
    pub const CONTACT: &str = "contact";
    /// Camera equipment
    pub const EQUIPMENT: &str = "equipment";
}

/// Single-valued resource properties
pub mod properties {
    /// Entry title
    pub const TITLE: &str = "title";
    /// Entry description / summary
    pub const DESCRIPTION: &str = "description";
    /// Canonical browser-facing URI
    pub const SOURCE_URL: &str = "source-url";
    /// Mime type (possibly overridden by the kind table)
    pub const MIME_TYPE: &str = "mime-type";
    /// Creation timestamp of the remote content
    pub const CONTENT_CREATED: &str = "content-created";
    /// Starred / favorite flag
    pub const FAVORITE: &str = "favorite";
    /// Media pixel width
    pub const WIDTH: &str = "width";
    /// Media pixel height
    pub const HEIGHT: &str = "height";
    /// Contact display name
    pub const FULLNAME: &str = "fullname";
    /// Contact email address
    pub const EMAIL_ADDRESS: &str = "email-address";
    /// Equipment manufacturer
    pub const MAKER: &str = "maker";
    /// Equipment model
    pub const MODEL: &str = "model";
}

/// Resource-to-resource relations
pub mod relations {
    /// Containment: item → parent container
    pub const PART_OF: &str = "part-of";
    /// Authorship: item → contact
    pub const CREATOR: &str = "creator";
    /// Shared access: item → contact
    pub const CONTRIBUTOR: &str = "contributor";
    /// Capture device: item → equipment
    pub const EQUIPMENT: &str = "equipment";
}
