//! Port definitions (hexagonal architecture interfaces)
//!
//! This module defines the port traits that form the boundaries of the
//! hexagonal architecture. Ports are interfaces that the engine depends
//! on, but whose implementations live in adapter crates.
//!
//! ## Ports Overview
//!
//! - [`IRemoteSource`] - Paginated listing of a remote account's collections
//! - [`IMetadataStore`] - The local indexed graph store

pub mod metadata_store;
pub mod remote_source;

pub use metadata_store::{IMetadataStore, PropertyValue, ResourceRef};
pub use remote_source::{IRemoteSource, ItemPage, PageCursor};
