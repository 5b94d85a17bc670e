//! Domain error types
//!
//! This module defines error types specific to domain operations:
//! identifier validation failures and missing natural keys for
//! auxiliary entities.

use thiserror::Error;

/// Errors that can occur in domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Provider-assigned identifier is empty or malformed
    #[error("Invalid provider id: {0}")]
    InvalidProviderId(String),

    /// Provider namespace is empty or malformed
    #[error("Invalid provider namespace: {0}")]
    InvalidNamespace(String),

    /// Local identifier string does not have the expected shape
    #[error("Invalid local id: {0}")]
    InvalidLocalId(String),

    /// Datasource scope identifier is empty
    #[error("Invalid datasource id: {0}")]
    InvalidDatasourceId(String),

    /// Pass identifier parsing error
    #[error("Invalid pass id: {0}")]
    InvalidPassId(String),

    /// An auxiliary entity was requested without any usable natural key
    #[error("Missing natural key: {0}")]
    MissingNaturalKey(String),
}
