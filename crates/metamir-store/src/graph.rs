//! SQLite implementation of IMetadataStore
//!
//! This module provides the concrete SQLite-based implementation of the
//! metadata store port defined in metamir-core. It handles value
//! serialization and SQL query construction.
//!
//! ## Type Mapping
//!
//! | Port Type            | SQL Type | Strategy                              |
//! |----------------------|----------|---------------------------------------|
//! | LocalId, Datasource  | TEXT     | String via `.as_str()` / constructor  |
//! | ResourceRef          | INTEGER  | `resources.id` rowkey                 |
//! | DateTime<Utc>        | TEXT     | ISO 8601 via `to_rfc3339()`           |
//! | PropertyValue        | TEXT×2   | (kind, value) columns, see below      |
//!
//! Property values are stored as a `kind` discriminator (`text`, `bool`,
//! `int`, `time`) plus a string rendering, so the exact variant survives a
//! round trip.
//!
//! ## Idempotence
//!
//! `ensure_resource` relies on `INSERT .. ON CONFLICT DO NOTHING` against
//! the `(datasource, local_id)` unique key: under concurrent callers the
//! insert is the compare-and-swap and the follow-up select reads whichever
//! row won. Properties upsert per `(resource, name)`; relations ignore
//! duplicate triples.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};

use metamir_core::domain::newtypes::{DatasourceId, LocalId};
use metamir_core::domain::vocab::tags;
use metamir_core::ports::metadata_store::{IMetadataStore, PropertyValue, ResourceRef};

use crate::StoreError;

/// SQLite-based implementation of the metadata store port
///
/// All operations are performed through a connection pool for concurrency.
pub struct SqliteMetadataStore {
    pool: SqlitePool,
}

impl SqliteMetadataStore {
    /// Creates a new store instance with the given connection pool
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Reads back a property, mainly for diagnostics and tests
    pub async fn property(
        &self,
        resource: &ResourceRef,
        name: &str,
    ) -> Result<Option<PropertyValue>, StoreError> {
        let row = sqlx::query("SELECT kind, value FROM properties WHERE resource_id = ? AND name = ?")
            .bind(resource.key)
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let kind: String = row.get("kind");
                let value: String = row.get("value");
                value_from_columns(&kind, &value).map(Some)
            }
            None => Ok(None),
        }
    }

    /// Counts outgoing relations with the given name
    pub async fn count_relations(
        &self,
        resource: &ResourceRef,
        relation: &str,
    ) -> Result<i64, StoreError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM relations WHERE subject_id = ? AND name = ?")
            .bind(resource.key)
            .bind(relation)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("n"))
    }

    /// Lists the type tags of a resource
    pub async fn type_tags(&self, resource: &ResourceRef) -> Result<HashSet<String>, StoreError> {
        let rows = sqlx::query("SELECT tag FROM resource_types WHERE resource_id = ?")
            .bind(resource.key)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(|row| row.get("tag")).collect())
    }
}

// ============================================================================
// Value conversion helpers
// ============================================================================

/// Renders a PropertyValue into its (kind, value) column pair
fn value_to_columns(value: &PropertyValue) -> (&'static str, String) {
    match value {
        PropertyValue::Text(s) => ("text", s.clone()),
        PropertyValue::Bool(b) => ("bool", b.to_string()),
        PropertyValue::Int(i) => ("int", i.to_string()),
        PropertyValue::Time(t) => ("time", t.to_rfc3339()),
    }
}

/// Reconstructs a PropertyValue from its stored (kind, value) pair
fn value_from_columns(kind: &str, value: &str) -> Result<PropertyValue, StoreError> {
    match kind {
        "text" => Ok(PropertyValue::Text(value.to_string())),
        "bool" => match value {
            "true" => Ok(PropertyValue::Bool(true)),
            "false" => Ok(PropertyValue::Bool(false)),
            other => Err(StoreError::SerializationError(format!(
                "Invalid boolean value '{}'",
                other
            ))),
        },
        "int" => value.parse::<i64>().map(PropertyValue::Int).map_err(|e| {
            StoreError::SerializationError(format!("Invalid integer value '{}': {}", value, e))
        }),
        "time" => parse_datetime(value).map(PropertyValue::Time),
        other => Err(StoreError::SerializationError(format!(
            "Unknown property kind: {}",
            other
        ))),
    }
}

/// Parses a DateTime<Utc> from an ISO 8601 string
fn parse_datetime(s: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            StoreError::SerializationError(format!("Failed to parse datetime '{}': {}", s, e))
        })
}

// ============================================================================
// Port implementation
// ============================================================================

#[async_trait::async_trait]
impl IMetadataStore for SqliteMetadataStore {
    async fn ensure_resource(
        &self,
        datasource: &DatasourceId,
        local_id: &LocalId,
        type_tags: &[&str],
    ) -> anyhow::Result<(ResourceRef, bool)> {
        // The insert is the critical section: under concurrent callers the
        // unique key lets exactly one row in, and rows_affected tells this
        // caller whether it was the creator.
        let inserted = sqlx::query(
            "INSERT INTO resources (datasource, local_id) VALUES (?, ?) \
             ON CONFLICT (datasource, local_id) DO NOTHING",
        )
        .bind(datasource.as_str())
        .bind(local_id.as_str())
        .execute(&self.pool)
        .await
        .map_err(StoreError::from)?
        .rows_affected();

        let row = sqlx::query("SELECT id FROM resources WHERE datasource = ? AND local_id = ?")
            .bind(datasource.as_str())
            .bind(local_id.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(StoreError::from)?;
        let key: i64 = row.get("id");

        for tag in type_tags {
            sqlx::query(
                "INSERT INTO resource_types (resource_id, tag) VALUES (?, ?) \
                 ON CONFLICT (resource_id, tag) DO NOTHING",
            )
            .bind(key)
            .bind(tag)
            .execute(&self.pool)
            .await
            .map_err(StoreError::from)?;
        }

        let existed_before = inserted == 0;
        if !existed_before {
            tracing::debug!(local_id = %local_id, key, "Created store resource");
        }

        Ok((
            ResourceRef {
                key,
                local_id: local_id.clone(),
            },
            existed_before,
        ))
    }

    async fn get_modification_clock(
        &self,
        resource: &ResourceRef,
    ) -> anyhow::Result<Option<DateTime<Utc>>> {
        let row = sqlx::query("SELECT clock FROM resources WHERE id = ?")
            .bind(resource.key)
            .fetch_one(&self.pool)
            .await
            .map_err(StoreError::from)?;

        let clock: Option<String> = row.get("clock");
        match clock {
            Some(ref s) if !s.is_empty() => Ok(Some(parse_datetime(s)?)),
            _ => Ok(None),
        }
    }

    async fn set_modification_clock(
        &self,
        resource: &ResourceRef,
        timestamp: DateTime<Utc>,
    ) -> anyhow::Result<()> {
        sqlx::query("UPDATE resources SET clock = ? WHERE id = ?")
            .bind(timestamp.to_rfc3339())
            .bind(resource.key)
            .execute(&self.pool)
            .await
            .map_err(StoreError::from)?;
        Ok(())
    }

    async fn set_property(
        &self,
        resource: &ResourceRef,
        name: &str,
        value: PropertyValue,
    ) -> anyhow::Result<()> {
        let (kind, rendered) = value_to_columns(&value);
        sqlx::query(
            "INSERT INTO properties (resource_id, name, kind, value) VALUES (?, ?, ?, ?) \
             ON CONFLICT (resource_id, name) DO UPDATE SET kind = excluded.kind, value = excluded.value",
        )
        .bind(resource.key)
        .bind(name)
        .bind(kind)
        .bind(rendered)
        .execute(&self.pool)
        .await
        .map_err(StoreError::from)?;
        Ok(())
    }

    async fn set_relation(
        &self,
        resource: &ResourceRef,
        relation: &str,
        target: &ResourceRef,
    ) -> anyhow::Result<()> {
        sqlx::query(
            "INSERT INTO relations (subject_id, name, object_id) VALUES (?, ?, ?) \
             ON CONFLICT (subject_id, name, object_id) DO NOTHING",
        )
        .bind(resource.key)
        .bind(relation)
        .bind(target.key)
        .execute(&self.pool)
        .await
        .map_err(StoreError::from)?;
        Ok(())
    }

    async fn list_known_identifiers(
        &self,
        datasource: &DatasourceId,
    ) -> anyhow::Result<HashSet<LocalId>> {
        let rows = sqlx::query(
            "SELECT r.local_id FROM resources r \
             JOIN resource_types t ON t.resource_id = r.id AND t.tag = ? \
             WHERE r.datasource = ?",
        )
        .bind(tags::REMOTE_OBJECT)
        .bind(datasource.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::from)?;

        let mut known = HashSet::with_capacity(rows.len());
        for row in rows {
            let id: String = row.get("local_id");
            known.insert(LocalId::new(id).map_err(|e| {
                StoreError::SerializationError(format!("Invalid stored local id: {}", e))
            })?);
        }
        Ok(known)
    }
}
