//! Uniform metadata records.
//!
//! Every dialect's listing and describe queries are normalized into the
//! record types here, so downstream consumers never see engine-specific
//! catalog shapes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Concrete relation kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableType {
    /// Base table.
    Table,
    /// Logical view.
    View,
    /// Materialized view.
    MaterializedView,
}

impl TableType {
    /// Wire name for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            TableType::Table => "table",
            TableType::View => "view",
            TableType::MaterializedView => "materialized_view",
        }
    }
}

impl fmt::Display for TableType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What to list: a concrete kind or everything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    /// Base tables only.
    Table,
    /// Views only.
    View,
    /// Materialized views only.
    MaterializedView,
    /// Tables, views, and materialized views.
    All,
}

impl ObjectKind {
    /// The concrete kind, if this is not `All`.
    pub fn table_type(&self) -> Option<TableType> {
        match self {
            ObjectKind::Table => Some(TableType::Table),
            ObjectKind::View => Some(TableType::View),
            ObjectKind::MaterializedView => Some(TableType::MaterializedView),
            ObjectKind::All => None,
        }
    }
}

impl From<TableType> for ObjectKind {
    fn from(t: TableType) -> Self {
        match t {
            TableType::Table => ObjectKind::Table,
            TableType::View => ObjectKind::View,
            TableType::MaterializedView => ObjectKind::MaterializedView,
        }
    }
}

impl FromStr for ObjectKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" | "tables" => Ok(ObjectKind::Table),
            "view" | "views" => Ok(ObjectKind::View),
            "materialized_view" | "mv" | "materialized_views" => Ok(ObjectKind::MaterializedView),
            "all" => Ok(ObjectKind::All),
            other => Err(Error::invalid_argument(format!(
                "unknown object kind: {other}"
            ))),
        }
    }
}

/// Caller-supplied scope override for metadata operations.
///
/// Unset parts fall back to the session context; empty strings are treated
/// as unset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Namespace {
    /// Catalog override.
    pub catalog: Option<String>,
    /// Database override.
    pub database: Option<String>,
    /// Schema override.
    pub schema: Option<String>,
}

impl Namespace {
    /// Scope to a catalog.
    pub fn catalog(name: impl Into<String>) -> Self {
        Self {
            catalog: Some(name.into()),
            ..Self::default()
        }
    }

    /// Scope to a database.
    pub fn database(name: impl Into<String>) -> Self {
        Self {
            database: Some(name.into()),
            ..Self::default()
        }
    }

    /// Scope to a schema.
    pub fn schema(name: impl Into<String>) -> Self {
        Self {
            schema: Some(name.into()),
            ..Self::default()
        }
    }

    /// Add a database to the scope.
    pub fn with_database(mut self, name: impl Into<String>) -> Self {
        self.database = Some(name.into());
        self
    }

    /// Add a schema to the scope.
    pub fn with_schema(mut self, name: impl Into<String>) -> Self {
        self.schema = Some(name.into());
        self
    }
}

/// Fully resolved scope a dialect builds SQL against.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedNamespace {
    /// Effective catalog, when the dialect has catalogs.
    pub catalog: Option<String>,
    /// Effective database.
    pub database: Option<String>,
    /// Effective schema, when the dialect has schemas.
    pub schema: Option<String>,
}

/// One normalized metadata record.
///
/// Namespace parts the dialect does not have are empty strings, never
/// invented. `identifier` is the dialect-quoted full name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataRecord {
    /// Catalog name, or empty.
    pub catalog_name: String,
    /// Database name, or empty.
    pub database_name: String,
    /// Schema name, or empty.
    pub schema_name: String,
    /// Relation name.
    pub table_name: String,
    /// Relation kind.
    pub table_type: TableType,
    /// Dialect-quoted full name.
    pub identifier: String,
    /// DDL text, when already known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub definition: Option<String>,
}

/// One normalized column description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnRecord {
    /// Zero-based position.
    pub ordinal: usize,
    /// Column name.
    pub name: String,
    /// Engine type name, formatted (e.g. `DECIMAL(10,2)`).
    pub data_type: String,
    /// Whether NULL is allowed.
    pub nullable: bool,
    /// Default expression, if any.
    pub default_value: Option<String>,
    /// Whether the column is part of the primary key.
    pub primary_key: bool,
}

/// A metadata record plus a CSV block of sampled rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleRecord {
    /// The object the sample came from.
    pub record: MetadataRecord,
    /// CSV text: header line plus up to `top_n` rows.
    pub rows: String,
}
