//! Pluggable SQL connectors with uniform metadata and execution surfaces.
//!
//! `sqlbridge` drives MySQL-protocol engines (MySQL, Apache Doris,
//! StarRocks) and warehouse engines (Oracle, Amazon Redshift, Snowflake)
//! through one [`Connector`] type. Engines are described by
//! [`Dialect`] descriptors (quoting, namespace model, capabilities, SQL
//! templates) rather than by per-engine connector subclasses, and
//! connectivity goes through a [`Driver`] seam so engines without a
//! bundled adapter can run on a host-supplied driver.
//!
//! # Features
//!
//! - Uniform metadata: tables, views, and materialized views normalize
//!   into the same record shape regardless of how the engine catalogs them.
//! - DDL retrieval with engine quirks handled (Doris async materialized
//!   views, Redshift view definitions) and placeholder comments instead of
//!   errors.
//! - One canonical row list rendered as CSV, rows, a columnar table, or a
//!   frame.
//! - Classified execution: reads, mutations (transactional), context
//!   switches, and batches over a single non-reentrant session.
//! - Runtime capability queries ([`Capability`]) instead of type-level
//!   feature detection.
//! - Explicit, name-keyed connector registration.
//!
//! # Feature Flags
//!
//! - `mysql`: bundles the mysql_async adapter (MySQL, Doris, StarRocks).
//! - `postgres`: bundles the tokio-postgres adapter (Redshift).
//! - `full`: both.
//!
//! # Example
//!
//! ```no_run
//! use sqlbridge::prelude::*;
//!
//! # async fn run() -> sqlbridge::Result<()> {
//! let mut registry = ConnectorRegistry::new();
//! register_builtin(&mut registry);
//!
//! let mut connector = registry.create(
//!     "doris",
//!     serde_json::json!({
//!         "host": "doris.internal",
//!         "port": 9030,
//!         "username": "app",
//!         "password": "secret",
//!         "database": "sales",
//!     }),
//! )?;
//!
//! let records = connector
//!     .list_objects(ObjectKind::All, &Namespace::default())
//!     .await?;
//! for record in &records {
//!     println!("{} {}", record.table_type, record.identifier);
//! }
//!
//! let result = connector.execute("SELECT 1", ResultFormat::Csv).await;
//! assert!(result.success);
//! connector.close().await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod config;
pub mod connector;
pub mod dialect;
pub mod driver;
pub mod error;
pub mod executor;
pub mod metadata;
pub mod registry;
pub mod types;

#[cfg(feature = "mysql")]
pub mod mysql;

#[cfg(feature = "postgres")]
pub mod postgres;

pub use config::ConnectionConfig;
pub use connector::Connector;
pub use dialect::{dialect_for, Capability, ContextChange, DbType, Dialect, QuoteStyle};
pub use driver::{Driver, DriverConnection, RowStream};
pub use error::{Error, ErrorKind, Result};
pub use executor::{BatchOutcome, ExecutionResult, Payload, ResultFormat, SqlKind};
pub use metadata::{ColumnRecord, MetadataRecord, Namespace, ObjectKind, SampleRecord, TableType};
pub use registry::{register_builtin, ConnectorFactory, ConnectorRegistry};
pub use types::{Row, Value};

/// Common imports.
pub mod prelude {
    pub use crate::config::ConnectionConfig;
    pub use crate::connector::Connector;
    pub use crate::dialect::{dialect_for, Capability, DbType, Dialect};
    pub use crate::driver::{Driver, DriverConnection, RowStream};
    pub use crate::error::{Error, ErrorKind, Result};
    pub use crate::executor::{BatchOutcome, ExecutionResult, ResultFormat, SqlKind};
    pub use crate::metadata::{
        ColumnRecord, MetadataRecord, Namespace, ObjectKind, SampleRecord, TableType,
    };
    pub use crate::registry::{register_builtin, ConnectorFactory, ConnectorRegistry};
    pub use crate::types::{Row, Value};
}
