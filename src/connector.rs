//! The generic connector.
//!
//! One [`Connector`] drives any [`Dialect`] through any [`Driver`]: it owns
//! the single wire session, caches the session context (catalog, database,
//! schema), normalizes metadata into [`MetadataRecord`]s, and runs
//! statements through the classified execution paths.
//!
//! Methods take `&mut self`: a connector is one non-reentrant session, not
//! a pool.

use std::pin::Pin;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::ConnectionConfig;
use crate::dialect::{dialect_for, Capability, DbType, Dialect};
use crate::driver::{Driver, DriverConnection, RowStream};
use crate::error::{Error, Result};
use crate::executor::{rows_to_csv, BatchOutcome, ExecutionResult, ResultFormat, SqlKind};
use crate::metadata::{
    ColumnRecord, MetadataRecord, Namespace, ObjectKind, ResolvedNamespace, SampleRecord,
    TableType,
};
use crate::types::{Row, Value};

fn non_empty(s: &Option<String>) -> Option<String> {
    s.as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
}

/// Empty and `"def"` both mean "use the default catalog".
fn normalize_catalog(name: &str) -> Option<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("def") {
        None
    } else {
        Some(trimmed.to_owned())
    }
}

fn truthy(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(v) => {
            if let Some(n) = v.as_i64() {
                return n != 0;
            }
            match v.as_str() {
                Some(s) => {
                    s.eq_ignore_ascii_case("yes")
                        || s.eq_ignore_ascii_case("y")
                        || s.eq_ignore_ascii_case("true")
                        || s == "1"
                }
                None => false,
            }
        }
        None => false,
    }
}

fn ddl_placeholder(identifier: &str, detail: &str) -> String {
    format!("-- DDL not available for {identifier}: {detail}")
}

/// A single database session with uniform metadata and execution surfaces.
pub struct Connector {
    dialect: Box<dyn Dialect>,
    driver: Arc<dyn Driver>,
    config: ConnectionConfig,
    conn: Option<Box<dyn DriverConnection>>,
    catalog: Option<String>,
    database: Option<String>,
    schema: Option<String>,
}

impl Connector {
    /// Build a connector. Validates the config; does not connect yet.
    pub fn new(
        dialect: Box<dyn Dialect>,
        driver: Arc<dyn Driver>,
        config: ConnectionConfig,
    ) -> Result<Self> {
        config.validate()?;
        let catalog = non_empty(&config.catalog)
            .or_else(|| dialect.default_catalog().map(str::to_owned));
        let database = non_empty(&config.database);
        let schema = dialect.initial_schema(&config);
        Ok(Self {
            dialect,
            driver,
            config,
            conn: None,
            catalog,
            database,
            schema,
        })
    }

    /// Build a connector for a named dialect with a host-supplied driver.
    pub fn with_driver(
        dialect_name: &str,
        driver: Arc<dyn Driver>,
        config: ConnectionConfig,
    ) -> Result<Self> {
        let dialect = dialect_for(dialect_name)
            .ok_or_else(|| Error::configuration(format!("unknown dialect: {dialect_name}")))?;
        Self::new(dialect, driver, config)
    }

    /// The dialect descriptor.
    pub fn dialect(&self) -> &dyn Dialect {
        self.dialect.as_ref()
    }

    /// Which engine this session talks to.
    pub fn db_type(&self) -> DbType {
        self.dialect.db_type()
    }

    /// Runtime capability query.
    pub fn supports(&self, cap: Capability) -> bool {
        self.dialect.capabilities().contains(&cap)
    }

    fn require(&self, cap: Capability) -> Result<()> {
        if self.supports(cap) {
            Ok(())
        } else {
            Err(Error::unsupported(format!(
                "{cap:?} is not supported by dialect {}",
                self.dialect.name()
            )))
        }
    }

    /// Cached session catalog.
    pub fn current_catalog(&self) -> Option<&str> {
        self.catalog.as_deref()
    }

    /// Cached session database.
    pub fn current_database(&self) -> Option<&str> {
        self.database.as_deref()
    }

    /// Cached session schema.
    pub fn current_schema(&self) -> Option<&str> {
        self.schema.as_deref()
    }

    /// Whether a wire session is currently open.
    pub fn is_connected(&self) -> bool {
        self.conn.is_some()
    }

    // ---- lifecycle -------------------------------------------------------

    /// Open the wire session. Idempotent.
    pub async fn connect(&mut self) -> Result<()> {
        if self.conn.is_none() {
            debug!(
                dialect = self.dialect.name(),
                host = %self.config.host,
                port = self.config.port,
                "connecting"
            );
            let conn = self.driver.connect(&self.config).await?;
            self.conn = Some(conn);
        }
        Ok(())
    }

    /// Close the wire session. Idempotent; the handle is released even
    /// when teardown fails. Teardown noise matching the dialect's benign
    /// patterns is logged and swallowed, anything else propagates.
    pub async fn close(&mut self) -> Result<()> {
        let Some(conn) = self.conn.take() else {
            return Ok(());
        };
        match conn.close().await {
            Ok(()) => Ok(()),
            Err(e) => {
                let message = e.to_string().to_lowercase();
                let benign = self
                    .dialect
                    .benign_close_patterns()
                    .iter()
                    .any(|p| message.contains(&p.to_lowercase()));
                if benign {
                    warn!(dialect = self.dialect.name(), error = %e, "ignoring teardown noise on close");
                    Ok(())
                } else {
                    Err(e)
                }
            }
        }
    }

    /// Probe the connection. Opens a session when none exists and closes
    /// it again afterwards in that case, success or not.
    pub async fn test_connection(&mut self) -> Result<bool> {
        let opened_here = self.conn.is_none();
        let outcome = self.run_query(self.dialect.probe_sql()).await;
        if opened_here {
            if let Err(e) = self.close().await {
                debug!(error = %e, "close after connection probe failed");
            }
        }
        match outcome {
            Ok(_) => Ok(true),
            Err(e) => {
                debug!(dialect = self.dialect.name(), error = %e, "connection probe failed");
                Ok(false)
            }
        }
    }

    fn conn(&self) -> Result<&dyn DriverConnection> {
        self.conn
            .as_deref()
            .ok_or_else(|| Error::internal("no active connection"))
    }

    /// Drop the cached handle after errors that leave the session unusable.
    fn note_session_error(&mut self, error: &Error) {
        if error.forces_reconnect() {
            debug!(error = %error, "dropping session after unrecoverable error");
            self.conn = None;
        }
    }

    async fn run_query(&mut self, sql: &str) -> Result<Vec<Row>> {
        self.connect().await?;
        debug!(sql, "query");
        let result = {
            let conn = self.conn()?;
            conn.query(sql).await
        };
        if let Err(e) = &result {
            self.note_session_error(e);
        }
        result
    }

    async fn run_execute(&mut self, sql: &str) -> Result<u64> {
        self.connect().await?;
        debug!(sql, "execute");
        let result = {
            let conn = self.conn()?;
            conn.execute(sql).await
        };
        if let Err(e) = &result {
            self.note_session_error(e);
        }
        result
    }

    async fn begin_tx(&mut self) -> Result<()> {
        self.connect().await?;
        let result = {
            let conn = self.conn()?;
            conn.begin().await
        };
        if let Err(e) = &result {
            self.note_session_error(e);
        }
        result
    }

    async fn commit_tx(&mut self) -> Result<()> {
        let result = {
            let conn = self.conn()?;
            conn.commit().await
        };
        if let Err(e) = &result {
            self.note_session_error(e);
        }
        result
    }

    /// Best-effort rollback; a failed rollback drops the session.
    async fn safe_rollback(&mut self) {
        let result = match self.conn() {
            Ok(conn) => conn.rollback().await,
            Err(_) => return,
        };
        if let Err(e) = result {
            warn!(error = %e, "rollback failed; dropping session");
            self.conn = None;
        }
    }

    // ---- session context -------------------------------------------------

    /// Effective catalog: explicit argument, then session context, then
    /// the dialect default. Empty and `"def"` mean "default".
    pub fn resolve_catalog(&self, explicit: Option<&str>) -> Option<String> {
        explicit
            .and_then(normalize_catalog)
            .or_else(|| self.catalog.as_deref().and_then(normalize_catalog))
            .or_else(|| self.dialect.default_catalog().map(str::to_owned))
    }

    /// Switch the session catalog. Empty and `"def"` switch back to the
    /// dialect default.
    pub async fn switch_catalog(&mut self, name: &str) -> Result<()> {
        self.require(Capability::Catalogs)?;
        let target = normalize_catalog(name)
            .or_else(|| self.dialect.default_catalog().map(str::to_owned))
            .ok_or_else(|| Error::invalid_argument("no catalog to switch to"))?;
        let sql = self
            .dialect
            .switch_catalog_sql(&target)
            .ok_or_else(|| Error::unsupported(format!(
                "dialect {} cannot switch catalogs",
                self.dialect.name()
            )))?;
        self.run_execute(&sql).await?;
        self.catalog = Some(target);
        Ok(())
    }

    /// Switch the session database.
    pub async fn switch_database(&mut self, name: &str) -> Result<()> {
        let Some(sql) = self.dialect.switch_database_sql(name) else {
            warn!(
                dialect = self.dialect.name(),
                database = name,
                "database switching is not supported mid-session"
            );
            return Err(Error::unsupported(format!(
                "dialect {} cannot switch databases mid-session",
                self.dialect.name()
            )));
        };
        self.run_execute(&sql).await?;
        self.database = Some(name.to_owned());
        Ok(())
    }

    /// Switch the session schema.
    pub async fn switch_schema(&mut self, name: &str) -> Result<()> {
        let Some(sql) = self.dialect.switch_schema_sql(name) else {
            return Err(Error::unsupported(format!(
                "dialect {} cannot switch schemas",
                self.dialect.name()
            )));
        };
        self.run_execute(&sql).await?;
        self.schema = Some(name.to_owned());
        Ok(())
    }

    /// Resolve a caller namespace against the session context, switching
    /// the session catalog first when the resolved catalog differs. The
    /// switch is a deliberate side effect: subsequent statements see the
    /// same catalog the metadata query ran against.
    async fn apply_namespace(&mut self, ns: &Namespace) -> Result<ResolvedNamespace> {
        let mut resolved = ResolvedNamespace::default();
        if self.supports(Capability::Catalogs) {
            let target = self.resolve_catalog(ns.catalog.as_deref());
            if let Some(target) = &target {
                if self.catalog.as_deref() != Some(target.as_str()) {
                    self.switch_catalog(target).await?;
                }
            }
            resolved.catalog = target;
        }
        resolved.database = non_empty(&ns.database).or_else(|| non_empty(&self.database));
        resolved.schema = non_empty(&ns.schema)
            .or_else(|| non_empty(&self.schema))
            .or_else(|| self.dialect.default_schema().map(str::to_owned));
        Ok(resolved)
    }

    // ---- metadata --------------------------------------------------------

    /// List catalogs (requires [`Capability::Catalogs`]).
    pub async fn list_catalogs(&mut self) -> Result<Vec<String>> {
        self.require(Capability::Catalogs)?;
        let sql = self.dialect.catalogs_sql().ok_or_else(|| {
            Error::unsupported(format!(
                "dialect {} cannot list catalogs",
                self.dialect.name()
            ))
        })?;
        let rows = self.run_query(sql).await?;
        Ok(rows
            .iter()
            .filter_map(|row| {
                row.text_by_name("CatalogName")
                    .or_else(|| row.text_by_name("Catalog"))
                    .or_else(|| row.get(0).map(Value::to_text))
            })
            .collect())
    }

    /// List databases, hiding system namespaces unless `include_sys`.
    pub async fn list_databases(&mut self, include_sys: bool) -> Result<Vec<String>> {
        let Some(sql) = self.dialect.databases_sql() else {
            // Single-database engines report the session database.
            return Ok(self.database.clone().into_iter().collect());
        };
        let rows = self.run_query(&sql).await?;
        let sys = self.dialect.system_namespaces();
        Ok(rows
            .iter()
            .filter_map(|row| row.text_by_name("database_name"))
            .filter(|name| include_sys || !sys.iter().any(|s| s.eq_ignore_ascii_case(name)))
            .collect())
    }

    /// List schemas, hiding system namespaces unless `include_sys`. Empty
    /// for engines whose databases are their schemas.
    pub async fn list_schemas(&mut self, include_sys: bool) -> Result<Vec<String>> {
        let Some(sql) = self.dialect.schemas_sql() else {
            debug!(
                dialect = self.dialect.name(),
                "no schema level; returning empty schema list"
            );
            return Ok(Vec::new());
        };
        let rows = self.run_query(&sql).await?;
        let sys = self.dialect.system_namespaces();
        Ok(rows
            .iter()
            .filter_map(|row| row.text_by_name("schema_name"))
            .filter(|name| include_sys || !sys.iter().any(|s| s.eq_ignore_ascii_case(name)))
            .collect())
    }

    /// List relations of `kind` in the given scope as normalized records.
    ///
    /// `ObjectKind::All` unions tables, views, and materialized views;
    /// view and materialized-view listing failures degrade to a warning
    /// and an empty contribution, table failures propagate.
    pub async fn list_objects(
        &mut self,
        kind: ObjectKind,
        ns: &Namespace,
    ) -> Result<Vec<MetadataRecord>> {
        match kind.table_type() {
            Some(t) => self.list_kind(t, ns).await,
            None => {
                let mut records = self.list_kind(TableType::Table, ns).await?;
                for t in [TableType::View, TableType::MaterializedView] {
                    if t == TableType::MaterializedView
                        && !self.supports(Capability::MaterializedViews)
                    {
                        continue;
                    }
                    match self.list_kind(t, ns).await {
                        Ok(mut more) => records.append(&mut more),
                        Err(e) => {
                            warn!(kind = %t, error = %e, "listing degraded to empty");
                        }
                    }
                }
                Ok(records)
            }
        }
    }

    async fn list_kind(&mut self, kind: TableType, ns: &Namespace) -> Result<Vec<MetadataRecord>> {
        if kind == TableType::MaterializedView {
            self.require(Capability::MaterializedViews)?;
        }
        let resolved = self.apply_namespace(ns).await?;
        let sql = self
            .dialect
            .list_objects_sql(kind, &resolved)
            .ok_or_else(|| {
                Error::unsupported(format!(
                    "{kind} listing is not supported by dialect {}",
                    self.dialect.name()
                ))
            })?;
        let rows = self.run_query(&sql).await?;
        let records: Vec<MetadataRecord> = rows
            .iter()
            .map(|row| self.record_from_row(kind, &resolved, row))
            .collect();
        if self.dialect.needs_mv_probe()
            && matches!(kind, TableType::Table | TableType::MaterializedView)
        {
            return self.probe_materialized_views(kind, records).await;
        }
        Ok(records)
    }

    fn record_from_row(
        &self,
        kind: TableType,
        resolved: &ResolvedNamespace,
        row: &Row,
    ) -> MetadataRecord {
        let catalog = resolved.catalog.clone().unwrap_or_default();
        let database = row
            .text_by_name("database_name")
            .or_else(|| resolved.database.clone())
            .unwrap_or_default();
        let schema = row
            .text_by_name("schema_name")
            .or_else(|| resolved.schema.clone())
            .unwrap_or_default();
        let table = row.text_by_name("table_name").unwrap_or_default();
        let identifier = self.dialect.full_name(
            (!catalog.is_empty()).then_some(catalog.as_str()),
            (!database.is_empty()).then_some(database.as_str()),
            (!schema.is_empty()).then_some(schema.as_str()),
            &table,
        );
        MetadataRecord {
            catalog_name: catalog,
            database_name: database,
            schema_name: schema,
            table_name: table,
            table_type: kind,
            identifier,
            definition: row.text_by_name("definition"),
        }
    }

    /// Engines listing materialized views as base tables need a probe per
    /// candidate. The table and materialized-view result sets end up
    /// disjoint; a probe failing for an unrelated reason leaves the object
    /// classified as a table.
    async fn probe_materialized_views(
        &mut self,
        requested: TableType,
        records: Vec<MetadataRecord>,
    ) -> Result<Vec<MetadataRecord>> {
        let mut out = Vec::with_capacity(records.len());
        for mut record in records {
            let is_mv = match self.probe_is_materialized_view(&record).await {
                Ok(v) => v,
                Err(e) => {
                    warn!(
                        identifier = %record.identifier,
                        error = %e,
                        "materialized-view probe failed; treating as table"
                    );
                    false
                }
            };
            match (requested, is_mv) {
                (TableType::Table, false) => out.push(record),
                (TableType::MaterializedView, true) => {
                    record.table_type = TableType::MaterializedView;
                    record.identifier = self.dialect.full_name(
                        (!record.catalog_name.is_empty()).then_some(record.catalog_name.as_str()),
                        (!record.database_name.is_empty())
                            .then_some(record.database_name.as_str()),
                        (!record.schema_name.is_empty()).then_some(record.schema_name.as_str()),
                        &record.table_name,
                    );
                    out.push(record);
                }
                _ => {}
            }
        }
        Ok(out)
    }

    async fn probe_is_materialized_view(&mut self, record: &MetadataRecord) -> Result<bool> {
        let Some(sql) = self.dialect.ddl_sql(TableType::Table, record) else {
            return Ok(false);
        };
        match self.run_query(&sql).await {
            Ok(_) => Ok(false),
            Err(e) if self.dialect.is_ddl_fallback_error(&e.to_string()) => Ok(true),
            Err(e) => Err(e),
        }
    }

    /// Fetch the DDL for one record. Never fails: a recognized fallback
    /// error triggers exactly one retry with the alternate statement; any
    /// other error, or a failed retry, yields a placeholder comment
    /// carrying the error text. Records that already carry a definition
    /// are returned without a query.
    pub async fn get_ddl(&mut self, record: &MetadataRecord) -> String {
        if let Some(definition) = &record.definition {
            return definition.clone();
        }
        let kind = record.table_type;
        let Some(sql) = self.dialect.ddl_sql(kind, record) else {
            return ddl_placeholder(
                &record.identifier,
                &format!("not supported by dialect {}", self.dialect.name()),
            );
        };
        match self.run_query(&sql).await {
            Ok(rows) => self
                .dialect
                .extract_ddl(kind, record, &rows)
                .unwrap_or_else(|| ddl_placeholder(&record.identifier, "empty result")),
            Err(e) => {
                if self.dialect.is_ddl_fallback_error(&e.to_string()) {
                    if let Some(fallback) = self.dialect.ddl_fallback_sql(kind, record) {
                        debug!(identifier = %record.identifier, "retrying DDL with alternate statement");
                        return match self.run_query(&fallback).await {
                            Ok(rows) => self
                                .dialect
                                .extract_ddl(kind, record, &rows)
                                .unwrap_or_else(|| {
                                    ddl_placeholder(&record.identifier, "empty result")
                                }),
                            Err(retry_err) => {
                                ddl_placeholder(&record.identifier, &retry_err.to_string())
                            }
                        };
                    }
                }
                ddl_placeholder(&record.identifier, &e.to_string())
            }
        }
    }

    /// List relations with their definitions populated, optionally
    /// filtered to the given relation names (case-insensitive).
    pub async fn list_objects_with_ddl(
        &mut self,
        kind: ObjectKind,
        ns: &Namespace,
        names: Option<&[String]>,
    ) -> Result<Vec<MetadataRecord>> {
        let mut records = self.list_objects(kind, ns).await?;
        if let Some(names) = names {
            records.retain(|r| names.iter().any(|n| n.eq_ignore_ascii_case(&r.table_name)));
        }
        for idx in 0..records.len() {
            if records[idx].definition.is_some() {
                continue;
            }
            let record = records[idx].clone();
            let ddl = self.get_ddl(&record).await;
            records[idx].definition = Some(ddl);
        }
        Ok(records)
    }

    /// Describe the columns of one relation, in ordinal order.
    pub async fn get_columns(
        &mut self,
        ns: &Namespace,
        table: &str,
    ) -> Result<Vec<ColumnRecord>> {
        let resolved = self.apply_namespace(ns).await?;
        let sql = self.dialect.columns_sql(&resolved, table);
        let rows = self.run_query(&sql).await?;
        Ok(rows
            .iter()
            .enumerate()
            .map(|(ordinal, row)| ColumnRecord {
                ordinal,
                name: row.text_by_name("name").unwrap_or_default(),
                data_type: row.text_by_name("data_type").unwrap_or_default(),
                nullable: truthy(row.get_by_name("nullable")),
                default_value: row.text_by_name("default_value"),
                primary_key: truthy(row.get_by_name("is_pk")),
            })
            .collect())
    }

    /// Sample up to `top_n` rows from each matching relation as CSV.
    /// Relations that fail to sample are skipped with a warning.
    pub async fn sample_rows(
        &mut self,
        kind: ObjectKind,
        ns: &Namespace,
        names: Option<&[String]>,
        top_n: usize,
    ) -> Result<Vec<SampleRecord>> {
        let mut records = self.list_objects(kind, ns).await?;
        if let Some(names) = names {
            records.retain(|r| names.iter().any(|n| n.eq_ignore_ascii_case(&r.table_name)));
        }
        let mut samples = Vec::with_capacity(records.len());
        for record in records {
            let sql = self.dialect.sample_sql(&record.identifier, top_n);
            match self.run_query(&sql).await {
                Ok(rows) => samples.push(SampleRecord {
                    record,
                    rows: rows_to_csv(&rows),
                }),
                Err(e) => {
                    warn!(identifier = %record.identifier, error = %e, "sampling failed; skipping");
                }
            }
        }
        Ok(samples)
    }

    // ---- execution -------------------------------------------------------

    /// Run one statement, routed by its classification. Failures come back
    /// as structured results, never as `Err`.
    pub async fn execute(&mut self, sql: &str, format: ResultFormat) -> ExecutionResult {
        match SqlKind::classify(sql) {
            SqlKind::Read => self.read_path(sql, format).await,
            SqlKind::Write | SqlKind::Ddl => self.write_path(sql).await,
            SqlKind::ContextSwitch => self.context_path(sql).await,
            SqlKind::Unknown => ExecutionResult::failed(
                sql,
                Error::invalid_argument("unrecognized statement kind").to_string(),
            ),
        }
    }

    /// Read-only execution: anything but a read statement fails fast
    /// without reaching the server.
    pub async fn execute_query(&mut self, sql: &str, format: ResultFormat) -> ExecutionResult {
        if !SqlKind::classify(sql).is_read() {
            return ExecutionResult::failed(
                sql,
                Error::invalid_argument("only read statements are allowed on the query path")
                    .to_string(),
            );
        }
        self.read_path(sql, format).await
    }

    async fn read_path(&mut self, sql: &str, format: ResultFormat) -> ExecutionResult {
        match self.run_query(sql).await {
            Ok(rows) => ExecutionResult::ok(sql, rows, format),
            Err(e) => ExecutionResult::failed(sql, e.to_string()),
        }
    }

    async fn write_path(&mut self, sql: &str) -> ExecutionResult {
        if let Err(e) = self.begin_tx().await {
            return ExecutionResult::failed(sql, e.to_string());
        }
        match self.run_execute(sql).await {
            Ok(affected) => match self.commit_tx().await {
                Ok(()) => ExecutionResult::affected(sql, affected),
                Err(e) => {
                    self.safe_rollback().await;
                    ExecutionResult::failed(sql, e.to_string())
                }
            },
            Err(e) => {
                self.safe_rollback().await;
                ExecutionResult::failed(sql, e.to_string())
            }
        }
    }

    async fn context_path(&mut self, sql: &str) -> ExecutionResult {
        match self.run_execute(sql).await {
            Ok(_) => {
                self.absorb_context_switch(sql);
                ExecutionResult::affected(sql, 0)
            }
            Err(e) => ExecutionResult::failed(sql, e.to_string()),
        }
    }

    /// Update the cached context from a successful context-switch
    /// statement. Statements the parser does not recognize leave the
    /// cache unchanged.
    fn absorb_context_switch(&mut self, sql: &str) {
        if let Some(change) = self.dialect.parse_context_switch(sql) {
            if let Some(catalog) = change.catalog {
                self.catalog = Some(catalog);
            }
            if let Some(database) = change.database {
                self.database = Some(database);
            }
            if let Some(schema) = change.schema {
                self.schema = Some(schema);
            }
        }
    }

    /// Run statements in order inside one transaction. The first failure
    /// aborts the remainder, rolls back everything, and is reported by
    /// index. A commit failure appends a synthetic result for the commit
    /// itself.
    pub async fn execute_many(&mut self, sqls: &[String]) -> BatchOutcome {
        let mut results = Vec::with_capacity(sqls.len());
        if sqls.is_empty() {
            return BatchOutcome {
                results,
                failed_index: None,
            };
        }
        if let Err(e) = self.begin_tx().await {
            results.push(ExecutionResult::failed(&sqls[0], e.to_string()));
            return BatchOutcome {
                results,
                failed_index: Some(0),
            };
        }
        for (idx, sql) in sqls.iter().enumerate() {
            let result = self.batch_statement(sql).await;
            let failed = !result.success;
            results.push(result);
            if failed {
                self.safe_rollback().await;
                return BatchOutcome {
                    results,
                    failed_index: Some(idx),
                };
            }
        }
        if let Err(e) = self.commit_tx().await {
            self.safe_rollback().await;
            let failed_index = results.len();
            results.push(ExecutionResult::failed("COMMIT", e.to_string()));
            return BatchOutcome {
                results,
                failed_index: Some(failed_index),
            };
        }
        BatchOutcome {
            results,
            failed_index: None,
        }
    }

    async fn batch_statement(&mut self, sql: &str) -> ExecutionResult {
        match SqlKind::classify(sql) {
            SqlKind::Read => match self.run_query(sql).await {
                Ok(rows) => ExecutionResult::ok(sql, rows, ResultFormat::Rows),
                Err(e) => ExecutionResult::failed(sql, e.to_string()),
            },
            SqlKind::Write | SqlKind::Ddl => match self.run_execute(sql).await {
                Ok(affected) => ExecutionResult::affected(sql, affected),
                Err(e) => ExecutionResult::failed(sql, e.to_string()),
            },
            SqlKind::ContextSwitch => match self.run_execute(sql).await {
                Ok(_) => {
                    self.absorb_context_switch(sql);
                    ExecutionResult::affected(sql, 0)
                }
                Err(e) => ExecutionResult::failed(sql, e.to_string()),
            },
            SqlKind::Unknown => ExecutionResult::failed(
                sql,
                Error::invalid_argument("unrecognized statement kind").to_string(),
            ),
        }
    }

    /// Stream a read statement's rows in batches of `batch_size`.
    pub async fn execute_iterator(
        &mut self,
        sql: &str,
        batch_size: usize,
    ) -> Result<Pin<Box<dyn RowStream>>> {
        if !SqlKind::classify(sql).is_read() {
            return Err(Error::invalid_argument(
                "streaming requires a read statement",
            ));
        }
        self.connect().await?;
        debug!(sql, batch_size, "query stream");
        let result = {
            let conn = self.conn()?;
            conn.query_stream(sql, batch_size).await
        };
        if let Err(e) = &result {
            self.note_session_error(e);
        }
        result
    }
}

impl std::fmt::Debug for Connector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connector")
            .field("dialect", &self.dialect.name())
            .field("config", &self.config)
            .field("connected", &self.conn.is_some())
            .field("catalog", &self.catalog)
            .field("database", &self.database)
            .field("schema", &self.schema)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truthy_interprets_driver_shapes() {
        assert!(truthy(Some(&Value::Bool(true))));
        assert!(truthy(Some(&Value::Int64(1))));
        assert!(!truthy(Some(&Value::Int64(0))));
        assert!(truthy(Some(&Value::String("YES".into()))));
        assert!(truthy(Some(&Value::String("y".into()))));
        assert!(!truthy(Some(&Value::String("NO".into()))));
        assert!(!truthy(Some(&Value::Null)));
        assert!(!truthy(None));
    }

    #[test]
    fn catalog_normalization() {
        assert_eq!(normalize_catalog("hive"), Some("hive".to_owned()));
        assert_eq!(normalize_catalog("  "), None);
        assert_eq!(normalize_catalog("def"), None);
        assert_eq!(normalize_catalog("DEF"), None);
    }

    #[test]
    fn ddl_placeholder_shape() {
        assert_eq!(
            ddl_placeholder("`d`.`t`", "boom"),
            "-- DDL not available for `d`.`t`: boom"
        );
    }
}
