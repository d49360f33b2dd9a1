//! Dialect descriptors.
//!
//! A [`Dialect`] describes an engine as data: quoting style, namespace
//! model, capabilities, and the SQL templates the generic
//! [`Connector`](crate::connector::Connector) runs. Per-engine behavior is
//! carried by these descriptors rather than by per-engine connector types.
//!
//! Listing and describe templates alias their projection to fixed column
//! names (`database_name`, `schema_name`, `table_name`, `definition`,
//! `name`, `data_type`, `nullable`, `default_value`, `is_pk`) so one row
//! mapper serves every engine.

use std::fmt;

use crate::config::ConnectionConfig;
use crate::metadata::{MetadataRecord, ResolvedNamespace, TableType};
use crate::types::Row;

/// Supported engines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DbType {
    /// MySQL.
    MySql,
    /// Apache Doris.
    Doris,
    /// StarRocks.
    StarRocks,
    /// Oracle.
    Oracle,
    /// Amazon Redshift.
    Redshift,
    /// Snowflake.
    Snowflake,
}

impl DbType {
    /// Canonical lower-case name, also the registry key.
    pub fn as_str(&self) -> &'static str {
        match self {
            DbType::MySql => "mysql",
            DbType::Doris => "doris",
            DbType::StarRocks => "starrocks",
            DbType::Oracle => "oracle",
            DbType::Redshift => "redshift",
            DbType::Snowflake => "snowflake",
        }
    }
}

impl fmt::Display for DbType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Optional surfaces an engine may expose. Queried at runtime via
/// [`Connector::supports`](crate::connector::Connector::supports).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// A catalog level above databases, switchable per session.
    Catalogs,
    /// Materialized views as a distinct relation kind.
    MaterializedViews,
    /// A schema level addressed as database.schema.table.
    SchemaNamespace,
}

/// Identifier quoting style.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuoteStyle {
    /// MySQL-protocol backticks.
    Backtick,
    /// Standard double quotes.
    DoubleQuote,
}

impl QuoteStyle {
    /// The quote character.
    pub fn quote_char(&self) -> char {
        match self {
            QuoteStyle::Backtick => '`',
            QuoteStyle::DoubleQuote => '"',
        }
    }

    /// Quote one identifier part, doubling embedded quote characters.
    pub fn quote(&self, name: &str) -> String {
        let q = self.quote_char();
        let doubled = format!("{q}{q}");
        format!("{q}{}{q}", name.replace(q, &doubled))
    }
}

/// How an engine addresses relations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamespaceModel {
    /// database.table (MySQL).
    Database,
    /// catalog.database.table (Doris, StarRocks).
    CatalogDatabase,
    /// schema.table (Oracle).
    Schema,
    /// database.schema.table (Redshift, Snowflake).
    DatabaseSchema,
}

/// Session context updates extracted from a context-switch statement.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContextChange {
    /// New catalog, if the statement switched one.
    pub catalog: Option<String>,
    /// New database, if the statement switched one.
    pub database: Option<String>,
    /// New schema, if the statement switched one.
    pub schema: Option<String>,
}

impl ContextChange {
    /// True when nothing was recognized.
    pub fn is_empty(&self) -> bool {
        self.catalog.is_none() && self.database.is_none() && self.schema.is_none()
    }
}

/// Escape a string for inclusion in a single-quoted SQL literal.
pub(crate) fn escape_literal(s: &str) -> String {
    s.replace('\'', "''")
}

/// An engine described as data plus SQL templates.
pub trait Dialect: Send + Sync {
    /// Which engine this is.
    fn db_type(&self) -> DbType;

    /// Registry key and log name.
    fn name(&self) -> &'static str {
        self.db_type().as_str()
    }

    /// Identifier quoting style.
    fn quote_style(&self) -> QuoteStyle;

    /// How relations are addressed.
    fn namespace_model(&self) -> NamespaceModel;

    /// Optional surfaces this engine exposes.
    fn capabilities(&self) -> &'static [Capability];

    /// Catalog used when none is configured or in context.
    fn default_catalog(&self) -> Option<&'static str> {
        None
    }

    /// Schema used when none is configured or in context.
    fn default_schema(&self) -> Option<&'static str> {
        None
    }

    /// Initial session schema derived from the configuration.
    fn initial_schema(&self, config: &ConnectionConfig) -> Option<String> {
        config
            .schema
            .clone()
            .or_else(|| self.default_schema().map(str::to_owned))
    }

    /// Namespaces hidden from listings unless explicitly requested.
    fn system_namespaces(&self) -> &'static [&'static str];

    /// Cheap liveness statement.
    fn probe_sql(&self) -> &'static str {
        "SELECT 1"
    }

    /// Quote one identifier part.
    fn quote_identifier(&self, name: &str) -> String {
        self.quote_style().quote(name)
    }

    /// Build the quoted full name for a relation, following the namespace
    /// model. Missing parts shorten the name rather than being invented.
    fn full_name(
        &self,
        catalog: Option<&str>,
        database: Option<&str>,
        schema: Option<&str>,
        table: &str,
    ) -> String {
        let mut parts: Vec<&str> = Vec::with_capacity(3);
        match self.namespace_model() {
            NamespaceModel::Database => {
                if let Some(d) = database {
                    parts.push(d);
                }
            }
            NamespaceModel::CatalogDatabase => match (catalog, database) {
                (Some(c), Some(d)) => {
                    parts.push(c);
                    parts.push(d);
                }
                (None, Some(d)) => parts.push(d),
                // A catalog alone cannot address a table.
                _ => {}
            },
            NamespaceModel::Schema => {
                if let Some(s) = schema {
                    parts.push(s);
                }
            }
            NamespaceModel::DatabaseSchema => match (database, schema) {
                (Some(d), Some(s)) => {
                    parts.push(d);
                    parts.push(s);
                }
                (None, Some(s)) => parts.push(s),
                _ => {}
            },
        }
        parts.push(table);
        parts
            .iter()
            .map(|p| self.quote_identifier(p))
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Split a quoted full name back into its parts. Inverse of
    /// [`full_name`](Dialect::full_name) for any component content,
    /// including embedded dots and quote characters.
    fn split_full_name(&self, full: &str) -> Vec<String> {
        let q = self.quote_style().quote_char();
        let mut parts = Vec::new();
        let mut current = String::new();
        let mut chars = full.chars().peekable();
        let mut in_quotes = false;
        while let Some(c) = chars.next() {
            if in_quotes {
                if c == q {
                    if chars.peek() == Some(&q) {
                        chars.next();
                        current.push(q);
                    } else {
                        in_quotes = false;
                    }
                } else {
                    current.push(c);
                }
            } else if c == q {
                in_quotes = true;
            } else if c == '.' {
                parts.push(std::mem::take(&mut current));
            } else {
                current.push(c);
            }
        }
        parts.push(current);
        parts
    }

    /// Listing query for one relation kind, or `None` when the engine has
    /// no such kind.
    fn list_objects_sql(&self, kind: TableType, ns: &ResolvedNamespace) -> Option<String>;

    /// Column-description query for one relation.
    fn columns_sql(&self, ns: &ResolvedNamespace, table: &str) -> String;

    /// DDL-retrieval query for a record, or `None` when the engine cannot
    /// produce DDL for this kind.
    fn ddl_sql(&self, kind: TableType, record: &MetadataRecord) -> Option<String>;

    /// Alternate DDL query used after a recognized fallback error.
    fn ddl_fallback_sql(&self, _kind: TableType, _record: &MetadataRecord) -> Option<String> {
        None
    }

    /// Whether a DDL error calls for the one-shot fallback retry.
    fn is_ddl_fallback_error(&self, _message: &str) -> bool {
        false
    }

    /// Pull the DDL text out of a DDL query result.
    fn extract_ddl(&self, _kind: TableType, _record: &MetadataRecord, rows: &[Row]) -> Option<String> {
        let row = rows.first()?;
        let value = row.get(row.len().checked_sub(1)?)?;
        if value.is_null() {
            None
        } else {
            Some(value.to_text())
        }
    }

    /// Whether listings must probe each candidate to tell tables and
    /// materialized views apart.
    fn needs_mv_probe(&self) -> bool {
        false
    }

    /// Catalog listing statement, for engines with catalogs.
    fn catalogs_sql(&self) -> Option<&'static str> {
        None
    }

    /// Database listing query, or `None` when the engine has a single
    /// fixed database.
    fn databases_sql(&self) -> Option<String>;

    /// Schema listing query, for engines with a schema level.
    fn schemas_sql(&self) -> Option<String> {
        None
    }

    /// Statement switching the session catalog.
    fn switch_catalog_sql(&self, _name: &str) -> Option<String> {
        None
    }

    /// Statement switching the session database.
    fn switch_database_sql(&self, _name: &str) -> Option<String> {
        None
    }

    /// Statement switching the session schema.
    fn switch_schema_sql(&self, _name: &str) -> Option<String> {
        None
    }

    /// Row-sampling query with a row cap.
    fn sample_sql(&self, full_name: &str, top_n: usize) -> String {
        format!("SELECT * FROM {full_name} LIMIT {top_n}")
    }

    /// Teardown error fragments that are noise rather than failures.
    fn benign_close_patterns(&self) -> &'static [&'static str] {
        &[]
    }

    /// Extract session-context updates from a context-switch statement.
    /// Unrecognized statements yield `None` and leave the cache untouched.
    fn parse_context_switch(&self, sql: &str) -> Option<ContextChange> {
        parse_context_switch_generic(sql)
    }
}

fn unquote_token(token: &str) -> String {
    token
        .trim_end_matches(';')
        .trim_end_matches(',')
        .trim_matches(|c| c == '`' || c == '"')
        .to_owned()
}

/// Shared context-switch parser covering every supported dialect's
/// switch statements.
pub(crate) fn parse_context_switch_generic(sql: &str) -> Option<ContextChange> {
    let normalized = sql.trim().trim_end_matches(';').replace('=', " = ");
    let tokens: Vec<String> = normalized
        .split_whitespace()
        .map(|t| t.to_owned())
        .collect();
    let lower: Vec<String> = tokens.iter().map(|t| t.to_lowercase()).collect();
    let lower_refs: Vec<&str> = lower.iter().map(String::as_str).collect();

    let mut change = ContextChange::default();
    match lower_refs.as_slice() {
        ["use", "database", _] => change.database = Some(unquote_token(&tokens[2])),
        ["use", "schema", _] => change.schema = Some(unquote_token(&tokens[2])),
        ["use", _] => change.database = Some(unquote_token(&tokens[1])),
        ["switch", _] => change.catalog = Some(unquote_token(&tokens[1])),
        ["set", "catalog", _] => change.catalog = Some(unquote_token(&tokens[2])),
        ["set", "search_path", "to", rest @ ..] | ["set", "search_path", "=", rest @ ..]
            if !rest.is_empty() =>
        {
            // First entry of the path wins.
            change.schema = Some(unquote_token(&tokens[3]));
        }
        ["alter", "session", "set", "current_schema", "=", _] => {
            change.schema = Some(unquote_token(&tokens[5]));
        }
        _ => return None,
    }
    if change.is_empty() {
        None
    } else {
        Some(change)
    }
}

const MYSQL_SYS_NAMESPACES: &[&str] = &["information_schema", "performance_schema", "mysql", "sys"];

fn mysql_schema_filter(ns: &ResolvedNamespace, sys: &[&str]) -> String {
    match &ns.database {
        Some(db) => format!("TABLE_SCHEMA = '{}'", escape_literal(db)),
        None => {
            let quoted: Vec<String> = sys.iter().map(|s| format!("'{s}'")).collect();
            format!("TABLE_SCHEMA NOT IN ({})", quoted.join(", "))
        }
    }
}

fn mysql_list_tables_sql(ns: &ResolvedNamespace, sys: &[&str]) -> String {
    format!(
        "SELECT TABLE_SCHEMA AS database_name, TABLE_NAME AS table_name \
         FROM information_schema.TABLES \
         WHERE {} AND TABLE_TYPE IN ('BASE TABLE', 'TABLE') \
         ORDER BY TABLE_SCHEMA, TABLE_NAME",
        mysql_schema_filter(ns, sys)
    )
}

fn mysql_list_views_sql(ns: &ResolvedNamespace, sys: &[&str]) -> String {
    format!(
        "SELECT TABLE_SCHEMA AS database_name, TABLE_NAME AS table_name \
         FROM information_schema.VIEWS \
         WHERE {} \
         ORDER BY TABLE_SCHEMA, TABLE_NAME",
        mysql_schema_filter(ns, sys)
    )
}

fn mysql_columns_sql(ns: &ResolvedNamespace, table: &str) -> String {
    let schema_filter = match &ns.database {
        Some(db) => format!("TABLE_SCHEMA = '{}'", escape_literal(db)),
        None => "TABLE_SCHEMA = DATABASE()".to_owned(),
    };
    format!(
        "SELECT COLUMN_NAME AS name, COLUMN_TYPE AS data_type, \
         IS_NULLABLE AS nullable, COLUMN_DEFAULT AS default_value, \
         CASE WHEN COLUMN_KEY = 'PRI' THEN 1 ELSE 0 END AS is_pk \
         FROM information_schema.COLUMNS \
         WHERE {} AND TABLE_NAME = '{}' \
         ORDER BY ORDINAL_POSITION",
        schema_filter,
        escape_literal(table)
    )
}

fn mysql_databases_sql() -> String {
    "SELECT SCHEMA_NAME AS database_name FROM information_schema.SCHEMATA ORDER BY SCHEMA_NAME"
        .to_owned()
}

fn show_create_sql(kind: TableType, identifier: &str) -> String {
    let keyword = match kind {
        TableType::Table => "TABLE",
        TableType::View => "VIEW",
        TableType::MaterializedView => "MATERIALIZED VIEW",
    };
    format!("SHOW CREATE {keyword} {identifier}")
}

/// SHOW CREATE results carry the DDL in a column named `Create Table`,
/// `Create View`, or similar; fall back to the second column.
fn extract_show_create(rows: &[Row]) -> Option<String> {
    let row = rows.first()?;
    let by_name = row
        .columns()
        .iter()
        .position(|c| c.to_lowercase().starts_with("create"))
        .and_then(|idx| row.get(idx));
    let value = by_name.or_else(|| row.get(1)).or_else(|| row.get(0))?;
    if value.is_null() {
        None
    } else {
        Some(value.to_text())
    }
}

/// MySQL.
#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlDialect;

impl Dialect for MySqlDialect {
    fn db_type(&self) -> DbType {
        DbType::MySql
    }

    fn quote_style(&self) -> QuoteStyle {
        QuoteStyle::Backtick
    }

    fn namespace_model(&self) -> NamespaceModel {
        NamespaceModel::Database
    }

    fn capabilities(&self) -> &'static [Capability] {
        &[]
    }

    fn system_namespaces(&self) -> &'static [&'static str] {
        MYSQL_SYS_NAMESPACES
    }

    fn list_objects_sql(&self, kind: TableType, ns: &ResolvedNamespace) -> Option<String> {
        match kind {
            TableType::Table => Some(mysql_list_tables_sql(ns, MYSQL_SYS_NAMESPACES)),
            TableType::View => Some(mysql_list_views_sql(ns, MYSQL_SYS_NAMESPACES)),
            TableType::MaterializedView => None,
        }
    }

    fn columns_sql(&self, ns: &ResolvedNamespace, table: &str) -> String {
        mysql_columns_sql(ns, table)
    }

    fn ddl_sql(&self, kind: TableType, record: &MetadataRecord) -> Option<String> {
        match kind {
            TableType::MaterializedView => None,
            _ => Some(show_create_sql(kind, &record.identifier)),
        }
    }

    fn extract_ddl(&self, _kind: TableType, _record: &MetadataRecord, rows: &[Row]) -> Option<String> {
        extract_show_create(rows)
    }

    fn databases_sql(&self) -> Option<String> {
        Some(mysql_databases_sql())
    }

    fn switch_database_sql(&self, name: &str) -> Option<String> {
        Some(format!("USE {}", self.quote_identifier(name)))
    }
}

const DORIS_SYS_NAMESPACES: &[&str] = &[
    "information_schema",
    "mysql",
    "__internal_schema",
];

/// Teardown noise the MySQL-protocol engines emit when the server drops
/// the session before the client's quit packet completes.
const MYSQL_PROTOCOL_BENIGN_CLOSE: &[&str] = &[
    "broken pipe",
    "connection reset",
    "packet out of order",
    "com_quit",
];

/// Apache Doris.
#[derive(Debug, Clone, Copy, Default)]
pub struct DorisDialect;

impl Dialect for DorisDialect {
    fn db_type(&self) -> DbType {
        DbType::Doris
    }

    fn quote_style(&self) -> QuoteStyle {
        QuoteStyle::Backtick
    }

    fn namespace_model(&self) -> NamespaceModel {
        NamespaceModel::CatalogDatabase
    }

    fn capabilities(&self) -> &'static [Capability] {
        &[Capability::Catalogs, Capability::MaterializedViews]
    }

    fn default_catalog(&self) -> Option<&'static str> {
        Some("internal")
    }

    fn system_namespaces(&self) -> &'static [&'static str] {
        DORIS_SYS_NAMESPACES
    }

    fn list_objects_sql(&self, kind: TableType, ns: &ResolvedNamespace) -> Option<String> {
        match kind {
            TableType::Table => Some(mysql_list_tables_sql(ns, DORIS_SYS_NAMESPACES)),
            TableType::View => Some(mysql_list_views_sql(ns, DORIS_SYS_NAMESPACES)),
            // Async materialized views are listed as BASE TABLE; the probe
            // separates them from plain tables afterwards.
            TableType::MaterializedView => Some(mysql_list_tables_sql(ns, DORIS_SYS_NAMESPACES)),
        }
    }

    fn columns_sql(&self, ns: &ResolvedNamespace, table: &str) -> String {
        mysql_columns_sql(ns, table)
    }

    fn ddl_sql(&self, kind: TableType, record: &MetadataRecord) -> Option<String> {
        // MVs answer SHOW CREATE TABLE with the async-MV refusal, which
        // triggers the fallback below.
        let keyword_kind = match kind {
            TableType::MaterializedView => TableType::Table,
            other => other,
        };
        Some(show_create_sql(keyword_kind, &record.identifier))
    }

    fn ddl_fallback_sql(&self, _kind: TableType, record: &MetadataRecord) -> Option<String> {
        Some(show_create_sql(TableType::MaterializedView, &record.identifier))
    }

    fn is_ddl_fallback_error(&self, message: &str) -> bool {
        let lower = message.to_lowercase();
        lower.contains("not support async materialized view")
            && lower.contains("show create materialized view")
    }

    fn extract_ddl(&self, _kind: TableType, _record: &MetadataRecord, rows: &[Row]) -> Option<String> {
        extract_show_create(rows)
    }

    fn needs_mv_probe(&self) -> bool {
        true
    }

    fn catalogs_sql(&self) -> Option<&'static str> {
        Some("SHOW CATALOGS")
    }

    fn databases_sql(&self) -> Option<String> {
        Some(mysql_databases_sql())
    }

    fn switch_catalog_sql(&self, name: &str) -> Option<String> {
        Some(format!("SWITCH {}", self.quote_identifier(name)))
    }

    fn switch_database_sql(&self, name: &str) -> Option<String> {
        Some(format!("USE {}", self.quote_identifier(name)))
    }

    fn benign_close_patterns(&self) -> &'static [&'static str] {
        MYSQL_PROTOCOL_BENIGN_CLOSE
    }
}

const STARROCKS_SYS_NAMESPACES: &[&str] = &[
    "information_schema",
    "sys",
    "_statistics_",
];

/// StarRocks.
#[derive(Debug, Clone, Copy, Default)]
pub struct StarRocksDialect;

impl Dialect for StarRocksDialect {
    fn db_type(&self) -> DbType {
        DbType::StarRocks
    }

    fn quote_style(&self) -> QuoteStyle {
        QuoteStyle::Backtick
    }

    fn namespace_model(&self) -> NamespaceModel {
        NamespaceModel::CatalogDatabase
    }

    fn capabilities(&self) -> &'static [Capability] {
        &[Capability::Catalogs, Capability::MaterializedViews]
    }

    fn default_catalog(&self) -> Option<&'static str> {
        Some("default_catalog")
    }

    fn system_namespaces(&self) -> &'static [&'static str] {
        STARROCKS_SYS_NAMESPACES
    }

    fn list_objects_sql(&self, kind: TableType, ns: &ResolvedNamespace) -> Option<String> {
        match kind {
            TableType::Table => Some(mysql_list_tables_sql(ns, STARROCKS_SYS_NAMESPACES)),
            TableType::View => Some(mysql_list_views_sql(ns, STARROCKS_SYS_NAMESPACES)),
            TableType::MaterializedView => {
                let filter = mysql_schema_filter(ns, STARROCKS_SYS_NAMESPACES);
                Some(format!(
                    "SELECT TABLE_SCHEMA AS database_name, TABLE_NAME AS table_name, \
                     MATERIALIZED_VIEW_DEFINITION AS definition \
                     FROM information_schema.materialized_views \
                     WHERE {filter} \
                     ORDER BY TABLE_SCHEMA, TABLE_NAME"
                ))
            }
        }
    }

    fn columns_sql(&self, ns: &ResolvedNamespace, table: &str) -> String {
        mysql_columns_sql(ns, table)
    }

    fn ddl_sql(&self, kind: TableType, record: &MetadataRecord) -> Option<String> {
        Some(show_create_sql(kind, &record.identifier))
    }

    fn extract_ddl(&self, _kind: TableType, _record: &MetadataRecord, rows: &[Row]) -> Option<String> {
        extract_show_create(rows)
    }

    fn catalogs_sql(&self) -> Option<&'static str> {
        Some("SHOW CATALOGS")
    }

    fn databases_sql(&self) -> Option<String> {
        Some(mysql_databases_sql())
    }

    fn switch_catalog_sql(&self, name: &str) -> Option<String> {
        Some(format!("SET CATALOG {}", self.quote_identifier(name)))
    }

    fn switch_database_sql(&self, name: &str) -> Option<String> {
        Some(format!("USE {}", self.quote_identifier(name)))
    }

    fn benign_close_patterns(&self) -> &'static [&'static str] {
        MYSQL_PROTOCOL_BENIGN_CLOSE
    }
}

const ORACLE_SYS_NAMESPACES: &[&str] = &[
    "SYS",
    "SYSTEM",
    "OUTLN",
    "DBSNMP",
    "APPQOSSYS",
    "CTXSYS",
    "DVSYS",
    "EXFSYS",
    "MDSYS",
    "OLAPSYS",
    "ORDSYS",
    "ORDDATA",
    "WMSYS",
    "XDB",
    "LBACSYS",
    "OJVMSYS",
    "GSMADMIN_INTERNAL",
    "AUDSYS",
];

fn oracle_owner_filter(ns: &ResolvedNamespace) -> String {
    match &ns.schema {
        Some(schema) => format!("OWNER = '{}'", escape_literal(&schema.to_uppercase())),
        None => {
            let quoted: Vec<String> = ORACLE_SYS_NAMESPACES
                .iter()
                .map(|s| format!("'{s}'"))
                .collect();
            format!("OWNER NOT IN ({})", quoted.join(", "))
        }
    }
}

/// Oracle.
#[derive(Debug, Clone, Copy, Default)]
pub struct OracleDialect;

impl Dialect for OracleDialect {
    fn db_type(&self) -> DbType {
        DbType::Oracle
    }

    fn quote_style(&self) -> QuoteStyle {
        QuoteStyle::DoubleQuote
    }

    fn namespace_model(&self) -> NamespaceModel {
        NamespaceModel::Schema
    }

    fn capabilities(&self) -> &'static [Capability] {
        &[Capability::MaterializedViews]
    }

    fn system_namespaces(&self) -> &'static [&'static str] {
        ORACLE_SYS_NAMESPACES
    }

    fn probe_sql(&self) -> &'static str {
        "SELECT 1 FROM DUAL"
    }

    /// Unqualified sessions resolve against the login user's own schema.
    fn initial_schema(&self, config: &ConnectionConfig) -> Option<String> {
        config
            .schema
            .clone()
            .or_else(|| Some(config.username.to_uppercase()))
    }

    fn list_objects_sql(&self, kind: TableType, ns: &ResolvedNamespace) -> Option<String> {
        let filter = oracle_owner_filter(ns);
        let sql = match kind {
            TableType::Table => format!(
                "SELECT OWNER AS schema_name, TABLE_NAME AS table_name \
                 FROM ALL_TABLES WHERE {filter} ORDER BY OWNER, TABLE_NAME"
            ),
            TableType::View => format!(
                "SELECT OWNER AS schema_name, VIEW_NAME AS table_name \
                 FROM ALL_VIEWS WHERE {filter} ORDER BY OWNER, VIEW_NAME"
            ),
            TableType::MaterializedView => format!(
                "SELECT OWNER AS schema_name, MVIEW_NAME AS table_name \
                 FROM ALL_MVIEWS WHERE {filter} ORDER BY OWNER, MVIEW_NAME"
            ),
        };
        Some(sql)
    }

    fn columns_sql(&self, ns: &ResolvedNamespace, table: &str) -> String {
        let owner = ns
            .schema
            .as_deref()
            .map(|s| escape_literal(&s.to_uppercase()))
            .unwrap_or_default();
        let table = escape_literal(&table.to_uppercase());
        format!(
            "SELECT c.COLUMN_NAME AS name, \
             CASE \
               WHEN c.DATA_TYPE = 'NUMBER' AND c.DATA_PRECISION IS NOT NULL \
                 THEN c.DATA_TYPE || '(' || c.DATA_PRECISION || ',' || NVL(c.DATA_SCALE, 0) || ')' \
               WHEN c.DATA_TYPE IN ('VARCHAR2', 'NVARCHAR2', 'CHAR', 'NCHAR', 'RAW') \
                 THEN c.DATA_TYPE || '(' || c.DATA_LENGTH || ')' \
               ELSE c.DATA_TYPE \
             END AS data_type, \
             c.NULLABLE AS nullable, c.DATA_DEFAULT AS default_value, \
             CASE WHEN pk.COLUMN_NAME IS NOT NULL THEN 1 ELSE 0 END AS is_pk \
             FROM ALL_TAB_COLUMNS c \
             LEFT JOIN ( \
               SELECT cc.COLUMN_NAME FROM ALL_CONSTRAINTS ac \
               JOIN ALL_CONS_COLUMNS cc \
                 ON ac.CONSTRAINT_NAME = cc.CONSTRAINT_NAME AND ac.OWNER = cc.OWNER \
               WHERE ac.CONSTRAINT_TYPE = 'P' \
                 AND ac.OWNER = '{owner}' AND ac.TABLE_NAME = '{table}' \
             ) pk ON pk.COLUMN_NAME = c.COLUMN_NAME \
             WHERE c.OWNER = '{owner}' AND c.TABLE_NAME = '{table}' \
             ORDER BY c.COLUMN_ID"
        )
    }

    fn ddl_sql(&self, kind: TableType, record: &MetadataRecord) -> Option<String> {
        let type_name = match kind {
            TableType::Table => "TABLE",
            TableType::View => "VIEW",
            TableType::MaterializedView => "MATERIALIZED_VIEW",
        };
        Some(format!(
            "SELECT DBMS_METADATA.GET_DDL('{type_name}', '{}', '{}') AS ddl FROM DUAL",
            escape_literal(&record.table_name.to_uppercase()),
            escape_literal(&record.schema_name.to_uppercase()),
        ))
    }

    fn databases_sql(&self) -> Option<String> {
        None
    }

    fn schemas_sql(&self) -> Option<String> {
        Some("SELECT USERNAME AS schema_name FROM ALL_USERS ORDER BY USERNAME".to_owned())
    }

    fn switch_schema_sql(&self, name: &str) -> Option<String> {
        Some(format!(
            "ALTER SESSION SET CURRENT_SCHEMA = {}",
            self.quote_identifier(&name.to_uppercase())
        ))
    }

    fn sample_sql(&self, full_name: &str, top_n: usize) -> String {
        format!("SELECT * FROM {full_name} WHERE ROWNUM <= {top_n}")
    }
}

const REDSHIFT_SYS_NAMESPACES: &[&str] = &["pg_catalog", "information_schema", "pg_internal"];

/// Amazon Redshift.
#[derive(Debug, Clone, Copy, Default)]
pub struct RedshiftDialect;

impl RedshiftDialect {
    fn schema_filter(ns: &ResolvedNamespace) -> String {
        match &ns.schema {
            Some(schema) => format!("n.nspname = '{}'", escape_literal(schema)),
            None => {
                let quoted: Vec<String> = REDSHIFT_SYS_NAMESPACES
                    .iter()
                    .map(|s| format!("'{s}'"))
                    .collect();
                format!("n.nspname NOT IN ({})", quoted.join(", "))
            }
        }
    }
}

impl Dialect for RedshiftDialect {
    fn db_type(&self) -> DbType {
        DbType::Redshift
    }

    fn quote_style(&self) -> QuoteStyle {
        QuoteStyle::DoubleQuote
    }

    fn namespace_model(&self) -> NamespaceModel {
        NamespaceModel::DatabaseSchema
    }

    fn capabilities(&self) -> &'static [Capability] {
        &[Capability::SchemaNamespace, Capability::MaterializedViews]
    }

    fn default_schema(&self) -> Option<&'static str> {
        Some("public")
    }

    fn system_namespaces(&self) -> &'static [&'static str] {
        REDSHIFT_SYS_NAMESPACES
    }

    fn list_objects_sql(&self, kind: TableType, ns: &ResolvedNamespace) -> Option<String> {
        let relkind = match kind {
            TableType::Table => 'r',
            TableType::View => 'v',
            TableType::MaterializedView => 'm',
        };
        Some(format!(
            "SELECT n.nspname AS schema_name, c.relname AS table_name \
             FROM pg_class c JOIN pg_namespace n ON n.oid = c.relnamespace \
             WHERE c.relkind = '{relkind}' AND {} \
             ORDER BY n.nspname, c.relname",
            Self::schema_filter(ns)
        ))
    }

    fn columns_sql(&self, ns: &ResolvedNamespace, table: &str) -> String {
        let schema = ns.schema.as_deref().unwrap_or("public");
        format!(
            "SELECT column_name AS name, data_type, is_nullable AS nullable, \
             column_default AS default_value, 0 AS is_pk \
             FROM information_schema.columns \
             WHERE table_schema = '{}' AND table_name = '{}' \
             ORDER BY ordinal_position",
            escape_literal(schema),
            escape_literal(table)
        )
    }

    fn ddl_sql(&self, kind: TableType, record: &MetadataRecord) -> Option<String> {
        match kind {
            // pg_get_viewdef only covers views; table DDL would need a
            // reconstruction query over svv_table_info.
            TableType::Table => None,
            TableType::View | TableType::MaterializedView => Some(format!(
                "SELECT pg_get_viewdef('{}.{}', true) AS definition",
                escape_literal(&record.schema_name),
                escape_literal(&record.table_name)
            )),
        }
    }

    fn extract_ddl(&self, kind: TableType, record: &MetadataRecord, rows: &[Row]) -> Option<String> {
        let row = rows.first()?;
        let body = match row.get(0) {
            Some(v) if !v.is_null() => v.to_text(),
            _ => return None,
        };
        let materialized = match kind {
            TableType::MaterializedView => "MATERIALIZED ",
            _ => "",
        };
        Some(format!(
            "CREATE {materialized}VIEW {}.{} AS\n{body}",
            record.schema_name, record.table_name
        ))
    }

    fn databases_sql(&self) -> Option<String> {
        Some(
            "SELECT datname AS database_name FROM pg_database \
             WHERE datistemplate = false ORDER BY datname"
                .to_owned(),
        )
    }

    fn schemas_sql(&self) -> Option<String> {
        Some(
            "SELECT nspname AS schema_name FROM pg_namespace \
             WHERE nspname NOT LIKE 'pg_temp_%' AND nspname NOT LIKE 'pg_toast%' \
             ORDER BY nspname"
                .to_owned(),
        )
    }

    fn switch_schema_sql(&self, name: &str) -> Option<String> {
        Some(format!("SET search_path TO {}", self.quote_identifier(name)))
    }
}

const SNOWFLAKE_SYS_NAMESPACES: &[&str] = &[
    "SNOWFLAKE",
    "SNOWFLAKE_SAMPLE_DATA",
    "INFORMATION_SCHEMA",
];

/// Snowflake.
#[derive(Debug, Clone, Copy, Default)]
pub struct SnowflakeDialect;

impl SnowflakeDialect {
    fn schema_filter(ns: &ResolvedNamespace) -> String {
        match &ns.schema {
            Some(schema) => format!("TABLE_SCHEMA = '{}'", escape_literal(schema)),
            None => "TABLE_SCHEMA != 'INFORMATION_SCHEMA'".to_owned(),
        }
    }
}

impl Dialect for SnowflakeDialect {
    fn db_type(&self) -> DbType {
        DbType::Snowflake
    }

    fn quote_style(&self) -> QuoteStyle {
        QuoteStyle::DoubleQuote
    }

    fn namespace_model(&self) -> NamespaceModel {
        NamespaceModel::DatabaseSchema
    }

    fn capabilities(&self) -> &'static [Capability] {
        &[Capability::SchemaNamespace, Capability::MaterializedViews]
    }

    fn system_namespaces(&self) -> &'static [&'static str] {
        SNOWFLAKE_SYS_NAMESPACES
    }

    fn list_objects_sql(&self, kind: TableType, ns: &ResolvedNamespace) -> Option<String> {
        let type_filter = match kind {
            TableType::Table => "TABLE_TYPE = 'BASE TABLE'",
            TableType::View => "TABLE_TYPE = 'VIEW'",
            TableType::MaterializedView => "TABLE_TYPE = 'MATERIALIZED VIEW'",
        };
        let source = match kind {
            TableType::View => "INFORMATION_SCHEMA.VIEWS",
            _ => "INFORMATION_SCHEMA.TABLES",
        };
        let type_clause = match kind {
            TableType::View => String::new(),
            _ => format!(" AND {type_filter}"),
        };
        Some(format!(
            "SELECT TABLE_CATALOG AS database_name, TABLE_SCHEMA AS schema_name, \
             TABLE_NAME AS table_name \
             FROM {source} WHERE {}{type_clause} \
             ORDER BY TABLE_SCHEMA, TABLE_NAME",
            Self::schema_filter(ns)
        ))
    }

    fn columns_sql(&self, ns: &ResolvedNamespace, table: &str) -> String {
        let schema_filter = match &ns.schema {
            Some(schema) => format!("TABLE_SCHEMA = '{}'", escape_literal(schema)),
            None => "TABLE_SCHEMA = CURRENT_SCHEMA()".to_owned(),
        };
        format!(
            "SELECT COLUMN_NAME AS name, DATA_TYPE AS data_type, \
             IS_NULLABLE AS nullable, COLUMN_DEFAULT AS default_value, 0 AS is_pk \
             FROM INFORMATION_SCHEMA.COLUMNS \
             WHERE {} AND TABLE_NAME = '{}' \
             ORDER BY ORDINAL_POSITION",
            schema_filter,
            escape_literal(table)
        )
    }

    fn ddl_sql(&self, kind: TableType, record: &MetadataRecord) -> Option<String> {
        let type_name = match kind {
            TableType::Table => "TABLE",
            TableType::View => "VIEW",
            TableType::MaterializedView => "MATERIALIZED_VIEW",
        };
        Some(format!(
            "SELECT GET_DDL('{type_name}', '{}') AS ddl",
            escape_literal(&record.identifier)
        ))
    }

    fn databases_sql(&self) -> Option<String> {
        Some(
            "SELECT DATABASE_NAME AS database_name FROM INFORMATION_SCHEMA.DATABASES \
             ORDER BY DATABASE_NAME"
                .to_owned(),
        )
    }

    fn schemas_sql(&self) -> Option<String> {
        Some(
            "SELECT SCHEMA_NAME AS schema_name FROM INFORMATION_SCHEMA.SCHEMATA \
             ORDER BY SCHEMA_NAME"
                .to_owned(),
        )
    }

    fn switch_database_sql(&self, name: &str) -> Option<String> {
        Some(format!("USE DATABASE {}", self.quote_identifier(name)))
    }

    fn switch_schema_sql(&self, name: &str) -> Option<String> {
        Some(format!("USE SCHEMA {}", self.quote_identifier(name)))
    }
}

/// All registrable dialect names.
pub const DIALECT_NAMES: &[&str] = &[
    "mysql",
    "doris",
    "starrocks",
    "oracle",
    "redshift",
    "snowflake",
];

/// Look up a dialect descriptor by name, case-insensitive.
pub fn dialect_for(name: &str) -> Option<Box<dyn Dialect>> {
    match name.to_lowercase().as_str() {
        "mysql" => Some(Box::new(MySqlDialect)),
        "doris" => Some(Box::new(DorisDialect)),
        "starrocks" => Some(Box::new(StarRocksDialect)),
        "oracle" => Some(Box::new(OracleDialect)),
        "redshift" => Some(Box::new(RedshiftDialect)),
        "snowflake" => Some(Box::new(SnowflakeDialect)),
        _ => None,
    }
}
