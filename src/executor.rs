//! Statement classification, result formats, and execution envelopes.

use serde::{Deserialize, Serialize};

use crate::types::{Row, Value};

/// What a statement does, judged by its leading keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SqlKind {
    /// Produces rows without changing state.
    Read,
    /// DML mutation.
    Write,
    /// DDL mutation.
    Ddl,
    /// Changes session context (catalog, database, schema, settings).
    ContextSwitch,
    /// Not recognized; rejected before reaching the server.
    Unknown,
}

/// Strip leading whitespace and `--` / `/* */` comments.
fn skip_leading_trivia(sql: &str) -> &str {
    let mut rest = sql;
    loop {
        let trimmed = rest.trim_start();
        if let Some(after) = trimmed.strip_prefix("--") {
            rest = match after.find('\n') {
                Some(idx) => &after[idx + 1..],
                None => "",
            };
        } else if let Some(after) = trimmed.strip_prefix("/*") {
            rest = match after.find("*/") {
                Some(idx) => &after[idx + 2..],
                None => "",
            };
        } else {
            return trimmed;
        }
    }
}

impl SqlKind {
    /// Classify a statement.
    pub fn classify(sql: &str) -> SqlKind {
        let body = skip_leading_trivia(sql);
        let mut words = body.split_whitespace();
        let first = match words.next() {
            Some(w) => w.to_uppercase(),
            None => return SqlKind::Unknown,
        };
        let second = words.next().map(|w| w.to_uppercase());

        match first.as_str() {
            "SELECT" | "WITH" | "SHOW" | "DESC" | "DESCRIBE" | "EXPLAIN" | "VALUES" => {
                SqlKind::Read
            }
            "INSERT" | "UPDATE" | "DELETE" | "MERGE" | "REPLACE" => SqlKind::Write,
            "ALTER" => match second.as_deref() {
                Some("SESSION") => SqlKind::ContextSwitch,
                _ => SqlKind::Ddl,
            },
            "CREATE" | "DROP" | "TRUNCATE" | "GRANT" | "REVOKE" | "COMMENT" => SqlKind::Ddl,
            "USE" | "SET" | "SWITCH" => SqlKind::ContextSwitch,
            _ => SqlKind::Unknown,
        }
    }

    /// True for statements served by the read path.
    pub fn is_read(&self) -> bool {
        matches!(self, SqlKind::Read)
    }

    /// True for statements that mutate data or schema.
    pub fn is_mutation(&self) -> bool {
        matches!(self, SqlKind::Write | SqlKind::Ddl)
    }
}

/// Shape of a read result payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultFormat {
    /// CSV text: header line plus one line per row.
    Csv,
    /// The canonical row list.
    Rows,
    /// Column-major table.
    Columnar,
    /// Named columns plus a row-major matrix.
    Frame,
}

impl Default for ResultFormat {
    fn default() -> Self {
        ResultFormat::Rows
    }
}

/// Column-major result table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnarTable {
    /// Column names.
    pub columns: Vec<String>,
    /// One vector of values per column.
    pub data: Vec<Vec<Value>>,
}

/// Named columns plus row-major values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// Column names.
    pub columns: Vec<String>,
    /// One vector of values per row.
    pub rows: Vec<Vec<Value>>,
}

/// A read result in the caller's requested shape. Every variant is
/// derived from the same canonical row list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Payload {
    /// CSV text.
    Csv(String),
    /// Row list.
    Rows(Vec<Row>),
    /// Column-major table.
    Columnar(ColumnarTable),
    /// Frame.
    Frame(Frame),
}

fn csv_field(text: &str) -> String {
    if text.contains(',') || text.contains('"') || text.contains('\n') || text.contains('\r') {
        format!("\"{}\"", text.replace('"', "\"\""))
    } else {
        text.to_owned()
    }
}

/// Render rows as CSV with a header line. NULL renders empty.
pub fn rows_to_csv(rows: &[Row]) -> String {
    let mut out = String::new();
    let Some(first) = rows.first() else {
        return out;
    };
    let header: Vec<String> = first.columns().iter().map(|c| csv_field(c)).collect();
    out.push_str(&header.join(","));
    out.push('\n');
    for row in rows {
        let line: Vec<String> = row.values().iter().map(|v| csv_field(&v.to_text())).collect();
        out.push_str(&line.join(","));
        out.push('\n');
    }
    out
}

impl Payload {
    /// Build a payload in `format` from the canonical row list.
    pub fn from_rows(rows: Vec<Row>, format: ResultFormat) -> Payload {
        match format {
            ResultFormat::Csv => Payload::Csv(rows_to_csv(&rows)),
            ResultFormat::Rows => Payload::Rows(rows),
            ResultFormat::Columnar => {
                let columns: Vec<String> = rows
                    .first()
                    .map(|r| r.columns().to_vec())
                    .unwrap_or_default();
                let mut data: Vec<Vec<Value>> = vec![Vec::with_capacity(rows.len()); columns.len()];
                for row in rows {
                    let (_, values) = row.into_parts();
                    for (col, value) in data.iter_mut().zip(values) {
                        col.push(value);
                    }
                }
                Payload::Columnar(ColumnarTable { columns, data })
            }
            ResultFormat::Frame => {
                let columns: Vec<String> = rows
                    .first()
                    .map(|r| r.columns().to_vec())
                    .unwrap_or_default();
                let matrix: Vec<Vec<Value>> =
                    rows.into_iter().map(|r| r.into_parts().1).collect();
                Payload::Frame(Frame {
                    columns,
                    rows: matrix,
                })
            }
        }
    }
}

/// Outcome of one statement. Failures are values, not panics or `Err`s.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Whether the statement succeeded.
    pub success: bool,
    /// The statement that ran.
    pub sql: String,
    /// Rows returned (reads) or affected (mutations).
    pub row_count: usize,
    /// Read payload. Always `None` on failure and for mutations.
    pub payload: Option<Payload>,
    /// Error text. Always `Some` on failure.
    pub error: Option<String>,
}

impl ExecutionResult {
    /// Successful read.
    pub fn ok(sql: impl Into<String>, rows: Vec<Row>, format: ResultFormat) -> Self {
        let row_count = rows.len();
        Self {
            success: true,
            sql: sql.into(),
            row_count,
            payload: Some(Payload::from_rows(rows, format)),
            error: None,
        }
    }

    /// Successful mutation or context switch.
    pub fn affected(sql: impl Into<String>, rows: u64) -> Self {
        Self {
            success: true,
            sql: sql.into(),
            row_count: usize::try_from(rows).unwrap_or(usize::MAX),
            payload: None,
            error: None,
        }
    }

    /// Failure. Guarantees the success/payload/error invariant.
    pub fn failed(sql: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            sql: sql.into(),
            row_count: 0,
            payload: None,
            error: Some(error.into()),
        }
    }
}

/// Outcome of an ordered batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchOutcome {
    /// Per-statement results, in submission order, up to and including
    /// the failing statement.
    pub results: Vec<ExecutionResult>,
    /// Index of the failing statement, when the batch aborted.
    pub failed_index: Option<usize>,
}

impl BatchOutcome {
    /// True when every statement ran and committed.
    pub fn success(&self) -> bool {
        self.failed_index.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_rows() -> Vec<Row> {
        vec![
            Row::new(
                vec!["id".into(), "name".into()],
                vec![Value::Int64(1), Value::String("a,b".into())],
            ),
            Row::new(
                vec!["id".into(), "name".into()],
                vec![Value::Int64(2), Value::Null],
            ),
        ]
    }

    #[test]
    fn classify_reads() {
        for sql in [
            "SELECT 1",
            "  with t as (select 1) select * from t",
            "SHOW DATABASES",
            "DESCRIBE orders",
            "EXPLAIN SELECT 1",
            "-- leading comment\nSELECT 2",
            "/* block */ SELECT 3",
        ] {
            assert_eq!(SqlKind::classify(sql), SqlKind::Read, "sql: {sql}");
        }
    }

    #[test]
    fn classify_mutations() {
        assert_eq!(SqlKind::classify("INSERT INTO t VALUES (1)"), SqlKind::Write);
        assert_eq!(SqlKind::classify("update t set a = 1"), SqlKind::Write);
        assert_eq!(SqlKind::classify("CREATE TABLE t (a INT)"), SqlKind::Ddl);
        assert_eq!(SqlKind::classify("ALTER TABLE t ADD b INT"), SqlKind::Ddl);
        assert_eq!(SqlKind::classify("TRUNCATE t"), SqlKind::Ddl);
    }

    #[test]
    fn classify_context_switches() {
        assert_eq!(SqlKind::classify("USE sales"), SqlKind::ContextSwitch);
        assert_eq!(SqlKind::classify("SET CATALOG hive"), SqlKind::ContextSwitch);
        assert_eq!(SqlKind::classify("SWITCH internal"), SqlKind::ContextSwitch);
        assert_eq!(
            SqlKind::classify("ALTER SESSION SET CURRENT_SCHEMA = HR"),
            SqlKind::ContextSwitch
        );
    }

    #[test]
    fn classify_unknown() {
        assert_eq!(SqlKind::classify(""), SqlKind::Unknown);
        assert_eq!(SqlKind::classify("   -- only a comment"), SqlKind::Unknown);
        assert_eq!(SqlKind::classify("FROB the database"), SqlKind::Unknown);
    }

    #[test]
    fn csv_quotes_and_nulls() {
        let csv = rows_to_csv(&two_rows());
        assert_eq!(csv, "id,name\n1,\"a,b\"\n2,\n");
    }

    #[test]
    fn csv_empty_result_is_empty_text() {
        assert_eq!(rows_to_csv(&[]), "");
    }

    #[test]
    fn columnar_transposes() {
        let payload = Payload::from_rows(two_rows(), ResultFormat::Columnar);
        let Payload::Columnar(table) = payload else {
            panic!("expected columnar payload");
        };
        assert_eq!(table.columns, vec!["id", "name"]);
        assert_eq!(table.data[0], vec![Value::Int64(1), Value::Int64(2)]);
        assert_eq!(table.data[1], vec![Value::String("a,b".into()), Value::Null]);
    }

    #[test]
    fn frame_keeps_row_major_order() {
        let payload = Payload::from_rows(two_rows(), ResultFormat::Frame);
        let Payload::Frame(frame) = payload else {
            panic!("expected frame payload");
        };
        assert_eq!(frame.rows.len(), 2);
        assert_eq!(frame.rows[1], vec![Value::Int64(2), Value::Null]);
    }

    #[test]
    fn failed_result_invariant() {
        let res = ExecutionResult::failed("SELECT * FROM missing", "not found");
        assert!(!res.success);
        assert!(res.payload.is_none());
        assert!(res.error.is_some());
        assert_eq!(res.row_count, 0);
    }
}
