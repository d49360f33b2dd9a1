//! Driver seam.
//!
//! A [`Driver`] turns a [`ConnectionConfig`] into a live
//! [`DriverConnection`]; the connector never touches a wire protocol
//! directly. The crate bundles adapters for the MySQL and Postgres wire
//! protocols behind feature flags; hosts can supply their own driver for
//! engines without a bundled adapter (Oracle, Snowflake).

use std::future::Future;
use std::pin::Pin;

use async_trait::async_trait;

use crate::config::ConnectionConfig;
use crate::error::Result;
use crate::types::Row;

/// Factory for wire connections.
#[async_trait]
pub trait Driver: Send + Sync {
    /// Open a connection. Implementations classify their failures via
    /// [`Error::classify`](crate::error::Error::classify).
    async fn connect(&self, config: &ConnectionConfig) -> Result<Box<dyn DriverConnection>>;
}

/// One live wire connection.
///
/// Methods take `&self`; implementations guard their handle internally.
#[async_trait]
pub trait DriverConnection: Send + Sync {
    /// Run a statement and materialize its rows.
    async fn query(&self, sql: &str) -> Result<Vec<Row>>;

    /// Run a statement and return the affected-row count.
    async fn execute(&self, sql: &str) -> Result<u64>;

    /// Open a transaction.
    async fn begin(&self) -> Result<()>;

    /// Commit the open transaction.
    async fn commit(&self) -> Result<()>;

    /// Roll back the open transaction.
    async fn rollback(&self) -> Result<()>;

    /// Run a read statement and stream its rows in batches of
    /// `batch_size`.
    async fn query_stream(&self, sql: &str, batch_size: usize)
        -> Result<Pin<Box<dyn RowStream>>>;

    /// Tear down the connection.
    async fn close(&self) -> Result<()>;
}

/// Forward-only, non-restartable row sequence.
pub trait RowStream: Send + Unpin {
    /// Next row, or `None` when exhausted.
    fn next(&mut self) -> Pin<Box<dyn Future<Output = Result<Option<Row>>> + Send + '_>>;
}

impl std::fmt::Debug for dyn RowStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("RowStream")
    }
}

/// Row stream served from an already-materialized result set, in batch-
/// sized chunks. Used by drivers whose native result sets borrow the
/// connection and cannot be held across calls.
pub struct BufferedRowStream {
    rows: std::vec::IntoIter<Row>,
    batch: Vec<Row>,
    batch_size: usize,
}

impl BufferedRowStream {
    /// Wrap a materialized result set.
    pub fn new(rows: Vec<Row>, batch_size: usize) -> Self {
        Self {
            rows: rows.into_iter(),
            batch: Vec::new(),
            batch_size: batch_size.max(1),
        }
    }

    fn refill(&mut self) {
        if self.batch.is_empty() {
            self.batch = self.rows.by_ref().take(self.batch_size).collect();
            self.batch.reverse();
        }
    }
}

impl RowStream for BufferedRowStream {
    fn next(&mut self) -> Pin<Box<dyn Future<Output = Result<Option<Row>>> + Send + '_>> {
        Box::pin(async move {
            self.refill();
            Ok(self.batch.pop())
        })
    }
}

/// Drain a stream into a vector. Test and convenience helper.
pub async fn collect_stream(mut stream: Pin<Box<dyn RowStream>>) -> Result<Vec<Row>> {
    let mut rows = Vec::new();
    while let Some(row) = stream.next().await? {
        rows.push(row);
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Value;

    fn row(n: i64) -> Row {
        Row::new(vec!["n".into()], vec![Value::Int64(n)])
    }

    #[tokio::test]
    async fn buffered_stream_yields_all_rows_in_order() {
        let rows: Vec<Row> = (0..7).map(row).collect();
        let stream = Box::pin(BufferedRowStream::new(rows.clone(), 3));
        let collected = collect_stream(stream).await.unwrap();
        assert_eq!(collected, rows);
    }

    #[tokio::test]
    async fn buffered_stream_is_exhausted_once() {
        let mut stream = BufferedRowStream::new(vec![row(1)], 10);
        assert!(stream.next().await.unwrap().is_some());
        assert!(stream.next().await.unwrap().is_none());
        assert!(stream.next().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn zero_batch_size_is_clamped() {
        let stream = Box::pin(BufferedRowStream::new(vec![row(1), row(2)], 0));
        let collected = collect_stream(stream).await.unwrap();
        assert_eq!(collected.len(), 2);
    }
}
