//! Scripted driver double shared by the integration tests.

#![allow(dead_code)]

use std::pin::Pin;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use sqlbridge::driver::BufferedRowStream;
use sqlbridge::{
    ConnectionConfig, Driver, DriverConnection, Error, Result, Row, RowStream, Value,
};

/// What a scripted statement produces.
#[derive(Clone)]
pub enum Reply {
    Rows(Vec<Row>),
    Affected(u64),
    Error(String),
}

#[derive(Default)]
struct Inner {
    /// Substring-matched rules, first match wins.
    rules: Vec<(String, Reply)>,
    /// Every statement that reached the driver, in order.
    log: Vec<String>,
    close_error: Option<String>,
    connect_error: Option<String>,
    connect_count: usize,
    close_count: usize,
}

/// Driver double: replies come from scripted rules, every statement is
/// recorded.
#[derive(Clone, Default)]
pub struct MockDriver {
    inner: Arc<Mutex<Inner>>,
}

impl MockDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script a reply for statements containing `pattern`.
    pub fn on(&self, pattern: &str, reply: Reply) -> &Self {
        self.inner
            .lock()
            .unwrap()
            .rules
            .push((pattern.to_owned(), reply));
        self
    }

    /// Make every close fail with `message`.
    pub fn fail_close(&self, message: &str) -> &Self {
        self.inner.lock().unwrap().close_error = Some(message.to_owned());
        self
    }

    /// Make every connect fail with `message`.
    pub fn fail_connect(&self, message: &str) -> &Self {
        self.inner.lock().unwrap().connect_error = Some(message.to_owned());
        self
    }

    pub fn log(&self) -> Vec<String> {
        self.inner.lock().unwrap().log.clone()
    }

    /// How many statements containing `pattern` reached the driver.
    pub fn count_matching(&self, pattern: &str) -> usize {
        self.inner
            .lock()
            .unwrap()
            .log
            .iter()
            .filter(|sql| sql.contains(pattern))
            .count()
    }

    pub fn connect_count(&self) -> usize {
        self.inner.lock().unwrap().connect_count
    }

    pub fn close_count(&self) -> usize {
        self.inner.lock().unwrap().close_count
    }
}

#[async_trait]
impl Driver for MockDriver {
    async fn connect(&self, _config: &ConnectionConfig) -> Result<Box<dyn DriverConnection>> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(message) = &inner.connect_error {
            return Err(Error::classify(message.clone(), None));
        }
        inner.connect_count += 1;
        Ok(Box::new(MockConnection {
            inner: Arc::clone(&self.inner),
        }))
    }
}

struct MockConnection {
    inner: Arc<Mutex<Inner>>,
}

impl MockConnection {
    fn reply_for(&self, sql: &str) -> Option<Reply> {
        let mut inner = self.inner.lock().unwrap();
        inner.log.push(sql.to_owned());
        inner
            .rules
            .iter()
            .find(|(pattern, _)| sql.contains(pattern.as_str()))
            .map(|(_, reply)| reply.clone())
    }
}

#[async_trait]
impl DriverConnection for MockConnection {
    async fn query(&self, sql: &str) -> Result<Vec<Row>> {
        match self.reply_for(sql) {
            Some(Reply::Rows(rows)) => Ok(rows),
            Some(Reply::Affected(_)) | None => Ok(Vec::new()),
            Some(Reply::Error(message)) => Err(Error::classify(message, Some(sql))),
        }
    }

    async fn execute(&self, sql: &str) -> Result<u64> {
        match self.reply_for(sql) {
            Some(Reply::Affected(n)) => Ok(n),
            Some(Reply::Rows(_)) | None => Ok(0),
            Some(Reply::Error(message)) => Err(Error::classify(message, Some(sql))),
        }
    }

    async fn begin(&self) -> Result<()> {
        self.execute("BEGIN").await.map(|_| ())
    }

    async fn commit(&self) -> Result<()> {
        self.execute("COMMIT").await.map(|_| ())
    }

    async fn rollback(&self) -> Result<()> {
        self.execute("ROLLBACK").await.map(|_| ())
    }

    async fn query_stream(
        &self,
        sql: &str,
        batch_size: usize,
    ) -> Result<Pin<Box<dyn RowStream>>> {
        let rows = self.query(sql).await?;
        Ok(Box::pin(BufferedRowStream::new(rows, batch_size)))
    }

    async fn close(&self) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.close_count += 1;
        match &inner.close_error {
            Some(message) => Err(Error::execution(message.clone())),
            None => Ok(()),
        }
    }
}

/// Build a row from column names and textual values.
pub fn text_row(columns: &[&str], values: &[&str]) -> Row {
    Row::new(
        columns.iter().map(|c| (*c).to_owned()).collect(),
        values
            .iter()
            .map(|v| Value::String((*v).to_owned()))
            .collect(),
    )
}

/// Rows shaped like a listing result: (database_name, table_name).
pub fn listing_rows(pairs: &[(&str, &str)]) -> Vec<Row> {
    pairs
        .iter()
        .map(|(db, table)| text_row(&["database_name", "table_name"], &[db, table]))
        .collect()
}

/// A plain config pointed at nowhere in particular.
pub fn test_config() -> ConnectionConfig {
    ConnectionConfig::new("db.test", 9030, "app").with_database("sales")
}
