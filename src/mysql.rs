//! MySQL wire-protocol driver adapter.
//!
//! Serves MySQL, Doris, and StarRocks; the latter two speak the MySQL
//! protocol on their frontend ports.

use std::pin::Pin;

use async_trait::async_trait;
use mysql_async::prelude::Queryable;
use mysql_async::{Conn, OptsBuilder, SslOpts};
use tokio::sync::Mutex;

use crate::config::ConnectionConfig;
use crate::connector::Connector;
use crate::dialect::{DorisDialect, MySqlDialect, StarRocksDialect};
use crate::driver::{BufferedRowStream, Driver, DriverConnection, RowStream};
use crate::error::{Error, Result};
use crate::registry::ConnectorFactory;
use crate::types::{Row, Value};

fn mysql_value_to_value(val: mysql_async::Value) -> Value {
    match val {
        mysql_async::Value::NULL => Value::Null,
        mysql_async::Value::Bytes(b) => match String::from_utf8(b) {
            Ok(s) => Value::String(s),
            Err(e) => Value::Bytes(e.into_bytes()),
        },
        mysql_async::Value::Int(n) => Value::Int64(n),
        mysql_async::Value::UInt(n) => Value::UInt64(n),
        mysql_async::Value::Float(f) => Value::Float32(f),
        mysql_async::Value::Double(d) => Value::Float64(d),
        mysql_async::Value::Date(year, month, day, hour, min, sec, micro) => {
            let Some(date) = chrono::NaiveDate::from_ymd_opt(i32::from(year), u32::from(month), u32::from(day))
            else {
                return Value::Null;
            };
            if hour == 0 && min == 0 && sec == 0 && micro == 0 {
                Value::Date(date)
            } else {
                match chrono::NaiveTime::from_hms_micro_opt(
                    u32::from(hour),
                    u32::from(min),
                    u32::from(sec),
                    micro,
                ) {
                    Some(time) => Value::DateTime(chrono::NaiveDateTime::new(date, time)),
                    None => Value::Null,
                }
            }
        }
        mysql_async::Value::Time(neg, days, hour, min, sec, micro) => {
            let total_hours = days * 24 + u32::from(hour);
            if neg {
                // Negative durations have no time-of-day shape.
                return Value::String(format!(
                    "-{:02}:{:02}:{:02}",
                    total_hours, min, sec
                ));
            }
            match chrono::NaiveTime::from_hms_micro_opt(
                total_hours % 24,
                u32::from(min),
                u32::from(sec),
                micro,
            ) {
                Some(time) => Value::Time(time),
                None => Value::Null,
            }
        }
    }
}

fn mysql_row_to_row(row: mysql_async::Row) -> Row {
    let columns: Vec<String> = row
        .columns_ref()
        .iter()
        .map(|c| c.name_str().to_string())
        .collect();
    let values: Vec<Value> = (0..row.len())
        .map(|i| {
            let val: mysql_async::Value = row.as_ref(i).cloned().unwrap_or(mysql_async::Value::NULL);
            mysql_value_to_value(val)
        })
        .collect();
    Row::new(columns, values)
}

/// Driver for MySQL-protocol engines.
#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlDriver;

#[async_trait]
impl Driver for MySqlDriver {
    async fn connect(&self, config: &ConnectionConfig) -> Result<Box<dyn DriverConnection>> {
        if config.iam {
            return Err(Error::configuration(
                "iam authentication is not supported by the mysql adapter",
            ));
        }
        let mut opts = OptsBuilder::default()
            .ip_or_hostname(config.host.clone())
            .tcp_port(config.port)
            .user(Some(config.username.clone()))
            .pass(Some(config.password.clone()))
            .db_name(config.database.clone());
        if config.ssl {
            opts = opts.ssl_opts(SslOpts::default());
        }

        let conn = tokio::time::timeout(config.connect_timeout(), Conn::new(opts))
            .await
            .map_err(|_| {
                Error::timeout(format!(
                    "connect to {}:{} timed out after {}s",
                    config.host, config.port, config.connect_timeout_secs
                ))
            })?
            .map_err(|e| Error::classify(e.to_string(), None))?;

        let connection = MySqlConnection {
            conn: Mutex::new(Some(conn)),
        };
        if config.charset.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            connection
                .run_drop(&format!("SET NAMES {}", config.charset))
                .await?;
        }
        if !config.autocommit {
            connection.run_drop("SET autocommit = 0").await?;
        }
        Ok(Box::new(connection))
    }
}

/// One MySQL-protocol session.
pub struct MySqlConnection {
    conn: Mutex<Option<Conn>>,
}

impl MySqlConnection {
    async fn take_conn(&self) -> Result<Conn> {
        self.conn
            .lock()
            .await
            .take()
            .ok_or_else(|| Error::connection("connection not available"))
    }

    async fn put_conn(&self, conn: Conn) {
        *self.conn.lock().await = Some(conn);
    }

    async fn run_drop(&self, sql: &str) -> Result<()> {
        let mut conn = self.take_conn().await?;
        let result = conn.query_drop(sql).await;
        self.put_conn(conn).await;
        result.map_err(|e| Error::classify(e.to_string(), Some(sql)))
    }
}

#[async_trait]
impl DriverConnection for MySqlConnection {
    async fn query(&self, sql: &str) -> Result<Vec<Row>> {
        let mut conn = self.take_conn().await?;
        let result: std::result::Result<Vec<mysql_async::Row>, _> = conn.query(sql).await;
        self.put_conn(conn).await;
        let rows = result.map_err(|e| Error::classify(e.to_string(), Some(sql)))?;
        Ok(rows.into_iter().map(mysql_row_to_row).collect())
    }

    async fn execute(&self, sql: &str) -> Result<u64> {
        let mut conn = self.take_conn().await?;
        let result = conn.query_drop(sql).await;
        let affected = conn.affected_rows();
        self.put_conn(conn).await;
        result.map_err(|e| Error::classify(e.to_string(), Some(sql)))?;
        Ok(affected)
    }

    async fn begin(&self) -> Result<()> {
        self.run_drop("BEGIN").await
    }

    async fn commit(&self) -> Result<()> {
        self.run_drop("COMMIT").await
    }

    async fn rollback(&self) -> Result<()> {
        self.run_drop("ROLLBACK").await
    }

    async fn query_stream(
        &self,
        sql: &str,
        batch_size: usize,
    ) -> Result<Pin<Box<dyn RowStream>>> {
        // mysql_async result sets borrow the connection, so the stream is
        // served from a materialized buffer.
        let rows = self.query(sql).await?;
        Ok(Box::pin(BufferedRowStream::new(rows, batch_size)))
    }

    async fn close(&self) -> Result<()> {
        let Some(conn) = self.conn.lock().await.take() else {
            return Ok(());
        };
        conn.disconnect()
            .await
            .map_err(|e| Error::classify(e.to_string(), None))
    }
}

macro_rules! mysql_protocol_factory {
    ($factory:ident, $dialect:expr, $name:literal) => {
        /// Registry factory.
        #[derive(Debug, Clone, Copy, Default)]
        pub struct $factory;

        impl ConnectorFactory for $factory {
            fn name(&self) -> &'static str {
                $name
            }

            fn create(&self, config: ConnectionConfig) -> Result<Connector> {
                Connector::new(
                    Box::new($dialect),
                    std::sync::Arc::new(MySqlDriver),
                    config,
                )
            }
        }
    };
}

mysql_protocol_factory!(MySqlFactory, MySqlDialect, "mysql");
mysql_protocol_factory!(DorisFactory, DorisDialect, "doris");
mysql_protocol_factory!(StarRocksFactory, StarRocksDialect, "starrocks");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_scalars() {
        assert_eq!(mysql_value_to_value(mysql_async::Value::NULL), Value::Null);
        assert_eq!(
            mysql_value_to_value(mysql_async::Value::Int(-7)),
            Value::Int64(-7)
        );
        assert_eq!(
            mysql_value_to_value(mysql_async::Value::UInt(u64::MAX)),
            Value::UInt64(u64::MAX)
        );
        assert_eq!(
            mysql_value_to_value(mysql_async::Value::Bytes(b"orders".to_vec())),
            Value::String("orders".into())
        );
    }

    #[test]
    fn converts_date_and_datetime() {
        let date = mysql_value_to_value(mysql_async::Value::Date(2024, 3, 9, 0, 0, 0, 0));
        assert_eq!(
            date,
            Value::Date(chrono::NaiveDate::from_ymd_opt(2024, 3, 9).unwrap())
        );
        let ts = mysql_value_to_value(mysql_async::Value::Date(2024, 3, 9, 12, 30, 5, 0));
        assert!(matches!(ts, Value::DateTime(_)));
        let bad = mysql_value_to_value(mysql_async::Value::Date(2024, 13, 40, 0, 0, 0, 0));
        assert_eq!(bad, Value::Null);
    }

    #[test]
    fn negative_time_becomes_text() {
        let v = mysql_value_to_value(mysql_async::Value::Time(true, 1, 2, 3, 4, 0));
        assert_eq!(v, Value::String("-26:03:04".into()));
    }

    #[tokio::test]
    async fn connect_rejects_iam_config() {
        let mut config = ConnectionConfig::new("db.test", 3306, "app");
        config.iam = true;
        config.cluster_identifier = Some("analytics".into());
        config.region = Some("eu-west-1".into());
        let err = MySqlDriver
            .connect(&config)
            .await
            .expect_err("iam must be rejected before dialing");
        assert_eq!(err.kind(), crate::error::ErrorKind::Configuration);
    }

    #[test]
    fn factories_build_connectors() {
        let config = ConnectionConfig::new("doris.local", 9030, "app");
        let connector = DorisFactory.create(config).unwrap();
        assert_eq!(connector.db_type(), crate::dialect::DbType::Doris);
        assert_eq!(connector.current_catalog(), Some("internal"));
    }
}
