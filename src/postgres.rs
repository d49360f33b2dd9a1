//! Postgres wire-protocol driver adapter. Serves Redshift.

use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio_postgres::types::Type;
use tracing::debug;

use crate::config::ConnectionConfig;
use crate::connector::Connector;
use crate::dialect::RedshiftDialect;
use crate::driver::{BufferedRowStream, Driver, DriverConnection, RowStream};
use crate::error::{Error, Result};
use crate::registry::ConnectorFactory;
use crate::types::{Row, Value};

fn pg_value_to_value(row: &tokio_postgres::Row, idx: usize) -> Value {
    let pg_type = row.columns()[idx].type_();
    match *pg_type {
        Type::BOOL => row
            .try_get::<_, Option<bool>>(idx)
            .ok()
            .flatten()
            .map(Value::Bool)
            .unwrap_or(Value::Null),
        Type::INT2 => row
            .try_get::<_, Option<i16>>(idx)
            .ok()
            .flatten()
            .map(Value::Int16)
            .unwrap_or(Value::Null),
        Type::INT4 => row
            .try_get::<_, Option<i32>>(idx)
            .ok()
            .flatten()
            .map(Value::Int32)
            .unwrap_or(Value::Null),
        Type::INT8 => row
            .try_get::<_, Option<i64>>(idx)
            .ok()
            .flatten()
            .map(Value::Int64)
            .unwrap_or(Value::Null),
        Type::FLOAT4 => row
            .try_get::<_, Option<f32>>(idx)
            .ok()
            .flatten()
            .map(Value::Float32)
            .unwrap_or(Value::Null),
        Type::FLOAT8 => row
            .try_get::<_, Option<f64>>(idx)
            .ok()
            .flatten()
            .map(Value::Float64)
            .unwrap_or(Value::Null),
        Type::NUMERIC => row
            .try_get::<_, Option<rust_decimal::Decimal>>(idx)
            .ok()
            .flatten()
            .map(Value::Decimal)
            .unwrap_or(Value::Null),
        Type::BYTEA => row
            .try_get::<_, Option<Vec<u8>>>(idx)
            .ok()
            .flatten()
            .map(Value::Bytes)
            .unwrap_or(Value::Null),
        Type::DATE => row
            .try_get::<_, Option<chrono::NaiveDate>>(idx)
            .ok()
            .flatten()
            .map(Value::Date)
            .unwrap_or(Value::Null),
        Type::TIME => row
            .try_get::<_, Option<chrono::NaiveTime>>(idx)
            .ok()
            .flatten()
            .map(Value::Time)
            .unwrap_or(Value::Null),
        Type::TIMESTAMP => row
            .try_get::<_, Option<chrono::NaiveDateTime>>(idx)
            .ok()
            .flatten()
            .map(Value::DateTime)
            .unwrap_or(Value::Null),
        Type::TIMESTAMPTZ => row
            .try_get::<_, Option<chrono::DateTime<chrono::Utc>>>(idx)
            .ok()
            .flatten()
            .map(|dt| Value::DateTimeTz(dt.fixed_offset()))
            .unwrap_or(Value::Null),
        Type::UUID => row
            .try_get::<_, Option<uuid::Uuid>>(idx)
            .ok()
            .flatten()
            .map(Value::Uuid)
            .unwrap_or(Value::Null),
        Type::JSON | Type::JSONB => row
            .try_get::<_, Option<serde_json::Value>>(idx)
            .ok()
            .flatten()
            .map(Value::Json)
            .unwrap_or(Value::Null),
        _ => row
            .try_get::<_, Option<String>>(idx)
            .ok()
            .flatten()
            .map(Value::String)
            .unwrap_or(Value::Null),
    }
}

fn pg_row_to_row(row: &tokio_postgres::Row) -> Row {
    let columns: Vec<String> = row.columns().iter().map(|c| c.name().to_owned()).collect();
    let values: Vec<Value> = (0..row.len()).map(|i| pg_value_to_value(row, i)).collect();
    Row::new(columns, values)
}

/// Driver for Postgres-protocol engines.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresDriver;

#[async_trait]
impl Driver for PostgresDriver {
    async fn connect(&self, config: &ConnectionConfig) -> Result<Box<dyn DriverConnection>> {
        if config.iam {
            return Err(Error::configuration(
                "iam authentication is not supported by the postgres adapter; \
                 supply a password instead",
            ));
        }
        if config.ssl {
            return Err(Error::unsupported(
                "the postgres adapter connects without tls; set ssl to false \
                 or supply a tls-capable driver via Connector::with_driver",
            ));
        }
        if !config.autocommit {
            return Err(Error::configuration(
                "postgres has no session autocommit toggle; use explicit \
                 transactions instead",
            ));
        }

        let mut pg_config = tokio_postgres::Config::new();
        pg_config
            .host(&config.host)
            .port(config.port)
            .user(&config.username)
            .password(&config.password)
            .connect_timeout(config.connect_timeout());
        // Redshift sessions land in "dev" when no database is configured.
        pg_config.dbname(config.database.as_deref().unwrap_or("dev"));

        let (client, connection) = pg_config
            .connect(tokio_postgres::NoTls)
            .await
            .map_err(|e| Error::classify(e.to_string(), None))?;

        tokio::spawn(async move {
            if let Err(e) = connection.await {
                debug!(error = %e, "postgres connection task ended");
            }
        });

        Ok(Box::new(PgConnection {
            client: Arc::new(client),
            closed: AtomicBool::new(false),
        }))
    }
}

/// One Postgres-protocol session.
pub struct PgConnection {
    client: Arc<tokio_postgres::Client>,
    closed: AtomicBool,
}

impl PgConnection {
    fn ensure_open(&self) -> Result<()> {
        if self.closed.load(Ordering::Relaxed) {
            return Err(Error::connection("connection is closed"));
        }
        Ok(())
    }
}

#[async_trait]
impl DriverConnection for PgConnection {
    async fn query(&self, sql: &str) -> Result<Vec<Row>> {
        self.ensure_open()?;
        let rows = self
            .client
            .query(sql, &[])
            .await
            .map_err(|e| Error::classify(e.to_string(), Some(sql)))?;
        Ok(rows.iter().map(pg_row_to_row).collect())
    }

    async fn execute(&self, sql: &str) -> Result<u64> {
        self.ensure_open()?;
        self.client
            .execute(sql, &[])
            .await
            .map_err(|e| Error::classify(e.to_string(), Some(sql)))
    }

    async fn begin(&self) -> Result<()> {
        self.ensure_open()?;
        self.client
            .batch_execute("BEGIN")
            .await
            .map_err(|e| Error::classify(e.to_string(), None))
    }

    async fn commit(&self) -> Result<()> {
        self.ensure_open()?;
        self.client
            .batch_execute("COMMIT")
            .await
            .map_err(|e| Error::classify(e.to_string(), None))
    }

    async fn rollback(&self) -> Result<()> {
        self.ensure_open()?;
        self.client
            .batch_execute("ROLLBACK")
            .await
            .map_err(|e| Error::classify(e.to_string(), None))
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
        // The wire connection tears down when the client drops with the
        // owning connector; from here on the handle just refuses work.
        self.closed.store(true, Ordering::Relaxed);
        Ok(())
    }
}

/// Registry factory.
#[derive(Debug, Clone, Copy, Default)]
pub struct RedshiftFactory;

impl ConnectorFactory for RedshiftFactory {
    fn name(&self) -> &'static str {
        "redshift"
    }

    fn create(&self, config: ConnectionConfig) -> Result<Connector> {
        Connector::new(Box::new(RedshiftDialect), Arc::new(PostgresDriver), config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[tokio::test]
    async fn connect_rejects_iam_config() {
        let mut config = ConnectionConfig::new("redshift.local", 5439, "app");
        config.iam = true;
        config.cluster_identifier = Some("analytics".into());
        config.region = Some("eu-west-1".into());
        let err = PostgresDriver
            .connect(&config)
            .await
            .expect_err("iam must be rejected before dialing");
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[tokio::test]
    async fn connect_refuses_tls_it_cannot_provide() {
        // ssl defaults to true; connecting anyway would silently downgrade.
        let config = ConnectionConfig::new("redshift.local", 5439, "app");
        let err = PostgresDriver
            .connect(&config)
            .await
            .expect_err("ssl must be rejected, not downgraded");
        assert_eq!(err.kind(), ErrorKind::Unsupported);
    }

    #[tokio::test]
    async fn connect_rejects_autocommit_off() {
        let mut config = ConnectionConfig::new("redshift.local", 5439, "app").with_ssl(false);
        config.autocommit = false;
        let err = PostgresDriver
            .connect(&config)
            .await
            .expect_err("autocommit off has no postgres equivalent");
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn factory_builds_redshift_connector() {
        let config = ConnectionConfig::new("redshift.local", 5439, "app");
        let connector = RedshiftFactory.create(config).unwrap();
        assert_eq!(connector.db_type(), crate::dialect::DbType::Redshift);
        assert_eq!(connector.current_schema(), Some("public"));
    }
}
