//! Connection configuration.

use std::fmt;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{Error, Result};

fn default_timeout() -> u64 {
    30
}

fn default_charset() -> String {
    "utf8mb4".to_owned()
}

fn default_true() -> bool {
    true
}

/// Connection settings shared by every dialect.
///
/// Unknown keys are rejected at deserialization time; semantic checks live in
/// [`ConnectionConfig::validate`]. The IAM fields only apply to Redshift.
#[derive(Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConnectionConfig {
    /// Server hostname or address.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Login user.
    pub username: String,
    /// Login password.
    #[serde(default)]
    pub password: String,
    /// Initial catalog, for engines with a catalog level.
    #[serde(default)]
    pub catalog: Option<String>,
    /// Initial database.
    #[serde(default)]
    pub database: Option<String>,
    /// Initial schema, for engines with a schema level.
    #[serde(default)]
    pub schema: Option<String>,
    /// Connect timeout in seconds.
    #[serde(default = "default_timeout")]
    pub connect_timeout_secs: u64,
    /// Client charset for MySQL-protocol engines.
    #[serde(default = "default_charset")]
    pub charset: String,
    /// Autocommit outside explicit transactions.
    #[serde(default = "default_true")]
    pub autocommit: bool,
    /// Use TLS where the driver supports it.
    #[serde(default = "default_true")]
    pub ssl: bool,
    /// Use IAM credentials instead of a password (Redshift).
    #[serde(default)]
    pub iam: bool,
    /// Redshift cluster identifier, required with `iam`.
    #[serde(default)]
    pub cluster_identifier: Option<String>,
    /// AWS region, required with `iam`.
    #[serde(default)]
    pub region: Option<String>,
    /// AWS access key id for IAM auth.
    #[serde(default)]
    pub access_key_id: Option<String>,
    /// AWS secret access key for IAM auth.
    #[serde(default)]
    pub secret_access_key: Option<String>,
}

impl ConnectionConfig {
    /// Minimal config; everything else via `with_*` builders.
    pub fn new(host: impl Into<String>, port: u16, username: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port,
            username: username.into(),
            password: String::new(),
            catalog: None,
            database: None,
            schema: None,
            connect_timeout_secs: default_timeout(),
            charset: default_charset(),
            autocommit: true,
            ssl: true,
            iam: false,
            cluster_identifier: None,
            region: None,
            access_key_id: None,
            secret_access_key: None,
        }
    }

    /// Set the password.
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = password.into();
        self
    }

    /// Set the initial catalog.
    pub fn with_catalog(mut self, catalog: impl Into<String>) -> Self {
        self.catalog = Some(catalog.into());
        self
    }

    /// Set the initial database.
    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    /// Set the initial schema.
    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    /// Set the connect timeout in seconds.
    pub fn with_connect_timeout_secs(mut self, secs: u64) -> Self {
        self.connect_timeout_secs = secs;
        self
    }

    /// Enable or disable TLS.
    pub fn with_ssl(mut self, ssl: bool) -> Self {
        self.ssl = ssl;
        self
    }

    /// Connect timeout as a [`Duration`].
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Check semantic constraints serde cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(Error::configuration("host must not be empty"));
        }
        if self.port == 0 {
            return Err(Error::configuration("port must not be zero"));
        }
        if self.username.trim().is_empty() {
            return Err(Error::configuration("username must not be empty"));
        }
        if self.iam && (self.cluster_identifier.is_none() || self.region.is_none()) {
            return Err(Error::configuration(
                "iam auth requires cluster_identifier and region",
            ));
        }
        Ok(())
    }
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"***")
            .field("catalog", &self.catalog)
            .field("database", &self.database)
            .field("schema", &self.schema)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("charset", &self.charset)
            .field("autocommit", &self.autocommit)
            .field("ssl", &self.ssl)
            .field("iam", &self.iam)
            .field("cluster_identifier", &self.cluster_identifier)
            .field("region", &self.region)
            .field(
                "secret_access_key",
                &self.secret_access_key.as_ref().map(|_| "***"),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_keys_rejected() {
        let raw = serde_json::json!({
            "host": "db.local",
            "port": 9030,
            "username": "app",
            "passwrod": "oops"
        });
        let parsed: std::result::Result<ConnectionConfig, _> = serde_json::from_value(raw);
        assert!(parsed.is_err());
    }

    #[test]
    fn defaults_applied() {
        let raw = serde_json::json!({
            "host": "db.local",
            "port": 3306,
            "username": "app"
        });
        let cfg: ConnectionConfig = serde_json::from_value(raw).unwrap();
        assert_eq!(cfg.connect_timeout_secs, 30);
        assert_eq!(cfg.charset, "utf8mb4");
        assert!(cfg.autocommit);
        assert!(cfg.ssl);
        assert!(!cfg.iam);
    }

    #[test]
    fn validate_rejects_empty_host() {
        let cfg = ConnectionConfig::new("  ", 3306, "app");
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_requires_iam_fields() {
        let mut cfg = ConnectionConfig::new("redshift.local", 5439, "app");
        cfg.iam = true;
        assert!(cfg.validate().is_err());
        cfg.cluster_identifier = Some("analytics".into());
        cfg.region = Some("eu-west-1".into());
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn debug_redacts_secrets() {
        let cfg = ConnectionConfig::new("db.local", 3306, "app").with_password("hunter2");
        let rendered = format!("{:?}", cfg);
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("***"));
    }
}
