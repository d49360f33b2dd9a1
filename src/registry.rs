//! Connector registry.
//!
//! Factories are registered explicitly by name; nothing registers itself
//! as a side effect of being linked in. [`register_builtin`] wires up the
//! factories whose driver adapters are compiled in.

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::ConnectionConfig;
use crate::connector::Connector;
use crate::error::{Error, Result};

/// Builds connectors for one dialect.
pub trait ConnectorFactory: Send + Sync {
    /// The dialect name this factory serves.
    fn name(&self) -> &'static str;

    /// Build a connector from an opaque configuration payload.
    fn create(&self, config: ConnectionConfig) -> Result<Connector>;
}

/// Name-keyed factory registry.
#[derive(Default)]
pub struct ConnectorRegistry {
    factories: HashMap<String, Arc<dyn ConnectorFactory>>,
}

impl ConnectorRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory under a name. Replaces any existing entry.
    pub fn register(&mut self, name: &str, factory: Arc<dyn ConnectorFactory>) {
        self.factories.insert(name.to_lowercase(), factory);
    }

    /// Look up a factory.
    pub fn get(&self, name: &str) -> Option<Arc<dyn ConnectorFactory>> {
        self.factories.get(&name.to_lowercase()).cloned()
    }

    /// Build a connector from a JSON configuration payload. Unknown
    /// config keys are rejected here, before anything connects.
    pub fn create(&self, name: &str, config: serde_json::Value) -> Result<Connector> {
        let factory = self
            .get(name)
            .ok_or_else(|| Error::not_found(format!("no connector registered for: {name}")))?;
        let config: ConnectionConfig = serde_json::from_value(config)
            .map_err(|e| Error::configuration(format!("invalid config for {name}: {e}")))?;
        factory.create(config)
    }

    /// Registered names, sorted.
    pub fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self.factories.keys().cloned().collect();
        names.sort();
        names
    }

    /// Whether a name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(&name.to_lowercase())
    }

    /// Number of registered factories.
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// True when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

/// Register every factory whose driver adapter is compiled in.
pub fn register_builtin(registry: &mut ConnectorRegistry) {
    #[cfg(feature = "mysql")]
    {
        registry.register("mysql", Arc::new(crate::mysql::MySqlFactory));
        registry.register("doris", Arc::new(crate::mysql::DorisFactory));
        registry.register("starrocks", Arc::new(crate::mysql::StarRocksFactory));
    }
    #[cfg(feature = "postgres")]
    {
        registry.register("redshift", Arc::new(crate::postgres::RedshiftFactory));
    }
    #[cfg(not(any(feature = "mysql", feature = "postgres")))]
    {
        let _ = registry;
    }
}
