//! Configuration provider
//!
//! Wraps [`Properties`] so that every failed lookup is logged under
//! [`ErrorClass::Config`] before the caller sees `None` or an error.

use crate::logging::LogSink;
use bhc_core::{
    ConfigError, ErrorClass, KerberosParams, Properties, PropertyName, QueueParams, SqlParams,
};
use std::sync::Arc;

/// Logged access to named configuration values
pub struct ConfigProvider {
    properties: Properties,
    log: Arc<dyn LogSink>,
}

impl ConfigProvider {
    /// Provider over loaded properties
    pub fn new(properties: Properties, log: Arc<dyn LogSink>) -> Self {
        Self { properties, log }
    }

    /// Raw properties, without logging
    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    /// Look up a property; a missing one is logged and returned as `None`
    pub fn get(&self, name: PropertyName) -> Option<&str> {
        let value = self.properties.get(name);
        if value.is_none() {
            self.log.error(
                ErrorClass::Config,
                &format!("Property {} is not defined in the properties file", name),
            );
        }
        value
    }

    /// Look up a property that must be defined; a missing one is logged
    pub fn require(&self, name: PropertyName) -> Result<&str, ConfigError> {
        self.get(name).ok_or(ConfigError::Missing(name))
    }

    /// Whether archival is enabled; missing or invalid flags are logged and read as `false`
    pub fn archival_enabled(&self) -> bool {
        match self.properties.archival_enabled() {
            Ok(enabled) => enabled,
            Err(e) => {
                self.log.error(ErrorClass::Config, &e.to_string());
                false
            }
        }
    }

    /// Store/filesystem credentials, logging each missing value
    pub fn kerberos_params(&self) -> KerberosParams {
        self.touch(&[PropertyName::KerberosUser, PropertyName::KerberosKeytab]);
        self.properties.kerberos_params()
    }

    /// Relational parameters for `database`, logging each missing value
    pub fn sql_params(&self, database: PropertyName) -> SqlParams {
        self.touch(&[
            PropertyName::SqlServerHost,
            PropertyName::SqlServerInstance,
            PropertyName::SqlServerUser,
            PropertyName::SqlServerPassword,
            database,
        ]);
        self.properties.sql_params(database)
    }

    /// Queue parameters, logging each missing value
    pub fn queue_params(&self, client_id: impl Into<String>) -> QueueParams {
        self.touch(&[
            PropertyName::KafkaZookeeperQuorum,
            PropertyName::KafkaBrokersList,
        ]);
        self.properties.queue_params(client_id)
    }

    fn touch(&self, names: &[PropertyName]) {
        for name in names {
            self.get(*name);
        }
    }
}
