//! Loader configuration via `bhc.toml`
//!
//! The configuration file is a TOML document with one table per backend,
//! decoded into [`ConfigFile`]. Values are looked up by dotted property
//! name, so
//!
//! ```toml
//! [hbase]
//! contacts_table = "contacts"
//! ```
//!
//! is looked up as `hbase.contacts_table`. The set of names the loader reads
//! is fixed and enumerated by [`PropertyName`].

use crate::error::ConfigError;
use serde::Deserialize;
use std::fmt;
use std::path::Path;

/// Config file name used when none is given explicitly.
pub const CONFIG_FILE_NAME: &str = "bhc.toml";

/// Environment name that routes acquittals through the override connection.
pub const PRODUCTION_ENV_NAME: &str = "Prod";

// ============================================================================
// Property Names
// ============================================================================

/// Every property the loader reads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PropertyName {
    /// Log destination: `"console"` or anything else for the durable log
    ApplicationLogs,
    /// Archival enabled flag (`true`/`false` or integer)
    ApplicationArchival,
    /// Deployment environment name
    ApplicationEnvName,
    /// Kerberos principal for the store and filesystem
    KerberosUser,
    /// Kerberos keytab path
    KerberosKeytab,
    /// Primary contacts table
    HbaseContactsTable,
    /// Staging (temporary) contacts table
    HbaseContactsTempTable,
    /// Queue zookeeper quorum
    KafkaZookeeperQuorum,
    /// Queue broker list
    KafkaBrokersList,
    /// Relational store host
    SqlServerHost,
    /// Relational store instance
    SqlServerInstance,
    /// Relational store user
    SqlServerUser,
    /// Relational store password
    SqlServerPassword,
    /// Database holding the cartography procedure
    SqlServerCartographyDb,
    /// Stored procedure returning cartography rows
    SqlServerCartographyProcedure,
    /// Reporting database
    SqlServerReportingDb,
    /// Acquittal table inside the reporting database
    SqlServerAcquittalTable,
    /// Production acquittal override: host
    AcquittalOverrideHost,
    /// Production acquittal override: instance
    AcquittalOverrideInstance,
    /// Production acquittal override: user
    AcquittalOverrideUser,
    /// Production acquittal override: password
    AcquittalOverridePassword,
    /// Production acquittal override: database
    AcquittalOverrideDatabase,
}

impl PropertyName {
    /// All property names, in declaration order
    pub const ALL: [PropertyName; 22] = [
        PropertyName::ApplicationLogs,
        PropertyName::ApplicationArchival,
        PropertyName::ApplicationEnvName,
        PropertyName::KerberosUser,
        PropertyName::KerberosKeytab,
        PropertyName::HbaseContactsTable,
        PropertyName::HbaseContactsTempTable,
        PropertyName::KafkaZookeeperQuorum,
        PropertyName::KafkaBrokersList,
        PropertyName::SqlServerHost,
        PropertyName::SqlServerInstance,
        PropertyName::SqlServerUser,
        PropertyName::SqlServerPassword,
        PropertyName::SqlServerCartographyDb,
        PropertyName::SqlServerCartographyProcedure,
        PropertyName::SqlServerReportingDb,
        PropertyName::SqlServerAcquittalTable,
        PropertyName::AcquittalOverrideHost,
        PropertyName::AcquittalOverrideInstance,
        PropertyName::AcquittalOverrideUser,
        PropertyName::AcquittalOverridePassword,
        PropertyName::AcquittalOverrideDatabase,
    ];

    /// Dotted `section.key` name in the configuration file
    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyName::ApplicationLogs => "application.logs",
            PropertyName::ApplicationArchival => "application.archival",
            PropertyName::ApplicationEnvName => "application.env_name",
            PropertyName::KerberosUser => "kerberos.user",
            PropertyName::KerberosKeytab => "kerberos.keytab",
            PropertyName::HbaseContactsTable => "hbase.contacts_table",
            PropertyName::HbaseContactsTempTable => "hbase.contacts_temp_table",
            PropertyName::KafkaZookeeperQuorum => "kafka.zookeeper_quorum",
            PropertyName::KafkaBrokersList => "kafka.brokers_list",
            PropertyName::SqlServerHost => "sqlserver.host",
            PropertyName::SqlServerInstance => "sqlserver.instance",
            PropertyName::SqlServerUser => "sqlserver.user",
            PropertyName::SqlServerPassword => "sqlserver.password",
            PropertyName::SqlServerCartographyDb => "sqlserver.cartography_db",
            PropertyName::SqlServerCartographyProcedure => "sqlserver.cartography_procedure",
            PropertyName::SqlServerReportingDb => "sqlserver.reporting_db",
            PropertyName::SqlServerAcquittalTable => "sqlserver.acquittal_table",
            PropertyName::AcquittalOverrideHost => "acquittal_override.host",
            PropertyName::AcquittalOverrideInstance => "acquittal_override.instance",
            PropertyName::AcquittalOverrideUser => "acquittal_override.user",
            PropertyName::AcquittalOverridePassword => "acquittal_override.password",
            PropertyName::AcquittalOverrideDatabase => "acquittal_override.database",
        }
    }

    /// Look up a property by its dotted key
    pub fn from_key(key: &str) -> Option<PropertyName> {
        PropertyName::ALL.iter().copied().find(|p| p.as_str() == key)
    }
}

impl fmt::Display for PropertyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Connection Parameters
// ============================================================================

/// Credentials shared by the store and filesystem connectors
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KerberosParams {
    /// Principal
    pub user: Option<String>,
    /// Keytab path
    pub keytab: Option<String>,
}

/// Relational store connection parameters
///
/// Absent values propagate as `None`; the connector decides whether it can
/// connect without them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SqlParams {
    /// Host name or address
    pub host: Option<String>,
    /// Server instance
    pub instance: Option<String>,
    /// Login
    pub user: Option<String>,
    /// Password
    pub password: Option<String>,
    /// Target database
    pub database: Option<String>,
}

/// Queue connection parameters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueueParams {
    /// Zookeeper quorum
    pub zookeeper_quorum: Option<String>,
    /// Broker list
    pub brokers: Option<String>,
    /// Client identifier, unique per process
    pub client_id: String,
}

// ============================================================================
// Environment
// ============================================================================

/// Deployment environment
///
/// Production carries explicit override parameters for the acquittal
/// connection; every other environment reuses the cached reporting handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    /// Production: acquittals open a fresh connection with these parameters
    Production {
        /// Parameters of the bypass connection
        acquittal_override: SqlParams,
    },
    /// Any other environment (empty when the property is absent)
    Other(String),
}

impl Environment {
    /// Resolve the environment from configuration
    pub fn from_properties(properties: &Properties) -> Self {
        match properties.get(PropertyName::ApplicationEnvName) {
            Some(PRODUCTION_ENV_NAME) => Environment::Production {
                acquittal_override: properties.acquittal_override_params(),
            },
            Some(other) => Environment::Other(other.to_string()),
            None => Environment::Other(String::new()),
        }
    }

    /// Environment name as configured
    pub fn name(&self) -> &str {
        match self {
            Environment::Production { .. } => PRODUCTION_ENV_NAME,
            Environment::Other(name) => name,
        }
    }

    /// Whether acquittals bypass the cached reporting handle
    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production { .. })
    }
}

/// Interpret a textual archival flag.
///
/// Accepts `true`/`false` (any case) or an integer, where a value greater
/// than zero enables archival.
pub fn parse_archival_flag(value: &str) -> Option<bool> {
    let trimmed = value.trim();
    if trimmed.eq_ignore_ascii_case("true") {
        return Some(true);
    }
    if trimmed.eq_ignore_ascii_case("false") {
        return Some(false);
    }
    trimmed.parse::<i64>().ok().map(|n| n > 0)
}

// ============================================================================
// Config File Sections
// ============================================================================

/// Archival flag as written in the file
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ArchivalFlag {
    /// `archival = true`
    Bool(bool),
    /// `archival = 1`; greater than zero enables
    Int(i64),
    /// `archival = "1"`, interpreted by [`parse_archival_flag`]
    Text(String),
}

impl ArchivalFlag {
    /// Whether the flag enables archival; `None` when text is not interpretable
    pub fn enabled(&self) -> Option<bool> {
        match self {
            ArchivalFlag::Bool(b) => Some(*b),
            ArchivalFlag::Int(n) => Some(*n > 0),
            ArchivalFlag::Text(s) => parse_archival_flag(s),
        }
    }
}

impl fmt::Display for ArchivalFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArchivalFlag::Bool(b) => write!(f, "{}", b),
            ArchivalFlag::Int(n) => write!(f, "{}", n),
            ArchivalFlag::Text(s) => f.write_str(s),
        }
    }
}

/// `[application]`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Application {
    /// Log destination
    pub logs: Option<String>,
    /// Close file appenders at shutdown
    pub archival: Option<ArchivalFlag>,
    /// Deployment environment
    pub env_name: Option<String>,
}

/// `[kerberos]`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Kerberos {
    /// Principal
    pub user: Option<String>,
    /// Keytab path
    pub keytab: Option<String>,
}

/// `[hbase]`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Hbase {
    /// Primary contacts table
    pub contacts_table: Option<String>,
    /// Staging contacts table
    pub contacts_temp_table: Option<String>,
}

/// `[kafka]`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Kafka {
    /// Zookeeper quorum
    pub zookeeper_quorum: Option<String>,
    /// Broker list
    pub brokers_list: Option<String>,
}

/// `[sqlserver]`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SqlServer {
    /// Host name or address
    pub host: Option<String>,
    /// Server instance
    pub instance: Option<String>,
    /// Login
    pub user: Option<String>,
    /// Password
    pub password: Option<String>,
    /// Database holding the cartography procedure
    pub cartography_db: Option<String>,
    /// Cartography stored procedure
    pub cartography_procedure: Option<String>,
    /// Reporting database
    pub reporting_db: Option<String>,
    /// Acquittal table
    pub acquittal_table: Option<String>,
}

/// `[acquittal_override]`, read in production only
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AcquittalOverride {
    /// Host name or address
    pub host: Option<String>,
    /// Server instance
    pub instance: Option<String>,
    /// Login
    pub user: Option<String>,
    /// Password
    pub password: Option<String>,
    /// Target database
    pub database: Option<String>,
}

/// Decoded `bhc.toml`; tables the loader does not read are ignored
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    /// `[application]`
    pub application: Application,
    /// `[kerberos]`
    pub kerberos: Kerberos,
    /// `[hbase]`
    pub hbase: Hbase,
    /// `[kafka]`
    pub kafka: Kafka,
    /// `[sqlserver]`
    pub sqlserver: SqlServer,
    /// `[acquittal_override]`
    pub acquittal_override: AcquittalOverride,
}

// ============================================================================
// Properties
// ============================================================================

/// Named configuration values loaded from `bhc.toml`
///
/// A lookup view over [`ConfigFile`] keyed by [`PropertyName`].
///
/// # Example
///
/// ```toml
/// [application]
/// logs = "console"
/// archival = true
/// env_name = "Rec"
///
/// [hbase]
/// contacts_table = "contacts"
/// contacts_temp_table = "contacts_tmp"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Properties {
    file: ConfigFile,
    // Textual form of `file.application.archival`, for `get`
    archival_text: Option<String>,
}

impl From<ConfigFile> for Properties {
    fn from(file: ConfigFile) -> Self {
        let archival_text = file.application.archival.as_ref().map(|f| f.to_string());
        Self {
            file,
            archival_text,
        }
    }
}

impl Properties {
    /// Empty configuration: every lookup is absent
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse configuration from TOML text
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid TOML or a known key has
    /// the wrong type.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(content)?;
        Ok(Self::from(file))
    }

    /// Read and parse configuration from a file path
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_toml_str(&content)
    }

    /// Decoded sections
    pub fn file(&self) -> &ConfigFile {
        &self.file
    }

    /// Set a value, replacing any previous one
    pub fn set(&mut self, name: PropertyName, value: impl Into<String>) {
        let value = value.into();
        if let Some(slot) = self.field_mut(name) {
            *slot = Some(value);
            return;
        }
        self.file.application.archival = Some(ArchivalFlag::Text(value.clone()));
        self.archival_text = Some(value);
    }

    /// Builder-style [`Properties::set`]
    pub fn with(mut self, name: PropertyName, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    /// Look up a property; `None` when it is not defined
    pub fn get(&self, name: PropertyName) -> Option<&str> {
        match self.field(name) {
            Some(slot) => slot.as_deref(),
            None => self.archival_text.as_deref(),
        }
    }

    /// Look up a property that must be defined
    pub fn require(&self, name: PropertyName) -> Result<&str, ConfigError> {
        self.get(name).ok_or(ConfigError::Missing(name))
    }

    /// Number of defined properties
    pub fn len(&self) -> usize {
        PropertyName::ALL
            .iter()
            .filter(|name| self.get(**name).is_some())
            .count()
    }

    /// Whether no property is defined
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether archival is enabled
    ///
    /// # Errors
    ///
    /// Returns an error if the flag is missing or not interpretable.
    pub fn archival_enabled(&self) -> Result<bool, ConfigError> {
        let name = PropertyName::ApplicationArchival;
        let flag = self
            .file
            .application
            .archival
            .as_ref()
            .ok_or(ConfigError::Missing(name))?;
        flag.enabled().ok_or_else(|| ConfigError::Invalid {
            name,
            value: flag.to_string(),
        })
    }

    /// Credentials for the store and filesystem connectors
    pub fn kerberos_params(&self) -> KerberosParams {
        let kerberos = &self.file.kerberos;
        KerberosParams {
            user: kerberos.user.clone(),
            keytab: kerberos.keytab.clone(),
        }
    }

    /// Relational parameters targeting the database named by `database`
    pub fn sql_params(&self, database: PropertyName) -> SqlParams {
        let sql = &self.file.sqlserver;
        SqlParams {
            host: sql.host.clone(),
            instance: sql.instance.clone(),
            user: sql.user.clone(),
            password: sql.password.clone(),
            database: self.get(database).map(str::to_string),
        }
    }

    /// Parameters of the production acquittal bypass connection
    pub fn acquittal_override_params(&self) -> SqlParams {
        let o = &self.file.acquittal_override;
        SqlParams {
            host: o.host.clone(),
            instance: o.instance.clone(),
            user: o.user.clone(),
            password: o.password.clone(),
            database: o.database.clone(),
        }
    }

    /// Queue parameters with the given client id
    pub fn queue_params(&self, client_id: impl Into<String>) -> QueueParams {
        QueueParams {
            zookeeper_quorum: self.file.kafka.zookeeper_quorum.clone(),
            brokers: self.file.kafka.brokers_list.clone(),
            client_id: client_id.into(),
        }
    }

    // `None` only for the archival flag, which is not a plain string
    fn field(&self, name: PropertyName) -> Option<&Option<String>> {
        let f = &self.file;
        let slot = match name {
            PropertyName::ApplicationLogs => &f.application.logs,
            PropertyName::ApplicationArchival => return None,
            PropertyName::ApplicationEnvName => &f.application.env_name,
            PropertyName::KerberosUser => &f.kerberos.user,
            PropertyName::KerberosKeytab => &f.kerberos.keytab,
            PropertyName::HbaseContactsTable => &f.hbase.contacts_table,
            PropertyName::HbaseContactsTempTable => &f.hbase.contacts_temp_table,
            PropertyName::KafkaZookeeperQuorum => &f.kafka.zookeeper_quorum,
            PropertyName::KafkaBrokersList => &f.kafka.brokers_list,
            PropertyName::SqlServerHost => &f.sqlserver.host,
            PropertyName::SqlServerInstance => &f.sqlserver.instance,
            PropertyName::SqlServerUser => &f.sqlserver.user,
            PropertyName::SqlServerPassword => &f.sqlserver.password,
            PropertyName::SqlServerCartographyDb => &f.sqlserver.cartography_db,
            PropertyName::SqlServerCartographyProcedure => &f.sqlserver.cartography_procedure,
            PropertyName::SqlServerReportingDb => &f.sqlserver.reporting_db,
            PropertyName::SqlServerAcquittalTable => &f.sqlserver.acquittal_table,
            PropertyName::AcquittalOverrideHost => &f.acquittal_override.host,
            PropertyName::AcquittalOverrideInstance => &f.acquittal_override.instance,
            PropertyName::AcquittalOverrideUser => &f.acquittal_override.user,
            PropertyName::AcquittalOverridePassword => &f.acquittal_override.password,
            PropertyName::AcquittalOverrideDatabase => &f.acquittal_override.database,
        };
        Some(slot)
    }

    fn field_mut(&mut self, name: PropertyName) -> Option<&mut Option<String>> {
        let f = &mut self.file;
        let slot = match name {
            PropertyName::ApplicationLogs => &mut f.application.logs,
            PropertyName::ApplicationArchival => return None,
            PropertyName::ApplicationEnvName => &mut f.application.env_name,
            PropertyName::KerberosUser => &mut f.kerberos.user,
            PropertyName::KerberosKeytab => &mut f.kerberos.keytab,
            PropertyName::HbaseContactsTable => &mut f.hbase.contacts_table,
            PropertyName::HbaseContactsTempTable => &mut f.hbase.contacts_temp_table,
            PropertyName::KafkaZookeeperQuorum => &mut f.kafka.zookeeper_quorum,
            PropertyName::KafkaBrokersList => &mut f.kafka.brokers_list,
            PropertyName::SqlServerHost => &mut f.sqlserver.host,
            PropertyName::SqlServerInstance => &mut f.sqlserver.instance,
            PropertyName::SqlServerUser => &mut f.sqlserver.user,
            PropertyName::SqlServerPassword => &mut f.sqlserver.password,
            PropertyName::SqlServerCartographyDb => &mut f.sqlserver.cartography_db,
            PropertyName::SqlServerCartographyProcedure => {
                &mut f.sqlserver.cartography_procedure
            }
            PropertyName::SqlServerReportingDb => &mut f.sqlserver.reporting_db,
            PropertyName::SqlServerAcquittalTable => &mut f.sqlserver.acquittal_table,
            PropertyName::AcquittalOverrideHost => &mut f.acquittal_override.host,
            PropertyName::AcquittalOverrideInstance => &mut f.acquittal_override.instance,
            PropertyName::AcquittalOverrideUser => &mut f.acquittal_override.user,
            PropertyName::AcquittalOverridePassword => &mut f.acquittal_override.password,
            PropertyName::AcquittalOverrideDatabase => &mut f.acquittal_override.database,
        };
        Some(slot)
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# Contacts loader configuration

[application]
# "console" logs to the console, anything else to the durable log
logs = "console"
# Close (rotate) file appenders at shutdown: true/false or an integer > 0
archival = false
# Deployment environment; "Prod" routes acquittals through [acquittal_override]
env_name = "Dev"

[kerberos]
user = "loader"
keytab = "/etc/security/keytabs/loader.keytab"

[hbase]
contacts_table = "contacts"
contacts_temp_table = "contacts_tmp"

[kafka]
zookeeper_quorum = "localhost:2181"
brokers_list = "localhost:9092"

[sqlserver]
host = "localhost"
instance = "MSSQLSERVER"
user = "loader"
password = ""
cartography_db = "cartography"
cartography_procedure = "ps_cartography"
reporting_db = "reporting"
acquittal_table = "ACQUITTEMENT"

# Only read when env_name = "Prod"
# [acquittal_override]
# host = ""
# instance = ""
# user = ""
# password = ""
# database = ""
"#
    }
}
