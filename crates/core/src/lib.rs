//! Core types for the contacts loader
//!
//! This crate defines the foundational types shared by the connectors and
//! the engine:
//! - RowKey, Cell, RowMutation, RowSnapshot: the row model of the primary store
//! - CartographyEntry: reference mapping loaded from the relational store
//! - ErrorClass: fixed classification attached to every logged failure
//! - ConnectorError / ConfigError: error hierarchy
//! - Properties / PropertyName: named configuration values

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod types;

pub use config::{
    parse_archival_flag, ArchivalFlag, ConfigFile, Environment, KerberosParams, Properties,
    PropertyName, QueueParams, SqlParams, CONFIG_FILE_NAME, PRODUCTION_ENV_NAME,
};
pub use error::{ConfigError, ConnectorError, ConnectorResult, ErrorClass};
pub use types::{CartographyEntry, Cell, ColumnId, RowKey, RowMutation, RowSnapshot};
