//! Context builder

use super::{ApplicationContext, CONTEXT_COMPONENT, GLOBAL_PROCESS};
use crate::appenders::AppendRegistry;
use crate::buffer::WriteBuffer;
use crate::config::ConfigProvider;
use crate::connectors::ConnectorCache;
use crate::flush::FlushController;
use crate::logging::{LogDestination, LogSink, LoggerRegistry};
use bhc_connectors::ConnectorFactory;
use bhc_core::{Environment, Properties, PropertyName};
use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

/// Builder for [`ApplicationContext`]
///
/// ```ignore
/// let ctx = ContextBuilder::new(factory)
///     .properties(Properties::from_file(path)?)
///     .build();
/// ```
pub struct ContextBuilder {
    factory: Arc<dyn ConnectorFactory>,
    properties: Properties,
    sink: Option<Arc<dyn LogSink>>,
}

impl ContextBuilder {
    /// Builder with empty properties
    pub fn new(factory: Arc<dyn ConnectorFactory>) -> Self {
        Self {
            factory,
            properties: Properties::new(),
            sink: None,
        }
    }

    /// Configuration values
    pub fn properties(mut self, properties: Properties) -> Self {
        self.properties = properties;
        self
    }

    /// Report the context's own failures to `sink` instead of its logger
    pub fn sink(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Build the context; nothing is connected until first use
    pub fn build(self) -> Arc<ApplicationContext> {
        let destination =
            LogDestination::from_property(self.properties.get(PropertyName::ApplicationLogs));
        let loggers = LoggerRegistry::new(destination);
        let log: Arc<dyn LogSink> = match self.sink {
            Some(sink) => sink,
            None => loggers.get(CONTEXT_COMPONENT, GLOBAL_PROCESS) as Arc<dyn LogSink>,
        };

        let environment = Environment::from_properties(&self.properties);
        let config = Arc::new(ConfigProvider::new(self.properties, Arc::clone(&log)));
        let connectors =
            ConnectorCache::new(self.factory, Arc::clone(&config), Arc::clone(&log));
        let appenders = AppendRegistry::new(Arc::clone(&log));
        let flusher = FlushController::new(Arc::clone(&config), Arc::clone(&log));

        info!(
            target: "bhc::context",
            environment = environment.name(),
            destination = ?destination,
            "context created"
        );

        Arc::new(ApplicationContext {
            config,
            environment,
            loggers,
            log,
            connectors,
            buffer: Mutex::new(WriteBuffer::new()),
            appenders,
            flusher,
            cartography: OnceCell::new(),
            closed: AtomicBool::new(false),
        })
    }
}
