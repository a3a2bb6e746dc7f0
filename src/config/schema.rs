//! Configuration schema definitions.
//!
//! This module defines the configuration structure of the observer binary.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration of the observer.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObserverConfig {
    /// Service name reported with every span.
    pub service_name: String,

    /// Enabled tracer backends, in chain order.
    pub options: Vec<OptionName>,

    /// Distributed tracing settings.
    pub tracing: TracingConfig,

    /// Metrics endpoint settings.
    pub metrics: MetricsConfig,

    /// Logging settings.
    pub logging: LoggingConfig,
}

impl Default for ObserverConfig {
    fn default() -> Self {
        Self {
            service_name: "graphql".to_string(),
            options: vec![OptionName::Tracing, OptionName::Logging, OptionName::Analytics],
            tracing: TracingConfig::default(),
            metrics: MetricsConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Tracer backend selectable from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionName {
    /// Distributed tracing spans.
    Tracing,
    /// Resolver error logging with trace id.
    Logging,
    /// Query and field analytics.
    Analytics,
}

/// Distributed tracing configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TracingConfig {
    /// Report finished spans. Trace ids are generated either way.
    pub report_spans: bool,

    /// Generate 128-bit trace ids instead of 64-bit ones.
    pub trace_id_128bit: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            report_spans: true,
            trace_id_128bit: false,
        }
    }
}

/// Metrics endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Serve the metrics endpoint.
    pub enabled: bool,

    /// Bind address of the metrics endpoint (e.g., "0.0.0.0:9090").
    pub address: String,

    /// Path of the metrics endpoint.
    pub path: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            address: "0.0.0.0:9090".to_string(),
            path: "/metrics".to_string(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter, overridden by `RUST_LOG`.
    pub level: String,

    /// Destination of resolver error lines.
    pub output: LogOutput,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            output: LogOutput::default(),
        }
    }
}

/// Where resolver error lines are written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    /// `tracing` events on the error target.
    #[default]
    Tracing,
    /// Plain lines on stderr.
    Stderr,
}
