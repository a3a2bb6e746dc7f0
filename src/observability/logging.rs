//! Structured logging and resolver error logging.
//!
//! # Responsibilities
//! - Initialize the `tracing` subscriber for the process
//! - Log resolver errors of one query, aggregated by message, with the trace id
//!
//! # Design Decisions
//! - One line per distinct message with its count, so a failure repeated across
//!   many fields does not flood the log
//! - Lines appear in order of the message's first occurrence
//! - Trace segment omitted when the context has no trace id
//! - Output goes through `tracing` by default, or to a plain writer (stderr)

use std::collections::HashMap;
use std::fmt;
use std::io::Write;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Local};
use thiserror::Error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{LogOutput, LoggingConfig};
use crate::context::ExecutionContext;
use crate::engine::QueryError;

/// Log target of resolver error events.
pub const ERROR_TARGET: &str = "graphql_observability::errors";

const TIMESTAMP_FORMAT: &str = "%d/%b/%Y:%H:%M:%S %z";

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("invalid log filter: {0}")]
    Filter(#[from] tracing_subscriber::filter::ParseError),
    #[error("could not install subscriber: {0}")]
    Init(#[from] tracing_subscriber::util::TryInitError),
}

/// Install the process-wide subscriber. `RUST_LOG` wins over the configured level.
pub fn init_logging(config: &LoggingConfig) -> Result<(), LoggingError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.level)?,
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()?;
    Ok(())
}

/// One rendered error line.
#[derive(Debug, Clone)]
pub struct ErrorLine {
    pub timestamp: DateTime<Local>,
    pub trace_id: Option<String>,
    pub message: String,
}

impl fmt::Display for ErrorLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.timestamp.format(TIMESTAMP_FORMAT))?;
        if let Some(id) = &self.trace_id {
            write!(f, " (trace:{})", id)?;
        }
        write!(f, " error: {}", self.message)
    }
}

#[derive(Clone, Default)]
enum Output {
    #[default]
    Tracing,
    Writer(Arc<Mutex<dyn Write + Send>>),
}

/// Formats and emits error events enriched with the trace id.
#[derive(Clone, Default)]
pub struct ErrorLogger {
    output: Output,
}

impl ErrorLogger {
    pub fn new(output: LogOutput) -> Self {
        match output {
            LogOutput::Tracing => Self::default(),
            LogOutput::Stderr => Self::with_writer(std::io::stderr()),
        }
    }

    /// Write plain lines to `writer` instead of the `tracing` pipeline.
    pub fn with_writer(writer: impl Write + Send + 'static) -> Self {
        Self {
            output: Output::Writer(Arc::new(Mutex::new(writer))),
        }
    }

    /// Log every error of a finished query, one line per distinct message.
    pub fn log_errors(&self, ctx: &ExecutionContext, errors: &[QueryError]) {
        let trace_id = ctx.trace_id().map(|id| id.to_string());
        for (message, count) in aggregate_errors(errors) {
            self.emit(trace_id.clone(), format!("{} (x{})", message, count), Some(count));
        }
    }

    /// Log a message alongside the trace id of `ctx`.
    pub fn error_ctx(&self, ctx: &ExecutionContext, message: &str) {
        self.emit(ctx.trace_id().map(|id| id.to_string()), message.to_string(), None);
    }

    /// Log a message when no context is available.
    pub fn error(&self, message: &str) {
        self.emit(None, message.to_string(), None);
    }

    fn emit(&self, trace_id: Option<String>, message: String, occurrences: Option<usize>) {
        match &self.output {
            Output::Tracing => {
                tracing::error!(
                    target: ERROR_TARGET,
                    trace_id = trace_id.as_deref(),
                    occurrences = occurrences.map(|n| n as u64),
                    "{}",
                    message
                );
            }
            Output::Writer(writer) => {
                let line = ErrorLine {
                    timestamp: Local::now(),
                    trace_id,
                    message,
                };
                // a poisoned writer still holds a usable sink
                let mut writer = writer.lock().unwrap_or_else(|e| e.into_inner());
                let _ = writeln!(writer, "{}", line);
            }
        }
    }
}

impl fmt::Debug for ErrorLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let output = match self.output {
            Output::Tracing => "tracing",
            Output::Writer(_) => "writer",
        };
        f.debug_struct("ErrorLogger").field("output", &output).finish()
    }
}

/// Group errors by exact message, in order of first occurrence.
pub fn aggregate_errors(errors: &[QueryError]) -> Vec<(&str, usize)> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut grouped: Vec<(&str, usize)> = Vec::new();
    for err in errors {
        match index.get(err.message.as_str()) {
            Some(&i) => grouped[i].1 += 1,
            None => {
                index.insert(err.message.as_str(), grouped.len());
                grouped.push((err.message.as_str(), 1));
            }
        }
    }
    grouped
}
