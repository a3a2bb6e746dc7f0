//! Distributed tracing backend.
//!
//! # Responsibilities
//! - Own the OpenTelemetry tracer provider of the observer
//! - Open spans as children of a propagated span context
//! - Export finished spans, or drop them when reporting is disabled
//!
//! # Design Decisions
//! - Always initialized, even with reporting off, so trace ids exist for log correlation
//! - `AlwaysOn` sampler: every trace is sampled
//! - 64-bit trace ids by default (upper half zero), 128-bit on request
//! - No exporter when reporting is off; a simple exporter emitting structured
//!   `tracing` events when it is on

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures_util::future::{self, BoxFuture, FutureExt};
use opentelemetry::trace::{Span as _, TraceContextExt, Tracer as _, TracerProvider as _};
use opentelemetry::{Context, KeyValue};
use opentelemetry_sdk::export::trace::{ExportResult, SpanData, SpanExporter};
use opentelemetry_sdk::trace::{Config, IdGenerator, Sampler, Tracer, TracerProvider};
use opentelemetry_sdk::Resource;
use serde_json::Value;
use thiserror::Error;

use crate::observability::logging::ErrorLogger;

pub use opentelemetry::trace::{SpanContext, SpanId, TraceId};

/// Log target of reported spans.
pub const SPAN_TARGET: &str = "graphql_observability::spans";

/// Error type for trace backend initialization.
#[derive(Debug, Error)]
pub enum TraceError {
    #[error("no service name provided")]
    MissingServiceName,
}

/// Trace and span ids drawn from `fastrand`. Span ids are never zero.
#[derive(Debug)]
struct FastrandIds {
    trace_id_128bit: bool,
}

impl IdGenerator for FastrandIds {
    fn new_trace_id(&self) -> TraceId {
        let high = if self.trace_id_128bit { fastrand::u64(..) } else { 0 };
        let id = u128::from(high) << 64 | u128::from(fastrand::u64(1..));
        TraceId::from_bytes(id.to_be_bytes())
    }

    fn new_span_id(&self) -> SpanId {
        SpanId::from_bytes(fastrand::u64(1..).to_be_bytes())
    }
}

/// Span attribute value of a JSON tag. Scalars keep their type, everything
/// else is stored as JSON text.
pub fn attribute_value(value: Value) -> opentelemetry::Value {
    match value {
        Value::Bool(b) => b.into(),
        Value::Number(n) => match n.as_i64() {
            Some(i) => i.into(),
            None => n.as_f64().map(opentelemetry::Value::from).unwrap_or_else(|| n.to_string().into()),
        },
        Value::String(s) => s.into(),
        other => other.to_string().into(),
    }
}

/// Exports every finished span as a structured `tracing` event.
pub struct LoggingExporter {
    service: Arc<str>,
    logger: ErrorLogger,
    closed: Arc<AtomicBool>,
}

impl LoggingExporter {
    fn new(service: Arc<str>, logger: ErrorLogger, closed: Arc<AtomicBool>) -> Self {
        Self { service, logger, closed }
    }

    fn log(&self, span: &SpanData) {
        let context = &span.span_context;
        if self.closed.load(Ordering::Acquire) {
            self.logger.error(&format!(
                "span {} of trace {} reported after the tracer was closed",
                context.span_id(),
                context.trace_id()
            ));
            return;
        }

        let tags: serde_json::Map<String, Value> = span
            .attributes
            .iter()
            .map(|kv| (kv.key.as_str().to_string(), Value::String(kv.value.to_string())))
            .collect();
        let tags = Value::Object(tags).to_string();
        let duration = span.end_time.duration_since(span.start_time).unwrap_or_default();
        let parent_id = if span.parent_span_id == SpanId::INVALID {
            String::new()
        } else {
            span.parent_span_id.to_string()
        };

        tracing::info!(
            target: SPAN_TARGET,
            service = %self.service,
            trace_id = %context.trace_id(),
            span_id = %context.span_id(),
            parent_id = %parent_id,
            operation = %span.name,
            duration_ms = duration.as_secs_f64() * 1000.0,
            tags = %tags,
            "span finished"
        );
    }
}

impl fmt::Debug for LoggingExporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoggingExporter")
            .field("service", &self.service)
            .finish_non_exhaustive()
    }
}

impl SpanExporter for LoggingExporter {
    fn export(&mut self, batch: Vec<SpanData>) -> BoxFuture<'static, ExportResult> {
        for span in &batch {
            self.log(span);
        }
        future::ready(Ok(())).boxed()
    }
}

/// Settings the backend is initialized with.
#[derive(Debug, Clone)]
pub struct TraceBackendConfig {
    pub service_name: String,
    pub report_spans: bool,
    pub trace_id_128bit: bool,
}

struct BackendInner {
    service: Arc<str>,
    provider: TracerProvider,
    tracer: Tracer,
    reporting: bool,
    closed: Arc<AtomicBool>,
}

/// Handle to the tracing backend. Cloning shares the same tracer provider.
#[derive(Clone)]
pub struct TraceBackend {
    inner: Arc<BackendInner>,
}

impl TraceBackend {
    /// Initialize the backend. Finished spans go to a [`LoggingExporter`] when
    /// `report_spans` is set; without it no exporter is attached.
    pub fn init(config: &TraceBackendConfig, logger: ErrorLogger) -> Result<Self, TraceError> {
        let closed = Arc::new(AtomicBool::new(false));
        let exporter = config.report_spans.then(|| {
            LoggingExporter::new(Arc::from(config.service_name.as_str()), logger, closed.clone())
        });
        let backend = Self::build(&config.service_name, exporter, config.trace_id_128bit, closed)?;

        tracing::info!(
            service = %config.service_name,
            report_spans = config.report_spans,
            trace_id_128bit = config.trace_id_128bit,
            "Trace backend initialized"
        );
        Ok(backend)
    }

    /// Initialize the backend with a caller supplied exporter.
    pub fn with_exporter(
        service_name: &str,
        exporter: impl SpanExporter + 'static,
        trace_id_128bit: bool,
    ) -> Result<Self, TraceError> {
        Self::build(service_name, Some(exporter), trace_id_128bit, Arc::new(AtomicBool::new(false)))
    }

    fn build<E: SpanExporter + 'static>(
        service_name: &str,
        exporter: Option<E>,
        trace_id_128bit: bool,
        closed: Arc<AtomicBool>,
    ) -> Result<Self, TraceError> {
        if service_name.trim().is_empty() {
            return Err(TraceError::MissingServiceName);
        }

        let reporting = exporter.is_some();
        let mut builder = TracerProvider::builder().with_config(
            Config::default()
                .with_sampler(Sampler::AlwaysOn)
                .with_id_generator(FastrandIds { trace_id_128bit })
                .with_resource(Resource::new([KeyValue::new("service.name", service_name.to_string())])),
        );
        if let Some(exporter) = exporter {
            builder = builder.with_simple_exporter(exporter);
        }
        let provider = builder.build();
        let tracer = provider.tracer(service_name.to_string());

        Ok(Self {
            inner: Arc::new(BackendInner {
                service: Arc::from(service_name),
                provider,
                tracer,
                reporting,
                closed,
            }),
        })
    }

    pub fn service_name(&self) -> &str {
        &self.inner.service
    }

    /// Whether finished spans leave the process.
    pub fn is_reporting(&self) -> bool {
        self.inner.reporting
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    /// Open a span. With a parent the span joins the parent's trace, otherwise it
    /// starts a new one.
    pub fn start_span(&self, operation: impl Into<String>, parent: Option<&SpanContext>) -> Span {
        let parent_cx = match parent {
            Some(parent) => Context::new().with_remote_span_context(parent.clone()),
            None => Context::new(),
        };
        Span {
            inner: self.inner.tracer.start_with_context(operation.into(), &parent_cx),
            tags: Vec::new(),
        }
    }

    /// Hand every finished span to the exporter.
    pub fn flush(&self) {
        for result in self.inner.provider.force_flush() {
            if let Err(e) = result {
                tracing::warn!(error = %e, service = %self.inner.service, "Span flush failed");
            }
        }
    }

    /// Flush pending spans and stop reporting. Further calls are no-ops.
    pub fn close(&self) {
        if self.is_closed() {
            return;
        }
        self.flush();
        if self.inner.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        tracing::info!(service = %self.inner.service, "Trace backend closed");
    }
}

impl fmt::Debug for TraceBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TraceBackend")
            .field("service", &self.inner.service)
            .field("reporting", &self.inner.reporting)
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// An open span. Tags are kept until [`Span::finish`], which writes them as
/// span attributes and ends the span.
pub struct Span {
    inner: opentelemetry_sdk::trace::Span,
    tags: Vec<(String, Value)>,
}

impl Span {
    pub fn context(&self) -> &SpanContext {
        self.inner.span_context()
    }

    pub fn set_tag(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();
        match self.tags.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.tags.push((key, value)),
        }
    }

    pub fn tag(&self, key: &str) -> Option<&Value> {
        self.tags.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn finish(mut self) {
        for (key, value) in self.tags.drain(..) {
            self.inner.set_attribute(KeyValue::new(key, attribute_value(value)));
        }
        self.inner.end();
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Span")
            .field("context", self.context())
            .field("tags", &self.tags)
            .finish()
    }
}
