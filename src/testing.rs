//! Test helpers shared by the unit tests.

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use futures_util::future::{self, BoxFuture, FutureExt};
use opentelemetry::trace::{SpanContext, SpanId, TraceFlags, TraceId, TraceState};
use opentelemetry_sdk::export::trace::{ExportResult, SpanData, SpanExporter};

use crate::analytics::measures::{Tag, View, ANALYTIC_VIEWS};
use crate::analytics::registry::MeasurementRegistry;
use crate::analytics::sink::MeasurementSink;

/// Sink that keeps every description and recording.
#[derive(Default)]
pub(crate) struct Capture {
    pub described: Mutex<Vec<&'static str>>,
    pub recorded: Mutex<Vec<(&'static str, Vec<Tag>, f64)>>,
}

impl Capture {
    pub fn names(&self) -> Vec<&'static str> {
        self.recorded.lock().unwrap().iter().map(|r| r.0).collect()
    }
}

impl MeasurementSink for Capture {
    fn describe(&self, view: &View) {
        self.described.lock().unwrap().push(view.name());
    }

    fn record(&self, view: &View, tags: &[Tag], value: f64) {
        self.recorded.lock().unwrap().push((view.name(), tags.to_vec(), value));
    }
}

/// Isolated registry with the analytic views and a capturing sink attached.
pub(crate) fn capturing_registry() -> (Arc<MeasurementRegistry>, Arc<Capture>) {
    let registry = Arc::new(MeasurementRegistry::new());
    registry.register(ANALYTIC_VIEWS).unwrap();
    let sink = Arc::new(Capture::default());
    registry.add_sink(sink.clone());
    (registry, sink)
}

/// Shared in-memory writer for `ErrorLogger::with_writer`.
#[derive(Clone, Default)]
pub(crate) struct Buffer(Arc<Mutex<Vec<u8>>>);

impl Buffer {
    pub fn lines(&self) -> Vec<String> {
        String::from_utf8(self.0.lock().unwrap().clone())
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }
}

impl Write for Buffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Exporter keeping every finished span in memory.
#[derive(Clone, Debug, Default)]
pub(crate) struct SpanCollector {
    spans: Arc<Mutex<Vec<SpanData>>>,
}

impl SpanCollector {
    pub fn spans(&self) -> Vec<SpanData> {
        self.spans.lock().unwrap().clone()
    }
}

impl SpanExporter for SpanCollector {
    fn export(&mut self, mut batch: Vec<SpanData>) -> BoxFuture<'static, ExportResult> {
        self.spans.lock().unwrap().append(&mut batch);
        future::ready(Ok(())).boxed()
    }
}

/// Attribute `key` of an exported span.
pub(crate) fn attribute(span: &SpanData, key: &str) -> Option<opentelemetry::Value> {
    span.attributes
        .iter()
        .find(|kv| kv.key.as_str() == key)
        .map(|kv| kv.value.clone())
}

/// Sampled span context with the given trace id and span id 1.
pub(crate) fn span_context(trace_id: u128) -> SpanContext {
    SpanContext::new(
        TraceId::from_bytes(trace_id.to_be_bytes()),
        SpanId::from_bytes(1_u64.to_be_bytes()),
        TraceFlags::SAMPLED,
        false,
        TraceState::default(),
    )
}
