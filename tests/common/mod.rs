//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use graphql_observability::analytics::{MeasurementSink, Tag, View};
use graphql_observability::engine::{TypeMetadata, Variables};
use graphql_observability::{ExecutionContext, FieldFinish, FieldStart, QueryError, QueryFinish, QueryStart, Tracer};

/// One measurement as seen by a sink.
#[derive(Debug, Clone, PartialEq)]
pub struct Recorded {
    pub view: &'static str,
    pub tags: Vec<Tag>,
    pub value: f64,
}

/// Sink keeping every recording in memory.
#[derive(Default)]
pub struct CaptureSink {
    recorded: Mutex<Vec<Recorded>>,
}

impl CaptureSink {
    pub fn recorded(&self) -> Vec<Recorded> {
        self.recorded.lock().unwrap().clone()
    }

    /// Recordings tagged with the given field identity.
    pub fn for_field(&self, field: &str) -> Vec<Recorded> {
        self.recorded()
            .into_iter()
            .filter(|r| r.tags.iter().any(|t| t.value == field))
            .collect()
    }

    /// Recordings of query views (untagged, `graphql_server_query_` prefix).
    pub fn for_query(&self) -> Vec<Recorded> {
        self.recorded()
            .into_iter()
            .filter(|r| r.view.starts_with("graphql_server_query_"))
            .collect()
    }
}

impl MeasurementSink for CaptureSink {
    fn record(&self, view: &View, tags: &[Tag], value: f64) {
        self.recorded.lock().unwrap().push(Recorded {
            view: view.name(),
            tags: tags.to_vec(),
            value,
        });
    }
}

/// In-memory writer for error log lines.
#[derive(Clone, Default)]
pub struct Buffer(Arc<Mutex<Vec<u8>>>);

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

/// Tracer writing every hook call to a shared journal.
pub struct RecordingTracer {
    pub name: &'static str,
    pub journal: Arc<Mutex<Vec<String>>>,
}

impl RecordingTracer {
    pub fn new(name: &'static str, journal: Arc<Mutex<Vec<String>>>) -> Self {
        Self { name, journal }
    }
}

impl Tracer for RecordingTracer {
    fn trace_query(&self, ctx: ExecutionContext, _query: &QueryStart<'_>) -> (ExecutionContext, QueryFinish) {
        self.journal
            .lock()
            .unwrap()
            .push(format!("{} query trace={}", self.name, ctx.trace_id_string()));
        let (name, journal) = (self.name, self.journal.clone());
        let finish = QueryFinish::from_fn(move |errors| {
            journal.lock().unwrap().push(format!("{} query done errors={}", name, errors.len()));
        });
        (ctx, finish)
    }

    fn trace_field(&self, ctx: ExecutionContext, field: &FieldStart<'_>) -> (ExecutionContext, FieldFinish) {
        self.journal.lock().unwrap().push(format!("{} field {}", self.name, field.identity()));
        (ctx, FieldFinish::noop())
    }
}

/// A field the simulated engine resolves, with its outcome.
pub struct FieldRun {
    pub type_name: &'static str,
    pub field_name: &'static str,
    pub error: Option<&'static str>,
}

impl FieldRun {
    pub fn ok(type_name: &'static str, field_name: &'static str) -> Self {
        Self { type_name, field_name, error: None }
    }

    pub fn failing(type_name: &'static str, field_name: &'static str, message: &'static str) -> Self {
        Self { type_name, field_name, error: Some(message) }
    }
}

/// Drive `tracer` the way a query engine would: start the query, resolve each
/// field in turn, then finish the query with every field error.
pub fn run_query(tracer: &dyn Tracer, ctx: ExecutionContext, query: &str, fields: &[FieldRun]) -> ExecutionContext {
    let (vars, types) = (Variables::new(), TypeMetadata::new());
    let (qctx, qfinish) = tracer.trace_query(
        ctx,
        &QueryStart {
            query,
            operation_name: "",
            variables: &vars,
            types: &types,
        },
    );

    let mut errors = Vec::new();
    for run in fields {
        let label = format!("GraphQL field: {}.{}", run.type_name, run.field_name);
        let args = Variables::new();
        let (_, ffinish) = tracer.trace_field(
            qctx.clone(),
            &FieldStart {
                label: &label,
                type_name: run.type_name,
                field_name: run.field_name,
                trivial: false,
                args: &args,
            },
        );
        let error = run.error.map(QueryError::new);
        ffinish.finish(error.as_ref());
        errors.extend(error);
    }

    qfinish.finish(&errors);
    qctx
}
