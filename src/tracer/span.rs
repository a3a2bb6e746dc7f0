//! Tracer opening a span per query and per non-trivial field.

use serde_json::Value;

use crate::context::ExecutionContext;
use crate::engine::{FieldStart, QueryError, QueryStart};
use crate::observability::tracing::{Span, TraceBackend};
use crate::tracer::finish::{FieldFinish, OnFieldFinish, OnQueryFinish, QueryFinish};
use crate::tracer::Tracer;

/// Operation name of the span covering a whole query.
pub const QUERY_SPAN: &str = "GraphQL request";

/// Distributed tracing backend of the chain.
///
/// Query spans are children of the span in the incoming context, if any. Field
/// spans are children of the query span. The derived context carries the new
/// span, so downstream tracers and log lines see its trace id.
#[derive(Debug, Clone)]
pub struct SpanTracer {
    backend: TraceBackend,
}

impl SpanTracer {
    pub fn new(backend: TraceBackend) -> Self {
        Self { backend }
    }
}

struct FinishQuerySpan(Span);

impl OnQueryFinish for FinishQuerySpan {
    fn finish(self: Box<Self>, errors: &[QueryError]) {
        let FinishQuerySpan(mut span) = *self;
        if let Some(first) = errors.first() {
            let mut message = first.to_string();
            if errors.len() > 1 {
                message.push_str(&format!(" (and {} more errors)", errors.len() - 1));
            }
            span.set_tag("error", true);
            span.set_tag("graphql.error", message);
        }
        span.finish();
    }
}

struct FinishFieldSpan(Span);

impl OnFieldFinish for FinishFieldSpan {
    fn finish(self: Box<Self>, error: Option<&QueryError>) {
        let FinishFieldSpan(mut span) = *self;
        if let Some(err) = error {
            span.set_tag("error", true);
            span.set_tag("graphql.error", err.to_string());
        }
        span.finish();
    }
}

impl Tracer for SpanTracer {
    fn trace_query(&self, ctx: ExecutionContext, query: &QueryStart<'_>) -> (ExecutionContext, QueryFinish) {
        let mut span = self.backend.start_span(QUERY_SPAN, ctx.span());
        span.set_tag("graphql.query", query.query);
        if !query.operation_name.is_empty() {
            span.set_tag("graphql.operationName", query.operation_name);
        }
        if !query.variables.is_empty() {
            span.set_tag("graphql.variables", Value::Object(query.variables.clone()));
        }

        let ctx = ctx.with_span(span.context().clone());
        (ctx, QueryFinish::new(FinishQuerySpan(span)))
    }

    fn trace_field(&self, ctx: ExecutionContext, field: &FieldStart<'_>) -> (ExecutionContext, FieldFinish) {
        if field.trivial {
            return (ctx, FieldFinish::noop());
        }

        let mut span = self.backend.start_span(field.label, ctx.span());
        span.set_tag("graphql.type", field.type_name);
        span.set_tag("graphql.field", field.field_name);
        for (name, value) in field.args {
            span.set_tag(format!("graphql.args.{}", name), value.clone());
        }

        let ctx = ctx.with_span(span.context().clone());
        (ctx, FieldFinish::new(FinishFieldSpan(span)))
    }
}
