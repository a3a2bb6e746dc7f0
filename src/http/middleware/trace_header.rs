//! Trace header middleware.
//!
//! Sets the `trace` response header to the trace id of the request's
//! [`ExecutionContext`], so clients can quote it when reporting problems.

use axum::{
    body::Body,
    extract::State,
    http::{header::HeaderName, HeaderMap, HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use opentelemetry::propagation::{Extractor, TextMapPropagator};
use opentelemetry::trace::TraceContextExt;
use opentelemetry_sdk::propagation::TraceContextPropagator;

use crate::context::ExecutionContext;
use crate::observability::tracing::{SpanContext, TraceBackend};

pub const TRACE_HEADER: &str = "trace";
pub const TRACEPARENT_HEADER: &str = "traceparent";

/// State of [`trace_header`]. Without a backend, requests that arrive without
/// a context get an empty header.
#[derive(Debug, Clone, Default)]
pub struct TraceHeaderState {
    backend: Option<TraceBackend>,
}

impl TraceHeaderState {
    pub fn new(backend: TraceBackend) -> Self {
        Self { backend: Some(backend) }
    }

    pub fn disabled() -> Self {
        Self::default()
    }
}

struct HeaderExtractor<'a>(&'a HeaderMap);

impl Extractor for HeaderExtractor<'_> {
    fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|v| v.to_str().ok())
    }

    fn keys(&self) -> Vec<&str> {
        self.0.keys().map(HeaderName::as_str).collect()
    }
}

/// `00-<32 hex>-<16 hex>-<2 hex>`, lowercase. The propagator's own hex
/// parsing takes a leading sign and short ids.
fn is_well_formed_traceparent(value: &str) -> bool {
    let mut parts = value.trim().split('-');
    [2, 32, 16, 2].iter().all(|&width| {
        parts.next().is_some_and(|part| {
            part.len() == width && part.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
        })
    }) && parts.next().is_none()
}

/// Remote span context of a valid W3C `traceparent` (and `tracestate`) header.
pub fn parent_from_headers(headers: &HeaderMap) -> Option<SpanContext> {
    let traceparent = headers.get(TRACEPARENT_HEADER)?.to_str().ok()?;
    if !is_well_formed_traceparent(traceparent) {
        return None;
    }
    let cx = TraceContextPropagator::new().extract(&HeaderExtractor(headers));
    let span = cx.span().span_context().clone();
    span.is_valid().then_some(span)
}

/// Decorate the response with the request's trace id.
///
/// A context already present in the request extensions is used as is.
/// Otherwise one is seeded from a root span that continues an incoming
/// `traceparent`, or starts a new trace, and is handed to downstream handlers.
pub async fn trace_header(
    State(state): State<TraceHeaderState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let existing = request.extensions().get::<ExecutionContext>().cloned();
    let (ctx, span) = match (existing, &state.backend) {
        (Some(ctx), _) => (ctx, None),
        (None, Some(backend)) => {
            let parent = parent_from_headers(request.headers());

            let mut span = backend.start_span(format!("HTTP {}", request.method()), parent.as_ref());
            span.set_tag("http.method", request.method().as_str());
            span.set_tag("http.url", request.uri().path());

            let ctx = ExecutionContext::new().with_span(span.context().clone());
            request.extensions_mut().insert(ctx.clone());
            (ctx, Some(span))
        }
        (None, None) => (ExecutionContext::new(), None),
    };

    let trace_id = ctx.trace_id_string();
    tracing::debug!(trace_id = %trace_id, "Request traced");

    let mut response = next.run(request).await;

    if let Some(mut span) = span {
        span.set_tag("http.status_code", response.status().as_u16());
        span.finish();
    }

    response.headers_mut().insert(
        HeaderName::from_static(TRACE_HEADER),
        HeaderValue::from_str(&trace_id).unwrap_or_else(|_| HeaderValue::from_static("")),
    );
    response
}
