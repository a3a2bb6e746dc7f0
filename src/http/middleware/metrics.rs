//! HTTP server metrics middleware.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    extract::{MatchedPath, State},
    http::Request,
    middleware::Next,
    response::Response,
};

use crate::analytics::measures::{
    Tag, HTTP_SERVER_LATENCY, HTTP_SERVER_REQUEST_COUNT, HTTP_SERVER_RESPONSE_COUNT, TAG_HTTP_METHOD,
    TAG_HTTP_PATH, TAG_HTTP_STATUS,
};
use crate::analytics::MeasurementRegistry;
use crate::context::ExecutionContext;

#[derive(Debug, Clone)]
pub struct HttpMetricsState {
    registry: Arc<MeasurementRegistry>,
}

impl HttpMetricsState {
    pub fn new(registry: Arc<MeasurementRegistry>) -> Self {
        Self { registry }
    }
}

/// Record request count, latency and response status of every request.
///
/// The path tag is the matched route template when routing has run, so
/// path parameters do not blow up label cardinality.
pub async fn record_http_metrics(
    State(state): State<HttpMetricsState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());
    let ctx = request.extensions().get::<ExecutionContext>().cloned().unwrap_or_default();

    let response = next.run(request).await;

    let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
    let status = response.status().as_u16().to_string();
    let tags = [
        Tag::new(TAG_HTTP_METHOD, method),
        Tag::new(TAG_HTTP_PATH, path),
        Tag::new(TAG_HTTP_STATUS, status),
    ];
    let measurements = [
        HTTP_SERVER_REQUEST_COUNT.m(1.0),
        HTTP_SERVER_LATENCY.m(elapsed_ms),
        HTTP_SERVER_RESPONSE_COUNT.m(1.0),
    ];
    if let Err(e) = state.registry.record(&ctx, &tags, &measurements) {
        tracing::error!(error = %e, "Failed to record HTTP metrics");
    }

    response
}
