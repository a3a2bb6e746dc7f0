//! Prometheus scrape endpoint.

use axum::{
    extract::State,
    http::header,
    response::IntoResponse,
    routing::get,
    Router,
};

use crate::observability::metrics::MetricsExporter;

pub const CONTENT_TYPE: &str = "text/plain; version=0.0.4";

/// Router serving the exporter's text exposition at `path`.
pub fn metrics_router(exporter: MetricsExporter, path: &str) -> Router {
    Router::new().route(path, get(render_metrics)).with_state(exporter)
}

async fn render_metrics(State(exporter): State<MetricsExporter>) -> impl IntoResponse {
    ([(header::CONTENT_TYPE, CONTENT_TYPE)], exporter.render())
}
