//! Axum middleware decorating the GraphQL endpoint.

pub mod metrics;
pub mod trace_header;

pub use metrics::{record_http_metrics, HttpMetricsState};
pub use trace_header::{trace_header, TraceHeaderState, TRACE_HEADER};
