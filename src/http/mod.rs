//! HTTP surface of the observer.
//!
//! # Data Flow
//! ```text
//! request
//!     → middleware/trace_header.rs (seed ExecutionContext, `trace` header)
//!     → middleware/metrics.rs (count, latency, status by route)
//!     → GraphQL handler (engine runs the composed tracer)
//!
//! scrape
//!     → exposition.rs (Prometheus text from the observer's recorder)
//! ```

pub mod exposition;
pub mod middleware;

pub use exposition::metrics_router;
pub use middleware::{record_http_metrics, trace_header, HttpMetricsState, TraceHeaderState, TRACE_HEADER};
