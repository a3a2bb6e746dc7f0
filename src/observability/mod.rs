//! Observability backends.
//!
//! # Data Flow
//! ```text
//! tracer variants produce:
//!     → logging.rs (aggregated resolver error lines, with trace id)
//!     → metrics.rs (Prometheus recorder behind the measurement registry)
//!     → tracing.rs (OpenTelemetry spans carrying the trace id through ExecutionContext)
//!
//! Consumers:
//!     → Log aggregation (tracing subscriber or stderr)
//!     → Metrics endpoint (Prometheus scrape)
//!     → Span events (simple exporter into the tracing subscriber)
//! ```
//!
//! # Design Decisions
//! - The trace backend always runs so log lines and the `trace` header can be
//!   correlated, even when span reporting is off
//! - Metrics aggregation lives in the recorder, recording is atomic increments

pub mod logging;
pub mod metrics;
pub mod tracing;

pub use self::logging::{init_logging, ErrorLogger};
pub use self::metrics::MetricsExporter;
pub use self::tracing::{SpanContext, TraceBackend, TraceId};
