//! Query and field analytics.
//!
//! # Data Flow
//! ```text
//! AnalyticsTracer (query/field start)
//!     → query.rs / field.rs (analyzer captures context + start instant)
//!     → engine completes the continuation
//!     → analyzer emits measurements
//!     → registry.rs (views lookup, tag filtering)
//!     → sink.rs (Prometheus counters and histograms)
//! ```
//!
//! # Design Decisions
//! - Every measure has exactly one view, registered before traffic
//! - Introspection fields (`__` types) are never measured
//! - Durations are fractional milliseconds

pub mod field;
pub mod measures;
pub mod query;
pub mod registry;
pub mod sink;

pub use field::FieldAnalyzer;
pub use measures::{Aggregation, Measure, Measurement, Tag, View};
pub use query::QueryAnalyzer;
pub use registry::{MeasurementRegistry, RegistryError};
pub use sink::{MeasurementSink, PrometheusSink};
