//! Tracer hooks invoked by the query engine.
//!
//! # Data Flow
//! ```text
//! engine
//!     → Tracer::trace_query / trace_field (start hook, returns derived context)
//!     → engine resolves the query or field
//!     → QueryFinish::finish / FieldFinish::finish (outcome)
//! ```
//!
//! # Responsibilities
//! - Define the tracer capability every backend implements
//! - Compose backends through [`ChainingTracer`]
//! - Provide the analytics, logging and span backends
//!
//! # Design Decisions
//! - Finish continuations are consumed by `finish(self, ..)`, so each runs at most once
//! - Tracers never mutate a context, they return a derived one

pub mod analytics;
pub mod chaining;
pub mod finish;
pub mod logging;
pub mod span;

use std::sync::Arc;

use crate::context::ExecutionContext;
use crate::engine::{FieldStart, QueryStart};

pub use analytics::AnalyticsTracer;
pub use chaining::ChainingTracer;
pub use finish::{FieldFinish, OnFieldFinish, OnQueryFinish, QueryFinish};
pub use logging::LoggingTracer;
pub use span::SpanTracer;

/// Observes the lifecycle of queries and of the fields resolved within them.
pub trait Tracer: Send + Sync {
    /// Called once when a query starts resolving.
    fn trace_query(&self, ctx: ExecutionContext, query: &QueryStart<'_>) -> (ExecutionContext, QueryFinish);

    /// Called once per field when it starts resolving.
    fn trace_field(&self, ctx: ExecutionContext, field: &FieldStart<'_>) -> (ExecutionContext, FieldFinish);
}

impl<T: Tracer + ?Sized> Tracer for Arc<T> {
    fn trace_query(&self, ctx: ExecutionContext, query: &QueryStart<'_>) -> (ExecutionContext, QueryFinish) {
        (**self).trace_query(ctx, query)
    }

    fn trace_field(&self, ctx: ExecutionContext, field: &FieldStart<'_>) -> (ExecutionContext, FieldFinish) {
        (**self).trace_field(ctx, field)
    }
}
