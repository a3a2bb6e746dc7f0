//! GraphQL observability middleware.
//!
//! Instruments a GraphQL query engine through tracer hooks: one composed
//! [`Tracer`] fans query and field lifecycle events out to span tracing,
//! resolver error logging and query/field analytics.

pub mod analytics;
pub mod config;
pub mod context;
pub mod engine;
pub mod http;
pub mod observability;
pub mod observer;
pub mod tracer;

#[cfg(test)]
pub(crate) mod testing;

pub use config::ObserverConfig;
pub use context::ExecutionContext;
pub use engine::{FieldStart, QueryError, QueryStart};
pub use observer::{Observer, ObserverBuilder, ObserverError, ObserverOption};
pub use tracer::{ChainingTracer, FieldFinish, QueryFinish, Tracer};
