//! Query resolution analyzer.

use std::sync::Arc;
use std::time::Instant;

use crate::analytics::measures::{QUERY_RESOLVE_COUNT, QUERY_RESOLVE_DURATION, QUERY_RESOLVE_ERROR_COUNT};
use crate::analytics::registry::MeasurementRegistry;
use crate::context::ExecutionContext;
use crate::engine::QueryError;

/// Measures one query resolution. Query measurements carry no tags of their own.
#[derive(Debug)]
pub struct QueryAnalyzer {
    ctx: ExecutionContext,
    start: Instant,
    registry: Arc<MeasurementRegistry>,
}

impl QueryAnalyzer {
    pub fn new(ctx: ExecutionContext, registry: Arc<MeasurementRegistry>) -> Self {
        Self::started_at(ctx, Instant::now(), registry)
    }

    pub fn started_at(ctx: ExecutionContext, start: Instant, registry: Arc<MeasurementRegistry>) -> Self {
        Self { ctx, start, registry }
    }

    /// Record count and duration, plus the number of errors when there are any.
    pub fn record_measurements(self, errors: &[QueryError]) {
        let elapsed_ms = self.start.elapsed().as_secs_f64() * 1000.0;
        let mut measurements = vec![QUERY_RESOLVE_COUNT.m(1.0), QUERY_RESOLVE_DURATION.m(elapsed_ms)];
        if !errors.is_empty() {
            measurements.push(QUERY_RESOLVE_ERROR_COUNT.m(errors.len() as f64));
        }

        if let Err(e) = self.registry.record(&self.ctx, &[], &measurements) {
            tracing::error!(error = %e, trace_id = %self.ctx.trace_id_string(), "Failed to record query measurements");
        }
    }
}
