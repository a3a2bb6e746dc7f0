//! Tracer feeding query and field analytics.

use std::sync::Arc;

use crate::analytics::{FieldAnalyzer, MeasurementRegistry, QueryAnalyzer};
use crate::context::ExecutionContext;
use crate::engine::{FieldStart, QueryError, QueryStart};
use crate::tracer::finish::{FieldFinish, OnFieldFinish, OnQueryFinish, QueryFinish};
use crate::tracer::Tracer;

/// Starts an analyzer per query and per field. The context passes through unchanged.
#[derive(Debug, Clone)]
pub struct AnalyticsTracer {
    registry: Arc<MeasurementRegistry>,
}

impl AnalyticsTracer {
    pub fn new(registry: Arc<MeasurementRegistry>) -> Self {
        Self { registry }
    }
}

impl Default for AnalyticsTracer {
    fn default() -> Self {
        Self::new(MeasurementRegistry::global())
    }
}

impl Tracer for AnalyticsTracer {
    fn trace_query(&self, ctx: ExecutionContext, _query: &QueryStart<'_>) -> (ExecutionContext, QueryFinish) {
        let analyzer = QueryAnalyzer::new(ctx.clone(), self.registry.clone());
        (ctx, QueryFinish::new(analyzer))
    }

    fn trace_field(&self, ctx: ExecutionContext, field: &FieldStart<'_>) -> (ExecutionContext, FieldFinish) {
        let analyzer = FieldAnalyzer::new(ctx.clone(), field.type_name, field.field_name, self.registry.clone());
        (ctx, FieldFinish::new(analyzer))
    }
}

impl OnQueryFinish for QueryAnalyzer {
    fn finish(self: Box<Self>, errors: &[QueryError]) {
        (*self).record_measurements(errors);
    }
}

impl OnFieldFinish for FieldAnalyzer {
    fn finish(self: Box<Self>, error: Option<&QueryError>) {
        (*self).record_measurements(error);
    }
}
