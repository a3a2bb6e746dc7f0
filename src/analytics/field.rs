//! Field resolution analyzer.

use std::sync::Arc;
use std::time::Instant;

use crate::analytics::measures::{
    Tag, FIELD_RESOLVE_COUNT, FIELD_RESOLVE_DURATION, FIELD_RESOLVE_ERROR_COUNT, TAG_FIELD,
};
use crate::analytics::registry::MeasurementRegistry;
use crate::context::ExecutionContext;
use crate::engine::QueryError;

/// Type names with this prefix belong to the introspection schema.
pub const INTROSPECTION_PREFIX: &str = "__";

/// Measures one field resolution, from construction to [`record_measurements`].
///
/// [`record_measurements`]: FieldAnalyzer::record_measurements
#[derive(Debug)]
pub struct FieldAnalyzer {
    ctx: ExecutionContext,
    type_name: String,
    field_name: String,
    start: Instant,
    registry: Arc<MeasurementRegistry>,
}

impl FieldAnalyzer {
    pub fn new(
        ctx: ExecutionContext,
        type_name: impl Into<String>,
        field_name: impl Into<String>,
        registry: Arc<MeasurementRegistry>,
    ) -> Self {
        Self::started_at(ctx, type_name, field_name, Instant::now(), registry)
    }

    pub fn started_at(
        ctx: ExecutionContext,
        type_name: impl Into<String>,
        field_name: impl Into<String>,
        start: Instant,
        registry: Arc<MeasurementRegistry>,
    ) -> Self {
        Self {
            ctx,
            type_name: type_name.into(),
            field_name: field_name.into(),
            start,
            registry,
        }
    }

    pub fn is_introspection(&self) -> bool {
        self.type_name.starts_with(INTROSPECTION_PREFIX)
    }

    /// Record count and duration, plus an error count when `error` is set.
    /// Introspection fields record nothing.
    pub fn record_measurements(self, error: Option<&QueryError>) {
        if self.is_introspection() {
            return;
        }

        let elapsed_ms = self.start.elapsed().as_secs_f64() * 1000.0;
        let mut measurements = vec![FIELD_RESOLVE_COUNT.m(1.0), FIELD_RESOLVE_DURATION.m(elapsed_ms)];
        if error.is_some() {
            measurements.push(FIELD_RESOLVE_ERROR_COUNT.m(1.0));
        }

        let field = format!("{}.{}", self.type_name, self.field_name);
        let tags = [Tag::new(TAG_FIELD, field.as_str())];
        if let Err(e) = self.registry.record(&self.ctx, &tags, &measurements) {
            tracing::error!(error = %e, field = %field, "Failed to record field measurements");
        }
    }
}
