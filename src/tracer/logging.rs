//! Tracer logging resolver errors with the trace id.

use crate::context::ExecutionContext;
use crate::engine::{FieldStart, QueryError, QueryStart};
use crate::observability::logging::ErrorLogger;
use crate::tracer::finish::{FieldFinish, OnQueryFinish, QueryFinish};
use crate::tracer::Tracer;

/// Logs the aggregated errors of each query once it finishes. Fields are not traced.
#[derive(Debug, Clone, Default)]
pub struct LoggingTracer {
    logger: ErrorLogger,
}

impl LoggingTracer {
    pub fn new(logger: ErrorLogger) -> Self {
        Self { logger }
    }
}

struct LogQueryErrors {
    ctx: ExecutionContext,
    logger: ErrorLogger,
}

impl OnQueryFinish for LogQueryErrors {
    fn finish(self: Box<Self>, errors: &[QueryError]) {
        if !errors.is_empty() {
            self.logger.log_errors(&self.ctx, errors);
        }
    }
}

impl Tracer for LoggingTracer {
    fn trace_query(&self, ctx: ExecutionContext, _query: &QueryStart<'_>) -> (ExecutionContext, QueryFinish) {
        let finish = QueryFinish::new(LogQueryErrors {
            ctx: ctx.clone(),
            logger: self.logger.clone(),
        });
        (ctx, finish)
    }

    fn trace_field(&self, ctx: ExecutionContext, _field: &FieldStart<'_>) -> (ExecutionContext, FieldFinish) {
        (ctx, FieldFinish::noop())
    }
}
