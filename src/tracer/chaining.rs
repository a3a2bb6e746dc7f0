//! Composition of several tracers behind one registration point.

use std::fmt;
use std::sync::Arc;

use crate::context::ExecutionContext;
use crate::engine::{FieldStart, QueryError, QueryStart};
use crate::tracer::finish::{FieldFinish, OnFieldFinish, OnQueryFinish, QueryFinish};
use crate::tracer::Tracer;

/// Calls every tracer in declared order.
///
/// On start, each tracer receives the context returned by the previous one. On
/// finish, every collected continuation gets the same outcome, in the same order.
#[derive(Clone, Default)]
pub struct ChainingTracer {
    tracers: Vec<Arc<dyn Tracer>>,
}

impl ChainingTracer {
    pub fn new(tracers: Vec<Arc<dyn Tracer>>) -> Self {
        Self { tracers }
    }

    pub fn push(&mut self, tracer: Arc<dyn Tracer>) {
        self.tracers.push(tracer);
    }

    pub fn len(&self) -> usize {
        self.tracers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracers.is_empty()
    }
}

impl Tracer for ChainingTracer {
    fn trace_query(&self, ctx: ExecutionContext, query: &QueryStart<'_>) -> (ExecutionContext, QueryFinish) {
        let mut ctx = ctx;
        let mut finishes = Vec::with_capacity(self.tracers.len());
        for tracer in &self.tracers {
            let (next, finish) = tracer.trace_query(ctx, query);
            ctx = next;
            if !finish.is_noop() {
                finishes.push(finish);
            }
        }

        let finish = if finishes.is_empty() {
            QueryFinish::noop()
        } else {
            QueryFinish::new(ChainedQueryFinish(finishes))
        };
        (ctx, finish)
    }

    fn trace_field(&self, ctx: ExecutionContext, field: &FieldStart<'_>) -> (ExecutionContext, FieldFinish) {
        let mut ctx = ctx;
        let mut finishes = Vec::with_capacity(self.tracers.len());
        for tracer in &self.tracers {
            let (next, finish) = tracer.trace_field(ctx, field);
            ctx = next;
            if !finish.is_noop() {
                finishes.push(finish);
            }
        }

        let finish = if finishes.is_empty() {
            FieldFinish::noop()
        } else {
            FieldFinish::new(ChainedFieldFinish(finishes))
        };
        (ctx, finish)
    }
}

impl fmt::Debug for ChainingTracer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChainingTracer").field("tracers", &self.tracers.len()).finish()
    }
}

struct ChainedQueryFinish(Vec<QueryFinish>);

impl OnQueryFinish for ChainedQueryFinish {
    fn finish(self: Box<Self>, errors: &[QueryError]) {
        for finish in self.0 {
            finish.finish(errors);
        }
    }
}

struct ChainedFieldFinish(Vec<FieldFinish>);

impl OnFieldFinish for ChainedFieldFinish {
    fn finish(self: Box<Self>, error: Option<&QueryError>) {
        for finish in self.0 {
            finish.finish(error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{TypeMetadata, Variables};
    use std::sync::Mutex;

    type Log = Arc<Mutex<Vec<String>>>;

    struct Step {
        name: &'static str,
        log: Log,
    }

    impl Tracer for Step {
        fn trace_query(&self, ctx: ExecutionContext, _query: &QueryStart<'_>) -> (ExecutionContext, QueryFinish) {
            let prev = ctx.tag("last").unwrap_or("-").to_string();
            self.log.lock().unwrap().push(format!("{} start after {}", self.name, prev));
            let (name, log) = (self.name, self.log.clone());
            let finish = QueryFinish::from_fn(move |errors| {
                log.lock().unwrap().push(format!("{} finish {}", name, errors.len()));
            });
            (ctx.with_tag("last", self.name), finish)
        }

        fn trace_field(&self, ctx: ExecutionContext, field: &FieldStart<'_>) -> (ExecutionContext, FieldFinish) {
            self.log.lock().unwrap().push(format!("{} field {}", self.name, field.field_name));
            let (name, log) = (self.name, self.log.clone());
            let finish = FieldFinish::from_fn(move |error| {
                let outcome = error.map(|e| e.message.clone()).unwrap_or_default();
                log.lock().unwrap().push(format!("{} field finish {}", name, outcome));
            });
            (ctx.with_tag("last", self.name), finish)
        }
    }

    fn chain(names: &[&'static str], log: &Log) -> ChainingTracer {
        ChainingTracer::new(
            names
                .iter()
                .map(|&name| Arc::new(Step { name, log: log.clone() }) as Arc<dyn Tracer>)
                .collect(),
        )
    }

    fn query<'a>(vars: &'a Variables, types: &'a TypeMetadata) -> QueryStart<'a> {
        QueryStart {
            query: "{ a }",
            operation_name: "",
            variables: vars,
            types,
        }
    }

    #[test]
    fn test_start_threads_context_in_order() {
        let log = Log::default();
        let tracer = chain(&["t1", "t2", "t3"], &log);
        let (vars, types) = (Variables::new(), TypeMetadata::new());

        let (ctx, finish) = tracer.trace_query(ExecutionContext::new(), &query(&vars, &types));

        assert_eq!(ctx.tag("last"), Some("t3"));
        assert_eq!(
            *log.lock().unwrap(),
            vec!["t1 start after -", "t2 start after t1", "t3 start after t2"]
        );
        finish.finish(&[]);
    }

    #[test]
    fn test_finish_fans_out_same_outcome() {
        let log = Log::default();
        let tracer = chain(&["t1", "t2"], &log);
        let (vars, types) = (Variables::new(), TypeMetadata::new());

        let (_, finish) = tracer.trace_query(ExecutionContext::new(), &query(&vars, &types));
        log.lock().unwrap().clear();
        finish.finish(&[QueryError::new("a"), QueryError::new("b")]);

        assert_eq!(*log.lock().unwrap(), vec!["t1 finish 2", "t2 finish 2"]);
    }

    #[test]
    fn test_field_fan_out() {
        let log = Log::default();
        let tracer = chain(&["t1", "t2"], &log);
        let args = Variables::new();
        let field = FieldStart {
            label: "GraphQL field: Query.a",
            type_name: "Query",
            field_name: "a",
            trivial: false,
            args: &args,
        };

        let (ctx, finish) = tracer.trace_field(ExecutionContext::new(), &field);
        finish.finish(Some(&QueryError::new("nope")));

        assert_eq!(ctx.tag("last"), Some("t2"));
        assert_eq!(
            *log.lock().unwrap(),
            vec!["t1 field a", "t2 field a", "t1 field finish nope", "t2 field finish nope"]
        );
    }

    #[test]
    fn test_empty_chain_is_identity() {
        let tracer = ChainingTracer::default();
        let (vars, types) = (Variables::new(), TypeMetadata::new());
        let ctx = ExecutionContext::new().with_tag("k", "v");

        let (out, finish) = tracer.trace_query(ctx.clone(), &query(&vars, &types));
        assert!(out.ptr_eq(&ctx));
        assert!(finish.is_noop());
        finish.finish(&[QueryError::new("ignored")]);

        let args = Variables::new();
        let field = FieldStart {
            label: "GraphQL field: Query.a",
            type_name: "Query",
            field_name: "a",
            trivial: false,
            args: &args,
        };
        let (out, finish) = tracer.trace_field(ctx.clone(), &field);
        assert!(out.ptr_eq(&ctx));
        assert!(finish.is_noop());
        finish.finish(Some(&QueryError::new("ignored")));
    }
}
