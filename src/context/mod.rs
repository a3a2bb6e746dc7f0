//! Request-scoped execution context.
//!
//! # Data Flow
//! ```text
//! engine creates ExecutionContext at query start
//!     → tracer 1 returns a derived context (e.g. with a span attached)
//!     → tracer 2 receives that derived context, may derive again
//!     → ... final context handed back to the engine
//!     → engine passes it to every field-start hook of the query
//! ```
//!
//! # Design Decisions
//! - Immutable: every `with_*` call returns a new context, the receiver is untouched
//! - Cheap to clone (one `Arc`), so derived contexts can be handed out freely
//! - Explicit value threaded through calls, never thread-local

use std::any::{Any, TypeId};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use crate::observability::tracing::{SpanContext, TraceId};

#[derive(Default, Clone)]
struct Inner {
    span: Option<SpanContext>,
    tags: BTreeMap<String, String>,
    values: HashMap<TypeId, Arc<dyn Any + Send + Sync>>,
}

/// Immutable, extensible key-value carrier threaded through every hook.
#[derive(Clone, Default)]
pub struct ExecutionContext {
    inner: Arc<Inner>,
}

impl ExecutionContext {
    /// Create an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    fn derive(&self, f: impl FnOnce(&mut Inner)) -> Self {
        let mut inner = (*self.inner).clone();
        f(&mut inner);
        Self {
            inner: Arc::new(inner),
        }
    }

    /// Derive a context carrying the given span as the active one.
    pub fn with_span(&self, span: SpanContext) -> Self {
        self.derive(|inner| inner.span = Some(span))
    }

    /// Derive a context with `key` set to `value` (upsert).
    pub fn with_tag(&self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let (key, value) = (key.into(), value.into());
        self.derive(|inner| {
            inner.tags.insert(key, value);
        })
    }

    /// Derive a context holding an arbitrary typed value, replacing any previous value of `T`.
    pub fn with_value<T: Any + Send + Sync>(&self, value: T) -> Self {
        self.derive(|inner| {
            inner.values.insert(TypeId::of::<T>(), Arc::new(value));
        })
    }

    /// The active span, if a tracing backend attached one.
    pub fn span(&self) -> Option<&SpanContext> {
        self.inner.span.as_ref()
    }

    /// Trace identifier of the active span, if it is valid.
    pub fn trace_id(&self) -> Option<TraceId> {
        self.inner
            .span
            .as_ref()
            .filter(|s| s.is_valid())
            .map(SpanContext::trace_id)
    }

    /// Trace identifier rendered as a string, empty when unavailable.
    pub fn trace_id_string(&self) -> String {
        self.trace_id().map(|id| id.to_string()).unwrap_or_default()
    }

    pub fn tag(&self, key: &str) -> Option<&str> {
        self.inner.tags.get(key).map(String::as_str)
    }

    /// All tags, ordered by key.
    pub fn tags(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inner.tags.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn value<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.inner
            .values
            .get(&TypeId::of::<T>())
            .and_then(|v| v.downcast_ref::<T>())
    }

    /// True when both handles point at the same underlying context.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("span", &self.inner.span)
            .field("tags", &self.inner.tags)
            .field("values", &self.inner.values.len())
            .finish()
    }
}
