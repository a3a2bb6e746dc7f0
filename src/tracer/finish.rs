//! Finish continuations returned by tracer start hooks.

use std::fmt;

use crate::engine::QueryError;

/// Completion of a traced query.
pub trait OnQueryFinish: Send {
    fn finish(self: Box<Self>, errors: &[QueryError]);
}

/// Completion of a traced field.
pub trait OnFieldFinish: Send {
    fn finish(self: Box<Self>, error: Option<&QueryError>);
}

struct FnQueryFinish<F>(F);

impl<F> OnQueryFinish for FnQueryFinish<F>
where
    F: FnOnce(&[QueryError]) + Send,
{
    fn finish(self: Box<Self>, errors: &[QueryError]) {
        let FnQueryFinish(f) = *self;
        f(errors)
    }
}

struct FnFieldFinish<F>(F);

impl<F> OnFieldFinish for FnFieldFinish<F>
where
    F: FnOnce(Option<&QueryError>) + Send,
{
    fn finish(self: Box<Self>, error: Option<&QueryError>) {
        let FnFieldFinish(f) = *self;
        f(error)
    }
}

/// Continuation the engine completes with the errors of a query.
///
/// Dropping it without calling [`QueryFinish::finish`] records nothing.
#[must_use = "the engine must finish the continuation once the query resolves"]
pub struct QueryFinish {
    inner: Option<Box<dyn OnQueryFinish>>,
}

impl QueryFinish {
    pub fn new(finish: impl OnQueryFinish + 'static) -> Self {
        Self {
            inner: Some(Box::new(finish)),
        }
    }

    pub fn from_fn(f: impl FnOnce(&[QueryError]) + Send + 'static) -> Self {
        Self::new(FnQueryFinish(f))
    }

    pub fn noop() -> Self {
        Self { inner: None }
    }

    pub fn is_noop(&self) -> bool {
        self.inner.is_none()
    }

    pub fn finish(mut self, errors: &[QueryError]) {
        if let Some(inner) = self.inner.take() {
            inner.finish(errors);
        }
    }
}

impl Drop for QueryFinish {
    fn drop(&mut self) {
        if self.inner.is_some() {
            tracing::debug!("Query finish dropped without being called, nothing recorded");
        }
    }
}

impl fmt::Debug for QueryFinish {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryFinish").field("noop", &self.is_noop()).finish()
    }
}

/// Continuation the engine completes with the error of a field, if any.
///
/// Dropping it without calling [`FieldFinish::finish`] records nothing.
#[must_use = "the engine must finish the continuation once the field resolves"]
pub struct FieldFinish {
    inner: Option<Box<dyn OnFieldFinish>>,
}

impl FieldFinish {
    pub fn new(finish: impl OnFieldFinish + 'static) -> Self {
        Self {
            inner: Some(Box::new(finish)),
        }
    }

    pub fn from_fn(f: impl FnOnce(Option<&QueryError>) + Send + 'static) -> Self {
        Self::new(FnFieldFinish(f))
    }

    pub fn noop() -> Self {
        Self { inner: None }
    }

    pub fn is_noop(&self) -> bool {
        self.inner.is_none()
    }

    pub fn finish(mut self, error: Option<&QueryError>) {
        if let Some(inner) = self.inner.take() {
            inner.finish(error);
        }
    }
}

impl Drop for FieldFinish {
    fn drop(&mut self) {
        if self.inner.is_some() {
            tracing::debug!("Field finish dropped without being called, nothing recorded");
        }
    }
}

impl fmt::Debug for FieldFinish {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldFinish").field("noop", &self.is_noop()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_query_finish_passes_errors() {
        let seen = Arc::new(AtomicUsize::new(0));
        let s = seen.clone();
        let finish = QueryFinish::from_fn(move |errors| {
            s.fetch_add(errors.len(), Ordering::SeqCst);
        });
        assert!(!finish.is_noop());
        finish.finish(&[QueryError::new("a"), QueryError::new("b")]);
        assert_eq!(seen.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_field_finish_passes_error() {
        let seen = Arc::new(AtomicUsize::new(0));
        let s = seen.clone();
        let finish = FieldFinish::from_fn(move |error| {
            if error.is_some() {
                s.fetch_add(1, Ordering::SeqCst);
            }
        });
        finish.finish(Some(&QueryError::new("x")));
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_dropped_finish_runs_nothing() {
        let seen = Arc::new(AtomicUsize::new(0));
        let s = seen.clone();
        drop(QueryFinish::from_fn(move |_| {
            s.fetch_add(1, Ordering::SeqCst);
        }));
        assert_eq!(seen.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_noop() {
        let finish = FieldFinish::noop();
        assert!(finish.is_noop());
        finish.finish(None);
        QueryFinish::noop().finish(&[]);
    }
}
