//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Own the Prometheus recorder that aggregates every registered view
//! - Configure histogram buckets per distribution view
//! - Render the Prometheus text exposition for the `/metrics` endpoint
//!
//! # Design Decisions
//! - The recorder is owned, not installed globally: recordings go through
//!   `metrics::with_local_recorder`, so several observers can live in one process
//! - Buckets are fixed at build time from the view definitions

use std::fmt;
use std::sync::Arc;

use metrics_exporter_prometheus::{BuildError, Matcher, PrometheusBuilder, PrometheusHandle, PrometheusRecorder};
use thiserror::Error;

use crate::analytics::measures::{Aggregation, View};

#[derive(Debug, Error)]
pub enum ExporterError {
    #[error("could not build prometheus exporter: {0}")]
    Build(#[from] BuildError),
}

struct Inner {
    recorder: PrometheusRecorder,
    handle: PrometheusHandle,
}

/// Handle to the Prometheus recorder. Cloning shares the same recorder.
#[derive(Clone)]
pub struct MetricsExporter {
    inner: Arc<Inner>,
}

impl MetricsExporter {
    /// Build a recorder with histogram buckets for every distribution view.
    pub fn new(views: &[View]) -> Result<Self, ExporterError> {
        let mut builder = PrometheusBuilder::new();
        for view in views {
            if let Aggregation::Distribution(bounds) = view.aggregation {
                builder = builder.set_buckets_for_metric(Matcher::Full(view.name().to_string()), bounds)?;
            }
        }
        let recorder = builder.build_recorder();
        let handle = recorder.handle();

        tracing::debug!(views = views.len(), "Prometheus recorder built");
        Ok(Self {
            inner: Arc::new(Inner { recorder, handle }),
        })
    }

    /// Run `f` with this exporter's recorder as the active `metrics` recorder.
    pub fn with_recorder<T>(&self, f: impl FnOnce() -> T) -> T {
        metrics::with_local_recorder(&self.inner.recorder, f)
    }

    /// Prometheus text exposition of everything recorded so far.
    pub fn render(&self) -> String {
        self.inner.handle.render()
    }

    pub fn handle(&self) -> PrometheusHandle {
        self.inner.handle.clone()
    }
}

impl fmt::Debug for MetricsExporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetricsExporter").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::measures::all_views;

    #[test]
    fn test_local_recorder_is_isolated() {
        let a = MetricsExporter::new(&all_views()).unwrap();
        let b = MetricsExporter::new(&all_views()).unwrap();

        a.with_recorder(|| metrics::counter!("graphql_server_query_resolve_count").increment(1));

        assert!(a.render().contains("graphql_server_query_resolve_count 1"));
        assert!(!b.render().contains("graphql_server_query_resolve_count"));
    }

    #[test]
    fn test_histogram_uses_view_buckets() {
        let exporter = MetricsExporter::new(&all_views()).unwrap();
        exporter.with_recorder(|| {
            metrics::histogram!("graphql_server_query_resolve_duration").record(12.5)
        });
        let rendered = exporter.render();
        assert!(rendered.contains("graphql_server_query_resolve_duration_bucket"));
        assert!(rendered.contains("graphql_server_query_resolve_duration_count 1"));
    }
}
