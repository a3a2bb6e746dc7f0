//! Observer composition root.
//!
//! # Data Flow
//! ```text
//! ObserverConfig / options
//!     → ObserverBuilder::build
//!         → MetricsExporter (buckets per view)
//!         → TraceBackend (trace ids, span reporting)
//!         → MeasurementRegistry::register (analytic + HTTP views, once)
//!         → PrometheusSink attached to the registry
//!         → one tracer per option, in option order
//!     → Observer { ChainingTracer, exporter, backend, registry, logger }
//! ```
//!
//! # Design Decisions
//! - The trace backend always runs so trace ids exist for log correlation;
//!   spans are only reported when an option asks for it
//! - Views are registered exactly once per registry, a second observer on the
//!   same registry fails

pub mod error;

use std::fmt;
use std::sync::Arc;

use axum::Router;

use crate::analytics::measures::all_views;
use crate::analytics::{MeasurementRegistry, PrometheusSink};
use crate::config::{ObserverConfig, OptionName};
use crate::http::{
    metrics_router, record_http_metrics, trace_header, HttpMetricsState, TraceHeaderState,
};
use crate::observability::logging::ErrorLogger;
use crate::observability::metrics::MetricsExporter;
use crate::observability::tracing::{TraceBackend, TraceBackendConfig};
use crate::tracer::{AnalyticsTracer, ChainingTracer, LoggingTracer, SpanTracer, Tracer};

pub use error::ObserverError;

/// Opt-in feature of the observer. Order of options is the chain order.
#[derive(Clone)]
pub enum ObserverOption {
    /// Span per query and per non-trivial field.
    DistributedTracing { report_spans: bool },
    /// Resolver error lines with the trace id.
    Logging,
    /// Query and field measurements.
    Analytics,
    /// Caller supplied tracer.
    Custom(Arc<dyn Tracer>),
}

impl ObserverOption {
    /// Distributed tracing with span reporting on.
    pub fn distributed_tracing() -> Self {
        Self::DistributedTracing { report_spans: true }
    }

    pub fn custom(tracer: impl Tracer + 'static) -> Self {
        Self::Custom(Arc::new(tracer))
    }

    pub fn report_spans(&self) -> bool {
        matches!(self, Self::DistributedTracing { report_spans: true })
    }
}

impl fmt::Debug for ObserverOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DistributedTracing { report_spans } => f
                .debug_struct("DistributedTracing")
                .field("report_spans", report_spans)
                .finish(),
            Self::Logging => f.write_str("Logging"),
            Self::Analytics => f.write_str("Analytics"),
            Self::Custom(_) => f.write_str("Custom"),
        }
    }
}

/// Instruments a GraphQL server: composed tracer, metrics, trace backend.
pub struct Observer {
    tracer: ChainingTracer,
    exporter: MetricsExporter,
    backend: TraceBackend,
    registry: Arc<MeasurementRegistry>,
    logger: ErrorLogger,
}

impl Observer {
    /// Build an observer for `service_name` against the process-wide registry.
    pub fn new(service_name: impl Into<String>, options: Vec<ObserverOption>) -> Result<Self, ObserverError> {
        Self::builder(service_name).options(options).build()
    }

    pub fn from_config(config: &ObserverConfig) -> Result<Self, ObserverError> {
        ObserverBuilder::from_config(config).build()
    }

    pub fn builder(service_name: impl Into<String>) -> ObserverBuilder {
        ObserverBuilder::new(service_name)
    }

    /// The tracer to hand to the query engine.
    pub fn tracer(&self) -> &ChainingTracer {
        &self.tracer
    }

    pub fn metrics_exporter(&self) -> &MetricsExporter {
        &self.exporter
    }

    pub fn trace_backend(&self) -> &TraceBackend {
        &self.backend
    }

    pub fn registry(&self) -> &Arc<MeasurementRegistry> {
        &self.registry
    }

    pub fn logger(&self) -> &ErrorLogger {
        &self.logger
    }

    pub fn trace_header_state(&self) -> TraceHeaderState {
        TraceHeaderState::new(self.backend.clone())
    }

    pub fn http_metrics_state(&self) -> HttpMetricsState {
        HttpMetricsState::new(self.registry.clone())
    }

    /// Wrap `router` with the trace header and HTTP metrics middleware.
    pub fn decorate<S>(&self, router: Router<S>) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        router
            .layer(axum::middleware::from_fn_with_state(
                self.http_metrics_state(),
                record_http_metrics,
            ))
            .layer(axum::middleware::from_fn_with_state(
                self.trace_header_state(),
                trace_header,
            ))
    }

    /// Router serving the Prometheus exposition at `path`.
    pub fn metrics_router(&self, path: &str) -> Router {
        metrics_router(self.exporter.clone(), path)
    }

    /// Flush and release the trace backend. Safe to call more than once.
    pub fn close(&self) {
        self.backend.close();
    }
}

impl fmt::Debug for Observer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observer")
            .field("tracer", &self.tracer)
            .field("backend", &self.backend)
            .finish_non_exhaustive()
    }
}

/// Builder of [`Observer`].
#[derive(Debug)]
pub struct ObserverBuilder {
    service_name: String,
    options: Vec<ObserverOption>,
    registry: Option<Arc<MeasurementRegistry>>,
    logger: ErrorLogger,
    trace_id_128bit: bool,
}

impl ObserverBuilder {
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            options: Vec::new(),
            registry: None,
            logger: ErrorLogger::default(),
            trace_id_128bit: false,
        }
    }

    pub fn from_config(config: &ObserverConfig) -> Self {
        let options: Vec<_> = config
            .options
            .iter()
            .map(|name| match name {
                OptionName::Tracing => ObserverOption::DistributedTracing {
                    report_spans: config.tracing.report_spans,
                },
                OptionName::Logging => ObserverOption::Logging,
                OptionName::Analytics => ObserverOption::Analytics,
            })
            .collect();

        Self::new(config.service_name.clone())
            .options(options)
            .logger(ErrorLogger::new(config.logging.output))
            .trace_id_128bit(config.tracing.trace_id_128bit)
    }

    pub fn option(mut self, option: ObserverOption) -> Self {
        self.options.push(option);
        self
    }

    pub fn options(mut self, options: impl IntoIterator<Item = ObserverOption>) -> Self {
        self.options.extend(options);
        self
    }

    /// Register views on `registry` instead of the process-wide one.
    pub fn registry(mut self, registry: Arc<MeasurementRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn logger(mut self, logger: ErrorLogger) -> Self {
        self.logger = logger;
        self
    }

    pub fn trace_id_128bit(mut self, enabled: bool) -> Self {
        self.trace_id_128bit = enabled;
        self
    }

    pub fn build(self) -> Result<Observer, ObserverError> {
        let report_spans = self.options.iter().any(ObserverOption::report_spans);
        let views = all_views();

        let exporter = MetricsExporter::new(&views)?;

        let backend = TraceBackend::init(
            &TraceBackendConfig {
                service_name: self.service_name.clone(),
                report_spans,
                trace_id_128bit: self.trace_id_128bit,
            },
            self.logger.clone(),
        )?;

        let registry = self.registry.unwrap_or_else(MeasurementRegistry::global);
        if let Err(e) = registry.register(&views) {
            backend.close();
            return Err(e.into());
        }
        registry.add_sink(Arc::new(PrometheusSink::new(exporter.clone())));

        let tracers: Vec<Arc<dyn Tracer>> = self
            .options
            .into_iter()
            .map(|option| -> Arc<dyn Tracer> {
                match option {
                    ObserverOption::DistributedTracing { .. } => Arc::new(SpanTracer::new(backend.clone())),
                    ObserverOption::Logging => Arc::new(LoggingTracer::new(self.logger.clone())),
                    ObserverOption::Analytics => Arc::new(AnalyticsTracer::new(registry.clone())),
                    ObserverOption::Custom(tracer) => tracer,
                }
            })
            .collect();

        tracing::info!(
            service = %self.service_name,
            tracers = tracers.len(),
            report_spans,
            views = views.len(),
            "Observer initialized"
        );

        Ok(Observer {
            tracer: ChainingTracer::new(tracers),
            exporter,
            backend,
            registry,
            logger: self.logger,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::measures::{FIELD_RESOLVE_COUNT, HTTP_SERVER_REQUEST_COUNT};
    use crate::analytics::RegistryError;
    use crate::observability::tracing::TraceError;
    use axum::{body::Body, http::Request, routing::get};
    use tower::ServiceExt;

    fn all_options() -> Vec<ObserverOption> {
        vec![
            ObserverOption::distributed_tracing(),
            ObserverOption::Logging,
            ObserverOption::Analytics,
        ]
    }

    #[test]
    fn test_build_with_isolated_registry() {
        let registry = Arc::new(MeasurementRegistry::new());
        let observer = Observer::builder("users")
            .options(all_options())
            .registry(registry.clone())
            .build()
            .unwrap();

        assert_eq!(observer.tracer().len(), 3);
        assert!(observer.trace_backend().is_reporting());
        assert!(registry.is_registered(FIELD_RESOLVE_COUNT.name));
        assert!(registry.is_registered(HTTP_SERVER_REQUEST_COUNT.name));
        observer.close();
        observer.close();
        assert!(observer.trace_backend().is_closed());
    }

    #[test]
    fn test_second_observer_on_same_registry_fails() {
        let registry = Arc::new(MeasurementRegistry::new());
        let _first = Observer::builder("users").registry(registry.clone()).build().unwrap();

        let err = Observer::builder("users").registry(registry).build().unwrap_err();
        assert!(matches!(err, ObserverError::Registry(RegistryError::DuplicateView(_))));
    }

    #[test]
    fn test_empty_service_name_registers_nothing() {
        let registry = Arc::new(MeasurementRegistry::new());
        let err = Observer::builder("").registry(registry.clone()).build().unwrap_err();

        assert!(matches!(err, ObserverError::Trace(TraceError::MissingServiceName)));
        assert!(!registry.is_registered(FIELD_RESOLVE_COUNT.name));
    }

    #[test]
    fn test_spans_not_reported_without_tracing_option() {
        let observer = Observer::builder("users")
            .option(ObserverOption::Analytics)
            .option(ObserverOption::DistributedTracing { report_spans: false })
            .registry(Arc::new(MeasurementRegistry::new()))
            .build()
            .unwrap();
        assert!(!observer.trace_backend().is_reporting());
    }

    #[test]
    fn test_from_config_maps_options() {
        let mut config = ObserverConfig::default();
        config.options = vec![OptionName::Analytics, OptionName::Tracing];
        config.tracing.report_spans = false;

        let observer = ObserverBuilder::from_config(&config)
            .registry(Arc::new(MeasurementRegistry::new()))
            .build()
            .unwrap();
        assert_eq!(observer.tracer().len(), 2);
        assert!(!observer.trace_backend().is_reporting());
    }

    #[tokio::test]
    async fn test_decorated_router_sets_trace_header() {
        let observer = Observer::builder("users")
            .options(all_options())
            .registry(Arc::new(MeasurementRegistry::new()))
            .build()
            .unwrap();
        let app = observer.decorate(Router::new().route("/graphql", get(|| async { "{}" })));

        let response = app
            .oneshot(Request::builder().uri("/graphql").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let trace = response.headers().get("trace").unwrap().to_str().unwrap();
        assert_eq!(trace.len(), 32);
        assert!(trace.bytes().all(|b| b.is_ascii_hexdigit()));

        let rendered = observer.metrics_exporter().render();
        let line = rendered
            .lines()
            .find(|l| l.starts_with("http_server_request_count{"))
            .unwrap();
        assert!(line.contains("http_path=\"/graphql\""));
        assert!(line.ends_with(" 1"));
    }
}
