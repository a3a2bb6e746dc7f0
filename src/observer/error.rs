//! Observer construction errors.

use thiserror::Error;

use crate::analytics::RegistryError;
use crate::observability::metrics::ExporterError;
use crate::observability::tracing::TraceError;

/// Construction fails as a whole: no partially built observer is returned.
#[derive(Debug, Error)]
pub enum ObserverError {
    #[error("register views: {0}")]
    Registry(#[from] RegistryError),
    #[error("init trace backend: {0}")]
    Trace(#[from] TraceError),
    #[error("create metrics exporter: {0}")]
    Exporter(#[from] ExporterError),
}
