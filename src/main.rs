//! GraphQL observer (v1)
//!
//! Runs the observability stack of a GraphQL service standalone: loads the
//! configuration, initializes logging, tracing and metrics, and serves the
//! Prometheus endpoint until interrupted.
//!
//! # Architecture Overview
//!
//! ```text
//!     query engine
//!         │ trace_query / trace_field
//!         ▼
//!   ┌──────────────────────────────────────────────────────┐
//!   │ ChainingTracer                                        │
//!   │   ┌───────────┐  ┌─────────────┐  ┌───────────────┐   │
//!   │   │SpanTracer │─▶│LoggingTracer│─▶│AnalyticsTracer│   │
//!   │   └─────┬─────┘  └──────┬──────┘  └───────┬───────┘   │
//!   └─────────┼───────────────┼─────────────────┼───────────┘
//!             ▼               ▼                 ▼
//!       trace backend     error log     measurement registry
//!       (span events)    (trace ids)    → Prometheus recorder
//!                                          → GET /metrics
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use graphql_observability::config::{load_config, ObserverConfig};
use graphql_observability::observability::init_logging;
use graphql_observability::Observer;

#[derive(Parser)]
#[command(name = "graphql-observer")]
#[command(about = "Observability stack for a GraphQL server", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the configured service name.
    #[arg(short, long)]
    service_name: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ObserverConfig::default(),
    };
    if let Some(name) = cli.service_name {
        config.service_name = name;
    }

    init_logging(&config.logging)?;

    tracing::info!("graphql-observer v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        service = %config.service_name,
        options = ?config.options,
        report_spans = config.tracing.report_spans,
        metrics_enabled = config.metrics.enabled,
        "Configuration loaded"
    );

    let observer = Observer::from_config(&config)?;

    if config.metrics.enabled {
        let app = observer
            .decorate(observer.metrics_router(&config.metrics.path))
            .layer(TraceLayer::new_for_http());

        let listener = TcpListener::bind(&config.metrics.address).await?;
        tracing::info!(
            address = %listener.local_addr()?,
            path = %config.metrics.path,
            "Serving metrics"
        );

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
    } else {
        shutdown_signal().await;
    }

    observer.close();
    tracing::info!("Shutdown complete");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl+C");
        return;
    }
    tracing::info!("Shutdown signal received");
}
