//! Measurement sinks.

use metrics::{Label, Unit as MetricUnit};

use crate::analytics::measures::{Aggregation, Tag, Unit, View};
use crate::observability::metrics::MetricsExporter;

/// Aggregates recorded measurements. Implementations must be safe for
/// concurrent recording.
pub trait MeasurementSink: Send + Sync {
    /// Called once per view, before the view's first recording.
    fn describe(&self, _view: &View) {}

    fn record(&self, view: &View, tags: &[Tag], value: f64);
}

/// Feeds views into the Prometheus recorder: count views become counters,
/// distribution views become histograms.
#[derive(Clone, Debug)]
pub struct PrometheusSink {
    exporter: MetricsExporter,
}

impl PrometheusSink {
    pub fn new(exporter: MetricsExporter) -> Self {
        Self { exporter }
    }
}

impl MeasurementSink for PrometheusSink {
    fn describe(&self, view: &View) {
        let unit = match view.measure.unit {
            Unit::Dimensionless => MetricUnit::Count,
            Unit::Milliseconds => MetricUnit::Milliseconds,
        };
        self.exporter.with_recorder(|| match view.aggregation {
            Aggregation::Count => metrics::describe_counter!(view.name(), unit, view.description),
            Aggregation::Distribution(_) => {
                metrics::describe_histogram!(view.name(), unit, view.description)
            }
        });
    }

    fn record(&self, view: &View, tags: &[Tag], value: f64) {
        let labels: Vec<Label> = tags
            .iter()
            .map(|t| Label::new(t.key.clone(), t.value.clone()))
            .collect();
        self.exporter.with_recorder(|| match view.aggregation {
            Aggregation::Count => metrics::counter!(view.name(), labels).increment(1),
            Aggregation::Distribution(_) => metrics::histogram!(view.name(), labels).record(value),
        });
    }
}
