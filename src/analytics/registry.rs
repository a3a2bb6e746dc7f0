//! Process-wide measurement registry.
//!
//! # Responsibilities
//! - Bind every measure to exactly one view, once, before traffic
//! - Resolve the tags of a recording against the view's tag keys
//! - Fan recordings out to the attached sinks
//!
//! # Design Decisions
//! - Registration is all-or-nothing and fails on duplicates
//! - Recording an unregistered measure is rejected, views are never created lazily
//! - Context tags are merged under the explicit tags (explicit wins)

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, OnceLock};

use arc_swap::ArcSwap;
use dashmap::DashMap;
use thiserror::Error;

use crate::analytics::measures::{Measurement, Tag, View};
use crate::analytics::sink::MeasurementSink;
use crate::context::ExecutionContext;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("a view for measure {0} is already registered")]
    DuplicateView(&'static str),
    #[error("measure {0} has no registered view")]
    UnregisteredMeasure(&'static str),
}

/// Registry of views and the sinks that aggregate them.
pub struct MeasurementRegistry {
    views: DashMap<&'static str, View>,
    sinks: ArcSwap<Vec<Arc<dyn MeasurementSink>>>,
    registration: Mutex<()>,
}

impl MeasurementRegistry {
    /// Create an isolated registry.
    pub fn new() -> Self {
        Self {
            views: DashMap::new(),
            sinks: ArcSwap::from_pointee(Vec::new()),
            registration: Mutex::new(()),
        }
    }

    /// The registry shared by the whole process.
    pub fn global() -> Arc<MeasurementRegistry> {
        static GLOBAL: OnceLock<Arc<MeasurementRegistry>> = OnceLock::new();
        GLOBAL.get_or_init(|| Arc::new(MeasurementRegistry::new())).clone()
    }

    /// Register views. Fails without registering anything if any measure already
    /// has a view, or appears twice in `views`.
    pub fn register(&self, views: &[View]) -> Result<(), RegistryError> {
        let _guard = self.registration.lock().unwrap_or_else(|e| e.into_inner());

        for (i, view) in views.iter().enumerate() {
            let repeated = views[..i].iter().any(|v| v.name() == view.name());
            if repeated || self.views.contains_key(view.name()) {
                return Err(RegistryError::DuplicateView(view.name()));
            }
        }

        let sinks = self.sinks.load();
        for view in views {
            self.views.insert(view.name(), *view);
            for sink in sinks.iter() {
                sink.describe(view);
            }
            tracing::debug!(view = view.name(), "Registered view");
        }
        Ok(())
    }

    pub fn is_registered(&self, measure: &str) -> bool {
        self.views.contains_key(measure)
    }

    pub fn view(&self, measure: &str) -> Option<View> {
        self.views.get(measure).map(|v| *v.value())
    }

    /// Attach a sink. Views registered so far are described to it immediately.
    pub fn add_sink(&self, sink: Arc<dyn MeasurementSink>) {
        let _guard = self.registration.lock().unwrap_or_else(|e| e.into_inner());
        for view in self.views.iter() {
            sink.describe(view.value());
        }
        self.sinks.rcu(|sinks| {
            let mut next = Vec::clone(sinks);
            next.push(sink.clone());
            next
        });
    }

    /// Record measurements scoped to `ctx`, tagged with `tags`. Nothing is
    /// recorded if any measure lacks a view.
    pub fn record(
        &self,
        ctx: &ExecutionContext,
        tags: &[Tag],
        measurements: &[Measurement],
    ) -> Result<(), RegistryError> {
        let mut resolved = Vec::with_capacity(measurements.len());
        for m in measurements {
            let view = self
                .view(m.measure.name)
                .ok_or(RegistryError::UnregisteredMeasure(m.measure.name))?;
            resolved.push((view, m.value));
        }

        let mut merged: BTreeMap<&str, &str> = ctx.tags().collect();
        for tag in tags {
            merged.insert(&tag.key, &tag.value);
        }

        let sinks = self.sinks.load();
        for (view, value) in resolved {
            let view_tags: Vec<Tag> = view
                .tag_keys
                .iter()
                .filter_map(|key| merged.get(key).map(|value| Tag::new(*key, *value)))
                .collect();
            for sink in sinks.iter() {
                sink.record(&view, &view_tags, value);
            }
        }
        Ok(())
    }
}

impl Default for MeasurementRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MeasurementRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MeasurementRegistry")
            .field("views", &self.views.len())
            .field("sinks", &self.sinks.load().len())
            .finish()
    }
}
