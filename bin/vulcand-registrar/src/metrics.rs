//! Prometheus metrics for registration events

use anyhow::Result;
use prometheus::{Counter, CounterVec, Encoder, Opts, Registry, TextEncoder};
use std::sync::Arc;

/// Counters shared by the event dispatcher and the health endpoint
#[derive(Clone)]
pub struct RegistrarMetrics {
    /// Lifecycle events handled, by action and outcome
    pub events_total: CounterVec,
    /// Failed store liveness probes
    pub probe_failures_total: Counter,
    pub registry: Arc<Registry>,
}

impl RegistrarMetrics {
    pub fn new() -> Result<Self> {
        let registry = Arc::new(Registry::new());

        let events_total = CounterVec::new(
            Opts::new("registrar_events_total", "Service lifecycle events handled"),
            &["action", "outcome"],
        )?;

        let probe_failures_total = Counter::new(
            "registrar_probe_failures_total",
            "Failed store liveness probes",
        )?;

        registry.register(Box::new(events_total.clone()))?;
        registry.register(Box::new(probe_failures_total.clone()))?;

        Ok(Self {
            events_total,
            probe_failures_total,
            registry,
        })
    }

    pub fn record_event(&self, action: &str, outcome: &str) {
        self.events_total.with_label_values(&[action, outcome]).inc();
    }

    /// Gather all metrics in Prometheus text format
    pub fn gather(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = vec![];
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}
