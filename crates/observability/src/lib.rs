use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::OnceCell;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

static TRACING_INIT: OnceCell<()> = OnceCell::new();

#[derive(Debug, Default)]
pub struct AppMetrics {
    requests_total: AtomicU64,
    classifier_calls_total: AtomicU64,
    lookup_calls_total: AtomicU64,
    distance_calls_total: AtomicU64,
    address_total: AtomicU64,
    options_total: AtomicU64,
    no_results_total: AtomicU64,
    passthrough_total: AtomicU64,
    failures_total: AtomicU64,
    total_latency_millis: AtomicU64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub requests_total: u64,
    pub classifier_calls_total: u64,
    pub lookup_calls_total: u64,
    pub distance_calls_total: u64,
    pub address_total: u64,
    pub options_total: u64,
    pub no_results_total: u64,
    pub passthrough_total: u64,
    pub failures_total: u64,
    pub avg_latency_millis: f64,
}

impl AppMetrics {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn inc_request(&self) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_classifier_call(&self) {
        self.classifier_calls_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_lookup_call(&self) {
        self.lookup_calls_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_distance_call(&self) {
        self.distance_calls_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_failure(&self) {
        self.failures_total.fetch_add(1, Ordering::Relaxed);
    }

    /// Counts a finished resolution by its terminal label.
    pub fn record_terminal(&self, terminal: &str) {
        let counter = match terminal {
            "address" => &self.address_total,
            "options" => &self.options_total,
            "no_results" => &self.no_results_total,
            _ => &self.passthrough_total,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn observe_latency(&self, duration: Duration) {
        self.total_latency_millis
            .fetch_add(duration.as_millis() as u64, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let requests = self.requests_total.load(Ordering::Relaxed);
        let latency = self.total_latency_millis.load(Ordering::Relaxed);

        MetricsSnapshot {
            requests_total: requests,
            classifier_calls_total: self.classifier_calls_total.load(Ordering::Relaxed),
            lookup_calls_total: self.lookup_calls_total.load(Ordering::Relaxed),
            distance_calls_total: self.distance_calls_total.load(Ordering::Relaxed),
            address_total: self.address_total.load(Ordering::Relaxed),
            options_total: self.options_total.load(Ordering::Relaxed),
            no_results_total: self.no_results_total.load(Ordering::Relaxed),
            passthrough_total: self.passthrough_total.load(Ordering::Relaxed),
            failures_total: self.failures_total.load(Ordering::Relaxed),
            avg_latency_millis: if requests == 0 {
                0.0
            } else {
                latency as f64 / requests as f64
            },
        }
    }
}

pub fn init_tracing(service_name: &str) {
    TRACING_INIT.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}=info,roadside_api=info,roadside_agents=info,roadside_gateways=info",
                service_name
            ))
        });

        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_current_span(true)
            .with_span_list(true)
            .init();
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_averages_latency_over_requests() {
        let metrics = AppMetrics::default();
        assert_eq!(metrics.snapshot().avg_latency_millis, 0.0);

        metrics.inc_request();
        metrics.inc_request();
        metrics.observe_latency(Duration::from_millis(30));
        metrics.observe_latency(Duration::from_millis(10));

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.requests_total, 2);
        assert_eq!(snapshot.avg_latency_millis, 20.0);
    }

    #[test]
    fn terminals_are_counted_separately() {
        let metrics = AppMetrics::default();
        for terminal in ["address", "options", "options", "no_results", "something_else"] {
            metrics.record_terminal(terminal);
        }

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.address_total, 1);
        assert_eq!(snapshot.options_total, 2);
        assert_eq!(snapshot.no_results_total, 1);
        assert_eq!(snapshot.passthrough_total, 1);
    }
}
