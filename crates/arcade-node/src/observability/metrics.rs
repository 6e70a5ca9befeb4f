//! Prometheus metrics collection.
//!
//! Holds the node's single [`Registry`]. HTTP-layer metrics are recorded
//! here directly; component metrics (chain, aggregator, pipeline, relay)
//! are registered into the same registry by the supervisor at startup via
//! each crate's `new_registered(&mut Registry)`, so `/metrics` exposes
//! everything from one scrape.

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use prometheus_client::encoding::EncodeLabelSet;
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::gauge::Gauge;
use prometheus_client::metrics::histogram::{exponential_buckets, Histogram};
use prometheus_client::registry::Registry;
use std::sync::Arc;

/// HTTP request labels.
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct HttpLabels {
    /// HTTP method (GET, POST, etc.)
    pub method: String,
    /// Request path pattern
    pub path: String,
    /// Response status code
    pub status: u16,
}

/// Global metrics state, shared by the HTTP middleware and the supervisor's
/// component registration step.
pub static METRICS: Lazy<MetricsState> = Lazy::new(MetricsState::new);

/// Metrics state container.
#[derive(Clone)]
pub struct MetricsState {
    /// Prometheus registry. The supervisor registers every component's
    /// metrics into this same instance at startup.
    pub registry: Arc<RwLock<Registry>>,
    /// HTTP request counter.
    pub http_requests_total: Family<HttpLabels, Counter>,
    /// HTTP request duration histogram (seconds).
    pub http_request_duration_seconds: Family<HttpLabels, Histogram>,
    /// HTTP active connections gauge.
    pub http_active_connections: Gauge,
}

impl Default for MetricsState {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsState {
    /// Create a new metrics state with the HTTP-layer metrics registered.
    pub fn new() -> Self {
        let mut registry = Registry::default();

        let http_requests_total = Family::<HttpLabels, Counter>::default();
        registry.register(
            "arcade_http_requests",
            "Total HTTP requests",
            http_requests_total.clone(),
        );

        let http_request_duration_seconds =
            Family::<HttpLabels, Histogram>::new_with_constructor(|| {
                Histogram::new(exponential_buckets(0.001, 2.0, 16))
            });
        registry.register(
            "arcade_http_request_duration_seconds",
            "HTTP request duration in seconds",
            http_request_duration_seconds.clone(),
        );

        let http_active_connections = Gauge::default();
        registry.register(
            "arcade_http_active_connections",
            "Number of active HTTP connections",
            http_active_connections.clone(),
        );

        Self {
            registry: Arc::new(RwLock::new(registry)),
            http_requests_total,
            http_request_duration_seconds,
            http_active_connections,
        }
    }

    /// Register a component's metrics into the shared registry, returning
    /// the live handle the caller should hold and update.
    pub fn register_component<T>(&self, build: impl FnOnce(&mut Registry) -> T) -> T {
        build(&mut self.registry.write())
    }

    /// Record an HTTP request.
    pub fn record_http_request(&self, method: &str, path: &str, status: u16, duration_secs: f64) {
        let labels = HttpLabels {
            method: method.to_string(),
            path: normalize_path(path),
            status,
        };

        self.http_requests_total.get_or_create(&labels).inc();
        self.http_request_duration_seconds
            .get_or_create(&labels)
            .observe(duration_secs);
    }

    /// Encode metrics for Prometheus scraping.
    pub fn encode(&self) -> String {
        let mut buffer = String::new();
        let registry = self.registry.read();
        prometheus_client::encoding::text::encode(&mut buffer, &registry)
            .expect("failed to encode metrics");
        buffer
    }
}

/// Normalize path for metrics (replace dynamic segments).
fn normalize_path(path: &str) -> String {
    let parts: Vec<&str> = path.split('/').collect();
    let normalized: Vec<&str> = parts
        .iter()
        .enumerate()
        .map(|(i, part)| {
            if part.is_empty() {
                return *part;
            }
            if is_dynamic_segment(part, i, &parts) {
                ":param"
            } else {
                *part
            }
        })
        .collect();
    normalized.join("/")
}

/// Check if a path segment is dynamic (an address or numeric id).
fn is_dynamic_segment(segment: &str, index: usize, parts: &[&str]) -> bool {
    if segment.starts_with("0x") && segment.len() == 42 {
        return true;
    }
    if segment.chars().all(|c| c.is_ascii_digit()) {
        return true;
    }
    if index >= 1 {
        if let Some(parent) = parts.get(index - 1) {
            if *parent == "nonce" || *parent == "delegated" {
                return true;
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_relay_address_segments() {
        assert_eq!(normalize_path("/health"), "/health");
        assert_eq!(
            normalize_path("/relay/nonce/0x1111111111111111111111111111111111111111"),
            "/relay/nonce/:param"
        );
    }

    #[test]
    fn metrics_state_encodes_http_metrics() {
        let metrics = MetricsState::new();
        metrics.record_http_request("GET", "/health", 200, 0.001);
        let encoded = metrics.encode();
        assert!(encoded.contains("arcade_http_requests"));
    }
}
