//! Aggregator metrics, registered into the node's Prometheus registry.

use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::gauge::Gauge;
use prometheus_client::registry::Registry;

/// Vote-aggregation business metrics.
#[derive(Debug, Clone, Default)]
pub struct AggregatorMetrics {
    /// Votes accepted into a pending window.
    pub votes_accepted: Counter,
    /// Votes rejected as late (window already finalized).
    pub votes_late: Counter,
    /// Duplicate votes dropped (dedup invariant).
    pub votes_deduped: Counter,
    /// Windows finalized with a non-empty vote set.
    pub windows_finalized: Counter,
    /// Windows skipped because no votes fell in range.
    pub windows_skipped_empty: Counter,
    /// The window currently accepting votes.
    pub current_window: Gauge,
}

impl AggregatorMetrics {
    /// Build a fresh metrics set and register it into `registry` under the
    /// `aggregator` prefix.
    pub fn new_registered(registry: &mut Registry) -> Self {
        let metrics = Self::default();
        let sub = registry.sub_registry_with_prefix("aggregator");
        sub.register(
            "votes_accepted",
            "votes accepted into a pending window",
            metrics.votes_accepted.clone(),
        );
        sub.register(
            "votes_late",
            "votes rejected as late",
            metrics.votes_late.clone(),
        );
        sub.register(
            "votes_deduped",
            "duplicate votes dropped",
            metrics.votes_deduped.clone(),
        );
        sub.register(
            "windows_finalized",
            "windows finalized with a winner",
            metrics.windows_finalized.clone(),
        );
        sub.register(
            "windows_skipped_empty",
            "windows skipped for having no votes",
            metrics.windows_skipped_empty.clone(),
        );
        sub.register(
            "current_window",
            "the window currently accepting votes",
            metrics.current_window.clone(),
        );
        metrics
    }
}
