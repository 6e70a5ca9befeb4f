//! Chain-client metrics, registered into the node's Prometheus registry.

use prometheus_client::encoding::EncodeLabelSet;
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::registry::Registry;

/// Label distinguishing which upstream path an event came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, EncodeLabelSet)]
pub struct PathLabel {
    /// `"subscription"` or `"poll"`.
    pub path: String,
}

/// Chain-client business metrics.
#[derive(Debug, Clone, Default)]
pub struct ChainClientMetrics {
    /// Votes observed, by upstream path.
    pub votes_observed: Family<PathLabel, Counter>,
    /// Subscription reconnects.
    pub reconnects: Counter,
    /// Poll-cycle errors.
    pub poll_errors: Counter,
    /// Block ticks emitted, by upstream path.
    pub ticks_emitted: Family<PathLabel, Counter>,
}

impl ChainClientMetrics {
    /// Build a fresh metrics set and register it into `registry` under the
    /// `chain` prefix. The returned handle is what the client should hold
    /// and update; the registry keeps its own clone for scraping.
    pub fn new_registered(registry: &mut Registry) -> Self {
        let metrics = Self::default();
        let sub = registry.sub_registry_with_prefix("chain");
        sub.register(
            "votes_observed",
            "votes observed, by upstream path",
            metrics.votes_observed.clone(),
        );
        sub.register(
            "reconnects",
            "subscription reconnects",
            metrics.reconnects.clone(),
        );
        sub.register("poll_errors", "poll-cycle errors", metrics.poll_errors.clone());
        sub.register(
            "ticks_emitted",
            "block ticks emitted, by upstream path",
            metrics.ticks_emitted.clone(),
        );
        metrics
    }
}
