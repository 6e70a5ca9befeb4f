//! Business metrics for the frame pipeline.

use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::gauge::Gauge;
use prometheus_client::metrics::histogram::Histogram;
use prometheus_client::registry::Registry;

/// Counters and gauges describing compression throughput and back-pressure.
#[derive(Debug, Clone)]
pub struct PipelineMetrics {
    pub frames_submitted: Counter,
    pub frames_compressed: Counter,
    pub frames_dropped: Counter,
    pub compression_seconds: Histogram,
    pub in_flight: Gauge,
    pub queued: Gauge,
}

impl PipelineMetrics {
    /// Build the metrics and register them under a `pipeline` sub-registry,
    /// returning the live handle the caller increments/sets.
    pub fn new_registered(registry: &mut Registry) -> Self {
        let frames_submitted = Counter::default();
        let frames_compressed = Counter::default();
        let frames_dropped = Counter::default();
        let compression_seconds = Histogram::new(
            [0.001, 0.005, 0.01, 0.02, 0.05, 0.1, 0.2, 0.5].into_iter(),
        );
        let in_flight = Gauge::default();
        let queued = Gauge::default();

        let sub = registry.sub_registry_with_prefix("pipeline");
        sub.register(
            "frames_submitted",
            "Total frames submitted to the pipeline",
            frames_submitted.clone(),
        );
        sub.register(
            "frames_compressed",
            "Total frames successfully compressed",
            frames_compressed.clone(),
        );
        sub.register(
            "frames_dropped",
            "Frames dropped due to a compression error or being superseded in the queue",
            frames_dropped.clone(),
        );
        sub.register(
            "compression_seconds",
            "Time spent encoding a single frame",
            compression_seconds.clone(),
        );
        sub.register("in_flight", "Compressions currently in flight", in_flight.clone());
        sub.register("queued", "Frames currently waiting in the queued slot", queued.clone());

        Self {
            frames_submitted,
            frames_compressed,
            frames_dropped,
            compression_seconds,
            in_flight,
            queued,
        }
    }
}
