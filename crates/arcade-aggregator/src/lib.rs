//! Sliding per-window vote aggregation with deterministic election.

pub mod aggregator;
pub mod error;
pub mod metrics;

pub use aggregator::VoteAggregator;
pub use error::{AggregatorError, Result};
pub use metrics::AggregatorMetrics;
