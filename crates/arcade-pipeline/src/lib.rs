//! Frame pipeline: compresses raw emulator framebuffers into JPEGs with
//! bounded concurrency and a latest-wins queue, so a slow compressor never
//! backs up memory or lags behind the emulator's frame clock.

pub mod compress;
pub mod error;
pub mod metrics;
pub mod pipeline;

pub use compress::{compress, CompressedFrame, DEFAULT_QUALITY};
pub use error::{PipelineError, Result};
pub use metrics::PipelineMetrics;
pub use pipeline::{FramePipeline, PipelineConfig};
