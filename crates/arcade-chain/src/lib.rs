//! Chain ingestion: dual-path subscription + polling with deduplication.
//!
//! [`backend::ChainBackend`] is the black-box upstream interface;
//! [`alloy_backend::AlloyChainBackend`] is the production implementation.
//! [`client::spawn`] drives both paths and merges their output into a
//! single deduplicated `Vote`/`BlockTick` stream.

pub mod alloy_backend;
pub mod backend;
pub mod client;
pub mod config;
pub mod dedup;
pub mod error;
pub mod metrics;

pub use alloy_backend::AlloyChainBackend;
pub use backend::{ChainBackend, RawBlockHead, RawVoteLog};
pub use client::{spawn, ChainOutputs};
pub use config::ChainConfig;
pub use error::{ChainError, Result};
pub use metrics::ChainClientMetrics;
