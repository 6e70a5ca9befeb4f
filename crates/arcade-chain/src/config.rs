//! Chain client configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the chain client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainConfig {
    /// WebSocket endpoint used for the subscription path.
    pub ws_url: String,
    /// HTTP endpoint used for the polling path.
    pub http_url: String,
    /// The vote contract address, lowercase `0x`-prefixed hex.
    pub contract_address: String,
    /// Window size `W`, in blocks.
    pub window_size: u64,
    /// Approximate block time, used to derive the poll interval (`W · blockTimeMs`).
    pub block_time_ms: u64,
    /// Maximum number of blocks fetched in a single poll range query.
    pub max_poll_range: u64,
    /// If the poll path falls behind the head by more than this multiple of
    /// `max_poll_range`, it skips ahead instead of draining block-by-block.
    pub skip_ahead_multiplier: u64,
    /// Delay before attempting to reconnect a dropped subscription.
    pub reconnect_delay_ms: u64,
    /// Number of consecutive cycles the poll path must lead the subscription
    /// path by before it alone drives window progression.
    pub poll_lead_cycles: u32,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            ws_url: "ws://127.0.0.1:8546".to_string(),
            http_url: "http://127.0.0.1:8545".to_string(),
            contract_address: "0x0000000000000000000000000000000000000000".to_string(),
            window_size: 5,
            block_time_ms: 400,
            max_poll_range: 100,
            skip_ahead_multiplier: 10,
            reconnect_delay_ms: 5_000,
            poll_lead_cycles: 3,
        }
    }
}

impl ChainConfig {
    /// The poll timer interval: `W · blockTimeMs`.
    pub fn poll_interval_ms(&self) -> u64 {
        self.window_size * self.block_time_ms
    }

    /// The span beyond `max_poll_range` past which the poll path skips
    /// ahead instead of draining range-by-range.
    pub fn skip_ahead_threshold(&self) -> u64 {
        self.max_poll_range * self.skip_ahead_multiplier
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn poll_interval_matches_formula() {
        let config = ChainConfig {
            window_size: 5,
            block_time_ms: 400,
            ..ChainConfig::default()
        };
        assert_eq!(config.poll_interval_ms(), 2000);
    }
}
