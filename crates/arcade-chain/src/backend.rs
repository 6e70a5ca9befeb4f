//! The black-box chain backend interface, kept separate from `alloy`
//! specifics so the merge/dedup logic in [`crate::client`] is testable
//! without a live RPC endpoint.

use crate::error::Result;
use async_trait::async_trait;
use futures::stream::BoxStream;

/// A raw block head as observed by either upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawBlockHead {
    /// Block number.
    pub number: u64,
    /// Block hash, when the observing path resolved one.
    pub hash: Option<[u8; 32]>,
}

/// A raw `VoteCast` log, not yet validated into an `Action`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawVoteLog {
    /// The block the log was included in.
    pub block: u64,
    /// The transaction hash carrying the log.
    pub tx_hash: [u8; 32],
    /// The log's index within its transaction's receipt.
    pub log_index: u32,
    /// The voting player's address (low 20 bytes of the indexed topic).
    pub player: [u8; 20],
    /// The raw `uint8 action` argument.
    pub action_code: u8,
}

/// The two upstream surfaces the chain client drives: a streaming
/// subscription and a polled HTTP range query.
#[async_trait]
pub trait ChainBackend: Send + Sync {
    /// Open (or reopen) the new-heads + vote-log subscription. Returns a
    /// single merged stream of block heads; `subscribe_vote_logs` is
    /// called separately for the log subscription.
    async fn subscribe_blocks(&self) -> Result<BoxStream<'static, Result<RawBlockHead>>>;

    /// Open (or reopen) the `VoteCast` log subscription.
    async fn subscribe_vote_logs(&self) -> Result<BoxStream<'static, Result<RawVoteLog>>>;

    /// Fetch the current chain head via the HTTP endpoint.
    async fn get_block_number(&self) -> Result<u64>;

    /// Fetch `VoteCast` logs in the inclusive-exclusive-per-spec range
    /// `(from, to]`.
    async fn get_vote_logs_range(&self, from: u64, to: u64) -> Result<Vec<RawVoteLog>>;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::VecDeque;

    /// A scriptable [`ChainBackend`] for unit tests.
    #[derive(Default)]
    pub struct MockBackend {
        pub block_heads: Mutex<VecDeque<RawBlockHead>>,
        pub vote_logs: Mutex<VecDeque<RawVoteLog>>,
        pub head: Mutex<u64>,
        pub range_logs: Mutex<Vec<RawVoteLog>>,
    }

    #[async_trait]
    impl ChainBackend for MockBackend {
        async fn subscribe_blocks(&self) -> Result<BoxStream<'static, Result<RawBlockHead>>> {
            let items: Vec<_> = self
                .block_heads
                .lock()
                .drain(..)
                .map(Ok)
                .collect();
            Ok(Box::pin(futures::stream::iter(items)))
        }

        async fn subscribe_vote_logs(&self) -> Result<BoxStream<'static, Result<RawVoteLog>>> {
            let items: Vec<_> = self.vote_logs.lock().drain(..).map(Ok).collect();
            Ok(Box::pin(futures::stream::iter(items)))
        }

        async fn get_block_number(&self) -> Result<u64> {
            Ok(*self.head.lock())
        }

        async fn get_vote_logs_range(&self, from: u64, to: u64) -> Result<Vec<RawVoteLog>> {
            Ok(self
                .range_logs
                .lock()
                .iter()
                .filter(|log| log.block > from && log.block <= to)
                .copied()
                .collect())
        }
    }
}
