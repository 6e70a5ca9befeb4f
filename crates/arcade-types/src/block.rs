//! Block-head signals used to drive window progression.

use serde::{Deserialize, Serialize};

/// A signal that some block has been observed, from either the
/// subscription or the polling upstream.
///
/// The subscription path always carries a hash; the poll path may omit
/// one if it only resolved a block number (e.g. skip-ahead logic).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockTick {
    /// Block number.
    pub number: u64,
    /// Block hash, lowercase-hex on the wire; `None` when the observing
    /// path could not resolve it.
    pub hash: Option<[u8; 32]>,
}

impl BlockTick {
    /// Construct a tick with a known hash.
    pub fn new(number: u64, hash: [u8; 32]) -> Self {
        Self {
            number,
            hash: Some(hash),
        }
    }

    /// Construct a tick without a resolved hash (poll path, skip-ahead).
    pub fn without_hash(number: u64) -> Self {
        Self { number, hash: None }
    }

    /// Merge two ticks for the same block number, preferring the
    /// subscription path's hash when both are present.
    ///
    /// Per spec: "the subscription path's hash is preferred when both
    /// paths see the same block."
    pub fn prefer_subscription(subscription: Option<Self>, poll: Self) -> Self {
        match subscription {
            Some(sub) if sub.number == poll.number && sub.hash.is_some() => sub,
            _ => poll,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefers_subscription_hash_on_matching_block() {
        let sub = BlockTick::new(10, [1u8; 32]);
        let poll = BlockTick::new(10, [2u8; 32]);
        let merged = BlockTick::prefer_subscription(Some(sub), poll);
        assert_eq!(merged.hash, Some([1u8; 32]));
    }

    #[test]
    fn falls_back_to_poll_hash_without_subscription() {
        let poll = BlockTick::new(10, [2u8; 32]);
        let merged = BlockTick::prefer_subscription(None, poll);
        assert_eq!(merged.hash, Some([2u8; 32]));
    }

    #[test]
    fn falls_back_to_poll_on_mismatched_block() {
        let sub = BlockTick::new(9, [1u8; 32]);
        let poll = BlockTick::new(10, [2u8; 32]);
        let merged = BlockTick::prefer_subscription(Some(sub), poll);
        assert_eq!(merged.number, 10);
        assert_eq!(merged.hash, Some([2u8; 32]));
    }
}
