//! Broadcast-shaped versions of `Vote`/`WindowResult` for the hub's
//! circular buffers.

use crate::action::Action;
use crate::vote::{Address, TxHash, Vote};
use crate::window::WindowResult;
use serde::{Deserialize, Serialize};

/// Default capacity of the recent-votes circular buffer.
pub const MAX_CACHED_VOTES: usize = 100;

/// Default capacity of the recent-results circular buffer.
pub const MAX_CACHED_ACTIONS: usize = 50;

/// The shape of a `Vote` as hydrated to newly-connected spectators and
/// broadcast on the event channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedVote {
    /// The voting player's address.
    pub player: Address,
    /// The action they voted for.
    pub action: Action,
    /// The block the vote was included in.
    pub block: u64,
    /// The transaction hash carrying the vote.
    pub tx_hash: TxHash,
}

impl From<&Vote> for CachedVote {
    fn from(vote: &Vote) -> Self {
        Self {
            player: vote.player,
            action: vote.action,
            block: vote.block,
            tx_hash: vote.tx_hash,
        }
    }
}

/// The shape of a `WindowResult` as hydrated to newly-connected
/// spectators and broadcast on the event channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedAction {
    /// The finalized window's id.
    pub window_id: u64,
    /// Inclusive first block of the window.
    pub start_block: u64,
    /// Inclusive last block of the window.
    pub end_block: u64,
    /// The elected action.
    pub winner: Action,
    /// Total votes counted in the window.
    pub total_votes: u32,
}

impl From<&WindowResult> for CachedAction {
    fn from(result: &WindowResult) -> Self {
        Self {
            window_id: result.window_id,
            start_block: result.start_block,
            end_block: result.end_block,
            winner: result.winner,
            total_votes: result.total_votes,
        }
    }
}

/// A fixed-capacity FIFO: pushing past capacity drops the oldest entry.
///
/// Used for the hub's recent-votes and recent-results buffers (§4.5).
#[derive(Debug, Clone)]
pub struct CircularBuffer<T> {
    capacity: usize,
    items: std::collections::VecDeque<T>,
}

impl<T> CircularBuffer<T> {
    /// Create a new buffer with the given capacity.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            items: std::collections::VecDeque::with_capacity(capacity),
        }
    }

    /// Push a new item, evicting the oldest if at capacity.
    pub fn push(&mut self, item: T) {
        if self.items.len() == self.capacity {
            self.items.pop_front();
        }
        self.items.push_back(item);
    }

    /// Iterate from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }

    /// Current number of buffered items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cached_vote_mirrors_vote_fields() {
        let vote = Vote {
            player: Address([1; 20]),
            action: Action::A,
            block: 5,
            tx_hash: TxHash([2; 32]),
            log_index: 0,
            observed_at_ms: 0,
        };
        let cached = CachedVote::from(&vote);
        assert_eq!(cached.player, vote.player);
        assert_eq!(cached.action, vote.action);
        assert_eq!(cached.block, vote.block);
        assert_eq!(cached.tx_hash, vote.tx_hash);
    }

    #[test]
    fn circular_buffer_evicts_oldest_past_capacity() {
        let mut buffer = CircularBuffer::new(2);
        buffer.push(1);
        buffer.push(2);
        buffer.push(3);
        let items: Vec<_> = buffer.iter().copied().collect();
        assert_eq!(items, vec![2, 3]);
        assert_eq!(buffer.len(), 2);
    }

    #[test]
    fn circular_buffer_default_sizes_match_spec() {
        assert_eq!(MAX_CACHED_VOTES, 100);
        assert_eq!(MAX_CACHED_ACTIONS, 50);
    }
}
