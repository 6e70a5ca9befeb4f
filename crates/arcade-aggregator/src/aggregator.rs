//! Sliding per-window vote aggregation with deterministic election.

use crate::error::AggregatorError;
use crate::metrics::AggregatorMetrics;
use arcade_types::{elect, Vote, VoteId, Window, WindowResult};
use std::collections::{HashMap, HashSet};
use tokio::sync::mpsc;

struct PendingWindow {
    votes: Vec<Vote>,
    seen: HashSet<VoteId>,
}

impl PendingWindow {
    fn new() -> Self {
        Self {
            votes: Vec::new(),
            seen: HashSet::new(),
        }
    }
}

/// Buckets votes by window, finalizes completed windows on each tick, and
/// elects a winner with deterministic tie-breaking.
///
/// Single-writer by design (§5: "addVote and onBlock must be serialized"):
/// callers must funnel both through one task or one mutex. This type does
/// not itself lock anything.
pub struct VoteAggregator {
    window_size: u64,
    current_window: Option<u64>,
    windows: HashMap<u64, PendingWindow>,
    last_block_hash: Option<[u8; 32]>,
    on_complete: mpsc::UnboundedSender<WindowResult>,
    metrics: AggregatorMetrics,
}

impl VoteAggregator {
    /// Construct an aggregator that emits finalized windows on
    /// `on_complete`, per the spec's "callback-driven aggregator modeled
    /// as a sink channel" design note.
    pub fn new(window_size: u64, on_complete: mpsc::UnboundedSender<WindowResult>) -> Self {
        Self::with_metrics(window_size, on_complete, AggregatorMetrics::default())
    }

    /// Construct an aggregator that records business metrics via `metrics`,
    /// typically built with [`AggregatorMetrics::new_registered`].
    pub fn with_metrics(
        window_size: u64,
        on_complete: mpsc::UnboundedSender<WindowResult>,
        metrics: AggregatorMetrics,
    ) -> Self {
        assert!(window_size >= 1, "window size must be at least 1");
        Self {
            window_size,
            current_window: None,
            windows: HashMap::new(),
            last_block_hash: None,
            on_complete,
            metrics,
        }
    }

    /// The window currently accepting votes, if any input has been seen yet.
    pub fn current_window(&self) -> Option<u64> {
        self.current_window
    }

    /// Record a vote. Rejects (and logs) votes for windows already
    /// finalized; idempotent re-delivery of the same vote is a no-op.
    pub fn add_vote(&mut self, vote: Vote) -> Result<(), AggregatorError> {
        let window_id = vote.window_id(self.window_size);
        self.advance_to(window_id);

        let current = self.current_window.expect("advance_to always sets current_window");
        if window_id < current {
            tracing::warn!(window_id, current_window = current, block = vote.block, "late vote rejected");
            self.metrics.votes_late.inc();
            return Err(AggregatorError::LateVote {
                window_id,
                current_window: current,
            });
        }

        let entry = self.windows.entry(window_id).or_insert_with(PendingWindow::new);
        if entry.seen.insert(vote.id()) {
            entry.votes.push(vote);
            self.metrics.votes_accepted.inc();
        } else {
            self.metrics.votes_deduped.inc();
        }
        Ok(())
    }

    /// Advance the window clock. `hash`, when present, becomes the seed
    /// used to break ties in any window this tick finalizes.
    pub fn on_block(&mut self, number: u64, hash: Option<[u8; 32]>) {
        if let Some(hash) = hash {
            self.last_block_hash = Some(hash);
        }
        let window_id = number / self.window_size;
        self.advance_to(window_id);
    }

    /// Finalize every window from the current one up to (not including)
    /// `new_window`, then adopt `new_window` as current. A no-op if
    /// `new_window` does not exceed the current window (idempotent /
    /// out-of-order ticks, per §8's windowing laws).
    fn advance_to(&mut self, new_window: u64) {
        let current = match self.current_window {
            Some(current) => current,
            None => {
                self.current_window = Some(new_window);
                return;
            }
        };

        if new_window <= current {
            return;
        }

        for window_id in current..new_window {
            match self.windows.remove(&window_id) {
                Some(pending) if !pending.votes.is_empty() => {
                    let window = Window::for_id(window_id, self.window_size);
                    let tallied: Vec<_> =
                        pending.votes.iter().map(|v| (v.action, v.tx_hash)).collect();
                    if let Some(result) = elect(window, &tallied, self.last_block_hash) {
                        self.metrics.windows_finalized.inc();
                        let _ = self.on_complete.send(result);
                    }
                }
                _ => {
                    self.metrics.windows_skipped_empty.inc();
                }
            }
        }

        self.current_window = Some(new_window);
        self.metrics.current_window.set(new_window as i64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arcade_types::{Action, TxHash};

    fn vote(block: u64, action: Action, tx_byte: u8) -> Vote {
        Vote {
            player: arcade_types::Address([0; 20]),
            action,
            block,
            tx_hash: TxHash([tx_byte; 32]),
            log_index: 0,
            observed_at_ms: 0,
        }
    }

    #[test]
    fn clean_window_scenario() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut agg = VoteAggregator::new(5, tx);

        agg.add_vote(vote(0, Action::Up, 1)).unwrap();
        agg.add_vote(vote(2, Action::Up, 2)).unwrap();
        agg.add_vote(vote(3, Action::Down, 3)).unwrap();
        agg.add_vote(vote(4, Action::Up, 4)).unwrap();
        agg.on_block(5, None);

        let result = rx.try_recv().unwrap();
        assert_eq!(result.window_id, 0);
        assert_eq!(result.start_block, 0);
        assert_eq!(result.end_block, 4);
        assert_eq!(result.winner, Action::Up);
        assert_eq!(result.total_votes, 4);
        assert_eq!(result.tallies[&Action::Up], 3);
        assert_eq!(result.tallies[&Action::Down], 1);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn tie_broken_by_hash_scenario() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut agg = VoteAggregator::new(5, tx);

        agg.add_vote(vote(0, Action::A, 1)).unwrap();
        agg.add_vote(vote(1, Action::B, 2)).unwrap();

        let mut hash = [0u8; 32];
        hash[31] = 0x01;
        agg.on_block(5, Some(hash));

        let first_run = rx.try_recv().unwrap().winner;
        assert_eq!(first_run, Action::B);

        // Running the exact same sequence again must produce the same winner.
        let (tx2, mut rx2) = mpsc::unbounded_channel();
        let mut agg2 = VoteAggregator::new(5, tx2);
        agg2.add_vote(vote(0, Action::A, 1)).unwrap();
        agg2.add_vote(vote(1, Action::B, 2)).unwrap();
        agg2.on_block(5, Some(hash));
        let second_run = rx2.try_recv().unwrap().winner;

        assert_eq!(first_run, second_run);
    }

    #[test]
    fn empty_window_skipped_scenario() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut agg = VoteAggregator::new(5, tx);

        agg.on_block(10, None);

        assert!(rx.try_recv().is_err());
        assert_eq!(agg.current_window(), Some(2));
    }

    #[test]
    fn late_vote_is_rejected() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut agg = VoteAggregator::new(5, tx);

        agg.add_vote(vote(0, Action::Up, 1)).unwrap();
        agg.on_block(5, None);
        let _ = rx.try_recv().unwrap();

        let result = agg.add_vote(vote(1, Action::Down, 2));
        assert!(matches!(result, Err(AggregatorError::LateVote { .. })));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn duplicate_vote_is_idempotent() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut agg = VoteAggregator::new(5, tx);

        let v = vote(0, Action::Up, 1);
        agg.add_vote(v).unwrap();
        agg.add_vote(v).unwrap();
        agg.on_block(5, None);

        let result = rx.try_recv().unwrap();
        assert_eq!(result.total_votes, 1);
    }

    #[test]
    fn stale_on_block_is_a_noop() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut agg = VoteAggregator::new(5, tx);

        agg.add_vote(vote(0, Action::Up, 1)).unwrap();
        agg.on_block(10, None);
        let _ = rx.try_recv().unwrap();
        assert_eq!(agg.current_window(), Some(2));

        agg.on_block(5, None);
        assert_eq!(agg.current_window(), Some(2));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn monotone_window_ids_across_results() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut agg = VoteAggregator::new(5, tx);

        agg.add_vote(vote(0, Action::Up, 1)).unwrap();
        agg.add_vote(vote(11, Action::Down, 2)).unwrap();
        agg.on_block(16, None);

        let first = rx.try_recv().unwrap();
        let second = rx.try_recv().unwrap();
        assert!(first.window_id < second.window_id);
    }
}
