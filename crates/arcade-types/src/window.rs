//! Window bounds, tallying, and the deterministic tie-break rule.

use crate::action::{Action, ALL_ACTIONS};
use crate::vote::TxHash;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The logical block range tallied as one unit: `windowId = floor(block / W)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    /// The window's identity.
    pub window_id: u64,
    /// Inclusive first block.
    pub start_block: u64,
    /// Inclusive last block.
    pub end_block: u64,
}

impl Window {
    /// Compute the window a given block belongs to.
    pub fn containing(block: u64, window_size: u64) -> Self {
        let window_id = block / window_size;
        Self::for_id(window_id, window_size)
    }

    /// Compute the bounds of a window by id.
    pub fn for_id(window_id: u64, window_size: u64) -> Self {
        Self {
            window_id,
            start_block: window_id * window_size,
            end_block: (window_id + 1) * window_size - 1,
        }
    }

    /// Whether `block` is within this window's bounds.
    pub fn contains(&self, block: u64) -> bool {
        (self.start_block..=self.end_block).contains(&block)
    }
}

/// The elected outcome of one finalized window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowResult {
    /// The window that was finalized.
    pub window_id: u64,
    /// Inclusive first block of the window.
    pub start_block: u64,
    /// Inclusive last block of the window.
    pub end_block: u64,
    /// Per-action vote counts; all 8 actions are present (possibly at 0).
    pub tallies: HashMap<Action, u32>,
    /// The elected action.
    pub winner: Action,
    /// The transaction hash of the first-seen vote for the winning action.
    pub winner_tx_hash: Option<TxHash>,
    /// Total votes counted in this window.
    pub total_votes: u32,
    /// The prior block hash used to break ties, if any.
    pub seed_hash: Option<[u8; 32]>,
}

/// Reduce a window's tallies to the set of actions tied for the highest count.
fn tied_actions(tallies: &HashMap<Action, u32>) -> Vec<Action> {
    let max = tallies.values().copied().max().unwrap_or(0);
    let mut tied: Vec<Action> = ALL_ACTIONS
        .into_iter()
        .filter(|a| tallies.get(a).copied().unwrap_or(0) == max)
        .collect();
    tied.sort_by_key(|a| a.to_code());
    tied
}

/// Pick a winner among tied actions.
///
/// Folds the last 8 bytes of `seed_hash` into a `u64`, XORs in the
/// window id, and reduces mod the number of tied actions. Falls back to
/// the first action in canonical enum order when no seed hash is
/// available (no prior block observed yet).
pub fn break_tie(seed_hash: Option<[u8; 32]>, window_id: u64, tied: &[Action]) -> Action {
    assert!(!tied.is_empty(), "break_tie requires at least one candidate");
    if tied.len() == 1 {
        return tied[0];
    }
    let Some(hash) = seed_hash else {
        return tied[0];
    };

    let mut tail = [0u8; 8];
    tail.copy_from_slice(&hash[24..32]);
    let hash_as_u64 = u64::from_be_bytes(tail);

    let index = (hash_as_u64 ^ window_id) % tied.len() as u64;
    tied[index as usize]
}

/// Tally a window's votes and elect a winner, per §4.2.
///
/// Returns `None` for an empty window (no votes): empty windows are
/// skipped and emit no result.
pub fn elect(
    window: Window,
    votes: &[(Action, TxHash)],
    seed_hash: Option<[u8; 32]>,
) -> Option<WindowResult> {
    if votes.is_empty() {
        return None;
    }

    let mut tallies: HashMap<Action, u32> = ALL_ACTIONS.into_iter().map(|a| (a, 0u32)).collect();
    let mut first_tx: HashMap<Action, TxHash> = HashMap::new();
    for (action, tx_hash) in votes {
        *tallies.get_mut(action).unwrap() += 1;
        first_tx.entry(*action).or_insert(*tx_hash);
    }

    let tied = tied_actions(&tallies);
    let winner = break_tie(seed_hash, window.window_id, &tied);

    Some(WindowResult {
        window_id: window.window_id,
        start_block: window.start_block,
        end_block: window.end_block,
        tallies,
        winner,
        winner_tx_hash: first_tx.get(&winner).copied(),
        total_votes: votes.len() as u32,
        seed_hash,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_bounds_match_spec_formula() {
        let w = Window::containing(7, 5);
        assert_eq!(w.window_id, 1);
        assert_eq!(w.start_block, 5);
        assert_eq!(w.end_block, 9);
    }

    #[test]
    fn clean_window_scenario() {
        let votes = vec![
            (Action::Up, TxHash([1; 32])),
            (Action::Up, TxHash([2; 32])),
            (Action::Down, TxHash([3; 32])),
            (Action::Up, TxHash([4; 32])),
        ];
        let window = Window::for_id(0, 5);
        let result = elect(window, &votes, None).unwrap();
        assert_eq!(result.winner, Action::Up);
        assert_eq!(result.total_votes, 4);
        assert_eq!(result.tallies[&Action::Up], 3);
        assert_eq!(result.tallies[&Action::Down], 1);
        assert_eq!(result.start_block, 0);
        assert_eq!(result.end_block, 4);
    }

    #[test]
    fn tie_broken_by_hash_scenario() {
        let votes = vec![(Action::A, TxHash([1; 32])), (Action::B, TxHash([2; 32]))];
        let mut hash = [0u8; 32];
        hash[31] = 0x01;
        let window = Window::for_id(0, 5);
        let result = elect(window, &votes, Some(hash)).unwrap();
        assert_eq!(result.winner, Action::B);

        // determinism: running twice yields the same winner
        let result2 = elect(window, &votes, Some(hash)).unwrap();
        assert_eq!(result.winner, result2.winner);
    }

    #[test]
    fn empty_window_yields_no_result() {
        let window = Window::for_id(2, 5);
        assert!(elect(window, &[], None).is_none());
    }

    #[test]
    fn single_candidate_skips_hashing() {
        assert_eq!(break_tie(None, 0, &[Action::Select]), Action::Select);
    }
}
