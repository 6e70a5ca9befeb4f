//! The shared dedup set absorbing duplicates between the subscription and
//! polling paths.

use arcade_types::VoteId;
use std::collections::HashMap;

/// Tracks every accepted vote's identity key, with periodic eviction of
/// entries old enough that they can no longer recur.
#[derive(Debug, Default)]
pub struct DedupSet {
    /// Maps a vote's identity to the window it belonged to, so eviction
    /// can drop entries from windows that have aged out.
    seen: HashMap<VoteId, u64>,
}

impl DedupSet {
    /// An empty dedup set.
    pub fn new() -> Self {
        Self {
            seen: HashMap::new(),
        }
    }

    /// Record a vote's identity for the given window.
    ///
    /// Returns `true` if this is the first time the identity has been
    /// seen (the caller should emit the vote); `false` if it's a
    /// duplicate (the caller must silently drop it).
    pub fn insert(&mut self, id: VoteId, window_id: u64) -> bool {
        match self.seen.entry(id) {
            std::collections::hash_map::Entry::Occupied(_) => false,
            std::collections::hash_map::Entry::Vacant(slot) => {
                slot.insert(window_id);
                true
            }
        }
    }

    /// Whether an identity has already been recorded.
    pub fn contains(&self, id: &VoteId) -> bool {
        self.seen.contains_key(id)
    }

    /// Evict entries belonging to windows older than `current_window - 2`.
    pub fn evict_before(&mut self, current_window: u64) {
        let floor = current_window.saturating_sub(2);
        self.seen.retain(|_, window_id| *window_id >= floor);
    }

    /// Current number of tracked identities.
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arcade_types::TxHash;

    fn id(block: u64, idx: u32) -> VoteId {
        (block, TxHash([block as u8; 32]), idx)
    }

    #[test]
    fn first_insert_accepts_second_rejects() {
        let mut set = DedupSet::new();
        assert!(set.insert(id(7, 0), 1));
        assert!(!set.insert(id(7, 0), 1));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn eviction_drops_only_old_windows() {
        let mut set = DedupSet::new();
        set.insert(id(0, 0), 0);
        set.insert(id(5, 0), 1);
        set.insert(id(10, 0), 2);

        set.evict_before(3);
        // floor = 3 - 2 = 1; window 0 is evicted, windows 1 and 2 survive.
        assert!(!set.contains(&id(0, 0)));
        assert!(set.contains(&id(5, 0)));
        assert!(set.contains(&id(10, 0)));
    }

    #[test]
    fn eviction_is_a_noop_before_window_two() {
        let mut set = DedupSet::new();
        set.insert(id(0, 0), 0);
        set.evict_before(1);
        assert!(set.contains(&id(0, 0)));
    }
}
