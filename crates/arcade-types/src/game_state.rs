//! Derived game-state snapshots read from emulator memory.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Badge bitmap plus the derived popcount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Badges {
    /// Raw badge bitmap as read from memory.
    pub bitmap: u8,
    /// Number of set bits in `bitmap`.
    pub count: u8,
}

impl Badges {
    /// Build from a raw bitmap byte.
    pub fn from_bitmap(bitmap: u8) -> Self {
        Self {
            bitmap,
            count: bitmap.count_ones() as u8,
        }
    }
}

/// A single party slot's battle-relevant stats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartySlot {
    /// Canonical species id (after table lookup).
    pub species: u16,
    /// Current HP.
    pub current_hp: u16,
    /// Max HP.
    pub max_hp: u16,
    /// Level.
    pub level: u8,
}

/// Player position on the current map, in tile coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerPosition {
    /// X tile coordinate.
    pub x: u8,
    /// Y tile coordinate.
    pub y: u8,
}

/// A derived snapshot of game state, refreshed on a fixed cadence and
/// broadcast only when semantically changed (see [`GameState::differs_from`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    /// Human-readable location name, resolved from the map id.
    pub location: String,
    /// Badge bitmap and count.
    pub badges: Badges,
    /// Player's position on the current map.
    pub position: PlayerPosition,
    /// Party members, in slot order.
    pub party: Vec<PartySlot>,
    /// Money, BCD-decoded into a plain decimal value.
    pub money: u32,
}

impl GameState {
    /// Whether `self` is semantically different from `previous`, per the
    /// change-detection rule: location, badge count, party count, money,
    /// or any per-slot HP differ.
    pub fn differs_from(&self, previous: &GameState) -> bool {
        if self.location != previous.location
            || self.badges.count != previous.badges.count
            || self.party.len() != previous.party.len()
            || self.money != previous.money
        {
            return true;
        }
        self.party
            .iter()
            .zip(previous.party.iter())
            .any(|(a, b)| a.current_hp != b.current_hp || a.max_hp != b.max_hp)
    }
}

/// Decode three big-endian BCD bytes into a 6-digit decimal value.
///
/// Each nibble is a decimal digit; e.g. `[0x01, 0x23, 0x45]` decodes to
/// `12345`.
pub fn decode_bcd_money(bytes: [u8; 3]) -> u32 {
    let mut value = 0u32;
    for byte in bytes {
        let hi = (byte >> 4) as u32;
        let lo = (byte & 0x0f) as u32;
        value = value * 100 + hi * 10 + lo;
    }
    value
}

/// Decode a big-endian 16-bit HP/stat value.
pub fn decode_be16(bytes: [u8; 2]) -> u16 {
    u16::from_be_bytes(bytes)
}

/// Maps internal (in-ROM) species indices to a stable canonical id.
///
/// Unmapped indices pass through unchanged; the table only needs to
/// carry entries whose internal ordering diverges from canonical id.
#[derive(Debug, Clone, Default)]
pub struct SpeciesTable(HashMap<u8, u16>);

impl SpeciesTable {
    /// An empty table: every lookup passes through unchanged.
    pub fn empty() -> Self {
        Self(HashMap::new())
    }

    /// Insert or override a mapping.
    pub fn insert(&mut self, internal_id: u8, canonical_id: u16) {
        self.0.insert(internal_id, canonical_id);
    }

    /// Resolve an internal species index to its canonical id.
    pub fn lookup(&self, internal_id: u8) -> u16 {
        self.0.get(&internal_id).copied().unwrap_or(internal_id as u16)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bcd_decodes_digit_by_digit() {
        assert_eq!(decode_bcd_money([0x01, 0x23, 0x45]), 12345);
        assert_eq!(decode_bcd_money([0x00, 0x00, 0x00]), 0);
        assert_eq!(decode_bcd_money([0x99, 0x99, 0x99]), 999999);
    }

    #[test]
    fn badges_count_set_bits() {
        assert_eq!(Badges::from_bitmap(0b0000_0111).count, 3);
        assert_eq!(Badges::from_bitmap(0).count, 0);
        assert_eq!(Badges::from_bitmap(0xff).count, 8);
    }

    #[test]
    fn species_table_passes_through_unmapped() {
        let table = SpeciesTable::empty();
        assert_eq!(table.lookup(42), 42);
    }

    #[test]
    fn species_table_honors_overrides() {
        let mut table = SpeciesTable::empty();
        table.insert(1, 112); // e.g. internal index 1 maps to a different dex id
        assert_eq!(table.lookup(1), 112);
        assert_eq!(table.lookup(2), 2);
    }

    fn slot(hp: u16, max_hp: u16) -> PartySlot {
        PartySlot {
            species: 1,
            current_hp: hp,
            max_hp,
            level: 5,
        }
    }

    fn base_state() -> GameState {
        GameState {
            location: "Pallet Town".into(),
            badges: Badges::from_bitmap(0),
            position: PlayerPosition { x: 0, y: 0 },
            party: vec![slot(20, 20)],
            money: 3000,
        }
    }

    #[test]
    fn identical_snapshots_do_not_differ() {
        let a = base_state();
        let b = base_state();
        assert!(!a.differs_from(&b));
    }

    #[test]
    fn hp_change_is_detected() {
        let a = base_state();
        let mut b = base_state();
        b.party[0].current_hp = 15;
        assert!(b.differs_from(&a));
    }

    #[test]
    fn location_change_is_detected() {
        let a = base_state();
        let mut b = base_state();
        b.location = "Viridian City".into();
        assert!(b.differs_from(&a));
    }

    #[test]
    fn position_only_change_does_not_count() {
        let a = base_state();
        let mut b = base_state();
        b.position = PlayerPosition { x: 5, y: 5 };
        assert!(!b.differs_from(&a));
    }
}
