//! Fixed-offset memory readout: decodes raw emulator memory into a
//! [`arcade_types::GameState`].

use arcade_types::game_state::{decode_bcd_money, decode_be16};
use arcade_types::{Badges, GameState, PartySlot, PlayerPosition, SpeciesTable};
use std::collections::HashMap;

const MAX_PARTY_SIZE: usize = 6;

/// Fixed memory offsets the readout decodes from. Concrete values are a
/// deployment detail (the actual ROM's memory map); these are the
/// well-known addresses for the supported title.
#[derive(Debug, Clone, Copy)]
pub struct MemoryLayout {
    pub map_id: usize,
    pub badge_bitmap: usize,
    pub player_x: usize,
    pub player_y: usize,
    pub party_count: usize,
    /// Base offset of the species byte for party slot 0; each subsequent
    /// slot is `species_base + slot`.
    pub party_species_base: usize,
    /// Base offset of each party slot's stat block; slots are
    /// `stride` bytes apart.
    pub party_stats_base: usize,
    pub party_stats_stride: usize,
    pub stat_current_hp_offset: usize,
    pub stat_max_hp_offset: usize,
    pub stat_level_offset: usize,
    pub money: usize,
}

impl Default for MemoryLayout {
    fn default() -> Self {
        Self {
            map_id: 0xD35E,
            badge_bitmap: 0xD356,
            player_x: 0xD362,
            player_y: 0xD361,
            party_count: 0xD163,
            party_species_base: 0xD164,
            party_stats_base: 0xD16B,
            party_stats_stride: 44,
            stat_current_hp_offset: 0x1,
            stat_max_hp_offset: 0x22,
            stat_level_offset: 0x21,
            money: 0xD347,
        }
    }
}

fn read_u8(memory: &[u8], offset: usize) -> u8 {
    memory.get(offset).copied().unwrap_or(0)
}

fn read_be16(memory: &[u8], offset: usize) -> u16 {
    let hi = read_u8(memory, offset);
    let lo = read_u8(memory, offset + 1);
    decode_be16([hi, lo])
}

/// Decode a full [`GameState`] snapshot from raw memory.
pub fn read_game_state(
    memory: &[u8],
    layout: &MemoryLayout,
    species_table: &SpeciesTable,
    location_names: &HashMap<u8, String>,
) -> GameState {
    let map_id = read_u8(memory, layout.map_id);
    let location = location_names
        .get(&map_id)
        .cloned()
        .unwrap_or_else(|| format!("Unknown Area 0x{map_id:02x}"));

    let badges = Badges::from_bitmap(read_u8(memory, layout.badge_bitmap));
    let position = PlayerPosition {
        x: read_u8(memory, layout.player_x),
        y: read_u8(memory, layout.player_y),
    };

    let party_count = (read_u8(memory, layout.party_count) as usize).min(MAX_PARTY_SIZE);
    let mut party = Vec::with_capacity(party_count);
    for slot in 0..party_count {
        let species = species_table.lookup(read_u8(memory, layout.party_species_base + slot));
        let stats_base = layout.party_stats_base + slot * layout.party_stats_stride;
        let current_hp = read_be16(memory, stats_base + layout.stat_current_hp_offset);
        let max_hp = read_be16(memory, stats_base + layout.stat_max_hp_offset);
        let level = read_u8(memory, stats_base + layout.stat_level_offset);
        party.push(PartySlot {
            species,
            current_hp,
            max_hp,
            level,
        });
    }

    let money_bytes = [
        read_u8(memory, layout.money),
        read_u8(memory, layout.money + 1),
        read_u8(memory, layout.money + 2),
    ];
    let money = decode_bcd_money(money_bytes);

    GameState {
        location,
        badges,
        position,
        party,
        money,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_a_minimal_snapshot() {
        let layout = MemoryLayout::default();
        let mut memory = vec![0u8; 0x10000];
        memory[layout.map_id] = 1;
        memory[layout.badge_bitmap] = 0b0000_0011;
        memory[layout.player_x] = 5;
        memory[layout.player_y] = 6;
        memory[layout.party_count] = 1;
        memory[layout.party_species_base] = 9;
        let stats_base = layout.party_stats_base;
        memory[stats_base + layout.stat_current_hp_offset] = 0x00;
        memory[stats_base + layout.stat_current_hp_offset + 1] = 20;
        memory[stats_base + layout.stat_max_hp_offset] = 0x00;
        memory[stats_base + layout.stat_max_hp_offset + 1] = 25;
        memory[stats_base + layout.stat_level_offset] = 5;
        memory[layout.money] = 0x01;
        memory[layout.money + 1] = 0x23;
        memory[layout.money + 2] = 0x45;

        let mut locations = HashMap::new();
        locations.insert(1, "Pallet Town".to_string());

        let state = read_game_state(&memory, &layout, &SpeciesTable::empty(), &locations);

        assert_eq!(state.location, "Pallet Town");
        assert_eq!(state.badges.count, 2);
        assert_eq!(state.position, PlayerPosition { x: 5, y: 6 });
        assert_eq!(state.party.len(), 1);
        assert_eq!(state.party[0].current_hp, 20);
        assert_eq!(state.party[0].max_hp, 25);
        assert_eq!(state.party[0].level, 5);
        assert_eq!(state.money, 12345);
    }

    #[test]
    fn unknown_map_id_falls_back_to_placeholder_name() {
        let layout = MemoryLayout::default();
        let memory = vec![0u8; 0x10000];
        let state = read_game_state(&memory, &layout, &SpeciesTable::empty(), &HashMap::new());
        assert!(state.location.starts_with("Unknown Area"));
    }
}
