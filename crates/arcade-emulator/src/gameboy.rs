//! The real [`EmulatorCore`] backend: a Game Boy core built on `boytacean`.
//!
//! This is the one concrete implementation of the black-box interface
//! described in the external-interfaces section; everything else in the
//! crate (driver, memory readout, persistence) is written against the
//! trait, not against this module.

use crate::core::EmulatorCore;
use crate::error::{EmulatorError, Result};
use boytacean::gb::{GameBoy, GameBoyMode};
use boytacean::pad::PadKey;

fn map_key(code: u8) -> Option<PadKey> {
    match code {
        0 => Some(PadKey::Up),
        1 => Some(PadKey::Down),
        2 => Some(PadKey::Left),
        3 => Some(PadKey::Right),
        4 => Some(PadKey::A),
        5 => Some(PadKey::B),
        6 => Some(PadKey::Start),
        7 => Some(PadKey::Select),
        _ => None,
    }
}

/// A running Game Boy instance.
pub struct GameBoyCore {
    gb: GameBoy,
    held_key: Option<PadKey>,
}

impl GameBoyCore {
    /// Construct a core in DMG-compatible mode, before any ROM is loaded.
    pub fn new() -> Self {
        let mut gb = GameBoy::new(Some(GameBoyMode::Dmg));
        gb.reset();
        Self {
            gb,
            held_key: None,
        }
    }
}

impl Default for GameBoyCore {
    fn default() -> Self {
        Self::new()
    }
}

impl EmulatorCore for GameBoyCore {
    fn load_rom(&mut self, rom: &[u8], save_ram: Option<&[u8]>) -> Result<()> {
        self.gb
            .load_cartridge_rom(rom)
            .map_err(|e| EmulatorError::Backend(e.to_string()))?;
        if let Some(ram) = save_ram {
            self.gb.set_cartridge_ram(ram.to_vec());
        }
        Ok(())
    }

    fn advance_one_frame(&mut self) {
        let key = self.held_key.take();
        if let Some(key) = key {
            self.gb.key_press(key);
        }
        self.gb.next_frame();
        if let Some(key) = key {
            self.gb.key_lift(key);
        }
    }

    fn get_screen(&self) -> Vec<u8> {
        self.gb.frame_buffer_rgba()
    }

    fn press_key(&mut self, code: u8) {
        self.held_key = map_key(code);
    }

    fn get_save_ram(&self) -> Vec<u8> {
        self.gb.cartridge_ram()
    }

    fn save_full_state(&self) -> Vec<u8> {
        self.gb.state_save()
    }

    fn restore_full_state(&mut self, data: &[u8]) -> Result<()> {
        self.gb
            .state_load(data)
            .map_err(|e| EmulatorError::Backend(e.to_string()))
    }

    fn get_memory(&self) -> Vec<u8> {
        self.gb.memory_snapshot()
    }
}
