//! The black-box emulator interface consumed by the driver (§6).

use crate::error::Result;

/// The emulator's console surface, as a trait so the driver is testable
/// without a real emulator core linked in.
pub trait EmulatorCore: Send {
    /// Load a ROM image, optionally seeding battery RAM.
    fn load_rom(&mut self, rom: &[u8], save_ram: Option<&[u8]>) -> Result<()>;

    /// Advance emulation by exactly one frame.
    fn advance_one_frame(&mut self);

    /// Current framebuffer, RGBA8, `width * height * 4` bytes.
    fn get_screen(&self) -> Vec<u8>;

    /// Inject a single button press for the current frame.
    fn press_key(&mut self, code: u8);

    /// Read the cartridge's persistent (battery) RAM.
    fn get_save_ram(&self) -> Vec<u8>;

    /// Serialize the entire emulator state (CPU registers + memory).
    fn save_full_state(&self) -> Vec<u8>;

    /// Restore a previously serialized full state.
    fn restore_full_state(&mut self, data: &[u8]) -> Result<()>;

    /// Read the emulator's addressable memory, for game-state readout.
    fn get_memory(&self) -> Vec<u8>;
}

#[cfg(test)]
pub mod mock {
    use super::*;

    /// An in-memory [`EmulatorCore`] double for driver tests.
    pub struct MockEmulatorCore {
        pub memory: Vec<u8>,
        pub frames_advanced: u32,
        pub keys_pressed: Vec<u8>,
        pub loaded_rom: Option<Vec<u8>>,
        pub save_ram: Vec<u8>,
        pub restore_should_fail: bool,
    }

    impl MockEmulatorCore {
        pub fn new(memory_size: usize) -> Self {
            Self {
                memory: vec![0; memory_size],
                frames_advanced: 0,
                keys_pressed: Vec::new(),
                loaded_rom: None,
                save_ram: Vec::new(),
                restore_should_fail: false,
            }
        }
    }

    impl EmulatorCore for MockEmulatorCore {
        fn load_rom(&mut self, rom: &[u8], save_ram: Option<&[u8]>) -> Result<()> {
            self.loaded_rom = Some(rom.to_vec());
            if let Some(ram) = save_ram {
                self.save_ram = ram.to_vec();
            }
            Ok(())
        }

        fn advance_one_frame(&mut self) {
            self.frames_advanced += 1;
        }

        fn get_screen(&self) -> Vec<u8> {
            vec![0; (arcade_types::SCREEN_WIDTH * arcade_types::SCREEN_HEIGHT * 4) as usize]
        }

        fn press_key(&mut self, code: u8) {
            self.keys_pressed.push(code);
        }

        fn get_save_ram(&self) -> Vec<u8> {
            self.save_ram.clone()
        }

        fn save_full_state(&self) -> Vec<u8> {
            self.memory.clone()
        }

        fn restore_full_state(&mut self, data: &[u8]) -> Result<()> {
            if self.restore_should_fail {
                return Err(crate::error::EmulatorError::SaveLoad("mock failure".into()));
            }
            self.memory = data.to_vec();
            Ok(())
        }

        fn get_memory(&self) -> Vec<u8> {
            self.memory.clone()
        }
    }
}
