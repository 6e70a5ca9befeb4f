//! Save-state lifecycle: full-state JSON preferred, battery-RAM fallback,
//! fresh start as a last resort.

use crate::core::EmulatorCore;
use crate::error::{EmulatorError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The two well-known save file paths for a save directory (§6).
#[derive(Debug, Clone)]
pub struct SavePaths {
    /// `<saveDir>/pokemon-red.state`: JSON full state, preferred on load.
    pub state_path: PathBuf,
    /// `<saveDir>/pokemon-red.sav`: raw battery RAM.
    pub sav_path: PathBuf,
}

impl SavePaths {
    /// Derive the standard paths from a save directory.
    pub fn for_dir(save_dir: &Path) -> Self {
        Self {
            state_path: save_dir.join("pokemon-red.state"),
            sav_path: save_dir.join("pokemon-red.sav"),
        }
    }
}

#[derive(Serialize, Deserialize)]
struct FullStateFile {
    data: Vec<u8>,
}

/// Load the emulator's starting state, in preference order: full state,
/// then battery RAM, then fresh. Returns which tier was used, for logging.
pub fn load_on_init<E: EmulatorCore>(
    core: &mut E,
    rom: &[u8],
    paths: &SavePaths,
) -> Result<&'static str> {
    if let Ok(raw) = std::fs::read(&paths.state_path) {
        match serde_json::from_slice::<FullStateFile>(&raw) {
            Ok(full_state) => {
                core.load_rom(rom, None)?;
                if core.restore_full_state(&full_state.data).is_ok() {
                    return Ok("full_state");
                }
                tracing::warn!("full state restore failed, falling back");
            }
            Err(e) => tracing::warn!(error = %e, "full state file unreadable, falling back"),
        }
    }

    if let Ok(save_ram) = std::fs::read(&paths.sav_path) {
        core.load_rom(rom, Some(&save_ram))?;
        return Ok("battery_ram");
    }

    core.load_rom(rom, None)?;
    Ok("fresh")
}

/// Serialize and flush both the full state and the battery-RAM backup.
/// Failures here are logged but not propagated as fatal (§7: "not fatal").
pub fn flush_save<E: EmulatorCore>(core: &E, paths: &SavePaths) -> Result<()> {
    let full_state = FullStateFile {
        data: core.save_full_state(),
    };
    let json = serde_json::to_vec(&full_state)
        .map_err(|e| EmulatorError::SaveFlush(std::io::Error::new(std::io::ErrorKind::Other, e)))?;
    std::fs::write(&paths.state_path, json).map_err(EmulatorError::SaveFlush)?;
    std::fs::write(&paths.sav_path, core.get_save_ram()).map_err(EmulatorError::SaveFlush)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::mock::MockEmulatorCore;

    #[test]
    fn fresh_start_when_nothing_saved() {
        let dir = tempfile::tempdir().unwrap();
        let paths = SavePaths::for_dir(dir.path());
        let mut core = MockEmulatorCore::new(16);

        let tier = load_on_init(&mut core, b"rom", &paths).unwrap();
        assert_eq!(tier, "fresh");
        assert_eq!(core.loaded_rom.as_deref(), Some(b"rom".as_slice()));
    }

    #[test]
    fn full_state_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let paths = SavePaths::for_dir(dir.path());
        let mut core = MockEmulatorCore::new(16);
        core.memory = vec![7; 16];

        flush_save(&core, &paths).unwrap();

        let mut restored = MockEmulatorCore::new(16);
        let tier = load_on_init(&mut restored, b"rom", &paths).unwrap();
        assert_eq!(tier, "full_state");
        assert_eq!(restored.get_memory(), vec![7; 16]);
    }

    #[test]
    fn falls_back_to_battery_ram_when_state_missing() {
        let dir = tempfile::tempdir().unwrap();
        let paths = SavePaths::for_dir(dir.path());
        std::fs::write(&paths.sav_path, vec![9; 8]).unwrap();

        let mut core = MockEmulatorCore::new(16);
        let tier = load_on_init(&mut core, b"rom", &paths).unwrap();
        assert_eq!(tier, "battery_ram");
        assert_eq!(core.save_ram, vec![9; 8]);
    }

    #[test]
    fn falls_back_past_a_corrupt_state_file() {
        let dir = tempfile::tempdir().unwrap();
        let paths = SavePaths::for_dir(dir.path());
        std::fs::write(&paths.state_path, b"not json").unwrap();
        std::fs::write(&paths.sav_path, vec![3; 4]).unwrap();

        let mut core = MockEmulatorCore::new(16);
        let tier = load_on_init(&mut core, b"rom", &paths).unwrap();
        assert_eq!(tier, "battery_ram");
    }
}
