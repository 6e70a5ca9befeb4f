//! ROM acquisition: download over HTTPS on first run, honoring one level
//! of redirect.

use crate::error::{EmulatorError, Result};
use std::path::Path;

/// Ensure a ROM exists at `rom_path`, downloading it from `rom_url` if
/// absent. Returns the ROM's bytes either way.
pub async fn ensure_rom(rom_path: &Path, rom_url: &str) -> Result<Vec<u8>> {
    if let Ok(bytes) = tokio::fs::read(rom_path).await {
        tracing::info!(path = %rom_path.display(), "ROM already present");
        return Ok(bytes);
    }

    tracing::info!(url = rom_url, "downloading ROM");
    let client = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::limited(1))
        .build()
        .map_err(|e| EmulatorError::RomAcquisition(e.to_string()))?;

    let response = client
        .get(rom_url)
        .send()
        .await
        .map_err(|e| EmulatorError::RomAcquisition(e.to_string()))?
        .error_for_status()
        .map_err(|e| EmulatorError::RomAcquisition(e.to_string()))?;

    let bytes = response
        .bytes()
        .await
        .map_err(|e| EmulatorError::RomAcquisition(e.to_string()))?;

    if let Some(parent) = rom_path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| EmulatorError::RomAcquisition(e.to_string()))?;
    }
    tokio::fs::write(rom_path, &bytes)
        .await
        .map_err(|e| EmulatorError::RomAcquisition(e.to_string()))?;

    Ok(bytes.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reads_existing_rom_without_network() {
        let dir = tempfile::tempdir().unwrap();
        let rom_path = dir.path().join("game.rom");
        tokio::fs::write(&rom_path, b"fake-rom-bytes").await.unwrap();

        let bytes = ensure_rom(&rom_path, "http://example.invalid/should-not-be-hit")
            .await
            .unwrap();
        assert_eq!(bytes, b"fake-rom-bytes");
    }
}
