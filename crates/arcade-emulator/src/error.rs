//! Error types for the emulator driver.

use thiserror::Error;

/// Errors surfaced by the emulator driver.
#[derive(Debug, Error)]
pub enum EmulatorError {
    /// ROM could not be downloaded or read from disk.
    #[error("failed to acquire ROM: {0}")]
    RomAcquisition(String),

    /// Emulator instantiation or ROM load failed. This is fatal per §7:
    /// the process exits non-zero on init failure.
    #[error("emulator init failed: {0}")]
    Init(String),

    /// A save-state write failed. Not fatal; the next autosave tick retries.
    #[error("save flush failed: {0}")]
    SaveFlush(#[source] std::io::Error),

    /// A save-state read/deserialize failed during load.
    #[error("save state load failed: {0}")]
    SaveLoad(String),

    /// The underlying emulator backend rejected an operation (bad ROM,
    /// corrupt state blob, etc).
    #[error("emulator backend error: {0}")]
    Backend(String),
}

/// Result type for emulator-driver operations.
pub type Result<T> = std::result::Result<T, EmulatorError>;
