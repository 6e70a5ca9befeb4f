//! Emulator driver: owns the console, the frame clock, button injection,
//! save-state lifecycle, and game-state readout.

pub mod core;
pub mod driver;
pub mod error;
pub mod gameboy;
pub mod memory;
pub mod metrics;
pub mod persistence;
pub mod rom;

pub use core::EmulatorCore;
pub use driver::{DriverConfig, EmulatorHandle};
pub use error::{EmulatorError, Result};
pub use gameboy::GameBoyCore;
pub use memory::MemoryLayout;
pub use metrics::EmulatorMetrics;
pub use persistence::SavePaths;
