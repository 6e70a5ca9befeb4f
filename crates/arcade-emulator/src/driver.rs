//! The emulator driver: owns the console, runs the frame clock, injects
//! buttons, and samples game state — all from a single task so the
//! non-reentrant emulator API is never touched concurrently (§5).

use crate::core::EmulatorCore;
use crate::memory::{read_game_state, MemoryLayout};
use crate::metrics::EmulatorMetrics;
use crate::persistence::{flush_save, SavePaths};
use arcade_types::{Action, GameState, RawFrame, SpeciesTable};
use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::{broadcast, mpsc};

/// Tunables for the driver's three cadences.
#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// Frame clock rate.
    pub fps: u32,
    /// Game-state sampling cadence.
    pub game_state_interval_ms: u64,
    /// Autosave cadence.
    pub autosave_interval_ms: u64,
    /// Default button-press duration, in frames.
    pub default_press_frames: u32,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            fps: 60,
            game_state_interval_ms: 2_000,
            autosave_interval_ms: 60_000,
            default_press_frames: 5,
        }
    }
}

impl DriverConfig {
    fn frame_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis((1000 / self.fps.max(1)) as u64)
    }
}

struct PressRequest {
    code: u8,
    duration_frames: u32,
}

/// A handle callers use to inject button presses into a running driver.
#[derive(Clone)]
pub struct EmulatorHandle {
    press_tx: mpsc::UnboundedSender<PressRequest>,
}

impl EmulatorHandle {
    /// Press a button for `duration` frames (default from [`DriverConfig`]
    /// if `None`). Overwrites any still-pending press (§4.3).
    pub fn press_button(&self, action: Action, duration: Option<u32>) {
        let _ = self.press_tx.send(PressRequest {
            code: action.to_code(),
            duration_frames: duration.unwrap_or(0),
        });
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Spawn the driver's task. Returns a handle for button injection plus
/// the frame and game-state output channels.
pub fn spawn<E>(
    core: E,
    save_paths: SavePaths,
    species_table: SpeciesTable,
    location_names: HashMap<u8, String>,
    memory_layout: MemoryLayout,
    config: DriverConfig,
    shutdown: broadcast::Receiver<()>,
) -> (
    EmulatorHandle,
    mpsc::UnboundedReceiver<RawFrame>,
    mpsc::UnboundedReceiver<GameState>,
    tokio::task::JoinHandle<()>,
)
where
    E: EmulatorCore + Send + 'static,
{
    spawn_with_metrics(
        core,
        save_paths,
        species_table,
        location_names,
        memory_layout,
        config,
        shutdown,
        EmulatorMetrics::default(),
    )
}

/// Like [`spawn`], but records business metrics via `metrics`, typically
/// built with [`EmulatorMetrics::new_registered`].
pub fn spawn_with_metrics<E>(
    mut core: E,
    save_paths: SavePaths,
    species_table: SpeciesTable,
    location_names: HashMap<u8, String>,
    memory_layout: MemoryLayout,
    config: DriverConfig,
    mut shutdown: broadcast::Receiver<()>,
    metrics: EmulatorMetrics,
) -> (
    EmulatorHandle,
    mpsc::UnboundedReceiver<RawFrame>,
    mpsc::UnboundedReceiver<GameState>,
    tokio::task::JoinHandle<()>,
)
where
    E: EmulatorCore + Send + 'static,
{
    let (press_tx, mut press_rx) = mpsc::unbounded_channel::<PressRequest>();
    let (frame_tx, frame_rx) = mpsc::unbounded_channel::<RawFrame>();
    let (state_tx, state_rx) = mpsc::unbounded_channel::<GameState>();

    let handle = tokio::spawn(async move {
        let mut frame_ticker = tokio::time::interval(config.frame_interval());
        let mut game_state_ticker =
            tokio::time::interval(std::time::Duration::from_millis(config.game_state_interval_ms));
        let mut autosave_ticker =
            tokio::time::interval(std::time::Duration::from_millis(config.autosave_interval_ms));

        let mut pending_button: Option<u8> = None;
        let mut frames_remaining: u32 = 0;
        let mut last_state: Option<GameState> = None;

        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    match flush_save(&core, &save_paths) {
                        Ok(()) => metrics.save_flushes.inc(),
                        Err(e) => {
                            metrics.save_flush_failures.inc();
                            tracing::warn!(error = %e, "save flush on shutdown failed");
                        }
                    }
                    return;
                }
                _ = frame_ticker.tick() => {
                    if frames_remaining > 0 {
                        if let Some(code) = pending_button {
                            core.press_key(code);
                        }
                        frames_remaining -= 1;
                        if frames_remaining == 0 {
                            pending_button = None;
                        }
                    }
                    core.advance_one_frame();
                    metrics.frames_advanced.inc();
                    let frame = RawFrame::new(core.get_screen(), now_ms());
                    if frame_tx.send(frame).is_err() {
                        return;
                    }
                }
                _ = game_state_ticker.tick() => {
                    let state = read_game_state(&core.get_memory(), &memory_layout, &species_table, &location_names);
                    let changed = match &last_state {
                        Some(previous) => state.differs_from(previous),
                        None => true,
                    };
                    if changed {
                        last_state = Some(state.clone());
                        metrics.game_state_changes.inc();
                        if state_tx.send(state).is_err() {
                            return;
                        }
                    }
                }
                _ = autosave_ticker.tick() => {
                    match flush_save(&core, &save_paths) {
                        Ok(()) => metrics.save_flushes.inc(),
                        Err(e) => {
                            metrics.save_flush_failures.inc();
                            tracing::warn!(error = %e, "autosave failed, will retry next tick");
                        }
                    }
                }
                press = press_rx.recv() => {
                    match press {
                        Some(request) => {
                            metrics.button_presses.inc();
                            pending_button = Some(request.code);
                            frames_remaining = if request.duration_frames == 0 {
                                config.default_press_frames
                            } else {
                                request.duration_frames
                            };
                        }
                        None => return,
                    }
                }
            }
        }
    });

    (EmulatorHandle { press_tx }, frame_rx, state_rx, handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::mock::MockEmulatorCore;

    #[tokio::test]
    async fn button_press_is_injected_and_cleared() {
        let core = MockEmulatorCore::new(0x10000);
        let dir = tempfile::tempdir().unwrap();
        let paths = SavePaths::for_dir(dir.path());
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let mut config = DriverConfig::default();
        config.fps = 1000; // fast ticks for the test
        config.game_state_interval_ms = 60_000;
        config.autosave_interval_ms = 60_000;

        let (handle, mut frames, _states, join) = spawn(
            core,
            paths,
            SpeciesTable::empty(),
            HashMap::new(),
            MemoryLayout::default(),
            config,
            shutdown_rx,
        );

        handle.press_button(Action::A, Some(2));

        // Drain a handful of frames so the press has time to apply and clear.
        for _ in 0..5 {
            let _ = tokio::time::timeout(std::time::Duration::from_millis(200), frames.recv())
                .await
                .expect("frame");
        }

        let _ = shutdown_tx.send(());
        let _ = tokio::time::timeout(std::time::Duration::from_millis(500), join).await;
    }
}
