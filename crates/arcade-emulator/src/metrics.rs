//! Prometheus metrics for the emulator driver.

use prometheus_client::metrics::counter::Counter;
use prometheus_client::registry::Registry;

/// Counters for the driver's three cadences (§148 T3/T4/T5).
#[derive(Debug, Clone, Default)]
pub struct EmulatorMetrics {
    /// Frames advanced by the frame clock.
    pub frames_advanced: Counter,
    /// Button presses injected.
    pub button_presses: Counter,
    /// Game-state samples that differed from the previous sample and were emitted.
    pub game_state_changes: Counter,
    /// Successful save flushes (autosave or shutdown).
    pub save_flushes: Counter,
    /// Save flushes that failed and were logged (§7: not fatal).
    pub save_flush_failures: Counter,
}

impl EmulatorMetrics {
    /// Register this component's metrics into `registry` under the
    /// `emulator` prefix, returning the live handle to update.
    pub fn new_registered(registry: &mut Registry) -> Self {
        let metrics = Self::default();
        let mut sub = registry.sub_registry_with_prefix("emulator");

        sub.register(
            "frames_advanced",
            "Frames advanced by the emulator clock",
            metrics.frames_advanced.clone(),
        );
        sub.register(
            "button_presses",
            "Button presses injected into the emulator",
            metrics.button_presses.clone(),
        );
        sub.register(
            "game_state_changes",
            "Game-state samples that changed and were broadcast",
            metrics.game_state_changes.clone(),
        );
        sub.register(
            "save_flushes",
            "Successful save flushes",
            metrics.save_flushes.clone(),
        );
        sub.register(
            "save_flush_failures",
            "Save flushes that failed (logged, not fatal)",
            metrics.save_flush_failures.clone(),
        );

        metrics
    }
}
