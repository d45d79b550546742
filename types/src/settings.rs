//! Engine settings
//!
//! Injected into the engine at call time rather than read from a global;
//! hosts that support live reload keep one behind a lock and clone per pass.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Merge every matched mapping's config/overlays in priority order
    /// instead of only the highest-priority one winning
    #[serde(default)]
    pub stack_configs: bool,

    /// Property path to the hit-point object on the actor, relative to the
    /// system data root (the synthetic `hp` comparator property resolves
    /// through `<hp_path>.value` / `<hp_path>.max`)
    #[serde(default = "default_hp_path")]
    pub hp_path: String,

    /// Contribute `hp++`/`hp--` pseudo-effects when a recent hit-point
    /// delta marker is present on the token
    #[serde(default)]
    pub highlight_hp_changes: bool,

    /// Debounce window for coalescing bursts of state-change events
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Suppress overlays targeting the screen-space UI layer
    #[serde(default)]
    pub disable_ui_overlays: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            stack_configs: false,
            hp_path: default_hp_path(),
            highlight_hp_changes: false,
            debounce_ms: default_debounce_ms(),
            disable_ui_overlays: false,
        }
    }
}

fn default_hp_path() -> String {
    "attributes.hp".to_string()
}

fn default_debounce_ms() -> u64 {
    100
}
