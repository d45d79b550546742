//! Mapping definition types
//!
//! A mapping is a user-authored rule binding an effect-activation condition
//! (an expression over active effect names) to a visual outcome: an image,
//! per-field config overrides, and optionally an overlay node.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::overlay::OverlayConfig;

/// Reference to a token image: path plus display name.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ImageRef {
    /// Image path or wildcard pattern (e.g. `tokens/orc-*.png`)
    pub src: String,
    /// Display name shown in the host UI
    #[serde(default)]
    pub name: String,
}

impl ImageRef {
    pub fn new(src: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            name: name.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.src.is_empty()
    }

    /// Whether the source is a wildcard/randomized pattern rather than a
    /// fixed path.
    pub fn is_wildcard(&self) -> bool {
        self.src.contains('*') || self.src.contains('{')
    }
}

/// Script hook attached to a mapping's activation or deactivation.
///
/// Either an inline script body (executed by the host's sandboxed runner)
/// or a named preset, or both.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ScriptHook {
    /// Inline script source. A body containing the continuation marker is
    /// run as a deferred script that gates the visual update.
    pub script: Option<String>,

    /// Named preset to apply/remove alongside the script
    pub preset: Option<String>,
}

impl ScriptHook {
    pub fn is_empty(&self) -> bool {
        self.script.is_none() && self.preset.is_none()
    }
}

/// A user-authored rule binding an effect condition to a visual outcome.
///
/// Persisted as an ordered list, either per-token or in the global store.
/// Read fresh on every evaluation pass; no derived state is cached on it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mapping {
    /// Stable identifier (also usable as a pseudo-effect name for chaining)
    pub id: String,

    /// Human label. Legacy data leaves this empty and the expression text
    /// doubles as the label.
    #[serde(default)]
    pub label: String,

    /// Expression in the effect-expression language. A single bare effect
    /// name, a comparator (`hp<=50%`), or a boolean combination with
    /// `&&`/`||`/`\!`/`\(`/`\)`.
    #[serde(default)]
    pub expression: String,

    /// Evaluation priority. Higher wins when mappings conflict; ties break
    /// by recency of activation.
    #[serde(default = "default_priority")]
    pub priority: i32,

    // ─── Outcome ────────────────────────────────────────────────────────────
    /// Image applied when the mapping is active (may be empty or a wildcard
    /// pattern resolved by the host's image search)
    #[serde(default)]
    pub img_src: String,

    /// Display name for the applied image
    #[serde(default)]
    pub img_name: String,

    /// Opaque per-field property overrides applied to the token
    /// (e.g. tint, scale). Deep-merged under stacking mode.
    /// Null cannot be written as TOML, so it is skipped on save.
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub config: serde_json::Value,

    // ─── Activation ─────────────────────────────────────────────────────────
    /// Bypass expression evaluation; the mapping is always considered active
    #[serde(default)]
    pub always_on: bool,

    /// Disabled mappings are never evaluated
    #[serde(default)]
    pub disabled: bool,

    /// Supplementary code predicate evaluated with the token as context;
    /// ANDed with the expression result
    pub predicate: Option<String>,

    // ─── Overlay ────────────────────────────────────────────────────────────
    /// Whether this mapping additionally contributes an overlay node
    #[serde(default)]
    pub overlay: bool,

    /// Full overlay definition (position, content, filter, parent)
    pub overlay_config: Option<OverlayConfig>,

    // ─── Scoping ────────────────────────────────────────────────────────────
    /// Allow-list of actor subtypes this mapping applies to (empty = all)
    #[serde(default)]
    pub target_actors: Vec<String>,

    /// UI organization only; not load-bearing for evaluation
    #[serde(default)]
    pub group: String,

    /// Restrict to specific token instances (template-applied mappings;
    /// empty = all tokens)
    #[serde(default)]
    pub tokens: Vec<String>,

    // ─── Hooks ──────────────────────────────────────────────────────────────
    /// Runs when this mapping becomes active
    pub on_apply: Option<ScriptHook>,

    /// Runs when this mapping stops being active
    pub on_remove: Option<ScriptHook>,
}

impl Mapping {
    /// Minimal mapping with everything else defaulted
    pub fn new(id: impl Into<String>, expression: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: String::new(),
            expression: expression.into(),
            priority: default_priority(),
            img_src: String::new(),
            img_name: String::new(),
            config: serde_json::Value::Null,
            always_on: false,
            disabled: false,
            predicate: None,
            overlay: false,
            overlay_config: None,
            target_actors: Vec::new(),
            group: String::new(),
            tokens: Vec::new(),
            on_apply: None,
            on_remove: None,
        }
    }

    /// Label shown in the UI; legacy mappings fall back to the expression
    pub fn effective_label(&self) -> &str {
        if self.label.is_empty() {
            &self.expression
        } else {
            &self.label
        }
    }

    pub fn image(&self) -> ImageRef {
        ImageRef::new(self.img_src.clone(), self.img_name.clone())
    }

    pub fn has_image(&self) -> bool {
        !self.img_src.is_empty()
    }

    /// Whether the config payload carries any overrides
    pub fn has_config(&self) -> bool {
        match &self.config {
            serde_json::Value::Null => false,
            serde_json::Value::Object(map) => !map.is_empty(),
            _ => true,
        }
    }
}

fn default_priority() -> i32 {
    50
}

// ═══════════════════════════════════════════════════════════════════════════
// Persisted File Structure
// ═══════════════════════════════════════════════════════════════════════════

/// Root structure of a persisted mapping file.
///
/// The legacy format keyed mappings by effect name; it is converted to the
/// array format on load and never written back.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum MappingFile {
    Current {
        #[serde(default, rename = "mapping")]
        mappings: Vec<Mapping>,
    },
    Legacy {
        #[serde(rename = "mapping")]
        mappings: HashMap<String, LegacyMapping>,
    },
}

impl MappingFile {
    /// Flatten either shape into the current ordered-list form.
    ///
    /// Legacy entries take the effect name they were keyed by as both id
    /// and expression; order follows the key sort for determinism.
    pub fn into_mappings(self) -> Vec<Mapping> {
        match self {
            MappingFile::Current { mappings } => mappings,
            MappingFile::Legacy { mappings } => {
                let mut keys: Vec<String> = mappings.keys().cloned().collect();
                keys.sort();
                keys.into_iter()
                    .map(|key| {
                        let legacy = &mappings[&key];
                        let mut mapping = Mapping::new(key.clone(), key);
                        mapping.img_src = legacy.img_src.clone();
                        mapping.img_name = legacy.img_name.clone();
                        mapping.priority = legacy.priority;
                        mapping.config = legacy.config.clone();
                        mapping.always_on = legacy.always_on;
                        mapping.disabled = legacy.disabled;
                        mapping
                    })
                    .collect()
            }
        }
    }
}

/// Mapping fields as stored by the legacy object-keyed format
#[derive(Debug, Clone, Deserialize)]
pub struct LegacyMapping {
    #[serde(default)]
    pub img_src: String,
    #[serde(default)]
    pub img_name: String,
    #[serde(default = "default_priority")]
    pub priority: i32,
    #[serde(default)]
    pub config: serde_json::Value,
    #[serde(default)]
    pub always_on: bool,
    #[serde(default)]
    pub disabled: bool,
}
