//! Mapping resolution
//!
//! One resolution pass: recompute the active effect set, apply the
//! added/removed delta, run every applicable mapping's expression, and
//! reconcile the matches into exactly one visual outcome — image, merged
//! config, overlay list, flag bookkeeping, and queued scripts.
//!
//! A malformed mapping is skipped for the pass; it never aborts the
//! others. Public entry points do not throw.

use std::collections::HashSet;

use effigy_types::{ImageRef, Mapping, Settings};

use crate::effects::active_effects;
use crate::expression::{Evaluation, evaluate};
use crate::host::{FlagOps, PresetAction, ScriptRunner, TokenState, VisualUpdate};
use crate::overlay::{OverlayNodeConfig, template};

/// Marker identifying a deferred script: the script body receives an
/// `advance` callback and the visual update waits until it is invoked.
pub const CONTINUATION_MARKER: &str = "advance(";

/// One queued script execution
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptCall {
    /// Mapping the hook belongs to (for logging)
    pub mapping_id: String,
    pub kind: ScriptKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ScriptKind {
    Script(String),
    Preset { name: String, action: PresetAction },
}

/// Scripts collected during resolution, split by sequencing requirement
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScriptBatch {
    /// Run before the visual update, in order, each gating the next
    pub deferred: Vec<ScriptCall>,

    /// Run after the visual update completes, regardless of its outcome
    pub immediate: Vec<ScriptCall>,
}

impl ScriptBatch {
    pub fn is_empty(&self) -> bool {
        self.deferred.is_empty() && self.immediate.is_empty()
    }
}

/// Outcome of one resolution pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Resolution {
    /// Image/config write-back plus default-image flag bookkeeping
    pub update: VisualUpdate,

    /// Overlay node configs contributed by matched overlay mappings
    pub overlays: Vec<OverlayNodeConfig>,

    pub scripts: ScriptBatch,

    /// Effective deltas after expression-produced effects were classified
    pub added: HashSet<String>,
    pub removed: HashSet<String>,
}

/// Evaluate one mapping's activation: expression result ANDed with the
/// optional code predicate. Predicate faults count as false.
pub(crate) fn mapping_fires(
    mapping: &Mapping,
    token: &dyn TokenState,
    runner: Option<&dyn ScriptRunner>,
    active: &[String],
    added: &HashSet<String>,
    removed: &HashSet<String>,
) -> Evaluation {
    let expression = mapping.expression.trim();
    let mut ev = if expression.is_empty() {
        Evaluation::default()
    } else {
        evaluate(expression, active, added, removed)
    };

    if let Some(predicate) = &mapping.predicate {
        let holds = match runner {
            Some(runner) => match runner.eval_predicate(token, predicate) {
                Ok(holds) => holds,
                Err(error) => {
                    tracing::warn!(mapping = %mapping.id, %error, "predicate failed");
                    false
                }
            },
            None => false,
        };
        // Empty expression with a truthy predicate still fires
        ev.result = if expression.is_empty() {
            holds
        } else {
            ev.result && holds
        };
    }

    ev
}

/// Whether a mapping can apply to this token at all (scoping only; the
/// expression decides activation).
fn applicable(mapping: &Mapping, token: &dyn TokenState) -> bool {
    if mapping.disabled {
        return false;
    }
    if !mapping.target_actors.is_empty()
        && !mapping.target_actors.iter().any(|t| t == token.actor_type())
    {
        return false;
    }
    if !mapping.tokens.is_empty() && !mapping.tokens.iter().any(|t| t == token.id()) {
        return false;
    }
    true
}

/// Resolve one token's visual outcome from its mappings and an effect
/// delta. Pure over the snapshot: no host writes happen here.
pub fn resolve(
    token: &dyn TokenState,
    mappings: &[Mapping],
    settings: &Settings,
    runner: Option<&dyn ScriptRunner>,
    added: &HashSet<String>,
    removed: &HashSet<String>,
) -> Resolution {
    let mut added = added.clone();
    let mut removed = removed.clone();

    // 1. Fresh effect set, then the delta. Re-added names move to the end
    // to mark recency; removed names are deleted.
    let mut active = active_effects(token, mappings, settings, runner, false);
    let mut add_names: Vec<String> = added.iter().cloned().collect();
    add_names.sort();
    for name in add_names {
        if let Some(pos) = active.iter().position(|n| *n == name) {
            active.remove(pos);
        }
        active.push(name);
    }
    active.retain(|name| !removed.contains(name));

    // 2. Run every applicable mapping's expression, feeding the same
    // deltas so expression-produced effects are classified as newly added
    // (append, queue for addition) vs pre-existing (prepend).
    let mut fired: HashSet<&str> = HashSet::new();
    for mapping in mappings.iter().filter(|m| applicable(m, token)) {
        let ev = if mapping.always_on {
            Evaluation {
                result: true,
                ..Default::default()
            }
        } else {
            mapping_fires(mapping, token, runner, &active, &added, &removed)
        };

        if ev.result {
            fired.insert(mapping.id.as_str());
            if ev.touched_added {
                if let Some(pos) = active.iter().position(|n| *n == mapping.id) {
                    active.remove(pos);
                }
                active.push(mapping.id.clone());
                removed.remove(&mapping.id);
                added.insert(mapping.id.clone());
            } else if !active.iter().any(|n| *n == mapping.id) {
                active.insert(0, mapping.id.clone());
            }
        } else {
            active.retain(|n| *n != mapping.id);
            if ev.touched_removed {
                added.remove(&mapping.id);
                removed.insert(mapping.id.clone());
            }
        }
    }

    // 3. Collect hooks for mappings entering the deltas
    let mut scripts = ScriptBatch::default();
    for mapping in mappings.iter().filter(|m| applicable(m, token)) {
        if added.contains(&mapping.id) {
            if let Some(hook) = &mapping.on_apply {
                collect_hook(&mut scripts, &mapping.id, hook, PresetAction::Apply);
            }
        }
        if removed.contains(&mapping.id) {
            if let Some(hook) = &mapping.on_remove {
                collect_hook(&mut scripts, &mapping.id, hook, PresetAction::Remove);
            }
        }
    }

    // 4. Matched list ordered by each mapping's most recent occurrence in
    // the effect set, then a stable ascending priority sort: ties go to
    // the most recently applied, and the last entry is dominant.
    let mut recency: Vec<(usize, &Mapping)> = mappings
        .iter()
        .filter(|m| applicable(m, token) && fired.contains(m.id.as_str()))
        .filter_map(|mapping| {
            active
                .iter()
                .rposition(|n| *n == mapping.id || *n == mapping.expression)
                .map(|index| (index, mapping))
        })
        .collect();
    recency.sort_by_key(|(index, _)| *index);
    let mut matched: Vec<&Mapping> = recency.into_iter().map(|(_, m)| m).collect();
    matched.sort_by_key(|m| m.priority);

    // 5. Image selection: scan from the dominant end. A wildcard image
    // that was not newly added this pass keeps the token's current image
    // instead of re-rolling.
    enum Selection {
        Mapped(ImageRef),
        Retain,
        None,
    }
    let mut selection = Selection::None;
    for mapping in matched.iter().rev() {
        if !mapping.has_image() {
            continue;
        }
        let image = mapping.image();
        selection = if image.is_wildcard() && !added.contains(&mapping.id) {
            Selection::Retain
        } else {
            Selection::Mapped(image)
        };
        break;
    }

    // 6. Config selection
    let config = if settings.stack_configs {
        let mut merged = serde_json::Value::Null;
        for mapping in &matched {
            if mapping.has_config() {
                merge_value(&mut merged, &mapping.config);
            }
        }
        (!merged.is_null()).then_some(merged)
    } else {
        matched
            .iter()
            .rev()
            .find(|m| m.has_config())
            .map(|m| m.config.clone())
    };

    // 7. Default-image bookkeeping: record the pre-mapping image before
    // the first overwrite; restore and clear it when nothing applies.
    let mut flags = FlagOps::default();
    let image = match selection {
        Selection::Mapped(image) => {
            if token.default_image().is_none() {
                flags.record_default = Some(token.current_image());
            }
            Some(image)
        }
        Selection::Retain => None,
        Selection::None => match token.default_image() {
            Some(default) => {
                flags.clear_default = true;
                Some(default)
            }
            None => None,
        },
    };

    // 8. Overlay contributions, template-expanded. Without stacking only
    // the top-priority overlay-bearing mapping contributes.
    let overlay_sources: Vec<&Mapping> = matched
        .iter()
        .copied()
        .filter(|m| m.overlay)
        .filter(|m| match &m.overlay_config {
            Some(config) => !(config.ui && settings.disable_ui_overlays),
            None => false,
        })
        .collect();
    let chosen: &[&Mapping] = if settings.stack_configs {
        &overlay_sources
    } else {
        match overlay_sources.last() {
            Some(last) => std::slice::from_ref(last),
            None => &[],
        }
    };
    let overlays = chosen
        .iter()
        .filter_map(|mapping| {
            let config = mapping.overlay_config.as_ref()?;
            Some(OverlayNodeConfig {
                id: mapping.id.clone(),
                parent_id: config.parent.clone(),
                config: template::expand(config, token),
            })
        })
        .collect();

    Resolution {
        update: VisualUpdate {
            image,
            config,
            flags,
        },
        overlays,
        scripts,
        added,
        removed,
    }
}

fn collect_hook(
    scripts: &mut ScriptBatch,
    mapping_id: &str,
    hook: &effigy_types::ScriptHook,
    action: PresetAction,
) {
    if let Some(source) = &hook.script {
        let call = ScriptCall {
            mapping_id: mapping_id.to_string(),
            kind: ScriptKind::Script(source.clone()),
        };
        if source.contains(CONTINUATION_MARKER) {
            scripts.deferred.push(call);
        } else {
            scripts.immediate.push(call);
        }
    }
    if let Some(preset) = &hook.preset {
        scripts.immediate.push(ScriptCall {
            mapping_id: mapping_id.to_string(),
            kind: ScriptKind::Preset {
                name: preset.clone(),
                action,
            },
        });
    }
}

/// Deep-merge `overlay` into `base`: objects merge per key (later wins),
/// everything else replaces.
fn merge_value(base: &mut serde_json::Value, overlay: &serde_json::Value) {
    match (base, overlay) {
        (serde_json::Value::Object(base), serde_json::Value::Object(overlay)) => {
            for (key, value) in overlay {
                merge_value(
                    base.entry(key.clone()).or_insert(serde_json::Value::Null),
                    value,
                );
            }
        }
        (slot, value) => *slot = value.clone(),
    }
}
