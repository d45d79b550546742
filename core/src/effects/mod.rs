//! Active effect set resolution
//!
//! Computes, for one token, the complete ordered list of currently-active
//! effect names from every source: built-in synthetic markers, actor
//! effects and equipped items, comparator-expression matches, the system
//! death marker, and (optionally) mapping ids for mappings whose own
//! expressions hold. Duplicates are allowed; consumers deduplicate as
//! needed. Order carries recency: later entries win image tie-breaks.

use std::collections::HashSet;

use effigy_types::{Mapping, Settings};

use crate::expression::Comparator;
use crate::host::{HpDelta, ScriptRunner, TokenState, TurnMarker};
use crate::mappings::mapping_fires;

/// Effect names contributed by the engine itself rather than sourced from
/// actor data.
pub mod synthetic {
    /// Token is part of an active encounter
    pub const IN_COMBAT: &str = "in-combat";
    /// Token's combatant is the current actor to act
    pub const CURRENT_TURN: &str = "combat-turn";
    /// Token's combatant acts next
    pub const NEXT_TURN: &str = "combat-turn-next";
    /// Token is hidden from players
    pub const HIDDEN: &str = "hidden";
    /// Recent hit-point gain marker
    pub const HP_GAIN: &str = "hp++";
    /// Recent hit-point loss marker
    pub const HP_LOSS: &str = "hp--";
    /// System-specific death marker
    pub const DEAD: &str = "Dead";
}

/// Compute the active effect set for `token`.
///
/// With `include_expression_mappings`, every mapping's full expression is
/// re-run against the effects accumulated so far and its id prepended when
/// it holds (`always_on` mappings unconditionally). One fixed pass only:
/// a mapping enabled by another mapping firing in the same pass is picked
/// up on the next external update cycle.
pub fn active_effects(
    token: &dyn TokenState,
    mappings: &[Mapping],
    settings: &Settings,
    runner: Option<&dyn ScriptRunner>,
    include_expression_mappings: bool,
) -> Vec<String> {
    let mut effects: Vec<String> = Vec::new();

    // 1. Built-in synthetic markers
    if token.in_combat() {
        effects.push(synthetic::IN_COMBAT.to_string());
    }
    match token.turn_marker() {
        TurnMarker::Current => effects.push(synthetic::CURRENT_TURN.to_string()),
        TurnMarker::Next => effects.push(synthetic::NEXT_TURN.to_string()),
        TurnMarker::None => {}
    }
    if token.is_hidden() {
        effects.push(synthetic::HIDDEN.to_string());
    }
    if settings.highlight_hp_changes {
        match token.hp_delta() {
            Some(HpDelta::Gain) => effects.push(synthetic::HP_GAIN.to_string()),
            Some(HpDelta::Loss) => effects.push(synthetic::HP_LOSS.to_string()),
            None => {}
        }
    }

    // 2. Actor-level effect names and equipped items. Linked tokens read
    // the actor document; unlinked tokens carry per-instance overrides.
    if token.is_linked() {
        effects.extend(token.actor_effect_names());
    } else {
        effects.extend(token.instance_effect_names());
    }
    effects.extend(token.equipped_item_names());

    // 3. Comparator-expression matches become pseudo-effects named by
    // their literal expression text
    for mapping in mappings.iter().filter(|m| !m.disabled) {
        if let Some(comparator) = Comparator::parse(&mapping.expression) {
            if comparator.matches(token, settings) {
                effects.insert(0, mapping.expression.clone());
            }
        }
    }

    // 4. System death marker
    if token.is_dead() {
        effects.push(synthetic::DEAD.to_string());
    }

    // 5. Expression mappings feed their own id back into the set
    if include_expression_mappings {
        let no_delta = HashSet::new();
        for mapping in mappings.iter().filter(|m| !m.disabled) {
            if mapping.always_on {
                effects.insert(0, mapping.id.clone());
                continue;
            }
            if mapping.expression.trim().is_empty() && mapping.predicate.is_none() {
                continue;
            }
            let ev = mapping_fires(mapping, token, runner, &effects, &no_delta, &no_delta);
            if ev.result {
                effects.insert(0, mapping.id.clone());
            }
        }
    }

    effects
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::PropertyValue;
    use crate::testutil::MockToken;

    #[test]
    fn test_synthetic_marker_composition() {
        let mut token = MockToken::new("t1");
        token.in_combat = true;
        token.turn = TurnMarker::Current;
        token.hidden = true;
        token.dead = true;

        let effects = active_effects(&token, &[], &Settings::default(), None, false);
        assert_eq!(
            effects,
            vec![
                synthetic::IN_COMBAT,
                synthetic::CURRENT_TURN,
                synthetic::HIDDEN,
                synthetic::DEAD,
            ]
        );
    }

    #[test]
    fn test_hp_delta_markers_gated_by_setting() {
        let mut token = MockToken::new("t1");
        token.hp_delta = Some(HpDelta::Loss);

        let effects = active_effects(&token, &[], &Settings::default(), None, false);
        assert!(effects.is_empty());

        let settings = Settings {
            highlight_hp_changes: true,
            ..Default::default()
        };
        let effects = active_effects(&token, &[], &settings, None, false);
        assert_eq!(effects, vec![synthetic::HP_LOSS]);
    }

    #[test]
    fn test_linked_vs_instance_effect_source() {
        let mut token = MockToken::new("t1");
        token.actor_effects = vec!["Blessed".to_string()];
        token.instance_effects = vec!["Cursed".to_string()];

        token.linked = true;
        let effects = active_effects(&token, &[], &Settings::default(), None, false);
        assert_eq!(effects, vec!["Blessed"]);

        token.linked = false;
        let effects = active_effects(&token, &[], &Settings::default(), None, false);
        assert_eq!(effects, vec!["Cursed"]);
    }

    #[test]
    fn test_equipped_items_contribute_names() {
        let mut token = MockToken::new("t1");
        token.items = vec!["Torch".to_string()];

        let effects = active_effects(&token, &[], &Settings::default(), None, false);
        assert_eq!(effects, vec!["Torch"]);
    }

    #[test]
    fn test_comparator_match_prepends_expression_text() {
        let token = MockToken::new("t1")
            .with_effects(&["Poisoned"])
            .with_property("attributes.hp.value", PropertyValue::Number(10.0))
            .with_property("attributes.hp.max", PropertyValue::Number(100.0));
        let mappings = vec![Mapping::new("bloodied", "hp<=50%")];

        let effects = active_effects(&token, &mappings, &Settings::default(), None, false);
        assert_eq!(effects, vec!["hp<=50%", "Poisoned"]);
    }

    #[test]
    fn test_expression_mappings_prepend_their_id() {
        let token = MockToken::new("t1").with_effects(&["Burning"]);
        let mut branded = Mapping::new("branded", "Burning");
        branded.priority = 10;
        let mappings = vec![branded, Mapping::new("unrelated", "Frozen")];

        let effects = active_effects(&token, &mappings, &Settings::default(), None, true);
        assert_eq!(effects, vec!["branded", "Burning"]);
    }

    #[test]
    fn test_always_on_mapping_prepended_without_expression() {
        let token = MockToken::new("t1");
        let mut mapping = Mapping::new("halo", "");
        mapping.always_on = true;

        let effects =
            active_effects(&token, &[mapping], &Settings::default(), None, true);
        assert_eq!(effects, vec!["halo"]);
    }

    #[test]
    fn test_disabled_mappings_are_ignored() {
        let token = MockToken::new("t1").with_effects(&["Burning"]);
        let mut mapping = Mapping::new("branded", "Burning");
        mapping.disabled = true;

        let effects =
            active_effects(&token, &[mapping], &Settings::default(), None, true);
        assert_eq!(effects, vec!["Burning"]);
    }
}
