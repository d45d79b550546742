//! Host collaborator traits
//!
//! The engine never touches the game engine's documents, canvas, scripts,
//! or network directly. Each external concern sits behind one narrow trait
//! here; the host adapter implements them against the real engine and the
//! test suite implements them as mocks.
//!
//! Evaluation and reconciliation are synchronous and never await mid-pass;
//! the async boundaries are the apply/script collaborators invoked by the
//! update coordinator between passes.

use async_trait::async_trait;

use effigy_types::ImageRef;

/// Scalar value resolved from live token/actor data
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Number(f64),
    Bool(bool),
    Text(String),
}

impl PropertyValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Self::Text(_) => None,
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Number(n) => *n != 0.0,
            Self::Bool(b) => *b,
            Self::Text(s) => !s.is_empty(),
        }
    }

    /// Rendering for template substitution
    pub fn display(&self) -> String {
        match self {
            Self::Number(n) => {
                if n.fract() == 0.0 {
                    format!("{}", *n as i64)
                } else {
                    format!("{n}")
                }
            }
            Self::Bool(b) => b.to_string(),
            Self::Text(s) => s.clone(),
        }
    }
}

/// Which combat-turn marker applies to a token right now
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TurnMarker {
    #[default]
    None,
    /// The token's combatant is the current actor to act
    Current,
    /// The token's combatant acts next
    Next,
}

/// Direction of a recent hit-point change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HpDelta {
    Gain,
    Loss,
}

/// Read-only snapshot of one token and its linked actor, taken at the
/// start of a resolution pass.
///
/// Implementations read the host document store; the engine only queries.
pub trait TokenState {
    /// Stable token identity
    fn id(&self) -> &str;

    /// Actor subtype (for `target_actors` mapping scoping)
    fn actor_type(&self) -> &str;

    /// Whether the token is linked to its actor document. Linked tokens
    /// source effects from the actor; unlinked tokens carry per-instance
    /// override data.
    fn is_linked(&self) -> bool;

    // ─── Built-in state markers ─────────────────────────────────────────────
    fn is_hidden(&self) -> bool;
    fn in_combat(&self) -> bool;
    fn turn_marker(&self) -> TurnMarker;
    fn hp_delta(&self) -> Option<HpDelta>;
    /// System-specific death marker
    fn is_dead(&self) -> bool;

    // ─── Named effect sources ───────────────────────────────────────────────
    /// Active, non-suppressed effect/condition names on the linked actor
    fn actor_effect_names(&self) -> Vec<String>;

    /// Effect names from per-instance override data (unlinked tokens)
    fn instance_effect_names(&self) -> Vec<String>;

    /// Names of currently equipped items
    fn equipped_item_names(&self) -> Vec<String>;

    // ─── Image bookkeeping ──────────────────────────────────────────────────
    fn current_image(&self) -> ImageRef;

    /// Pre-mapping image recorded by an earlier pass, if any
    fn default_image(&self) -> Option<ImageRef>;

    // ─── Property access ────────────────────────────────────────────────────
    /// Resolve a dotted property path against live token/actor data.
    /// Returns None for unresolvable paths; callers treat that as falsy.
    fn resolve_property(&self, path: &str) -> Option<PropertyValue>;
}

/// Opaque error from a host collaborator call. The engine logs and
/// contains these; it never inspects them.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct HostError(pub String);

impl HostError {
    pub fn msg(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

/// Flag writes the applier persists alongside a visual update
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FlagOps {
    /// Record this image as the token's pre-mapping default
    pub record_default: Option<ImageRef>,

    /// Clear the recorded default (the default image is being restored)
    pub clear_default: bool,
}

impl FlagOps {
    pub fn is_empty(&self) -> bool {
        self.record_default.is_none() && !self.clear_default
    }
}

/// One resolved visual write-back for a token
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VisualUpdate {
    /// New token image (None = leave unchanged)
    pub image: Option<ImageRef>,

    /// Merged per-field config overrides (None = leave unchanged)
    pub config: Option<serde_json::Value>,

    pub flags: FlagOps,
}

impl VisualUpdate {
    pub fn is_empty(&self) -> bool {
        self.image.is_none() && self.config.is_none() && self.flags.is_empty()
    }
}

/// Applies a resolved update to the live token document/texture,
/// optionally with an animation.
#[async_trait]
pub trait ImageApplier: Send + Sync {
    async fn apply(&self, token_id: &str, update: &VisualUpdate) -> Result<(), HostError>;
}

/// Whether a preset is being applied or removed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresetAction {
    Apply,
    Remove,
}

/// Executes user-authored scripts, presets, and code predicates.
/// Opaque to the engine; expected to sandbox as the host sees fit.
#[async_trait]
pub trait ScriptRunner: Send + Sync {
    /// Run a fire-and-forget script hook
    async fn run_script(&self, token_id: &str, source: &str) -> Result<(), HostError>;

    /// Run a deferred script that was handed a continuation callback.
    /// Returns whether the script invoked its continuation; `false`
    /// abandons the rest of the chain and the visual update.
    async fn run_deferred(&self, token_id: &str, source: &str) -> Result<bool, HostError>;

    /// Apply or remove a named preset
    async fn run_preset(
        &self,
        token_id: &str,
        name: &str,
        action: PresetAction,
    ) -> Result<(), HostError>;

    /// Evaluate a boolean code predicate with the token as context.
    /// Synchronous: predicates run inside the resolution pass.
    fn eval_predicate(&self, token: &dyn TokenState, source: &str) -> Result<bool, HostError>;
}

/// Notifies other connected clients to re-run overlay reconciliation for a
/// token. Only the token identifier crosses the wire; each client
/// recomputes locally.
pub trait Broadcast: Send + Sync {
    fn overlays_changed(&self, token_id: &str);
}

/// Produces token snapshots for queued update flushes
pub trait TokenProvider: Send + Sync {
    /// None if the token no longer exists. The snapshot is borrowed across
    /// await points inside spawned flush tasks, so it must be `Sync` too.
    fn snapshot(&self, token_id: &str) -> Option<Box<dyn TokenState + Send + Sync>>;
}
