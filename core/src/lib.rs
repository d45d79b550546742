//! Effigy engine
//!
//! Binds token visuals to dynamic game state: determines which named
//! effects are active on a token, evaluates mapping expressions over that
//! set, reconciles multiple matching mappings into one visual outcome, and
//! drives an incremental diff-based redraw of the overlay node tree.
//!
//! The host game engine (documents, rendering primitives, scripts, network
//! broadcast) sits behind the traits in [`host`]; everything in here is
//! host-agnostic.

pub mod effects;
pub mod error;
pub mod expression;
pub mod host;
pub mod mappings;
pub mod overlay;
pub mod scheduler;

#[cfg(test)]
pub(crate) mod testutil;

// Re-exports for convenience
pub use effects::active_effects;
pub use error::{RenderError, StoreError};
pub use expression::{Evaluation, evaluate};
pub use mappings::{MappingStore, Resolution, resolve};
pub use overlay::{OverlayNodeConfig, OverlayTree, SceneBackend, reconcile};
pub use scheduler::{Coordinator, EffectDelta, UpdateScheduler};
