//! Overlay compositing
//!
//! The engine owns a plain data record per overlay node and diffs freshly
//! resolved configs against the existing tree, so expensive visual content
//! (loaded textures, running animations, video state) survives minor
//! property changes. A thin [`SceneBackend`] adapter maps each record to
//! one rendering-primitive handle in the host canvas.

mod node;
mod reconcile;
pub mod template;


pub use node::{Layer, OverlayNode, OverlayNodeConfig, OverlayTree, SceneBackend};
pub(crate) use reconcile::clear_tree;
pub use reconcile::reconcile;
