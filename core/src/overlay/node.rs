//! Overlay node records and the scene backend seam

use effigy_types::OverlayConfig;

use crate::error::RenderError;

/// Which container root a node lives under
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
    /// The world canvas, transformed with the scene
    World,
    /// The screen-space front layer
    Ui,
}

impl Layer {
    pub fn of(config: &OverlayConfig) -> Self {
        if config.ui { Self::Ui } else { Self::World }
    }
}

/// One resolved overlay node config: the mapping's authored overlay after
/// template substitution, keyed by the owning mapping's id.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayNodeConfig {
    /// Unique id, tied to the owning mapping
    pub id: String,

    /// Id of the parent overlay node; None attaches to the token directly
    pub parent_id: Option<String>,

    pub config: OverlayConfig,
}

/// Rendering-primitive adapter implemented by the host.
///
/// One handle per overlay node. Texture/image load failures are expected
/// to fall back to a placeholder inside the backend; errors that do
/// surface abort only the affected node. All calls are synchronous: a
/// reconcile pass never yields to the event loop.
pub trait SceneBackend {
    type Handle;

    /// Materialize a node under the given layer root (or parent handle)
    fn create(
        &mut self,
        config: &OverlayNodeConfig,
        layer: Layer,
        parent: Option<&Self::Handle>,
    ) -> Result<Self::Handle, RenderError>;

    /// Cheap in-place update of transform/animation/filter fields
    fn refresh(&mut self, handle: &mut Self::Handle, config: &OverlayNodeConfig);

    /// Regenerate the node's texture/content after an img/text/shape change
    fn regenerate(
        &mut self,
        handle: &mut Self::Handle,
        config: &OverlayNodeConfig,
    ) -> Result<(), RenderError>;

    /// Detach and reattach under a new parent (None = the layer root)
    fn reparent(&mut self, handle: &mut Self::Handle, parent: Option<&Self::Handle>);

    /// Move the node between the world and UI container roots
    fn set_layer(&mut self, handle: &mut Self::Handle, layer: Layer);

    fn set_sort(&mut self, handle: &mut Self::Handle, sort: i32);

    /// Destroy the node and its content
    fn destroy(&mut self, handle: Self::Handle);
}

/// Live overlay node record owned by the engine
#[derive(Debug)]
pub struct OverlayNode<H> {
    pub id: String,
    pub parent_id: Option<String>,
    pub config: OverlayConfig,
    pub layer: Layer,
    pub sort: i32,
    pub pending_removal: bool,
    pub handle: H,
}

/// Per-token overlay tree, in insertion order
#[derive(Debug)]
pub struct OverlayTree<H> {
    nodes: Vec<OverlayNode<H>>,
}

impl<H> Default for OverlayTree<H> {
    fn default() -> Self {
        Self { nodes: Vec::new() }
    }
}

impl<H> OverlayTree<H> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[OverlayNode<H>] {
        &self.nodes
    }

    pub(crate) fn nodes_mut(&mut self) -> &mut [OverlayNode<H>] {
        &mut self.nodes
    }

    pub fn get(&self, id: &str) -> Option<&OverlayNode<H>> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub(crate) fn index_of(&self, id: &str) -> Option<usize> {
        self.nodes.iter().position(|n| n.id == id)
    }

    /// Index of a node that exists and is not pending removal
    pub(crate) fn live_index(&self, id: &str) -> Option<usize> {
        self.nodes
            .iter()
            .position(|n| n.id == id && !n.pending_removal)
    }

    pub(crate) fn push(&mut self, node: OverlayNode<H>) {
        self.nodes.push(node);
    }

    pub(crate) fn remove(&mut self, index: usize) -> OverlayNode<H> {
        self.nodes.remove(index)
    }

    /// Distinct mutable references to two nodes. `a` and `b` must differ.
    pub(crate) fn two_mut(
        &mut self,
        a: usize,
        b: usize,
    ) -> (&mut OverlayNode<H>, &mut OverlayNode<H>) {
        debug_assert_ne!(a, b);
        if a < b {
            let (left, right) = self.nodes.split_at_mut(b);
            (&mut left[a], &mut right[0])
        } else {
            let (left, right) = self.nodes.split_at_mut(a);
            (&mut right[0], &mut left[b])
        }
    }

    /// Drain every node, yielding handles for destruction
    pub(crate) fn take_all(&mut self) -> Vec<OverlayNode<H>> {
        std::mem::take(&mut self.nodes)
    }
}
