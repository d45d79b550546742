//! Incremental overlay tree reconciliation
//!
//! Mark-and-sweep diff of the resolved overlay configs against the live
//! node tree: matched nodes are refreshed in place (transform), have their
//! content regenerated (img/text/shapes), are reparented or moved between
//! layer roots; unmatched configs create nodes; unmatched nodes and their
//! descendants are destroyed in the same pass. Survivors get deterministic
//! sort indices, underlays counting down below zero and overlays counting
//! up.

use std::collections::HashSet;

use super::node::{Layer, OverlayNode, OverlayNodeConfig, OverlayTree, SceneBackend};

pub fn reconcile<B: SceneBackend>(
    tree: &mut OverlayTree<B::Handle>,
    resolved: &[OverlayNodeConfig],
    backend: &mut B,
) {
    // 1. Everything is a removal candidate until matched
    for node in tree.nodes_mut() {
        node.pending_removal = true;
    }

    // 2. Match first so surviving parents are unmarked before any
    // creation looks them up, then create
    let mut to_create = Vec::new();
    for config in resolved {
        let layer = Layer::of(&config.config);
        match tree.index_of(&config.id) {
            Some(index) => update_node(tree, index, config, layer, backend),
            None => to_create.push((config, layer)),
        }
    }
    for (config, layer) in to_create {
        create_node(tree, config, layer, backend);
    }

    // 4. Orphan cascade: a node whose parent is gone or being removed goes
    // with it, transitively, in this same pass
    loop {
        let live_ids: HashSet<String> = tree
            .nodes()
            .iter()
            .filter(|n| !n.pending_removal)
            .map(|n| n.id.clone())
            .collect();
        let mut changed = false;
        for node in tree.nodes_mut() {
            if node.pending_removal {
                continue;
            }
            if let Some(parent_id) = &node.parent_id {
                if !live_ids.contains(parent_id) {
                    node.pending_removal = true;
                    changed = true;
                }
            }
        }
        if !changed {
            break;
        }
    }

    // 5. Sweep
    let mut index = 0;
    while index < tree.len() {
        if tree.nodes()[index].pending_removal {
            let node = tree.remove(index);
            backend.destroy(node.handle);
        } else {
            index += 1;
        }
    }

    // 6. Deterministic stacking order independent of creation order
    let mut under = 0;
    let mut over = 0;
    for node in tree.nodes_mut() {
        let sort = if node.config.underlay {
            under -= 1;
            under
        } else {
            over += 1;
            over
        };
        if node.sort != sort {
            node.sort = sort;
            backend.set_sort(&mut node.handle, sort);
        }
    }
}

/// Diff one matched node against its fresh config and apply the cheapest
/// sufficient update. Step 3's unmark happens here.
fn update_node<B: SceneBackend>(
    tree: &mut OverlayTree<B::Handle>,
    index: usize,
    config: &OverlayNodeConfig,
    layer: Layer,
    backend: &mut B,
) {
    if tree.nodes()[index].parent_id != config.parent_id {
        let parent_index = match &config.parent_id {
            None => None,
            Some(parent_id) => match tree.live_index(parent_id) {
                Some(parent_index) if parent_index != index => Some(parent_index),
                // No live parent: discard the node and let the next pass
                // recreate it once the parent exists
                _ => {
                    let node = tree.remove(index);
                    backend.destroy(node.handle);
                    return;
                }
            },
        };
        match parent_index {
            None => {
                let node = &mut tree.nodes_mut()[index];
                backend.reparent(&mut node.handle, None);
            }
            Some(parent_index) => {
                let (child, parent) = tree.two_mut(index, parent_index);
                backend.reparent(&mut child.handle, Some(&parent.handle));
            }
        }
    }

    let node = &mut tree.nodes_mut()[index];
    if node.layer != layer {
        backend.set_layer(&mut node.handle, layer);
        node.layer = layer;
    }
    if !node.config.same_content(&config.config) {
        if let Err(error) = backend.regenerate(&mut node.handle, config) {
            tracing::warn!(id = %config.id, %error, "overlay content regeneration failed");
        }
    }
    if !node.config.same_transform(&config.config) {
        backend.refresh(&mut node.handle, config);
    }
    node.config = config.config.clone();
    node.parent_id = config.parent_id.clone();
    node.pending_removal = false;
}

fn create_node<B: SceneBackend>(
    tree: &mut OverlayTree<B::Handle>,
    config: &OverlayNodeConfig,
    layer: Layer,
    backend: &mut B,
) {
    let parent_index = match &config.parent_id {
        None => None,
        Some(parent_id) => match tree.live_index(parent_id) {
            Some(parent_index) => Some(parent_index),
            None => {
                // Parent absent or being removed this pass: skip creation;
                // retried on the next resolution pass
                tracing::debug!(id = %config.id, parent = %parent_id, "overlay parent not live");
                return;
            }
        },
    };

    let parent_handle = parent_index.map(|i| &tree.nodes()[i].handle);
    let created = backend.create(config, layer, parent_handle);
    match created {
        Ok(handle) => tree.push(OverlayNode {
            id: config.id.clone(),
            parent_id: config.parent_id.clone(),
            config: config.config.clone(),
            layer,
            sort: 0,
            pending_removal: false,
            handle,
        }),
        Err(error) => {
            tracing::warn!(id = %config.id, %error, "overlay node creation failed");
        }
    }
}

/// Destroy every node for a token (token deleted or overlays disabled)
pub(crate) fn clear_tree<B: SceneBackend>(tree: &mut OverlayTree<B::Handle>, backend: &mut B) {
    for node in tree.take_all() {
        backend.destroy(node.handle);
    }
}
