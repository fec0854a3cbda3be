// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Render plan: an ordered sequence of draw items for one frame.

use alloc::vec::Vec;

use kurbo::Rect;
use strata_core::node::{NodeId, SceneStore, SurfaceId};

/// Blend mode for compositing a render item.
///
/// Registered blend formulas (see [`BLEND_MODE`](crate::BLEND_MODE)) are
/// opaque data resolved by backends; this enum covers the built-in modes a
/// plan carries when no registered formula applies.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum BlendMode {
    /// Standard source-over alpha compositing.
    #[default]
    SourceOver,
    /// Multiply blend.
    Multiply,
    /// Screen blend.
    Screen,
}

/// A single draw command in the render plan.
///
/// Items are produced in back-to-front order, matching the scene tree's
/// traversal order.
#[derive(Clone, Debug)]
pub struct RenderItem {
    /// The node this item originates from.
    pub node: NodeId,
    /// The surface to draw.
    pub surface: SurfaceId,
    /// World-space 2D affine, `[a, b, c, d, tx, ty]`.
    pub world_transform: [f32; 6],
    /// World alpha (0.0–1.0, accumulated from ancestors).
    pub world_alpha: f32,
    /// Blend mode.
    pub blend_mode: BlendMode,
    /// Whether the node is clipped by a mask node.
    pub masked: bool,
    /// Filter area in world coordinates, if any.
    pub filter_area: Option<Rect>,
}

/// An ordered list of draw commands for a single frame.
///
/// Backends translate this into native compositor operations or GPU draw
/// calls depending on their rendering strategy.
#[derive(Clone, Debug, Default)]
pub struct RenderPlan {
    /// Draw items in back-to-front order.
    pub items: Vec<RenderItem>,
}

impl RenderPlan {
    /// Creates an empty render plan.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes all items, keeping the allocation.
    pub fn clear(&mut self) {
        self.items.clear();
    }
}

/// Builds the render plan for the subtree rooted at `root`.
///
/// Updates the subtree's transforms parent-before-child, then walks it
/// depth-first, pruning invisible subtrees, skipping mask-only nodes, and
/// emitting one item per renderable node with content — in back-to-front
/// order.
///
/// # Panics
///
/// Panics if the handle is stale.
#[must_use]
pub fn build_plan(store: &mut SceneStore, root: NodeId) -> RenderPlan {
    store.update_transforms(root);
    let mut plan = RenderPlan::new();
    collect(store, root, &mut plan);
    plan
}

fn collect(store: &SceneStore, id: NodeId, plan: &mut RenderPlan) {
    if !store.visible(id) || store.is_mask(id) {
        return;
    }
    if store.renderable(id)
        && let Some(content) = store.content(id)
    {
        let coeffs = store.transform(id).world().as_coeffs();
        #[allow(
            clippy::cast_possible_truncation,
            reason = "render payloads are f32 by contract"
        )]
        let world_transform = coeffs.map(|c| c as f32);
        plan.items.push(RenderItem {
            node: id,
            surface: content.surface,
            world_transform,
            world_alpha: store.world_alpha(id),
            blend_mode: BlendMode::default(),
            masked: store.mask(id).is_some(),
            filter_area: store.filter_area(id),
        });
    }
    for child in store.children(id) {
        collect(store, child, plan);
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use kurbo::Point;
    use strata_core::node::Content;

    use super::*;

    fn content(surface: u32) -> Option<Content> {
        Some(Content {
            surface: SurfaceId(surface),
            extent: Rect::new(0.0, 0.0, 1.0, 1.0),
        })
    }

    #[test]
    fn plan_is_back_to_front() {
        let mut store = SceneStore::new();
        let root = store.create_node();
        let back = store.create_node();
        let front = store.create_node();
        store.add_child(root, back);
        store.add_child(root, front);
        store.set_content(back, content(1));
        store.set_content(front, content(2));

        let plan = build_plan(&mut store, root);
        let surfaces: Vec<u32> = plan.items.iter().map(|i| i.surface.0).collect();
        assert_eq!(surfaces, vec![1, 2]);
    }

    #[test]
    fn invisible_subtrees_are_pruned() {
        let mut store = SceneStore::new();
        let root = store.create_node();
        let hidden = store.create_node();
        let leaf = store.create_node();
        store.add_child(root, hidden);
        store.add_child(hidden, leaf);
        store.set_content(leaf, content(1));
        store.set_visible(hidden, false);

        let plan = build_plan(&mut store, root);
        assert!(plan.items.is_empty());
    }

    #[test]
    fn non_renderable_nodes_still_emit_children() {
        let mut store = SceneStore::new();
        let root = store.create_node();
        let group = store.create_node();
        let leaf = store.create_node();
        store.add_child(root, group);
        store.add_child(group, leaf);
        store.set_content(group, content(1));
        store.set_content(leaf, content(2));
        store.set_renderable(group, false);

        let plan = build_plan(&mut store, root);
        let surfaces: Vec<u32> = plan.items.iter().map(|i| i.surface.0).collect();
        assert_eq!(surfaces, vec![2]);
    }

    #[test]
    fn mask_nodes_are_skipped_and_consumers_flagged() {
        let mut store = SceneStore::new();
        let root = store.create_node();
        let sprite = store.create_node();
        let mask = store.create_node();
        store.add_child(root, sprite);
        store.add_child(root, mask);
        store.set_content(sprite, content(1));
        store.set_content(mask, content(2));
        store.set_mask(sprite, Some(mask));

        let plan = build_plan(&mut store, root);
        assert_eq!(plan.items.len(), 1);
        assert_eq!(plan.items[0].surface, SurfaceId(1));
        assert!(plan.items[0].masked);
    }

    #[test]
    fn items_carry_world_state() {
        let mut store = SceneStore::new();
        let root = store.create_node();
        let leaf = store.create_node();
        store.add_child(root, leaf);
        store.set_position(root, Point::new(10.0, 0.0));
        store.set_position(leaf, Point::new(0.0, 5.0));
        store.set_alpha(root, 0.5);
        store.set_content(leaf, content(1));

        let plan = build_plan(&mut store, root);
        let item = &plan.items[0];
        assert_eq!(item.world_transform[4], 10.0);
        assert_eq!(item.world_transform[5], 5.0);
        let eps = 1e-6;
        assert!((item.world_alpha - 0.5).abs() < eps);
    }
}
