// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! On-demand bounds and coordinate-space queries.
//!
//! Bounds are cached per node behind the `bounds_id`/`last_bounds_id` tag
//! pair: every transform update bumps `bounds_id`, and a query recomputes the
//! accumulator only while the tags disagree. The engine guarantees a single
//! node's cache is coherent with its own last transform; whole-subtree
//! coherency (a parent noticing a child's bounds moved without any update
//! walk) is the container layer's contract, discharged by driving
//! [`SceneStore::update_transforms`] before querying.

use kurbo::{Point, Rect};
use thiserror::Error;

use crate::bounds::Bounds;
use crate::transform::Transform;

use super::id::{INVALID, NodeId};
use super::store::SceneStore;

/// Errors surfaced by coordinate-space queries.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum SceneError {
    /// The node's world matrix is not invertible; the caller decides how to
    /// recover (the engine never substitutes an identity fallback).
    #[error("world transform is not invertible")]
    DegenerateTransform,
}

impl SceneStore {
    /// Returns the node's world-space bounds.
    ///
    /// With `skip_update == false`, transforms are refreshed first (ancestors
    /// via the post-update walk when attached; the sentinel substitution
    /// covers detached roots), then the subtree below the node — so the
    /// result reflects current state. With `skip_update == true` the current
    /// cached matrices are trusted; the result may be stale by design — an
    /// accuracy/performance tradeoff the caller opts into.
    ///
    /// The returned rectangle is a snapshot; it stays meaningful until the
    /// node is next updated or queried.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn bounds(&mut self, id: NodeId, skip_update: bool) -> Rect {
        self.validate(id);
        let idx = id.idx;

        if !skip_update {
            if self.parent[idx as usize] != INVALID {
                self.post_update_ancestors(idx);
            }
            self.update_subtree(idx);
        }

        if self.bounds_id[idx as usize] != self.last_bounds_id[idx as usize] {
            self.calculate_bounds(idx);
            self.last_bounds_id[idx as usize] = self.bounds_id[idx as usize];
        }

        self.bounds[idx as usize].rect()
    }

    /// Returns the node's bounds as if it were detached with an identity
    /// transform — parent-independent local bounds.
    ///
    /// The node's transform and parent link are swapped out for the duration
    /// of the computation and restored on every exit path (the computation
    /// itself is infallible, so restoration is unconditional straight-line
    /// code). World matrices in the subtree are left for the next update
    /// walk to re-derive.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn local_bounds(&mut self, id: NodeId) -> Rect {
        self.validate(id);
        let i = id.idx as usize;

        let saved_transform = self.transform[i];
        let saved_parent = self.parent[i];
        self.transform[i] = Transform::IDENTITY;
        self.parent[i] = INVALID;

        let rect = self.bounds(id, false);

        self.transform[i] = saved_transform;
        self.parent[i] = saved_parent;
        rect
    }

    /// Converts a point from the node's local space to world space.
    ///
    /// Unless `skip_update` is set, ancestor world matrices are refreshed
    /// first (via the post-update walk, or the sentinel substitution for a
    /// detached node).
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn to_global(&mut self, id: NodeId, point: Point, skip_update: bool) -> Point {
        self.validate(id);
        if !skip_update {
            if self.parent[id.idx as usize] != INVALID {
                self.post_update_ancestors(id.idx);
            }
            self.update_transform_at(id.idx);
        }
        self.transform[id.idx as usize].world() * point
    }

    /// Converts a point into the node's local space.
    ///
    /// When `from` is given, `point` is first interpreted in that node's
    /// local space and routed through [`to_global`](Self::to_global).
    /// Fails with [`SceneError::DegenerateTransform`] when the node's world
    /// matrix cannot be inverted (e.g. a zero scale anywhere in the ancestor
    /// chain).
    ///
    /// # Panics
    ///
    /// Panics if a handle is stale.
    pub fn to_local(
        &mut self,
        id: NodeId,
        point: Point,
        from: Option<NodeId>,
        skip_update: bool,
    ) -> Result<Point, SceneError> {
        self.validate(id);
        let point = match from {
            Some(f) => self.to_global(f, point, skip_update),
            None => point,
        };

        if !skip_update {
            if self.parent[id.idx as usize] != INVALID {
                self.post_update_ancestors(id.idx);
            }
            self.update_transform_at(id.idx);
        }

        let world = self.transform[id.idx as usize].world();
        let det = world.determinant();
        if det == 0.0 || !det.is_finite() {
            return Err(SceneError::DegenerateTransform);
        }
        Ok(world.inverse() * point)
    }

    /// Recomputes the bounds accumulator at `idx`: the node's own content
    /// extent under its world matrix, plus the bounds of visible renderable
    /// children (recursively, each behind its own cache tag).
    ///
    /// A grouping node without content and without eligible children
    /// accumulates nothing and snapshots to `Rect::ZERO`.
    pub(crate) fn calculate_bounds(&mut self, idx: u32) {
        let mut acc = Bounds::new();

        if let Some(content) = self.content[idx as usize] {
            let world = self.transform[idx as usize].world();
            acc.add_frame(
                world,
                content.extent.x0,
                content.extent.y0,
                content.extent.x1,
                content.extent.y1,
            );
        }

        let mut child = self.first_child[idx as usize];
        while child != INVALID {
            let c = child as usize;
            if self.visible[c] && self.renderable[c] {
                if self.bounds_id[c] != self.last_bounds_id[c] {
                    self.calculate_bounds(child);
                    self.last_bounds_id[c] = self.bounds_id[c];
                }
                let child_bounds = self.bounds[c];
                acc.add_bounds(&child_bounds);
            }
            child = self.next_sibling[c];
        }

        self.bounds[idx as usize] = acc;
    }
}

#[cfg(test)]
mod tests {
    use kurbo::Vec2;

    use crate::node::{Content, SurfaceId};

    use super::*;

    fn content(x0: f64, y0: f64, x1: f64, y1: f64) -> Option<Content> {
        Some(Content {
            surface: SurfaceId(1),
            extent: Rect::new(x0, y0, x1, y1),
        })
    }

    #[test]
    fn to_global_walks_the_ancestor_chain() {
        let mut store = SceneStore::new();
        let root = store.create_node();
        let child = store.create_node();
        let grandchild = store.create_node();
        store.add_child(root, child);
        store.add_child(child, grandchild);

        store.set_position(child, Point::new(10.0, 0.0));
        store.set_position(grandchild, Point::new(0.0, 5.0));

        assert_eq!(
            store.to_global(grandchild, Point::ZERO, false),
            Point::new(10.0, 5.0)
        );
    }

    #[test]
    fn detached_matches_identity_parent() {
        // A detached node (sentinel path) and the same node under an
        // identity-transform parent must produce identical results.
        let mut detached = SceneStore::new();
        let d = detached.create_node();
        detached.set_position(d, Point::new(3.0, 4.0));
        detached.set_content(d, content(0.0, 0.0, 2.0, 2.0));

        let mut attached = SceneStore::new();
        let parent = attached.create_node();
        let a = attached.create_node();
        attached.add_child(parent, a);
        attached.set_position(a, Point::new(3.0, 4.0));
        attached.set_content(a, content(0.0, 0.0, 2.0, 2.0));

        assert_eq!(
            detached.to_global(d, Point::new(1.0, 1.0), false),
            attached.to_global(a, Point::new(1.0, 1.0), false)
        );
        assert_eq!(detached.bounds(d, false), attached.bounds(a, false));
    }

    #[test]
    fn bounds_maps_content_through_world_matrix() {
        let mut store = SceneStore::new();
        let id = store.create_node();
        store.set_position(id, Point::new(10.0, 5.0));
        store.set_content(id, content(0.0, 0.0, 4.0, 2.0));

        assert_eq!(store.bounds(id, false), Rect::new(10.0, 5.0, 14.0, 7.0));
    }

    #[test]
    fn bounds_unions_visible_renderable_children() {
        let mut store = SceneStore::new();
        let root = store.create_node();
        let a = store.create_node();
        let b = store.create_node();
        let hidden = store.create_node();
        store.add_child(root, a);
        store.add_child(root, b);
        store.add_child(root, hidden);

        store.set_content(a, content(0.0, 0.0, 2.0, 2.0));
        store.set_position(b, Point::new(5.0, 5.0));
        store.set_content(b, content(0.0, 0.0, 1.0, 1.0));
        store.set_content(hidden, content(100.0, 100.0, 200.0, 200.0));
        store.set_visible(hidden, false);

        assert_eq!(store.bounds(root, false), Rect::new(0.0, 0.0, 6.0, 6.0));
    }

    #[test]
    fn grouping_node_without_content_is_zero() {
        let mut store = SceneStore::new();
        let id = store.create_node();
        assert_eq!(store.bounds(id, false), Rect::ZERO);
    }

    #[test]
    fn skip_update_bounds_are_idempotent() {
        let mut store = SceneStore::new();
        let id = store.create_node();
        store.set_position(id, Point::new(1.0, 2.0));
        store.set_content(id, content(0.0, 0.0, 3.0, 3.0));

        // Prime the cache with one full query.
        let first = store.bounds(id, false);
        let tag = store.last_bounds_id(id);

        let second = store.bounds(id, true);
        let third = store.bounds(id, true);
        assert_eq!(second, first);
        assert_eq!(third, first);
        assert_eq!(store.last_bounds_id(id), tag, "no recompute may happen");
    }

    #[test]
    fn mutation_invalidates_the_cache() {
        let mut store = SceneStore::new();
        let id = store.create_node();
        store.set_content(id, content(0.0, 0.0, 1.0, 1.0));

        let _ = store.bounds(id, false);
        let primed = store.bounds_id(id);
        assert_eq!(store.last_bounds_id(id), primed);

        // Any transform-affecting mutation makes the next update bump the
        // tag past the cached one.
        store.set_position(id, Point::new(9.0, 0.0));
        store.update_transform(id);
        assert!(store.bounds_id(id) > primed, "tag must strictly increase");
        assert_ne!(store.bounds_id(id), store.last_bounds_id(id));

        let rect = store.bounds(id, true);
        assert_eq!(store.last_bounds_id(id), store.bounds_id(id));
        assert_eq!(rect, Rect::new(9.0, 0.0, 10.0, 1.0));
    }

    #[test]
    fn local_bounds_ignores_parent_and_own_transform() {
        let mut store = SceneStore::new();
        let parent = store.create_node();
        let id = store.create_node();
        store.add_child(parent, id);
        store.set_position(parent, Point::new(100.0, 100.0));
        store.set_position(id, Point::new(10.0, 10.0));
        store.set_content(id, content(0.0, 0.0, 4.0, 4.0));

        assert_eq!(store.local_bounds(id), Rect::new(0.0, 0.0, 4.0, 4.0));

        // Both the transform and the parent link are restored.
        assert_eq!(store.parent(id), Some(parent));
        assert_eq!(store.transform(id).position(), Point::new(10.0, 10.0));
        assert_eq!(
            store.to_global(id, Point::ZERO, false),
            Point::new(110.0, 110.0)
        );
    }

    #[test]
    fn local_bounds_keeps_child_offsets() {
        let mut store = SceneStore::new();
        let id = store.create_node();
        let child = store.create_node();
        store.add_child(id, child);
        store.set_position(id, Point::new(50.0, 50.0));
        store.set_position(child, Point::new(3.0, 0.0));
        store.set_content(child, content(0.0, 0.0, 1.0, 1.0));

        assert_eq!(store.local_bounds(id), Rect::new(3.0, 0.0, 4.0, 1.0));
    }

    #[test]
    fn to_local_inverts_to_global() {
        let mut store = SceneStore::new();
        let root = store.create_node();
        let child = store.create_node();
        store.add_child(root, child);
        store.set_position(root, Point::new(10.0, 0.0));
        store.set_position(child, Point::new(0.0, 5.0));
        store.set_scale(child, Vec2::new(2.0, 2.0));

        let world = store.to_global(child, Point::new(1.0, 1.0), false);
        let back = store
            .to_local(child, world, None, false)
            .expect("invertible transform");
        let eps = 1e-9;
        assert!((back.x - 1.0).abs() < eps, "x was {}", back.x);
        assert!((back.y - 1.0).abs() < eps, "y was {}", back.y);
    }

    #[test]
    fn to_local_relative_to_another_node() {
        let mut store = SceneStore::new();
        let a = store.create_node();
        let b = store.create_node();
        store.set_position(a, Point::new(10.0, 0.0));
        store.set_position(b, Point::new(4.0, 4.0));

        // (0,0) in a's space is (10,0) in world space, i.e. (6,-4) in b's.
        let p = store
            .to_local(b, Point::ZERO, Some(a), false)
            .expect("invertible transform");
        assert_eq!(p, Point::new(6.0, -4.0));
    }

    #[test]
    fn to_local_fails_on_degenerate_transform() {
        let mut store = SceneStore::new();
        let id = store.create_node();
        store.set_scale(id, Vec2::new(0.0, 1.0));

        assert_eq!(
            store.to_local(id, Point::ZERO, None, false),
            Err(SceneError::DegenerateTransform)
        );
    }

    #[test]
    fn degenerate_ancestor_poisons_descendants() {
        let mut store = SceneStore::new();
        let root = store.create_node();
        let child = store.create_node();
        store.add_child(root, child);
        store.set_scale(root, Vec2::new(0.0, 0.0));

        assert_eq!(
            store.to_local(child, Point::ZERO, None, false),
            Err(SceneError::DegenerateTransform)
        );
    }
}
