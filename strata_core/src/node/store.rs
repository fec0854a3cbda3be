// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Struct-of-arrays node storage with allocation, topology, and property
//! management.

use alloc::vec::Vec;

use kurbo::{Point, Rect, Vec2};
use understory_dirty::{CycleHandling, DirtyTracker, EagerPolicy};

use crate::bounds::Bounds;
use crate::dirty;
use crate::transform::Transform;

use super::id::{INVALID, NodeId, SurfaceId};
use super::traverse::Children;

/// Slot index of the sentinel root.
///
/// Allocated eagerly in [`SceneStore::new`], never handed out as a [`NodeId`],
/// never given a parent. Detached nodes read its world state (identity
/// matrix, world alpha 1) during transform updates.
pub(crate) const SENTINEL: u32 = 0;

/// Renderable content attached to a node.
///
/// `extent` is the local-space rectangle the surface covers; the bounds hook
/// maps it through the node's world matrix.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Content {
    /// The externally-managed surface to present.
    pub surface: SurfaceId,
    /// Local-space extent of the surface.
    pub extent: Rect,
}

/// Struct-of-arrays storage for all nodes.
///
/// Nodes are addressed by [`NodeId`] handles. Internally, each node occupies
/// a slot in parallel arrays. Destroyed nodes are recycled via a free list,
/// and generation counters prevent stale handle access.
#[derive(Debug)]
pub struct SceneStore {
    // -- Topology --
    pub(crate) parent: Vec<u32>,
    pub(crate) first_child: Vec<u32>,
    pub(crate) next_sibling: Vec<u32>,
    pub(crate) prev_sibling: Vec<u32>,

    // -- Local properties (set by callers) --
    pub(crate) transform: Vec<Transform>,
    pub(crate) alpha: Vec<f32>,
    pub(crate) visible: Vec<bool>,
    pub(crate) renderable: Vec<bool>,
    pub(crate) z_index: Vec<i32>,
    pub(crate) mask: Vec<u32>,
    pub(crate) filter_area: Vec<Option<Rect>>,
    pub(crate) content: Vec<Option<Content>>,

    // -- Computed properties (written by update/query primitives) --
    pub(crate) world_alpha: Vec<f32>,
    pub(crate) bounds_id: Vec<u32>,
    pub(crate) last_bounds_id: Vec<u32>,
    pub(crate) bounds: Vec<Bounds>,
    pub(crate) is_mask: Vec<bool>,
    pub(crate) mask_consumer: Vec<u32>,
    pub(crate) last_sorted_index: Vec<u32>,

    // -- Allocation --
    pub(crate) generation: Vec<u32>,
    pub(crate) free_list: Vec<u32>,
    pub(crate) len: u32,

    // -- Dirty tracking --
    pub(crate) dirty: DirtyTracker<u32>,

    // -- Traversal cache --
    pub(crate) traversal_order: Vec<u32>,
    pub(crate) traversal_dirty: bool,

    // -- Lifecycle tracking --
    pub(crate) pending_added: Vec<u32>,
    pub(crate) pending_removed: Vec<u32>,
}

impl Default for SceneStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneStore {
    /// Creates an empty scene store.
    ///
    /// The sentinel root (slot 0) is constructed here, up front, so no lazy
    /// initialization happens on the query paths.
    #[must_use]
    pub fn new() -> Self {
        let mut store = Self {
            parent: Vec::new(),
            first_child: Vec::new(),
            next_sibling: Vec::new(),
            prev_sibling: Vec::new(),
            transform: Vec::new(),
            alpha: Vec::new(),
            visible: Vec::new(),
            renderable: Vec::new(),
            z_index: Vec::new(),
            mask: Vec::new(),
            filter_area: Vec::new(),
            content: Vec::new(),
            world_alpha: Vec::new(),
            bounds_id: Vec::new(),
            last_bounds_id: Vec::new(),
            bounds: Vec::new(),
            is_mask: Vec::new(),
            mask_consumer: Vec::new(),
            last_sorted_index: Vec::new(),
            generation: Vec::new(),
            free_list: Vec::new(),
            len: 0,
            dirty: DirtyTracker::with_cycle_handling(CycleHandling::Error),
            traversal_order: Vec::new(),
            traversal_dirty: true,
            pending_added: Vec::new(),
            pending_removed: Vec::new(),
        };
        // Sentinel root: not a creatable node, not in lifecycle lists, never
        // marked dirty. Its world state stays identity / alpha 1 forever.
        store.push_slot();
        store
    }

    /// Appends one slot with default values and returns its index.
    fn push_slot(&mut self) -> u32 {
        let idx = self.len;
        self.len += 1;
        self.parent.push(INVALID);
        self.first_child.push(INVALID);
        self.next_sibling.push(INVALID);
        self.prev_sibling.push(INVALID);
        self.transform.push(Transform::IDENTITY);
        self.alpha.push(1.0);
        self.visible.push(true);
        self.renderable.push(true);
        self.z_index.push(0);
        self.mask.push(INVALID);
        self.filter_area.push(None);
        self.content.push(None);
        self.world_alpha.push(1.0);
        self.bounds_id.push(0);
        self.last_bounds_id.push(INVALID);
        self.bounds.push(Bounds::EMPTY);
        self.is_mask.push(false);
        self.mask_consumer.push(INVALID);
        self.last_sorted_index.push(0);
        self.generation.push(0);
        idx
    }

    /// Resets a recycled slot to default values.
    fn reset_slot(&mut self, idx: u32) {
        let i = idx as usize;
        self.generation[i] += 1;
        self.parent[i] = INVALID;
        self.first_child[i] = INVALID;
        self.next_sibling[i] = INVALID;
        self.prev_sibling[i] = INVALID;
        self.transform[i] = Transform::IDENTITY;
        self.alpha[i] = 1.0;
        self.visible[i] = true;
        self.renderable[i] = true;
        self.z_index[i] = 0;
        self.mask[i] = INVALID;
        self.filter_area[i] = None;
        self.content[i] = None;
        self.world_alpha[i] = 1.0;
        self.bounds_id[i] = 0;
        self.last_bounds_id[i] = INVALID;
        self.bounds[i] = Bounds::EMPTY;
        self.is_mask[i] = false;
        self.mask_consumer[i] = INVALID;
        self.last_sorted_index[i] = 0;
    }

    // -- Allocation API --

    /// Creates a new node and returns its handle.
    ///
    /// The node starts detached, with an identity transform, full opacity,
    /// visible and renderable, z-index 0, and no mask or content. Its bounds
    /// cache tag is initialized stale so the first bounds query always
    /// recomputes.
    pub fn create_node(&mut self) -> NodeId {
        let idx = if let Some(idx) = self.free_list.pop() {
            self.reset_slot(idx);
            idx
        } else {
            self.push_slot()
        };

        self.traversal_dirty = true;
        self.pending_added.push(idx);
        self.dirty.mark(idx, dirty::TOPOLOGY);

        NodeId {
            idx,
            generation: self.generation[idx as usize],
        }
    }

    /// Destroys a node, freeing its slot for reuse.
    ///
    /// Detaches from the parent's child list, releases the mask relationship
    /// in both directions, and invalidates every outstanding handle to the
    /// node — any further operation through an old handle panics.
    ///
    /// # Panics
    ///
    /// Panics if the node has children (remove them first) or if the handle
    /// is stale.
    pub fn destroy(&mut self, id: NodeId) {
        self.validate(id);
        let idx = id.idx;
        assert!(
            self.first_child[idx as usize] == INVALID,
            "cannot destroy node with children"
        );

        // Remove from parent's child list if attached.
        if self.parent[idx as usize] != INVALID {
            self.unlink_from_parent(idx);
        }

        // Release the mask this node consumes, if it is still the current
        // consumer.
        let m = self.mask[idx as usize];
        if m != INVALID && self.mask_consumer[m as usize] == idx {
            self.release_mask_target(m);
        }

        // If this node serves as a mask, clear the consumer's reference so a
        // recycled slot is never mistaken for the old mask.
        let consumer = self.mask_consumer[idx as usize];
        if consumer != INVALID && self.mask[consumer as usize] == idx {
            self.mask[consumer as usize] = INVALID;
            self.dirty.mark(consumer, dirty::APPEARANCE);
        }

        // Remove dirty tracking dependencies.
        self.dirty.remove_key(idx);

        // Bump generation so old handles immediately fail validation.
        self.generation[idx as usize] += 1;

        self.free_list.push(idx);
        self.traversal_dirty = true;
        self.pending_removed.push(idx);
        self.dirty.mark(idx, dirty::TOPOLOGY);
    }

    /// Returns whether the given handle refers to a live node.
    #[must_use]
    pub fn is_alive(&self, id: NodeId) -> bool {
        (id.idx < self.len)
            && self.generation[id.idx as usize] == id.generation
            && !self.free_list.contains(&id.idx)
    }

    // -- Topology API --

    /// Adds `child` as the last child of `parent`.
    ///
    /// Marks inherited channels for `child`'s subtree so world matrices and
    /// world alphas are repainted under the new ancestry.
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale, if `child` already has a parent, or
    /// if `child` is `parent` or one of its ancestors (the parent links must
    /// stay a forest).
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) {
        self.validate(parent);
        self.validate(child);
        let p = parent.idx;
        let c = child.idx;
        assert!(
            self.parent[c as usize] == INVALID,
            "child already has a parent"
        );
        assert!(
            !self.is_ancestor_of(c, p),
            "cannot add a node's ancestor (or itself) as its child"
        );

        self.link_as_last_child(p, c);

        // Dirty dependency edges: child depends on parent for the inherited
        // channels.
        let _ = self.dirty.add_dependency(c, p, dirty::TRANSFORM);
        let _ = self.dirty.add_dependency(c, p, dirty::OPACITY);

        self.mark_subtree_inherited_dirty(c);
        self.traversal_dirty = true;
        self.dirty.mark(p, dirty::TOPOLOGY);
    }

    /// Removes `child` from its current parent.
    ///
    /// Marks inherited channels for `child`'s subtree so world matrices and
    /// world alphas are repainted after detaching from the old ancestry.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale or the node has no parent.
    pub fn remove_from_parent(&mut self, child: NodeId) {
        self.validate(child);
        let c = child.idx;
        assert!(self.parent[c as usize] != INVALID, "node has no parent");

        let p = self.parent[c as usize];
        self.unlink_from_parent(c);

        self.dirty.remove_dependency(c, p, dirty::TRANSFORM);
        self.dirty.remove_dependency(c, p, dirty::OPACITY);

        self.mark_subtree_inherited_dirty(c);
        self.traversal_dirty = true;
        self.dirty.mark(p, dirty::TOPOLOGY);
    }

    /// Moves `child` to be a child of `new_parent`.
    ///
    /// If `child` already has a parent, it is removed first.
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale, or if the move would create a cycle.
    pub fn reparent(&mut self, child: NodeId, new_parent: NodeId) {
        self.validate(child);
        self.validate(new_parent);
        assert!(
            !self.is_ancestor_of(child.idx, new_parent.idx),
            "cannot add a node's ancestor (or itself) as its child"
        );

        if self.parent[child.idx as usize] != INVALID {
            let old_p = self.parent[child.idx as usize];
            self.unlink_from_parent(child.idx);
            self.dirty
                .remove_dependency(child.idx, old_p, dirty::TRANSFORM);
            self.dirty
                .remove_dependency(child.idx, old_p, dirty::OPACITY);
            self.dirty.mark(old_p, dirty::TOPOLOGY);
        }

        let p = new_parent.idx;
        let c = child.idx;
        self.link_as_last_child(p, c);

        let _ = self.dirty.add_dependency(c, p, dirty::TRANSFORM);
        let _ = self.dirty.add_dependency(c, p, dirty::OPACITY);

        self.mark_subtree_inherited_dirty(c);
        self.traversal_dirty = true;
        self.dirty.mark(p, dirty::TOPOLOGY);
    }

    /// Inserts `child` before `sibling` in the sibling list.
    ///
    /// `child` must not already have a parent. `sibling` must have a parent.
    ///
    /// # Panics
    ///
    /// Panics if handles are stale, `child` already has a parent, `sibling`
    /// has no parent, or the insert would create a cycle.
    pub fn insert_before(&mut self, child: NodeId, sibling: NodeId) {
        self.validate(child);
        self.validate(sibling);
        let c = child.idx;
        let s = sibling.idx;
        assert!(
            self.parent[c as usize] == INVALID,
            "child already has a parent"
        );
        let p = self.parent[s as usize];
        assert!(p != INVALID, "sibling has no parent");
        assert!(
            !self.is_ancestor_of(c, p),
            "cannot add a node's ancestor (or itself) as its child"
        );

        self.parent[c as usize] = p;
        self.next_sibling[c as usize] = s;
        self.prev_sibling[c as usize] = self.prev_sibling[s as usize];

        if self.prev_sibling[s as usize] != INVALID {
            self.next_sibling[self.prev_sibling[s as usize] as usize] = c;
        } else {
            // `sibling` was the first child.
            self.first_child[p as usize] = c;
        }
        self.prev_sibling[s as usize] = c;

        let _ = self.dirty.add_dependency(c, p, dirty::TRANSFORM);
        let _ = self.dirty.add_dependency(c, p, dirty::OPACITY);

        self.mark_subtree_inherited_dirty(c);
        self.traversal_dirty = true;
        self.dirty.mark(p, dirty::TOPOLOGY);
    }

    /// Returns the parent of a node, if any.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.validate(id);
        let p = self.parent[id.idx as usize];
        if p == INVALID {
            None
        } else {
            Some(NodeId {
                idx: p,
                generation: self.generation[p as usize],
            })
        }
    }

    /// Returns an iterator over the direct children of a node.
    #[must_use]
    pub fn children(&self, id: NodeId) -> Children<'_> {
        self.validate(id);
        Children::new(self, self.first_child[id.idx as usize])
    }

    /// Returns the root nodes (those with no parent).
    ///
    /// The sentinel slot is not a node and never appears here.
    #[must_use]
    pub fn roots(&self) -> Vec<NodeId> {
        let mut roots = Vec::new();
        for idx in (SENTINEL + 1)..self.len {
            if self.parent[idx as usize] == INVALID && !self.free_list.contains(&idx) {
                roots.push(NodeId {
                    idx,
                    generation: self.generation[idx as usize],
                });
            }
        }
        roots
    }

    /// Re-sorts the children of `id` ascending by z-index, so higher z-index
    /// children sit later in the list and draw on top.
    ///
    /// The sort is stable: children with equal z-index keep their insertion
    /// order, witnessed by the per-child sorted-index tiebreak this method
    /// records before sorting.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn sort_children(&mut self, id: NodeId) {
        self.validate(id);
        let p = id.idx;

        let mut order: Vec<u32> = Vec::new();
        let mut child = self.first_child[p as usize];
        while child != INVALID {
            order.push(child);
            child = self.next_sibling[child as usize];
        }
        if order.len() < 2 {
            return;
        }

        for (i, &c) in order.iter().enumerate() {
            self.last_sorted_index[c as usize] = i as u32;
        }
        let before = order.clone();
        order.sort_by_key(|&c| self.z_index[c as usize]);
        if order == before {
            return;
        }

        // Relink the sibling list in the new order.
        self.first_child[p as usize] = order[0];
        for (i, &c) in order.iter().enumerate() {
            self.prev_sibling[c as usize] = if i == 0 { INVALID } else { order[i - 1] };
            self.next_sibling[c as usize] = if i + 1 == order.len() {
                INVALID
            } else {
                order[i + 1]
            };
        }

        self.traversal_dirty = true;
        self.dirty.mark(p, dirty::TOPOLOGY);
    }

    // -- Property getters (read-only, no dirty marking) --

    /// Returns the transform of a node.
    ///
    /// The copy's matrices are only valid as of the node's last transform
    /// update.
    #[must_use]
    pub fn transform(&self, id: NodeId) -> Transform {
        self.validate(id);
        self.transform[id.idx as usize]
    }

    /// Returns the local opacity of a node.
    #[must_use]
    pub fn alpha(&self, id: NodeId) -> f32 {
        self.validate(id);
        self.alpha[id.idx as usize]
    }

    /// Returns whether the node is visible.
    #[must_use]
    pub fn visible(&self, id: NodeId) -> bool {
        self.validate(id);
        self.visible[id.idx as usize]
    }

    /// Returns whether the node renders its own content.
    #[must_use]
    pub fn renderable(&self, id: NodeId) -> bool {
        self.validate(id);
        self.renderable[id.idx as usize]
    }

    /// Returns the z-order hint of a node.
    #[must_use]
    pub fn z_index(&self, id: NodeId) -> i32 {
        self.validate(id);
        self.z_index[id.idx as usize]
    }

    /// Returns the node currently used as this node's mask, if any.
    #[must_use]
    pub fn mask(&self, id: NodeId) -> Option<NodeId> {
        self.validate(id);
        let m = self.mask[id.idx as usize];
        if m == INVALID {
            None
        } else {
            Some(NodeId {
                idx: m,
                generation: self.generation[m as usize],
            })
        }
    }

    /// Returns whether the node currently serves as another node's mask.
    #[must_use]
    pub fn is_mask(&self, id: NodeId) -> bool {
        self.validate(id);
        self.is_mask[id.idx as usize]
    }

    /// Returns the filter area of a node.
    #[must_use]
    pub fn filter_area(&self, id: NodeId) -> Option<Rect> {
        self.validate(id);
        self.filter_area[id.idx as usize]
    }

    /// Returns the surface content of a node.
    #[must_use]
    pub fn content(&self, id: NodeId) -> Option<Content> {
        self.validate(id);
        self.content[id.idx as usize]
    }

    /// Returns the computed world alpha of a node.
    ///
    /// Only valid immediately after a transform update has walked through
    /// this node; it is not recomputed lazily.
    #[must_use]
    pub fn world_alpha(&self, id: NodeId) -> f32 {
        self.validate(id);
        self.world_alpha[id.idx as usize]
    }

    /// Returns the bounds cache tag, bumped on every transform update and
    /// structural change.
    #[must_use]
    pub fn bounds_id(&self, id: NodeId) -> u32 {
        self.validate(id);
        self.bounds_id[id.idx as usize]
    }

    /// Returns the tag the cached bounds were computed at.
    ///
    /// Equal to [`bounds_id`](Self::bounds_id) exactly when the cached bounds
    /// are valid.
    #[must_use]
    pub fn last_bounds_id(&self, id: NodeId) -> u32 {
        self.validate(id);
        self.last_bounds_id[id.idx as usize]
    }

    /// Returns the position this node held in its parent's child list the
    /// last time the parent's children were sorted.
    #[must_use]
    pub fn last_sorted_index(&self, id: NodeId) -> u32 {
        self.validate(id);
        self.last_sorted_index[id.idx as usize]
    }

    // -- Mutation API (equality-gated, auto-marks dirty) --

    /// Replaces the transform of a node wholesale.
    pub fn set_transform(&mut self, id: NodeId, transform: Transform) {
        self.validate(id);
        if self.transform[id.idx as usize] == transform {
            return;
        }
        self.transform[id.idx as usize] = transform;
        self.dirty.mark_with(id.idx, dirty::TRANSFORM, &EagerPolicy);
    }

    /// Sets the position component of a node's transform.
    pub fn set_position(&mut self, id: NodeId, position: Point) {
        self.validate(id);
        let t = &mut self.transform[id.idx as usize];
        if t.position() == position {
            return;
        }
        t.set_position(position);
        self.dirty.mark_with(id.idx, dirty::TRANSFORM, &EagerPolicy);
    }

    /// Sets the scale component of a node's transform.
    pub fn set_scale(&mut self, id: NodeId, scale: Vec2) {
        self.validate(id);
        let t = &mut self.transform[id.idx as usize];
        if t.scale() == scale {
            return;
        }
        t.set_scale(scale);
        self.dirty.mark_with(id.idx, dirty::TRANSFORM, &EagerPolicy);
    }

    /// Sets the rotation (radians) of a node's transform.
    pub fn set_rotation(&mut self, id: NodeId, rotation: f64) {
        self.validate(id);
        let t = &mut self.transform[id.idx as usize];
        if t.rotation() == rotation {
            return;
        }
        t.set_rotation(rotation);
        self.dirty.mark_with(id.idx, dirty::TRANSFORM, &EagerPolicy);
    }

    /// Sets the skew angles (radians) of a node's transform.
    pub fn set_skew(&mut self, id: NodeId, skew: Vec2) {
        self.validate(id);
        let t = &mut self.transform[id.idx as usize];
        if t.skew() == skew {
            return;
        }
        t.set_skew(skew);
        self.dirty.mark_with(id.idx, dirty::TRANSFORM, &EagerPolicy);
    }

    /// Sets the pivot of a node's transform.
    pub fn set_pivot(&mut self, id: NodeId, pivot: Point) {
        self.validate(id);
        let t = &mut self.transform[id.idx as usize];
        if t.pivot() == pivot {
            return;
        }
        t.set_pivot(pivot);
        self.dirty.mark_with(id.idx, dirty::TRANSFORM, &EagerPolicy);
    }

    /// Sets the local opacity of a node (expected range `[0, 1]`).
    pub fn set_alpha(&mut self, id: NodeId, alpha: f32) {
        self.validate(id);
        if self.alpha[id.idx as usize] == alpha {
            return;
        }
        self.alpha[id.idx as usize] = alpha;
        self.dirty.mark_with(id.idx, dirty::OPACITY, &EagerPolicy);
    }

    /// Sets whether the node (and its subtree) is drawn at all.
    pub fn set_visible(&mut self, id: NodeId, visible: bool) {
        self.validate(id);
        if self.visible[id.idx as usize] == visible {
            return;
        }
        self.visible[id.idx as usize] = visible;
        self.dirty.mark(id.idx, dirty::APPEARANCE);
    }

    /// Sets whether the node renders its own content (children still draw).
    pub fn set_renderable(&mut self, id: NodeId, renderable: bool) {
        self.validate(id);
        if self.renderable[id.idx as usize] == renderable {
            return;
        }
        self.renderable[id.idx as usize] = renderable;
        self.dirty.mark(id.idx, dirty::APPEARANCE);
    }

    /// Sets the z-order hint consumed by [`sort_children`](Self::sort_children).
    pub fn set_z_index(&mut self, id: NodeId, z_index: i32) {
        self.validate(id);
        if self.z_index[id.idx as usize] == z_index {
            return;
        }
        self.z_index[id.idx as usize] = z_index;
        self.dirty.mark(id.idx, dirty::APPEARANCE);
    }

    /// Sets the filter area of a node.
    pub fn set_filter_area(&mut self, id: NodeId, filter_area: Option<Rect>) {
        self.validate(id);
        if self.filter_area[id.idx as usize] == filter_area {
            return;
        }
        self.filter_area[id.idx as usize] = filter_area;
        self.dirty.mark(id.idx, dirty::APPEARANCE);
    }

    /// Sets the surface content of a node.
    pub fn set_content(&mut self, id: NodeId, content: Option<Content>) {
        self.validate(id);
        if self.content[id.idx as usize] == content {
            return;
        }
        self.content[id.idx as usize] = content;
        self.dirty.mark(id.idx, dirty::CONTENT);
    }

    /// Sets or clears the node's mask.
    ///
    /// Setting a mask marks the target node as mask-only: its `renderable`
    /// flag drops and `is_mask` rises, and it records this node as its
    /// current consumer. A mask node has exactly one current consumer — the
    /// last writer wins, with no reference counting. Clearing restores the
    /// target only if this node is still its current consumer; clearing an
    /// already-clear mask is a silent no-op.
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale.
    pub fn set_mask(&mut self, id: NodeId, mask: Option<NodeId>) {
        self.validate(id);
        let idx = id.idx;
        let new_m = match mask {
            Some(m) => {
                self.validate(m);
                m.idx
            }
            None => INVALID,
        };
        let old_m = self.mask[idx as usize];
        if old_m == new_m {
            return;
        }

        if old_m != INVALID && self.mask_consumer[old_m as usize] == idx {
            self.release_mask_target(old_m);
        }

        self.mask[idx as usize] = new_m;
        if new_m != INVALID {
            self.renderable[new_m as usize] = false;
            self.is_mask[new_m as usize] = true;
            self.mask_consumer[new_m as usize] = idx;
            self.dirty.mark(new_m, dirty::APPEARANCE);
        }
        self.dirty.mark(idx, dirty::APPEARANCE);
    }

    // -- Raw-index accessors for change consumers --
    //
    // These accept raw slot indices (as found in `SceneChanges`) rather than
    // `NodeId` handles, skipping generation validation. Only use with indices
    // that came from `SceneChanges` or `traversal_order()`.

    /// Returns the transform at raw slot `idx`.
    ///
    /// # Panics
    ///
    /// Panics if `idx >= self.len`.
    #[must_use]
    pub fn transform_at(&self, idx: u32) -> Transform {
        assert!(
            idx < self.len,
            "slot index {idx} out of range (len {})",
            self.len
        );
        self.transform[idx as usize]
    }

    /// Returns the computed world alpha at raw slot `idx`.
    ///
    /// # Panics
    ///
    /// Panics if `idx >= self.len`.
    #[must_use]
    pub fn world_alpha_at(&self, idx: u32) -> f32 {
        assert!(
            idx < self.len,
            "slot index {idx} out of range (len {})",
            self.len
        );
        self.world_alpha[idx as usize]
    }

    /// Returns the visibility flag at raw slot `idx`.
    ///
    /// # Panics
    ///
    /// Panics if `idx >= self.len`.
    #[must_use]
    pub fn visible_at(&self, idx: u32) -> bool {
        assert!(
            idx < self.len,
            "slot index {idx} out of range (len {})",
            self.len
        );
        self.visible[idx as usize]
    }

    /// Returns the surface content at raw slot `idx`.
    ///
    /// # Panics
    ///
    /// Panics if `idx >= self.len`.
    #[must_use]
    pub fn content_at(&self, idx: u32) -> Option<Content> {
        assert!(
            idx < self.len,
            "slot index {idx} out of range (len {})",
            self.len
        );
        self.content[idx as usize]
    }

    // -- Internal helpers --

    /// Panics if the handle is stale.
    pub(crate) fn validate(&self, id: NodeId) {
        assert!(
            id.idx < self.len && self.generation[id.idx as usize] == id.generation,
            "stale NodeId: {id:?} (current gen: {})",
            if id.idx < self.len {
                self.generation[id.idx as usize]
            } else {
                u32::MAX
            }
        );
    }

    /// Returns whether `idx` is `descendant` or one of its ancestors.
    fn is_ancestor_of(&self, idx: u32, descendant: u32) -> bool {
        let mut current = descendant;
        while current != INVALID {
            if current == idx {
                return true;
            }
            current = self.parent[current as usize];
        }
        false
    }

    /// Appends `c` to `p`'s child list and sets the parent link.
    fn link_as_last_child(&mut self, p: u32, c: u32) {
        self.parent[c as usize] = p;
        self.prev_sibling[c as usize] = INVALID;
        self.next_sibling[c as usize] = INVALID;

        if self.first_child[p as usize] == INVALID {
            self.first_child[p as usize] = c;
        } else {
            // Walk to last child.
            let mut last = self.first_child[p as usize];
            while self.next_sibling[last as usize] != INVALID {
                last = self.next_sibling[last as usize];
            }
            self.next_sibling[last as usize] = c;
            self.prev_sibling[c as usize] = last;
        }
    }

    /// Removes `idx` from its parent's child list without touching dirty
    /// state.
    fn unlink_from_parent(&mut self, idx: u32) {
        let p = self.parent[idx as usize];
        let prev = self.prev_sibling[idx as usize];
        let next = self.next_sibling[idx as usize];

        if prev != INVALID {
            self.next_sibling[prev as usize] = next;
        } else {
            // Was first child.
            self.first_child[p as usize] = next;
        }

        if next != INVALID {
            self.prev_sibling[next as usize] = prev;
        }

        self.parent[idx as usize] = INVALID;
        self.prev_sibling[idx as usize] = INVALID;
        self.next_sibling[idx as usize] = INVALID;
    }

    /// Restores a mask target to a plain renderable node.
    fn release_mask_target(&mut self, m: u32) {
        self.renderable[m as usize] = true;
        self.is_mask[m as usize] = false;
        self.mask_consumer[m as usize] = INVALID;
        self.dirty.mark(m, dirty::APPEARANCE);
    }

    /// Marks the subtree rooted at `idx` dirty for inherited channels.
    fn mark_subtree_inherited_dirty(&mut self, idx: u32) {
        self.dirty.mark_with(idx, dirty::TRANSFORM, &EagerPolicy);
        self.dirty.mark_with(idx, dirty::OPACITY, &EagerPolicy);
    }
}
