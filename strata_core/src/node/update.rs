// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Transform propagation and change draining.
//!
//! [`SceneStore::update_transform`] is the single propagation primitive: it
//! bumps the node's bounds tag, composes the world matrix from the *direct*
//! parent's already-updated state, and derives the world alpha. Containers
//! drive it parent-before-child ([`SceneStore::update_transforms`] walks a
//! subtree in that order). A detached node reads the sentinel slot instead of
//! a parent, so roots take the same code path as everything else while still
//! producing correct world-space results.
//!
//! [`SceneStore::drain_changes`] consumes the dirty channels into a
//! [`SceneChanges`] set — the per-frame repaint hint. Draining only reports:
//! recomputation stays with the primitives above and the query paths.

use alloc::vec::Vec;

use crate::dirty;

use super::id::{INVALID, NodeId};
use super::store::{SENTINEL, SceneStore};

/// The set of changes produced by a single
/// [`SceneStore::drain_changes`] call.
///
/// Each list contains the raw slot indices of nodes whose properties changed
/// in the corresponding category since the last drain. Hosts use these to
/// decide what to repaint; use the store's `*_at()` accessors to read current
/// values without paying for generation checks.
#[derive(Clone, Debug, Default)]
pub struct SceneChanges {
    /// Nodes whose transform components changed (including via an ancestor).
    pub transforms: Vec<u32>,
    /// Nodes whose opacity changed (including via an ancestor).
    pub opacities: Vec<u32>,
    /// Nodes whose visibility, renderability, z-order, mask, or filter area
    /// changed.
    pub appearance: Vec<u32>,
    /// Nodes whose surface content changed.
    pub content: Vec<u32>,
    /// Nodes created since the last drain.
    pub added: Vec<u32>,
    /// Nodes destroyed since the last drain.
    pub removed: Vec<u32>,
    /// Whether the tree topology changed (traversal order was rebuilt).
    pub topology_changed: bool,
}

impl SceneChanges {
    /// Clears all change lists.
    pub fn clear(&mut self) {
        self.transforms.clear();
        self.opacities.clear();
        self.appearance.clear();
        self.content.clear();
        self.added.clear();
        self.removed.clear();
        self.topology_changed = false;
    }

    /// Returns whether nothing changed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
            && self.opacities.is_empty()
            && self.appearance.is_empty()
            && self.content.is_empty()
            && self.added.is_empty()
            && self.removed.is_empty()
            && !self.topology_changed
    }
}

impl SceneStore {
    /// Recomputes a single node's world matrix and world alpha from its
    /// direct parent's (or, for a detached node, the sentinel's) current
    /// world state, and bumps the node's bounds tag.
    ///
    /// The parent's world state must already be up to date — callers walk
    /// parent-before-child. After this call the node's world matrix and
    /// [`world_alpha`](Self::world_alpha) are valid until the node or an
    /// ancestor is mutated again.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn update_transform(&mut self, id: NodeId) {
        self.validate(id);
        self.update_transform_at(id.idx);
    }

    /// Updates the subtree rooted at `id`, parent before child.
    ///
    /// This is the walk a container layer drives once per frame before
    /// rendering.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn update_transforms(&mut self, id: NodeId) {
        self.validate(id);
        self.update_subtree(id.idx);
    }

    /// Refreshes the world state of every ancestor of `id`, root first,
    /// without bumping any bounds tags.
    ///
    /// Pair with [`update_transform`](Self::update_transform) to answer an
    /// on-demand query for a node the frame's top-down walk has not reached
    /// yet. The query operations do this themselves; container code only
    /// needs it when reading world state directly.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn update_ancestors(&mut self, id: NodeId) {
        self.validate(id);
        self.post_update_ancestors(id.idx);
    }

    pub(crate) fn update_transform_at(&mut self, idx: u32) {
        let i = idx as usize;
        self.bounds_id[i] = self.bounds_id[i].wrapping_add(1);

        let p = self.parent[i];
        let p = if p == INVALID { SENTINEL } else { p };
        let parent_transform = self.transform[p as usize];
        let parent_alpha = self.world_alpha[p as usize];

        self.transform[i].update(&parent_transform);
        self.world_alpha[i] = self.alpha[i] * parent_alpha;
    }

    pub(crate) fn update_subtree(&mut self, idx: u32) {
        self.update_transform_at(idx);
        let mut child = self.first_child[idx as usize];
        while child != INVALID {
            self.update_subtree(child);
            child = self.next_sibling[child as usize];
        }
    }

    /// Refreshes the world state of every ancestor of `idx`, root first.
    ///
    /// Used by on-demand queries issued outside the render walk, so ancestor
    /// world matrices are fresh even if the host's top-down pass has not
    /// reached this subtree yet. Ancestors' bounds tags are not bumped — only
    /// the queried node pays that through the update primitive.
    pub(crate) fn post_update_ancestors(&mut self, idx: u32) {
        let p = self.parent[idx as usize];
        if p == INVALID {
            return;
        }
        self.post_update_ancestors(p);
        self.refresh_world_at(p);
    }

    /// Recomputes world matrix and world alpha at `idx` without touching the
    /// bounds tag.
    fn refresh_world_at(&mut self, idx: u32) {
        let i = idx as usize;
        let p = self.parent[i];
        let p = if p == INVALID { SENTINEL } else { p };
        let parent_transform = self.transform[p as usize];
        let parent_alpha = self.world_alpha[p as usize];
        self.transform[i].update(&parent_transform);
        self.world_alpha[i] = self.alpha[i] * parent_alpha;
    }

    /// Drains all dirty channels, returning the set of changes since the
    /// last drain.
    ///
    /// Rebuilds the traversal order first if topology changed. Draining
    /// never recomputes world state — pair it with
    /// [`update_transforms`](Self::update_transforms) in the host loop.
    pub fn drain_changes(&mut self) -> SceneChanges {
        let mut changes = SceneChanges::default();
        self.drain_changes_into(&mut changes);
        changes
    }

    /// Like [`drain_changes`](Self::drain_changes), but reuses a
    /// caller-provided buffer to avoid allocation.
    pub fn drain_changes_into(&mut self, changes: &mut SceneChanges) {
        changes.clear();

        if self.traversal_dirty {
            self.rebuild_traversal_order();
            changes.topology_changed = true;
            self.traversal_dirty = false;
        }

        changes.transforms = self
            .dirty
            .drain(dirty::TRANSFORM)
            .affected()
            .deterministic()
            .run()
            .collect();
        changes.opacities = self
            .dirty
            .drain(dirty::OPACITY)
            .affected()
            .deterministic()
            .run()
            .collect();
        changes.appearance = self
            .dirty
            .drain(dirty::APPEARANCE)
            .deterministic()
            .run()
            .collect();
        changes.content = self
            .dirty
            .drain(dirty::CONTENT)
            .deterministic()
            .run()
            .collect();

        // Drain TOPOLOGY (just consume, the rebuild above covered it).
        let _: Vec<u32> = self
            .dirty
            .drain(dirty::TOPOLOGY)
            .deterministic()
            .run()
            .collect();

        core::mem::swap(&mut self.pending_added, &mut changes.added);
        core::mem::swap(&mut self.pending_removed, &mut changes.removed);
    }

    /// Returns the current traversal order (depth-first pre-order over all
    /// live nodes, sentinel excluded).
    ///
    /// Only valid after [`drain_changes`](Self::drain_changes) has been
    /// called at least once.
    #[must_use]
    pub fn traversal_order(&self) -> &[u32] {
        &self.traversal_order
    }

    /// Rebuilds the depth-first pre-order traversal of all live nodes.
    fn rebuild_traversal_order(&mut self) {
        self.traversal_order.clear();
        for idx in (SENTINEL + 1)..self.len {
            if self.parent[idx as usize] == INVALID && !self.free_list.contains(&idx) {
                self.dfs_collect(idx);
            }
        }
    }

    /// Depth-first pre-order collection starting from `idx`.
    fn dfs_collect(&mut self, idx: u32) {
        self.traversal_order.push(idx);
        let mut child = self.first_child[idx as usize];
        while child != INVALID {
            self.dfs_collect(child);
            child = self.next_sibling[child as usize];
        }
    }
}
