// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dirty-tracking channel constants.
//!
//! Strata uses multi-channel dirty tracking (via [`understory_dirty`]) as the
//! engine's "something changed" signal: property setters mark the matching
//! channel on a real value change, and a host loop drains all channels once
//! per frame through
//! [`SceneStore::drain_changes`](crate::node::SceneStore::drain_changes) to
//! decide what to repaint. Draining reports; it never recomputes — world
//! transforms and bounds are recomputed by the update and query primitives.
//!
//! # Propagation semantics
//!
//! - **Propagating** — [`TRANSFORM`] and [`OPACITY`] use
//!   [`EagerPolicy`](understory_dirty::EagerPolicy) and have dependency
//!   edges from child to parent. Marking a parent dirty automatically marks
//!   all descendants, because world matrices and world alphas are inherited
//!   properties.
//!
//! - **Local-only** — [`APPEARANCE`] and [`CONTENT`] are marked with the
//!   default policy. Visibility, renderability, z-order, mask, and filter
//!   area affect how a node is drawn but inherit nothing, so only the
//!   explicitly marked node appears in the drain output.
//!
//! - **Structural** — [`TOPOLOGY`] is marked on structural mutations
//!   (create/destroy, attach/detach, child reordering). It triggers a
//!   traversal-order rebuild during the next drain but does not propagate.

use understory_dirty::Channel;

/// A transform component changed — world matrices of the subtree are stale.
pub const TRANSFORM: Channel = Channel::new(0);

/// Opacity changed — world alphas of the subtree are stale.
pub const OPACITY: Channel = Channel::new(1);

/// Visibility, renderability, z-order, mask, or filter area changed.
pub const APPEARANCE: Channel = Channel::new(2);

/// Surface content changed — no propagation needed.
pub const CONTENT: Channel = Channel::new(3);

/// Tree topology changed — triggers traversal order rebuild.
pub const TOPOLOGY: Channel = Channel::new(4);
