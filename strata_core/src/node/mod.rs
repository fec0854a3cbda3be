// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scene tree data model.
//!
//! A *node* is an element of the scene graph. Each node has:
//!
//! - An identity ([`NodeId`]) — a generational handle that becomes stale when
//!   the node is destroyed, preventing use-after-free bugs at the API level.
//! - Topology — parent, first-child, and sibling links forming an ordered
//!   forest. The child→parent link is a non-owning index; destroying a
//!   subtree never keeps it alive through back-references.
//! - **Local properties** set by the caller: transform components
//!   (position/scale/rotation/skew/pivot), opacity, visibility,
//!   renderability, z-order, mask, filter area, and surface content.
//! - **Derived state** produced by the update and query primitives:
//!   world matrix, `world_alpha` (own alpha × parent world alpha), and the
//!   cached world bounds behind the `bounds_id`/`last_bounds_id` tag pair.
//!
//! Nodes are stored in struct-of-arrays layout with index-based handles for
//! cache-friendly traversal. Slot 0 of every store is the *sentinel root*: a
//! never-exposed identity parent that gives detached nodes a well-defined
//! world space without a separate code path in the update primitive.
//!
//! # Dirty tracking
//!
//! Property setters compare against the current value and, only on a real
//! change, mark the corresponding channel (see [`dirty`](crate::dirty)).
//! [`SceneStore::drain_changes`] consumes all channels into a
//! [`SceneChanges`] set — the per-frame repaint hint for the host loop.

mod id;
mod query;
mod store;
mod traverse;
mod update;

pub use id::{INVALID, NodeId, SurfaceId};
pub use query::SceneError;
pub use store::{Content, SceneStore};
pub use traverse::Children;
pub use update::SceneChanges;
