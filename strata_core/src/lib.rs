// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scene-graph and extension-registry core for 2D rendering.
//!
//! `strata_core` provides the foundational data structures of a 2D rendering
//! engine: a tree of renderable nodes with hierarchical transforms and cached
//! world bounds, and a registry through which independently-loaded modules
//! attach themselves to named extension points. It is `no_std` compatible
//! (with `alloc`) and uses array-based struct-of-arrays storage with index
//! handles for cache-friendly traversal.
//!
//! # Architecture
//!
//! Application code mutates node properties; setters mark per-channel dirty
//! state. A host loop drives the two consumption paths:
//!
//! ```text
//!   property setters ──► dirty channels ──► SceneStore::drain_changes()
//!                                                 │
//!                                                 ▼
//!   host loop ──► SceneStore::update_transforms() (parent-before-child)
//!                     │
//!                     ▼
//!   on-demand queries: bounds() / to_global() / to_local()
//!
//!   plugin modules ──► Extensions::add() ──► queued or delivered
//!   pipeline owner ──► Extensions::handle() ──► queue drained FIFO
//! ```
//!
//! **[`node`]** — Struct-of-arrays scene store with generational handles.
//! Local properties (transform components, opacity, visibility, z-order,
//! mask, content) are set by the caller; world transforms, world alphas, and
//! bounds are computed by the update and query primitives.
//!
//! **[`transform`]** — Decomposed 2D transform (position, scale, rotation,
//! skew, pivot) composing [`kurbo::Affine`] matrices.
//!
//! **[`bounds`]** — Axis-aligned accumulator producing [`kurbo::Rect`]
//! snapshots.
//!
//! **[`dirty`]** — Multi-channel dirty tracking via `understory_dirty`.
//! TRANSFORM and OPACITY propagate to descendants; APPEARANCE and CONTENT are
//! local-only; TOPOLOGY marks structural change.
//!
//! **[`extensions`]** — Type-keyed plugin registration with per-point single
//! ownership, FIFO queuing before handler installation, and priority-ordered
//! list composition.
//!
//! **[`trace`]** — [`TraceSink`](trace::TraceSink) trait and event types for
//! host-loop instrumentation, with zero-overhead [`Tracer`](trace::Tracer)
//! wrapper.
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one
//!   branch per call site).

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod bounds;
pub mod dirty;
pub mod extensions;
pub mod node;
pub mod trace;
pub mod transform;
