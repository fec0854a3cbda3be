// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for the host loop.
//!
//! This module provides a [`TraceSink`] trait with per-event methods that
//! host-loop instrumentation calls as it drives the engine. All method bodies
//! default to no-ops, so implementing only the events you care about is fine.
//!
//! [`Tracer`] wraps an optional `&mut dyn TraceSink`. When the `trace`
//! feature is **off**, every `Tracer` method compiles to nothing (zero
//! overhead). When **on**, each method performs a single `Option` branch
//! before dispatching.
//!
//! The core defines the contract; emission sits with the host, which knows
//! where its frame begins and ends. [`changes_event`] bridges a drained
//! [`SceneChanges`] set to its event form.

use kurbo::Rect;

use crate::extensions::ExtensionPoint;
use crate::node::SceneChanges;

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Per-drain change counts, emitted after
/// [`SceneStore::drain_changes`](crate::node::SceneStore::drain_changes).
#[derive(Clone, Copy, Debug, Default)]
pub struct SceneChangesEvent {
    /// Number of nodes with stale world matrices.
    pub transforms: usize,
    /// Number of nodes with stale world alphas.
    pub opacities: usize,
    /// Number of nodes with appearance changes.
    pub appearance: usize,
    /// Number of nodes with content changes.
    pub content: usize,
    /// Nodes created since the last drain.
    pub added: usize,
    /// Nodes destroyed since the last drain.
    pub removed: usize,
    /// Whether the traversal order was rebuilt.
    pub topology_changed: bool,
}

/// Builds the event form of a drained change set.
#[must_use]
pub fn changes_event(changes: &SceneChanges) -> SceneChangesEvent {
    SceneChangesEvent {
        transforms: changes.transforms.len(),
        opacities: changes.opacities.len(),
        appearance: changes.appearance.len(),
        content: changes.content.len(),
        added: changes.added.len(),
        removed: changes.removed.len(),
        topology_changed: changes.topology_changed,
    }
}

/// Emitted when a node's world bounds were recomputed.
#[derive(Clone, Copy, Debug)]
pub struct BoundsEvent {
    /// Raw slot index of the node.
    pub node: u32,
    /// The freshly accumulated world-space rectangle.
    pub rect: Rect,
}

/// What happened to an extension record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ExtensionEventKind {
    /// Delivered to an installed handler.
    Added,
    /// Queued pending a handler.
    Queued,
    /// Drained from the queue at handler installation.
    Drained,
    /// Passed to an installed remove handler.
    Removed,
}

/// Emitted as extension records move through the registry.
#[derive(Clone, Copy, Debug)]
pub struct ExtensionEvent<'a> {
    /// The extension point involved.
    pub point: ExtensionPoint,
    /// The record's name, if it has one.
    pub name: Option<&'a str>,
    /// What happened.
    pub kind: ExtensionEventKind,
}

/// Emitted when a component claims an extension point.
#[derive(Clone, Copy, Debug)]
pub struct PointClaimedEvent {
    /// The claimed point.
    pub point: ExtensionPoint,
    /// How many queued records were drained at installation.
    pub drained: usize,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from the host loop.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called after a change drain.
    fn on_scene_changes(&mut self, e: &SceneChangesEvent) {
        _ = e;
    }

    /// Called when a node's bounds were recomputed.
    fn on_bounds_computed(&mut self, e: &BoundsEvent) {
        _ = e;
    }

    /// Called as extension records move through the registry.
    fn on_extension(&mut self, e: &ExtensionEvent<'_>) {
        _ = e;
    }

    /// Called when an extension point is claimed.
    fn on_point_claimed(&mut self, e: &PointClaimedEvent) {
        _ = e;
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Thin wrapper around an optional [`TraceSink`].
///
/// When the `trace` feature is **off**, every method compiles to nothing.
/// When **on**, each method checks the inner `Option` (one branch) before
/// dispatching to the sink.
pub struct Tracer<'a> {
    #[cfg(feature = "trace")]
    sink: Option<&'a mut dyn TraceSink>,
    #[cfg(not(feature = "trace"))]
    _marker: core::marker::PhantomData<&'a mut dyn TraceSink>,
}

impl core::fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

impl<'a> Tracer<'a> {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: &'a mut dyn TraceSink) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: None }
        }
        #[cfg(not(feature = "trace"))]
        {
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Emits a [`SceneChangesEvent`].
    #[inline]
    pub fn scene_changes(&mut self, e: &SceneChangesEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_scene_changes(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`BoundsEvent`].
    #[inline]
    pub fn bounds_computed(&mut self, e: &BoundsEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_bounds_computed(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits an [`ExtensionEvent`].
    #[inline]
    pub fn extension(&mut self, e: &ExtensionEvent<'_>) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_extension(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`PointClaimedEvent`].
    #[inline]
    pub fn point_claimed(&mut self, e: &PointClaimedEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_point_claimed(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::node::SceneStore;

    use super::*;

    #[test]
    fn changes_event_counts_the_drained_set() {
        let mut store = SceneStore::new();
        let a = store.create_node();
        let _b = store.create_node();

        let changes = store.drain_changes();
        let event = changes_event(&changes);
        assert_eq!(event.added, 2);
        assert!(event.topology_changed);

        store.set_alpha(a, 0.5);
        let event = changes_event(&store.drain_changes());
        assert_eq!(event.opacities, 1);
        assert_eq!(event.added, 0);
    }

    #[test]
    fn noop_sink_accepts_every_event() {
        let mut sink = NoopSink;
        sink.on_scene_changes(&SceneChangesEvent::default());
        sink.on_bounds_computed(&BoundsEvent {
            node: 1,
            rect: Rect::ZERO,
        });
        sink.on_extension(&ExtensionEvent {
            point: ExtensionPoint::new("p"),
            name: None,
            kind: ExtensionEventKind::Queued,
        });
        sink.on_point_claimed(&PointClaimedEvent {
            point: ExtensionPoint::new("p"),
            drained: 0,
        });
    }

    #[cfg(feature = "trace")]
    #[test]
    fn tracer_dispatches_when_enabled() {
        #[derive(Default)]
        struct Counting(u32);
        impl TraceSink for Counting {
            fn on_scene_changes(&mut self, _e: &SceneChangesEvent) {
                self.0 += 1;
            }
        }

        let mut sink = Counting::default();
        {
            let mut tracer = Tracer::new(&mut sink);
            tracer.scene_changes(&SceneChangesEvent::default());
        }
        assert_eq!(sink.0, 1);

        // A disabled tracer stays silent.
        let mut tracer = Tracer::none();
        tracer.scene_changes(&SceneChangesEvent::default());
    }
}
