// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output and scene-tree dumps.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr).
//! [`tree_to_string`] renders a scene tree as indented text for quick
//! inspection in logs and test failures.

use std::fmt::Write as _;
use std::io::Write;

use strata_core::node::{NodeId, SceneStore};
use strata_core::trace::{
    BoundsEvent, ExtensionEvent, ExtensionEventKind, PointClaimedEvent, SceneChangesEvent,
    TraceSink,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write)
/// destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink").finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self {
            writer: Box::new(std::io::stderr()),
        }
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self { writer }
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self { writer }
    }

    /// Consumes the sink, returning the destination.
    pub fn into_writer(self) -> W {
        self.writer
    }
}

fn kind_name(kind: ExtensionEventKind) -> &'static str {
    match kind {
        ExtensionEventKind::Added => "added",
        ExtensionEventKind::Queued => "queued",
        ExtensionEventKind::Drained => "drained",
        ExtensionEventKind::Removed => "removed",
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_scene_changes(&mut self, e: &SceneChangesEvent) {
        let _ = writeln!(
            self.writer,
            "[changes] transforms={} opacities={} appearance={} content={} \
             added={} removed={} topology={}",
            e.transforms, e.opacities, e.appearance, e.content, e.added, e.removed,
            e.topology_changed,
        );
    }

    fn on_bounds_computed(&mut self, e: &BoundsEvent) {
        let _ = writeln!(
            self.writer,
            "[bounds] node={} rect=({:.1},{:.1})..({:.1},{:.1})",
            e.node, e.rect.x0, e.rect.y0, e.rect.x1, e.rect.y1,
        );
    }

    fn on_extension(&mut self, e: &ExtensionEvent<'_>) {
        let _ = writeln!(
            self.writer,
            "[ext:{}] point={} name={}",
            kind_name(e.kind),
            e.point,
            e.name.unwrap_or("-"),
        );
    }

    fn on_point_claimed(&mut self, e: &PointClaimedEvent) {
        let _ = writeln!(
            self.writer,
            "[claim] point={} drained={}",
            e.point, e.drained,
        );
    }
}

/// Renders the scene tree as indented text, one node per line.
///
/// Flags are appended only when off their defaults, so a quiet tree reads
/// quietly.
#[must_use]
pub fn tree_to_string(store: &SceneStore) -> String {
    let mut out = String::new();
    for root in store.roots() {
        write_node(store, root, 0, &mut out);
    }
    out
}

fn write_node(store: &SceneStore, id: NodeId, depth: usize, out: &mut String) {
    for _ in 0..depth {
        out.push_str("  ");
    }
    let _ = write!(out, "{id:?} z={} alpha={}", store.z_index(id), store.alpha(id));
    if !store.visible(id) {
        out.push_str(" hidden");
    }
    if !store.renderable(id) {
        out.push_str(" non-renderable");
    }
    if store.is_mask(id) {
        out.push_str(" mask");
    }
    if let Some(content) = store.content(id) {
        let _ = write!(out, " surface={}", content.surface.0);
    }
    out.push('\n');
    for child in store.children(id) {
        write_node(store, child, depth + 1, out);
    }
}
