// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Change recording for tests and tooling.

use strata_core::node::SceneChanges;
use strata_core::trace::{SceneChangesEvent, TraceSink, changes_event};

/// One recorded drain, in observation order.
#[derive(Clone, Copy, Debug)]
pub struct ChangeRecord {
    /// Monotonic observation counter, starting at 0.
    pub sequence: u64,
    /// The drained change counts.
    pub event: SceneChangesEvent,
}

/// Accumulates per-drain change summaries.
///
/// Feed it either directly ([`observe`](Self::observe)) or as a
/// [`TraceSink`] behind a [`Tracer`](strata_core::trace::Tracer).
#[derive(Debug, Default)]
pub struct ChangeRecorder {
    records: Vec<ChangeRecord>,
    next_sequence: u64,
}

impl ChangeRecorder {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a drained change set.
    pub fn observe(&mut self, changes: &SceneChanges) {
        self.on_scene_changes(&changes_event(changes));
    }

    /// Returns all records, oldest first.
    #[must_use]
    pub fn records(&self) -> &[ChangeRecord] {
        &self.records
    }

    /// Returns the most recent record, if any.
    #[must_use]
    pub fn last(&self) -> Option<&ChangeRecord> {
        self.records.last()
    }

    /// Forgets all records; the sequence counter keeps counting.
    pub fn clear(&mut self) {
        self.records.clear();
    }
}

impl TraceSink for ChangeRecorder {
    fn on_scene_changes(&mut self, e: &SceneChangesEvent) {
        self.records.push(ChangeRecord {
            sequence: self.next_sequence,
            event: *e,
        });
        self.next_sequence += 1;
    }
}
