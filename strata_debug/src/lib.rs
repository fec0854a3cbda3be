// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Diagnostics for strata: human-readable trace output, scene-tree dumps,
//! and change recording.
//!
//! - [`PrettyPrintSink`] writes one line per trace event to any
//!   [`Write`](std::io::Write) destination.
//! - [`tree_to_string`] renders a scene tree as indented text.
//! - [`ChangeRecorder`] accumulates per-drain change summaries for tests and
//!   tooling.

mod pretty;
mod recorder;

pub use pretty::{PrettyPrintSink, tree_to_string};
pub use recorder::{ChangeRecord, ChangeRecorder};
