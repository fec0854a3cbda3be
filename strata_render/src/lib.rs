// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Render-plan definitions and pipeline composition for strata.
//!
//! This crate is the bridge between [`strata_core`]'s scene tree and
//! backend-specific rendering. It defines:
//!
//! - [`RenderItem`] — a single draw command in the render plan
//! - [`RenderPlan`] — an ordered list of draw commands for one frame
//! - [`build_plan`] — the culled, back-to-front walk producing a plan
//! - [`PipelineSlots`] — the startup composer that claims the well-known
//!   extension points and receives backend, stage, blend-mode, and
//!   asset-parser registrations in either load order

#![no_std]
#![cfg_attr(docsrs, feature(doc_cfg))]

extern crate alloc;

mod compose;
mod plan;

pub use compose::{ASSET_PARSER, BLEND_MODE, PIPELINE_STAGE, PipelineSlots, RENDER_BACKEND};
pub use plan::{BlendMode, RenderItem, RenderPlan, build_plan};
