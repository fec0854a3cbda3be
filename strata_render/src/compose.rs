// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pipeline composition from the extension registry.
//!
//! At startup the render pipeline claims the extension points it
//! understands; the registry feeds it registrations as they arrive, whether
//! a plugin loaded before or after the pipeline. All of the pipeline's
//! composition state lives in shared slot targets the registry handlers
//! write into.

use alloc::collections::BTreeMap;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::cell::RefCell;

use strata_core::extensions::{
    DEFAULT_PRIORITY, ExtensionHandle, ExtensionPoint, Extensions, ExtensionsError, ListEntry,
    NamedEntry,
};

/// Backend implementations, keyed by name, highest priority first.
pub const RENDER_BACKEND: ExtensionPoint = ExtensionPoint::new("render-backend");

/// Pipeline stages, ordered by priority (higher runs earlier).
pub const PIPELINE_STAGE: ExtensionPoint = ExtensionPoint::new("pipeline-stage");

/// Blend-mode formulas, keyed by name. The formula payload is opaque data
/// interpreted by backends.
pub const BLEND_MODE: ExtensionPoint = ExtensionPoint::new("blend-mode");

/// Asset-loader parsers, keyed by name, highest priority first.
pub const ASSET_PARSER: ExtensionPoint = ExtensionPoint::new("asset-parser");

/// The composition targets a render pipeline assembles itself from.
///
/// Create one, [`attach`](Self::attach) it to the host's registry, and read
/// the slots when building the pipeline. Registrations made before the
/// attach are drained into the slots at attach time, in arrival order.
#[derive(Clone, Default)]
pub struct PipelineSlots {
    /// Registered rendering backends.
    pub backends: Rc<RefCell<Vec<NamedEntry>>>,
    /// Registered pipeline stages, priority-ordered.
    pub stages: Rc<RefCell<Vec<ListEntry>>>,
    /// Registered blend-mode formulas.
    pub blend_modes: Rc<RefCell<BTreeMap<String, ExtensionHandle>>>,
    /// Registered asset parsers.
    pub parsers: Rc<RefCell<Vec<NamedEntry>>>,
}

impl core::fmt::Debug for PipelineSlots {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PipelineSlots")
            .field("backends", &self.backends.borrow().len())
            .field("stages", &self.stages.borrow().len())
            .field("blend_modes", &self.blend_modes.borrow().len())
            .field("parsers", &self.parsers.borrow().len())
            .finish()
    }
}

impl PipelineSlots {
    /// Creates empty composition targets.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims the four well-known extension points on `extensions`.
    ///
    /// # Errors
    ///
    /// Returns [`ExtensionsError::PointAlreadyClaimed`] if any of the points
    /// already has an owner — the pipeline must be the sole composer.
    pub fn attach(&self, extensions: &mut Extensions) -> Result<(), ExtensionsError> {
        extensions.handle_by_named_list(
            RENDER_BACKEND,
            Rc::clone(&self.backends),
            DEFAULT_PRIORITY,
        )?;
        extensions.handle_by_list(PIPELINE_STAGE, Rc::clone(&self.stages), DEFAULT_PRIORITY)?;
        extensions.handle_by_map(BLEND_MODE, Rc::clone(&self.blend_modes))?;
        extensions.handle_by_named_list(ASSET_PARSER, Rc::clone(&self.parsers), DEFAULT_PRIORITY)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use strata_core::extensions::ExtensionDescriptor;

    use super::*;

    fn named(point: ExtensionPoint, name: &str, priority: Option<i32>) -> ExtensionDescriptor {
        ExtensionDescriptor {
            points: vec![point],
            name: Some(String::from(name)),
            priority,
            handle: Rc::new(String::from(name)),
        }
    }

    #[test]
    fn backends_registered_before_attach_arrive_at_attach() {
        let mut extensions = Extensions::new();
        extensions.add(named(RENDER_BACKEND, "gpu", Some(10)));
        extensions.add(named(RENDER_BACKEND, "software", None));

        let slots = PipelineSlots::new();
        slots.attach(&mut extensions).expect("points are unclaimed");

        let backends = slots.backends.borrow();
        assert_eq!(backends.len(), 2);
        assert_eq!(backends[0].name, "gpu");
        assert_eq!(backends[1].name, "software");
    }

    #[test]
    fn stages_compose_in_priority_order_across_attach() {
        let mut extensions = Extensions::new();
        extensions.add(ExtensionDescriptor {
            points: vec![PIPELINE_STAGE],
            name: None,
            priority: Some(5),
            handle: Rc::new(String::from("mid")),
        });

        let slots = PipelineSlots::new();
        slots.attach(&mut extensions).expect("points are unclaimed");

        extensions.add(ExtensionDescriptor {
            points: vec![PIPELINE_STAGE],
            name: None,
            priority: Some(10),
            handle: Rc::new(String::from("early")),
        });

        let priorities: Vec<i32> = slots.stages.borrow().iter().map(|e| e.priority).collect();
        assert_eq!(priorities, vec![10, 5]);
    }

    #[test]
    fn blend_modes_land_in_the_map() {
        let mut extensions = Extensions::new();
        let slots = PipelineSlots::new();
        slots.attach(&mut extensions).expect("points are unclaimed");

        extensions.add(named(BLEND_MODE, "overlay", None));
        assert!(slots.blend_modes.borrow().contains_key("overlay"));
    }

    #[test]
    fn one_extension_can_serve_several_points() {
        let mut extensions = Extensions::new();
        let slots = PipelineSlots::new();
        slots.attach(&mut extensions).expect("points are unclaimed");

        extensions.add(ExtensionDescriptor {
            points: vec![ASSET_PARSER, PIPELINE_STAGE],
            name: Some(String::from("svg")),
            priority: None,
            handle: Rc::new(String::from("svg")),
        });

        assert_eq!(slots.parsers.borrow().len(), 1);
        assert_eq!(slots.stages.borrow().len(), 1);
    }

    #[test]
    fn second_composer_is_rejected() {
        let mut extensions = Extensions::new();
        let slots = PipelineSlots::new();
        slots.attach(&mut extensions).expect("points are unclaimed");

        let rival = PipelineSlots::new();
        assert_eq!(
            rival.attach(&mut extensions),
            Err(ExtensionsError::PointAlreadyClaimed(RENDER_BACKEND))
        );
    }
}
