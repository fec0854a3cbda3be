// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Extension records and their normalization.

use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;
use core::any::Any;
use core::fmt;

/// Identifies an extension point.
///
/// Points are compared by their static name; the well-known names live with
/// the component that owns the point (e.g. the render pipeline composer).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ExtensionPoint(&'static str);

impl ExtensionPoint {
    /// Creates a point identifier from its name.
    #[inline]
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    /// Returns the point's name.
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        self.0
    }
}

impl fmt::Debug for ExtensionPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ExtensionPoint({:?})", self.0)
    }
}

impl fmt::Display for ExtensionPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// The opaque handle to a registered implementation.
///
/// Identity (for unnamed-list ordering and removal) is `Rc::ptr_eq`.
pub type ExtensionHandle = Rc<dyn Any>;

/// Metadata an extension declares about itself.
#[derive(Clone, Debug)]
pub struct ExtensionMetadata {
    /// The extension points this extension registers under. Must not be
    /// empty.
    pub points: Vec<ExtensionPoint>,
    /// Key within named lists and maps.
    pub name: Option<String>,
    /// Ordering priority; falls back to the handler's default when `None`.
    pub priority: Option<i32>,
}

impl ExtensionMetadata {
    /// Metadata for a single anonymous registration under `point`.
    #[must_use]
    pub fn for_point(point: ExtensionPoint) -> Self {
        Self {
            points: vec![point],
            name: None,
            priority: None,
        }
    }

    /// Sets the name key.
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the ordering priority.
    #[must_use]
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = Some(priority);
        self
    }
}

/// A bare extension implementation that carries its own metadata.
///
/// Implementations are registered as `Rc<dyn Extension>` and delivered to
/// handlers as their [`ExtensionHandle`] upcast; handlers downcast to the
/// concrete type they expect.
pub trait Extension: Any {
    /// Returns the registration metadata for this implementation.
    fn metadata(&self) -> ExtensionMetadata;
}

/// An explicit registration descriptor wrapping an opaque handle.
#[derive(Clone)]
pub struct ExtensionDescriptor {
    /// The extension points to register under. Must not be empty.
    pub points: Vec<ExtensionPoint>,
    /// Key within named lists and maps.
    pub name: Option<String>,
    /// Ordering priority; falls back to the handler's default when `None`.
    pub priority: Option<i32>,
    /// The implementation handle delivered to handlers.
    pub handle: ExtensionHandle,
}

impl fmt::Debug for ExtensionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtensionDescriptor")
            .field("points", &self.points)
            .field("name", &self.name)
            .field("priority", &self.priority)
            .finish_non_exhaustive()
    }
}

/// The closed set of shapes accepted by [`add`](super::Extensions::add) and
/// [`remove`](super::Extensions::remove).
#[derive(Clone)]
pub enum ExtensionItem {
    /// A bare implementation carrying its own metadata.
    Bare(Rc<dyn Extension>),
    /// An explicit descriptor around an opaque handle.
    Descriptor(ExtensionDescriptor),
}

impl fmt::Debug for ExtensionItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bare(_) => f.debug_tuple("Bare").finish_non_exhaustive(),
            Self::Descriptor(d) => f.debug_tuple("Descriptor").field(d).finish(),
        }
    }
}

impl From<ExtensionDescriptor> for ExtensionItem {
    fn from(descriptor: ExtensionDescriptor) -> Self {
        Self::Descriptor(descriptor)
    }
}

impl<E: Extension> From<Rc<E>> for ExtensionItem {
    fn from(implementation: Rc<E>) -> Self {
        Self::Bare(implementation)
    }
}

impl ExtensionItem {
    /// Resolves the item into a normalized [`ExtensionEntry`].
    ///
    /// # Panics
    ///
    /// Panics if the item declares no extension point — the one malformed
    /// shape the closed set cannot rule out statically.
    #[must_use]
    pub fn normalize(self) -> ExtensionEntry {
        let entry = match self {
            Self::Bare(implementation) => {
                let metadata = implementation.metadata();
                let handle: ExtensionHandle = implementation;
                ExtensionEntry {
                    points: metadata.points,
                    name: metadata.name,
                    priority: metadata.priority,
                    handle,
                }
            }
            Self::Descriptor(descriptor) => ExtensionEntry {
                points: descriptor.points,
                name: descriptor.name,
                priority: descriptor.priority,
                handle: descriptor.handle,
            },
        };
        assert!(
            !entry.points.is_empty(),
            "extension must declare at least one extension point"
        );
        entry
    }
}

/// A normalized extension record, as delivered to handlers.
#[derive(Clone)]
pub struct ExtensionEntry {
    /// The points this record registers under (never empty).
    pub points: Vec<ExtensionPoint>,
    /// Key within named lists and maps.
    pub name: Option<String>,
    /// Declared priority, if any.
    pub priority: Option<i32>,
    /// The implementation handle.
    pub handle: ExtensionHandle,
}

impl ExtensionEntry {
    /// Returns the effective priority given a handler's default.
    #[inline]
    #[must_use]
    pub fn priority_or(&self, default_priority: i32) -> i32 {
        self.priority.unwrap_or(default_priority)
    }
}

impl fmt::Debug for ExtensionEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtensionEntry")
            .field("points", &self.points)
            .field("name", &self.name)
            .field("priority", &self.priority)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Dummy;

    impl Extension for Dummy {
        fn metadata(&self) -> ExtensionMetadata {
            ExtensionMetadata::for_point(ExtensionPoint::new("dummy"))
                .named("dummy-impl")
                .with_priority(7)
        }
    }

    #[test]
    fn bare_implementation_normalizes_through_its_metadata() {
        let item = ExtensionItem::from(Rc::new(Dummy));
        let entry = item.normalize();
        assert_eq!(entry.points, vec![ExtensionPoint::new("dummy")]);
        assert_eq!(entry.name.as_deref(), Some("dummy-impl"));
        assert_eq!(entry.priority, Some(7));
        assert!(entry.handle.downcast_ref::<Dummy>().is_some());
    }

    #[test]
    fn descriptor_normalizes_verbatim() {
        let handle: ExtensionHandle = Rc::new(42_u32);
        let entry = ExtensionItem::from(ExtensionDescriptor {
            points: vec![ExtensionPoint::new("a"), ExtensionPoint::new("b")],
            name: None,
            priority: None,
            handle,
        })
        .normalize();
        assert_eq!(entry.points.len(), 2);
        assert_eq!(entry.priority_or(-1), -1);
    }

    #[test]
    #[should_panic(expected = "at least one extension point")]
    fn empty_point_list_is_rejected() {
        let _ = ExtensionItem::from(ExtensionDescriptor {
            points: vec![],
            name: None,
            priority: None,
            handle: Rc::new(()),
        })
        .normalize();
    }
}
