// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The extension registry and its composition helpers.

use alloc::boxed::Box;
use alloc::collections::BTreeMap;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::cell::RefCell;
use core::fmt;

use thiserror::Error;

use super::entry::{ExtensionEntry, ExtensionHandle, ExtensionItem, ExtensionPoint};

/// Priority used when neither the record nor the handler supplies one.
pub const DEFAULT_PRIORITY: i32 = -1;

/// Errors surfaced by the registry.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum ExtensionsError {
    /// [`Extensions::handle`] was called for a point that already has an
    /// owner. Each extension point may be claimed exactly once for its
    /// lifetime.
    #[error("extension point {0} already has a registered owner")]
    PointAlreadyClaimed(ExtensionPoint),
}

/// An entry in a priority-ordered list target.
#[derive(Clone)]
pub struct ListEntry {
    /// The effective priority the entry was inserted with.
    pub priority: i32,
    /// The implementation handle.
    pub handle: ExtensionHandle,
}

impl fmt::Debug for ListEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListEntry")
            .field("priority", &self.priority)
            .finish_non_exhaustive()
    }
}

/// An entry in a priority-ordered, name-keyed list target.
#[derive(Clone)]
pub struct NamedEntry {
    /// The name the entry is keyed by.
    pub name: String,
    /// The effective priority the entry was inserted with.
    pub priority: i32,
    /// The implementation handle.
    pub handle: ExtensionHandle,
}

impl fmt::Debug for NamedEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NamedEntry")
            .field("name", &self.name)
            .field("priority", &self.priority)
            .finish_non_exhaustive()
    }
}

type HandlerFn = Box<dyn FnMut(&ExtensionEntry)>;

struct PointHandlers {
    on_add: HandlerFn,
    on_remove: HandlerFn,
}

#[derive(Default)]
struct PointSlot {
    handlers: Option<PointHandlers>,
    /// Pending records, populated only while no handler is installed.
    queue: Vec<ExtensionEntry>,
}

/// The extension registry.
///
/// Maps extension points to their (single) owning handler pair and, before an
/// owner claims a point, queues records FIFO. Create one per host at engine
/// startup; all operations are synchronous and single-threaded.
#[derive(Default)]
pub struct Extensions {
    points: BTreeMap<ExtensionPoint, PointSlot>,
}

impl fmt::Debug for Extensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Extensions")
            .field("points", &self.points.len())
            .finish_non_exhaustive()
    }
}

impl Extensions {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an extension.
    ///
    /// For every point the record declares: if the point has an owner, the
    /// record is delivered to its add handler immediately; otherwise it joins
    /// the point's pending queue and is delivered, in arrival order, when an
    /// owner claims the point.
    ///
    /// # Panics
    ///
    /// Panics if the item declares no extension point.
    pub fn add(&mut self, item: impl Into<ExtensionItem>) {
        let entry = item.into().normalize();
        for &point in &entry.points {
            let slot = self.points.entry(point).or_default();
            match slot.handlers.as_mut() {
                Some(handlers) => (handlers.on_add)(&entry),
                None => slot.queue.push(entry.clone()),
            }
        }
    }

    /// Unregisters an extension.
    ///
    /// For every point the record declares, the point's remove handler is
    /// invoked if one is installed; what "matching" means (by name, by
    /// handle identity) is the handler's decision, so removing a record that
    /// was never added is a no-op from the caller's perspective. Points
    /// without an owner ignore the call; a queued record is not retracted.
    ///
    /// # Panics
    ///
    /// Panics if the item declares no extension point.
    pub fn remove(&mut self, item: impl Into<ExtensionItem>) {
        let entry = item.into().normalize();
        for &point in &entry.points {
            if let Some(slot) = self.points.get_mut(&point)
                && let Some(handlers) = slot.handlers.as_mut()
            {
                (handlers.on_remove)(&entry);
            }
        }
    }

    /// Claims `point`, installing its add and remove handlers.
    ///
    /// Records queued for the point are drained through `on_add` in FIFO
    /// arrival order, then the queue is discarded. Records added afterwards
    /// are delivered directly, in call order, after the drained ones.
    ///
    /// # Errors
    ///
    /// Returns [`ExtensionsError::PointAlreadyClaimed`] if the point already
    /// has an owner.
    pub fn handle(
        &mut self,
        point: ExtensionPoint,
        on_add: impl FnMut(&ExtensionEntry) + 'static,
        on_remove: impl FnMut(&ExtensionEntry) + 'static,
    ) -> Result<(), ExtensionsError> {
        let slot = self.points.entry(point).or_default();
        if slot.handlers.is_some() {
            return Err(ExtensionsError::PointAlreadyClaimed(point));
        }
        slot.handlers = Some(PointHandlers {
            on_add: Box::new(on_add),
            on_remove: Box::new(on_remove),
        });

        let queued = core::mem::take(&mut slot.queue);
        if let Some(handlers) = slot.handlers.as_mut() {
            for entry in &queued {
                (handlers.on_add)(entry);
            }
        }
        Ok(())
    }

    /// Claims `point` with handlers that maintain a name-keyed map.
    ///
    /// Adding inserts `entry.name → entry.handle` (the last registration
    /// under a name wins); removing deletes the key.
    ///
    /// # Errors
    ///
    /// Returns [`ExtensionsError::PointAlreadyClaimed`] if the point already
    /// has an owner.
    ///
    /// # Panics
    ///
    /// The installed add handler panics when given an unnamed record — a map
    /// target has nothing to key it by.
    pub fn handle_by_map(
        &mut self,
        point: ExtensionPoint,
        target: Rc<RefCell<BTreeMap<String, ExtensionHandle>>>,
    ) -> Result<(), ExtensionsError> {
        let add_target = Rc::clone(&target);
        self.handle(
            point,
            move |entry| {
                let name = match &entry.name {
                    Some(name) => name.clone(),
                    None => panic!("extension for map-handled point {point} requires a name"),
                };
                add_target
                    .borrow_mut()
                    .insert(name, Rc::clone(&entry.handle));
            },
            move |entry| {
                if let Some(name) = &entry.name {
                    target.borrow_mut().remove(name);
                }
            },
        )
    }

    /// Claims `point` with handlers that maintain a priority-ordered list.
    ///
    /// Adding appends the handle (unless already present, by identity) and
    /// stably re-sorts the list descending by priority, so higher-priority
    /// entries come first and equal priorities keep insertion order.
    /// Removing matches by handle identity.
    ///
    /// # Errors
    ///
    /// Returns [`ExtensionsError::PointAlreadyClaimed`] if the point already
    /// has an owner.
    pub fn handle_by_list(
        &mut self,
        point: ExtensionPoint,
        target: Rc<RefCell<Vec<ListEntry>>>,
        default_priority: i32,
    ) -> Result<(), ExtensionsError> {
        let add_target = Rc::clone(&target);
        self.handle(
            point,
            move |entry| {
                let mut list = add_target.borrow_mut();
                if list.iter().any(|e| Rc::ptr_eq(&e.handle, &entry.handle)) {
                    return;
                }
                list.push(ListEntry {
                    priority: entry.priority_or(default_priority),
                    handle: Rc::clone(&entry.handle),
                });
                list.sort_by(|a, b| b.priority.cmp(&a.priority));
            },
            move |entry| {
                target
                    .borrow_mut()
                    .retain(|e| !Rc::ptr_eq(&e.handle, &entry.handle));
            },
        )
    }

    /// Claims `point` with handlers that maintain a priority-ordered,
    /// name-keyed list.
    ///
    /// Like [`handle_by_list`](Self::handle_by_list), but entries are keyed
    /// and deduplicated by name — the first registration under a name is
    /// kept — and removal matches by name.
    ///
    /// # Errors
    ///
    /// Returns [`ExtensionsError::PointAlreadyClaimed`] if the point already
    /// has an owner.
    ///
    /// # Panics
    ///
    /// The installed add handler panics when given an unnamed record.
    pub fn handle_by_named_list(
        &mut self,
        point: ExtensionPoint,
        target: Rc<RefCell<Vec<NamedEntry>>>,
        default_priority: i32,
    ) -> Result<(), ExtensionsError> {
        let add_target = Rc::clone(&target);
        self.handle(
            point,
            move |entry| {
                let name = match &entry.name {
                    Some(name) => name.clone(),
                    None => panic!("extension for named-list point {point} requires a name"),
                };
                let mut list = add_target.borrow_mut();
                if list.iter().any(|e| e.name == name) {
                    return;
                }
                list.push(NamedEntry {
                    name,
                    priority: entry.priority_or(default_priority),
                    handle: Rc::clone(&entry.handle),
                });
                list.sort_by(|a, b| b.priority.cmp(&a.priority));
            },
            move |entry| {
                if let Some(name) = &entry.name {
                    target.borrow_mut().retain(|e| &e.name != name);
                }
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use super::super::entry::ExtensionDescriptor;
    use super::*;

    fn descriptor(point: ExtensionPoint, name: &str, priority: Option<i32>) -> ExtensionDescriptor {
        ExtensionDescriptor {
            points: vec![point],
            name: Some(String::from(name)),
            priority,
            handle: Rc::new(String::from(name)),
        }
    }

    const POINT: ExtensionPoint = ExtensionPoint::new("test-point");

    #[test]
    fn queued_records_drain_fifo_on_claim() {
        let mut extensions = Extensions::new();
        extensions.add(descriptor(POINT, "a", None));
        extensions.add(descriptor(POINT, "b", None));

        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        extensions
            .handle(
                POINT,
                move |entry| {
                    if let Some(name) = entry.name.clone() {
                        sink.borrow_mut().push(name);
                    }
                },
                |_| {},
            )
            .expect("point is unclaimed");

        assert_eq!(*seen.borrow(), vec!["a", "b"]);
    }

    #[test]
    fn records_added_after_claim_deliver_immediately() {
        let mut extensions = Extensions::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        extensions
            .handle(
                POINT,
                move |entry| {
                    if let Some(name) = entry.name.clone() {
                        sink.borrow_mut().push(name);
                    }
                },
                |_| {},
            )
            .expect("point is unclaimed");

        extensions.add(descriptor(POINT, "late", None));
        assert_eq!(*seen.borrow(), vec!["late"]);
    }

    #[test]
    fn second_claim_fails() {
        let mut extensions = Extensions::new();
        extensions
            .handle(POINT, |_| {}, |_| {})
            .expect("first claim succeeds");
        assert_eq!(
            extensions.handle(POINT, |_| {}, |_| {}),
            Err(ExtensionsError::PointAlreadyClaimed(POINT))
        );
    }

    #[test]
    fn multi_point_records_fan_out() {
        const A: ExtensionPoint = ExtensionPoint::new("a");
        const B: ExtensionPoint = ExtensionPoint::new("b");

        let mut extensions = Extensions::new();
        let hits = Rc::new(RefCell::new(0_u32));

        for point in [A, B] {
            let counter = Rc::clone(&hits);
            extensions
                .handle(point, move |_| *counter.borrow_mut() += 1, |_| {})
                .expect("point is unclaimed");
        }

        extensions.add(ExtensionDescriptor {
            points: vec![A, B],
            name: None,
            priority: None,
            handle: Rc::new(()),
        });
        assert_eq!(*hits.borrow(), 2);
    }

    #[test]
    fn remove_without_owner_is_a_no_op() {
        let mut extensions = Extensions::new();
        extensions.remove(descriptor(POINT, "ghost", None));
    }

    #[test]
    fn map_target_last_registration_wins() {
        let mut extensions = Extensions::new();
        let map = Rc::new(RefCell::new(BTreeMap::new()));
        extensions
            .handle_by_map(POINT, Rc::clone(&map))
            .expect("point is unclaimed");

        let first: ExtensionHandle = Rc::new(1_u32);
        let second: ExtensionHandle = Rc::new(2_u32);
        extensions.add(ExtensionDescriptor {
            points: vec![POINT],
            name: Some(String::from("backend")),
            priority: None,
            handle: Rc::clone(&first),
        });
        extensions.add(ExtensionDescriptor {
            points: vec![POINT],
            name: Some(String::from("backend")),
            priority: None,
            handle: Rc::clone(&second),
        });

        let map = map.borrow();
        let stored = map.get("backend").expect("name registered");
        assert!(Rc::ptr_eq(stored, &second));
    }

    #[test]
    fn map_target_remove_deletes_the_key() {
        let mut extensions = Extensions::new();
        let map = Rc::new(RefCell::new(BTreeMap::new()));
        extensions
            .handle_by_map(POINT, Rc::clone(&map))
            .expect("point is unclaimed");

        let record = descriptor(POINT, "backend", None);
        extensions.add(record.clone());
        assert!(map.borrow().contains_key("backend"));

        extensions.remove(record);
        assert!(map.borrow().is_empty());
    }

    #[test]
    fn list_target_orders_by_priority() {
        let mut extensions = Extensions::new();
        let list = Rc::new(RefCell::new(Vec::new()));
        extensions
            .handle_by_list(POINT, Rc::clone(&list), DEFAULT_PRIORITY)
            .expect("point is unclaimed");

        extensions.add(descriptor(POINT, "mid", Some(5)));
        extensions.add(descriptor(POINT, "low", None));
        extensions.add(descriptor(POINT, "high", Some(10)));

        let priorities: Vec<i32> = list.borrow().iter().map(|e| e.priority).collect();
        assert_eq!(priorities, vec![10, 5, -1]);
    }

    #[test]
    fn list_target_keeps_insertion_order_for_ties() {
        let mut extensions = Extensions::new();
        let list = Rc::new(RefCell::new(Vec::new()));
        extensions
            .handle_by_list(POINT, Rc::clone(&list), DEFAULT_PRIORITY)
            .expect("point is unclaimed");

        let first: ExtensionHandle = Rc::new(String::from("first"));
        let second: ExtensionHandle = Rc::new(String::from("second"));
        for handle in [&first, &second] {
            extensions.add(ExtensionDescriptor {
                points: vec![POINT],
                name: None,
                priority: Some(3),
                handle: Rc::clone(handle),
            });
        }

        let list = list.borrow();
        assert!(Rc::ptr_eq(&list[0].handle, &first));
        assert!(Rc::ptr_eq(&list[1].handle, &second));
    }

    #[test]
    fn list_target_deduplicates_by_identity_and_removes() {
        let mut extensions = Extensions::new();
        let list = Rc::new(RefCell::new(Vec::new()));
        extensions
            .handle_by_list(POINT, Rc::clone(&list), DEFAULT_PRIORITY)
            .expect("point is unclaimed");

        let record = descriptor(POINT, "only", None);
        extensions.add(record.clone());
        extensions.add(record.clone());
        assert_eq!(list.borrow().len(), 1);

        extensions.remove(record);
        assert!(list.borrow().is_empty());

        // Removing again stays a no-op.
        extensions.remove(descriptor(POINT, "never-added", None));
        assert!(list.borrow().is_empty());
    }

    #[test]
    fn named_list_deduplicates_by_name() {
        let mut extensions = Extensions::new();
        let list = Rc::new(RefCell::new(Vec::new()));
        extensions
            .handle_by_named_list(POINT, Rc::clone(&list), DEFAULT_PRIORITY)
            .expect("point is unclaimed");

        extensions.add(descriptor(POINT, "loader", Some(1)));
        // Same name, different handle: the first registration is kept.
        extensions.add(descriptor(POINT, "loader", Some(99)));

        let list_ref = list.borrow();
        assert_eq!(list_ref.len(), 1);
        assert_eq!(list_ref[0].priority, 1);
    }

    #[test]
    fn named_list_removes_by_name() {
        let mut extensions = Extensions::new();
        let list = Rc::new(RefCell::new(Vec::new()));
        extensions
            .handle_by_named_list(POINT, Rc::clone(&list), DEFAULT_PRIORITY)
            .expect("point is unclaimed");

        extensions.add(descriptor(POINT, "loader", None));
        extensions.add(descriptor(POINT, "codec", None));
        assert_eq!(list.borrow().len(), 2);

        // A fresh descriptor with the same name matches, identity aside.
        extensions.remove(descriptor(POINT, "loader", None));
        let list_ref = list.borrow();
        assert_eq!(list_ref.len(), 1);
        assert_eq!(list_ref[0].name, "codec");
    }

    #[test]
    fn queue_is_discarded_after_drain() {
        let mut extensions = Extensions::new();
        extensions.add(descriptor(POINT, "early", None));

        let count = Rc::new(RefCell::new(0_u32));
        let counter = Rc::clone(&count);
        extensions
            .handle(POINT, move |_| *counter.borrow_mut() += 1, |_| {})
            .expect("point is unclaimed");
        assert_eq!(*count.borrow(), 1);

        // Nothing left queued: a later add delivers exactly once.
        extensions.add(descriptor(POINT, "late", None));
        assert_eq!(*count.borrow(), 2);
    }
}
