// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Extension registry: named integration slots for independently-loaded
//! modules.
//!
//! An *extension point* is a named slot (e.g. a render-backend list) that
//! exactly one owning component claims via [`Extensions::handle`]. Plugin
//! modules call [`Extensions::add`] / [`Extensions::remove`] at any time —
//! before or after the owner claims the point. Records added before a
//! handler is installed are queued and drained FIFO at installation, so host
//! and plugins tolerate either load order.
//!
//! An extension is either a *bare* implementation carrying its own metadata
//! (the [`Extension`] trait) or an explicit [`ExtensionDescriptor`]. Both
//! normalize to an [`ExtensionEntry`] at the call boundary — a closed set of
//! tagged shapes rather than runtime sniffing.
//!
//! The registry is a host-owned value created at engine startup. Under the
//! engine's single-threaded contract the host's one instance is the
//! process-wide registry; the `Rc`/`RefCell` wrapper targets make the
//! single-threaded intent explicit in the types.

mod entry;
mod registry;

pub use entry::{
    Extension, ExtensionDescriptor, ExtensionEntry, ExtensionHandle, ExtensionItem,
    ExtensionMetadata, ExtensionPoint,
};
pub use registry::{DEFAULT_PRIORITY, Extensions, ExtensionsError, ListEntry, NamedEntry};
