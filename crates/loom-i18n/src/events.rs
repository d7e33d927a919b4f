// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Notifications emitted when resource loads settle.
//!
//! Listeners are registered on a [`ListenerChain`]. A chain may have a
//! parent; events marked `bubbles` are delivered to the chain's own
//! listeners first and then handed up to the parent chain.
//!
//! # Example
//!
//! ```ignore
//! use loom_i18n::{ListenerChain, LocalizeListener, ResourcesLoaded};
//!
//! struct LogLoads;
//!
//! impl LocalizeListener for LogLoads {
//!     fn on_resources_loaded(&self, event: &ResourcesLoaded) {
//!         println!("loaded {}", event.path);
//!     }
//! }
//!
//! let chain = ListenerChain::new();
//! chain.add(LogLoads);
//! ```

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::trace;

use crate::fetch::FetchedResource;

/// A resource file was fetched and applied to the resource store.
#[derive(Debug, Clone)]
pub struct ResourcesLoaded {
	pub path: String,
	/// Language the document was loaded for, when it was a flat map.
	pub language: Option<String>,
	/// Whether the document was merged (`true`) or replaced the store.
	pub merged: bool,
	/// The fetch result the resources came from.
	pub resource: Arc<FetchedResource>,
	/// Deliver to the parent chain as well.
	pub bubbles: bool,
}

/// A resource file could not be loaded.
///
/// Carries no cause; the failure is logged where it happens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourcesError {
	pub path: String,
	pub bubbles: bool,
}

/// Receives resource load notifications.
pub trait LocalizeListener: Send + Sync {
	fn on_resources_loaded(&self, _event: &ResourcesLoaded) {}

	fn on_resources_error(&self, _event: &ResourcesError) {}
}

/// A listener that ignores every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpListener;

impl LocalizeListener for NoOpListener {}

/// Ordered set of listeners with an optional parent chain.
#[derive(Clone, Default)]
pub struct ListenerChain {
	inner: Arc<ListenerChainInner>,
}

#[derive(Default)]
struct ListenerChainInner {
	listeners: RwLock<Vec<Arc<dyn LocalizeListener>>>,
	parent: Option<ListenerChain>,
}

impl ListenerChain {
	pub fn new() -> Self {
		Self::default()
	}

	/// Creates a chain that forwards bubbling events to `parent`.
	pub fn with_parent(parent: ListenerChain) -> Self {
		Self {
			inner: Arc::new(ListenerChainInner {
				listeners: RwLock::new(Vec::new()),
				parent: Some(parent),
			}),
		}
	}

	pub fn add(&self, listener: impl LocalizeListener + 'static) {
		self.add_shared(Arc::new(listener));
	}

	pub fn add_shared(&self, listener: Arc<dyn LocalizeListener>) {
		self.inner.listeners.write().push(listener);
	}

	pub fn parent(&self) -> Option<&ListenerChain> {
		self.inner.parent.as_ref()
	}

	pub fn len(&self) -> usize {
		self.inner.listeners.read().len()
	}

	pub fn is_empty(&self) -> bool {
		self.inner.listeners.read().is_empty()
	}

	/// Listeners are invoked on a snapshot, so a listener may register
	/// further listeners without deadlocking.
	fn snapshot(&self) -> Vec<Arc<dyn LocalizeListener>> {
		self.inner.listeners.read().clone()
	}

	pub(crate) fn emit_loaded(&self, event: &ResourcesLoaded) {
		trace!(path = %event.path, listeners = self.len(), "emitting resources-loaded");
		for listener in self.snapshot() {
			listener.on_resources_loaded(event);
		}
		if event.bubbles {
			if let Some(parent) = self.parent() {
				parent.emit_loaded(event);
			}
		}
	}

	pub(crate) fn emit_error(&self, event: &ResourcesError) {
		trace!(path = %event.path, listeners = self.len(), "emitting resources-error");
		for listener in self.snapshot() {
			listener.on_resources_error(event);
		}
		if event.bubbles {
			if let Some(parent) = self.parent() {
				parent.emit_error(event);
			}
		}
	}
}

impl std::fmt::Debug for ListenerChain {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ListenerChain")
			.field("listeners", &self.len())
			.field("has_parent", &self.parent().is_some())
			.finish()
	}
}
