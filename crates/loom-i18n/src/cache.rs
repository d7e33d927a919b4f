// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Process-wide localization caches.
//!
//! Every localizer in the same scope shares one [`LocalizationCache`]:
//! the in-flight and completed resource fetches (keyed by path), the
//! compiled-message cache, and the fetcher used to issue requests.
//!
//! # Invariants
//!
//! 1. **One fetch per path**: the first request for a path installs a shared
//!    handle; later requests await the same handle, whether it is still in
//!    flight or already settled.
//! 2. **No implicit eviction**: request handles live until
//!    [`LocalizationCache::forget_request`] is called, so a failed fetch keeps
//!    failing for that path until it is forgotten.
//! 3. **Coarse invalidation**: compiled messages are only ever cleared as a
//!    whole, when a translator is rebuilt.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt, Shared};
use loom_i18n_core::MessageCache;
use once_cell::sync::{Lazy, OnceCell};
use parking_lot::Mutex;
use tracing::debug;

use crate::error::FetchError;
use crate::fetch::{FetchedResource, ResourceFetcher};

/// Scope used when none is configured.
pub const DEFAULT_SCOPE: &str = "default";

/// Outcome of a fetch, shared by every waiter.
pub type FetchResult = Result<Arc<FetchedResource>, FetchError>;

/// A fetch handle that can be awaited any number of times.
pub type SharedFetch = Shared<BoxFuture<'static, FetchResult>>;

static REGISTRY: Lazy<Mutex<HashMap<String, Arc<LocalizationCache>>>> =
	Lazy::new(|| Mutex::new(HashMap::new()));

/// Shared fetch handles, compiled messages and fetcher for one scope.
pub struct LocalizationCache {
	scope: String,
	requests: Mutex<HashMap<String, SharedFetch>>,
	messages: Arc<MessageCache>,
	fetcher: OnceCell<Arc<dyn ResourceFetcher>>,
}

impl LocalizationCache {
	/// Creates a standalone cache that is not registered in any scope.
	pub fn new(scope: impl Into<String>) -> Self {
		Self {
			scope: scope.into(),
			requests: Mutex::new(HashMap::new()),
			messages: Arc::new(MessageCache::new()),
			fetcher: OnceCell::new(),
		}
	}

	/// Returns the cache for `scope`, creating an empty one on first access.
	pub fn for_scope(scope: &str) -> Arc<Self> {
		let mut registry = REGISTRY.lock();
		Arc::clone(registry.entry(scope.to_string()).or_insert_with(|| {
			debug!(scope, "initializing localization cache");
			Arc::new(Self::new(scope))
		}))
	}

	pub fn scope(&self) -> &str {
		&self.scope
	}

	pub fn messages(&self) -> &Arc<MessageCache> {
		&self.messages
	}

	/// Returns the scope's fetcher, installing the one from `init` if there
	/// is none yet.
	pub fn fetcher_or_init<F>(&self, init: F) -> Arc<dyn ResourceFetcher>
	where
		F: FnOnce() -> Arc<dyn ResourceFetcher>,
	{
		Arc::clone(self.fetcher.get_or_init(|| {
			debug!(scope = %self.scope, "installing shared resource fetcher");
			init()
		}))
	}

	/// Like [`Self::fetcher_or_init`], for fetchers whose construction can
	/// fail. Nothing is installed on error.
	pub fn fetcher_or_try_init<F, E>(&self, init: F) -> Result<Arc<dyn ResourceFetcher>, E>
	where
		F: FnOnce() -> Result<Arc<dyn ResourceFetcher>, E>,
	{
		self.fetcher
			.get_or_try_init(|| {
				debug!(scope = %self.scope, "installing shared resource fetcher");
				init()
			})
			.map(Arc::clone)
	}

	/// Returns the fetch handle for `path`, starting one with `start` when
	/// the path has never been requested.
	///
	/// The boolean is `true` when this call issued the fetch.
	pub fn request<F>(&self, path: &str, start: F) -> (SharedFetch, bool)
	where
		F: FnOnce() -> BoxFuture<'static, FetchResult>,
	{
		let mut requests = self.requests.lock();
		if let Some(handle) = requests.get(path) {
			return (handle.clone(), false);
		}

		let handle = start().shared();
		requests.insert(path.to_string(), handle.clone());
		(handle, true)
	}

	pub fn has_request(&self, path: &str) -> bool {
		self.requests.lock().contains_key(path)
	}

	/// Number of distinct paths ever requested (and not forgotten).
	pub fn request_count(&self) -> usize {
		self.requests.lock().len()
	}

	/// Drops the handle for `path` so the next load issues a new fetch.
	///
	/// Returns `true` if a handle was removed.
	pub fn forget_request(&self, path: &str) -> bool {
		let removed = self.requests.lock().remove(path).is_some();
		if removed {
			debug!(scope = %self.scope, path, "forgot resource request");
		}
		removed
	}
}

impl std::fmt::Debug for LocalizationCache {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("LocalizationCache")
			.field("scope", &self.scope)
			.field("requests", &self.request_count())
			.field("messages", &self.messages.len())
			.field("has_fetcher", &self.fetcher.get().is_some())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::fetch::{FetchRequest, FileFetcher};
	use std::sync::atomic::{AtomicUsize, Ordering};

	fn resource(url: &str) -> FetchResult {
		Ok(Arc::new(FetchedResource {
			url: url.to_string(),
			status: 200,
			body: serde_json::json!({}),
		}))
	}

	#[test]
	fn test_for_scope_returns_same_instance() {
		let a = LocalizationCache::for_scope("cache-test-same");
		let b = LocalizationCache::for_scope("cache-test-same");
		assert!(Arc::ptr_eq(&a, &b));
		assert_eq!(a.scope(), "cache-test-same");
	}

	#[test]
	fn test_distinct_scopes_are_isolated() {
		let a = LocalizationCache::for_scope("cache-test-a");
		let b = LocalizationCache::for_scope("cache-test-b");
		assert!(!Arc::ptr_eq(&a, &b));
		assert!(!Arc::ptr_eq(a.messages(), b.messages()));
	}

	#[test]
	fn test_new_cache_starts_empty() {
		let cache = LocalizationCache::new("fresh");
		assert_eq!(cache.request_count(), 0);
		assert!(cache.messages().is_empty());
		assert!(!cache.has_request("en.json"));
	}

	#[test]
	fn test_fetcher_created_once() {
		let cache = LocalizationCache::new("fetcher");
		let created = AtomicUsize::new(0);
		let make = || {
			created.fetch_add(1, Ordering::SeqCst);
			Arc::new(FileFetcher) as Arc<dyn ResourceFetcher>
		};

		let first = cache.fetcher_or_init(make);
		let second = cache.fetcher_or_init(|| {
			created.fetch_add(1, Ordering::SeqCst);
			Arc::new(FileFetcher) as Arc<dyn ResourceFetcher>
		});

		assert!(Arc::ptr_eq(&first, &second));
		assert_eq!(created.load(Ordering::SeqCst), 1);
	}

	#[test]
	fn test_failed_fetcher_init_installs_nothing() {
		let cache = LocalizationCache::new("fetcher-fallible");
		let err = cache
			.fetcher_or_try_init(|| Err::<Arc<dyn ResourceFetcher>, _>("no tls backend"))
			.err();
		assert_eq!(err, Some("no tls backend"));

		let fetcher = cache
			.fetcher_or_try_init(|| Ok::<_, &str>(Arc::new(FileFetcher) as Arc<dyn ResourceFetcher>));
		assert!(fetcher.is_ok());
	}

	#[tokio::test]
	async fn test_request_is_deduplicated_by_path() {
		let cache = LocalizationCache::new("dedup");
		let started = Arc::new(AtomicUsize::new(0));

		let start = |url: &'static str| {
			let started = Arc::clone(&started);
			move || {
				started.fetch_add(1, Ordering::SeqCst);
				async move { resource(url) }.boxed()
			}
		};

		let (first, issued_first) = cache.request("en.json", start("en.json"));
		let (second, issued_second) = cache.request("en.json", start("en.json"));
		let (_, issued_other) = cache.request("es.json", start("es.json"));

		assert!(issued_first);
		assert!(!issued_second);
		assert!(issued_other);
		assert_eq!(started.load(Ordering::SeqCst), 2);
		assert_eq!(cache.request_count(), 2);

		let (a, b) = tokio::join!(first, second);
		assert!(Arc::ptr_eq(&a.unwrap(), &b.unwrap()));
	}

	#[tokio::test]
	async fn test_failed_handle_is_reused_until_forgotten() {
		let cache = LocalizationCache::new("failed");
		let fail = || {
			async {
				Err::<Arc<FetchedResource>, _>(FetchError::Status {
					url: "en.json".to_string(),
					status: 500,
				})
			}
			.boxed()
		};

		let (handle, _) = cache.request("en.json", fail);
		assert!(handle.await.is_err());

		let (handle, issued) = cache.request("en.json", || async { resource("en.json") }.boxed());
		assert!(!issued);
		assert!(handle.await.is_err());

		assert!(cache.forget_request("en.json"));
		assert!(!cache.forget_request("en.json"));

		let (handle, issued) = cache.request("en.json", || async { resource("en.json") }.boxed());
		assert!(issued);
		assert!(handle.await.is_ok());
	}

	#[tokio::test]
	async fn test_file_fetcher_through_shared_handle() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("en.json");
		std::fs::write(&path, r#"{ "hi": "hi" }"#).unwrap();
		let path = path.to_string_lossy().into_owned();

		let cache = LocalizationCache::new("file");
		let fetcher = cache.fetcher_or_init(|| Arc::new(FileFetcher) as Arc<dyn ResourceFetcher>);
		let request = FetchRequest::new(&path);
		let (handle, _) = cache.request(&path, move || {
			async move { fetcher.fetch(&request).await.map(Arc::new) }.boxed()
		});

		let resource = handle.await.unwrap();
		assert_eq!(resource.body, serde_json::json!({ "hi": "hi" }));
	}
}
