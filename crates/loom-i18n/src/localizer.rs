// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The localization context: resource store, translator and loading.
//!
//! A [`Localizer`] owns one resource store and a [`Translator`] derived from
//! its language, resources and formats. Any change to those inputs rebuilds
//! the translator, which clears the compiled messages of the localizer's
//! cache scope.
//!
//! Loading is asynchronous. Concurrent loads of the same path share one
//! fetch; each caller applies the result to its own store and emits its own
//! notification once the fetch settles.

use std::collections::BTreeMap;
use std::sync::Arc;

use futures::future::{join_all, FutureExt};
use loom_i18n_core::{
	FormatOptions, IcuMessageFormatter, MessageArgs, MessageFormatter, ResourceBundle, Result,
	Translator, TranslatorInputs,
};
use parking_lot::RwLock;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::cache::LocalizationCache;
use crate::config::{LocalizerConfig, PreloadResource};
use crate::error::{FetchError, LoadError};
use crate::events::{ListenerChain, LocalizeListener, ResourcesError, ResourcesLoaded};
use crate::fetch::{DefaultFetcher, FetchRequest, FetchedResource, HttpFetcher, ResourceFetcher};

/// Parameters of one resource load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadRequest {
	pub path: String,
	/// Treat the document as a flat key → pattern map for this language.
	pub language: Option<String>,
	/// Deep-merge into the existing store instead of replacing it.
	pub merge: bool,
	/// Overrides the localizer's default credentials flag.
	pub with_credentials: Option<bool>,
	/// Added to the configured headers, replacing same-named ones.
	pub headers: Option<BTreeMap<String, String>>,
}

impl LoadRequest {
	pub fn new(path: impl Into<String>) -> Self {
		Self {
			path: path.into(),
			language: None,
			merge: true,
			with_credentials: None,
			headers: None,
		}
	}

	pub fn language(mut self, language: impl Into<String>) -> Self {
		self.language = Some(language.into());
		self
	}

	pub fn merge(mut self, merge: bool) -> Self {
		self.merge = merge;
		self
	}

	pub fn with_credentials(mut self, with_credentials: bool) -> Self {
		self.with_credentials = Some(with_credentials);
		self
	}

	pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.headers
			.get_or_insert_with(BTreeMap::new)
			.insert(name.into(), value.into());
		self
	}

	pub fn headers(mut self, headers: BTreeMap<String, String>) -> Self {
		self.headers = Some(headers);
		self
	}
}

impl From<&PreloadResource> for LoadRequest {
	fn from(resource: &PreloadResource) -> Self {
		let request = Self::new(&resource.path).merge(resource.merge);
		match &resource.language {
			Some(language) => request.language(language),
			None => request,
		}
	}
}

/// How a load settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
	Loaded,
	Failed,
}

impl LoadOutcome {
	pub fn is_loaded(self) -> bool {
		matches!(self, Self::Loaded)
	}
}

struct State {
	language: Option<String>,
	resources: Option<Arc<ResourceBundle>>,
	formats: Arc<FormatOptions>,
	use_key_if_missing: bool,
	translator: Translator,
}

struct LocalizerInner {
	state: RwLock<State>,
	config: LocalizerConfig,
	cache: Arc<LocalizationCache>,
	formatter: Arc<dyn MessageFormatter>,
	fetcher: Option<Arc<dyn ResourceFetcher>>,
	listeners: ListenerChain,
}

/// A localization context.
///
/// Cheap to clone; clones share the same store and listeners.
#[derive(Clone)]
pub struct Localizer {
	inner: Arc<LocalizerInner>,
}

impl Localizer {
	pub fn builder() -> LocalizerBuilder {
		LocalizerBuilder::new()
	}

	/// Formats `key` with the given name/value pairs.
	///
	/// See [`Translator::translate`] for the meaning of the result.
	pub fn localize<I, K, V>(&self, key: &str, args: I) -> Result<Option<String>>
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<Value>,
	{
		self.localize_args(key, &MessageArgs::from_pairs(args))
	}

	pub fn localize_args(&self, key: &str, args: &MessageArgs) -> Result<Option<String>> {
		let translator = self.translator();
		translator.translate(key, args)
	}

	pub fn set_language(&self, language: Option<String>) {
		let mut state = self.inner.state.write();
		state.language = language;
		self.rebuild(&mut state);
	}

	pub fn set_resources(&self, resources: Option<ResourceBundle>) {
		let mut state = self.inner.state.write();
		state.resources = resources.map(Arc::new);
		self.rebuild(&mut state);
	}

	pub fn set_formats(&self, formats: FormatOptions) {
		let mut state = self.inner.state.write();
		state.formats = Arc::new(formats);
		self.rebuild(&mut state);
	}

	pub fn set_use_key_if_missing(&self, use_key_if_missing: bool) {
		let mut state = self.inner.state.write();
		state.use_key_if_missing = use_key_if_missing;
		self.rebuild(&mut state);
	}

	pub fn language(&self) -> Option<String> {
		self.inner.state.read().language.clone()
	}

	pub fn resources(&self) -> Option<Arc<ResourceBundle>> {
		self.inner.state.read().resources.clone()
	}

	pub fn formats(&self) -> Arc<FormatOptions> {
		Arc::clone(&self.inner.state.read().formats)
	}

	pub fn use_key_if_missing(&self) -> bool {
		self.inner.state.read().use_key_if_missing
	}

	/// The current translator. It keeps working on the inputs it was built
	/// from even if the localizer changes afterwards.
	pub fn translator(&self) -> Translator {
		self.inner.state.read().translator.clone()
	}

	pub fn cache(&self) -> &Arc<LocalizationCache> {
		&self.inner.cache
	}

	pub fn listeners(&self) -> &ListenerChain {
		&self.inner.listeners
	}

	pub fn config(&self) -> &LocalizerConfig {
		&self.inner.config
	}

	/// Fetches a resource file and applies it to the store.
	///
	/// Failures are reported through the listeners, never returned.
	#[instrument(skip(self, request), fields(path = %request.path, language = ?request.language))]
	pub async fn load_resources(&self, request: LoadRequest) -> LoadOutcome {
		match self.fetch_bundle(&request).await {
			Ok((resource, bundle)) => {
				self.apply_resources(bundle, request.merge);
				info!(merged = request.merge, "resources loaded");
				self.inner.listeners.emit_loaded(&ResourcesLoaded {
					path: request.path,
					language: request.language,
					merged: request.merge,
					resource,
					bubbles: self.inner.config.bubble_events,
				});
				LoadOutcome::Loaded
			}
			Err(err) => {
				warn!(error = %err, "failed to load resources");
				self.inner.listeners.emit_error(&ResourcesError {
					path: request.path,
					bubbles: self.inner.config.bubble_events,
				});
				LoadOutcome::Failed
			}
		}
	}

	/// Loads every resource listed in the configuration's `preload`.
	pub async fn preload(&self) -> Vec<LoadOutcome> {
		let loads = self
			.inner
			.config
			.preload
			.iter()
			.map(|resource| self.load_resources(LoadRequest::from(resource)));
		join_all(loads).await
	}

	/// Drops the cached fetch for `path` so the next load fetches it again.
	pub fn forget_request(&self, path: &str) -> bool {
		self.inner.cache.forget_request(path)
	}

	async fn fetch_bundle(
		&self,
		request: &LoadRequest,
	) -> std::result::Result<(Arc<FetchedResource>, ResourceBundle), LoadError> {
		let fetcher = self.fetcher()?;
		let fetch_request = self.fetch_request(request);

		let (handle, issued) = self.inner.cache.request(&request.path, move || {
			async move { fetcher.fetch(&fetch_request).await.map(Arc::new) }.boxed()
		});
		if issued {
			debug!("issued resource fetch");
		} else {
			debug!("joining existing resource request");
		}

		let resource = handle.await?;
		let bundle = ResourceBundle::from_document(resource.body.clone(), request.language.as_deref())?;
		Ok((resource, bundle))
	}

	fn fetch_request(&self, request: &LoadRequest) -> FetchRequest {
		let mut headers = self.inner.config.headers.clone();
		if let Some(extra) = &request.headers {
			headers.extend(extra.iter().map(|(k, v)| (k.clone(), v.clone())));
		}
		FetchRequest {
			url: request.path.clone(),
			with_credentials: request
				.with_credentials
				.unwrap_or(self.inner.config.with_credentials),
			headers,
		}
	}

	/// The scope's shared fetcher, installing this localizer's on first use.
	fn fetcher(&self) -> std::result::Result<Arc<dyn ResourceFetcher>, FetchError> {
		let config = &self.inner.config;
		let own = self.inner.fetcher.clone();
		self.inner.cache.fetcher_or_try_init(
			|| -> std::result::Result<Arc<dyn ResourceFetcher>, FetchError> {
				if let Some(fetcher) = own {
					return Ok(fetcher);
				}
				let mut http = HttpFetcher::new(config.request_timeout())?;
				if let Some(token) = &config.auth_token {
					http = http.auth_token(token);
				}
				Ok(Arc::new(DefaultFetcher::new(http)))
			},
		)
	}

	fn apply_resources(&self, bundle: ResourceBundle, merge: bool) {
		let mut state = self.inner.state.write();
		let resources = match state.resources.take() {
			Some(mut existing) if merge => {
				Arc::make_mut(&mut existing).merge(bundle);
				existing
			}
			_ => Arc::new(bundle),
		};
		state.resources = Some(resources);
		self.rebuild(&mut state);
	}

	fn rebuild(&self, state: &mut State) {
		state.translator = build_translator(
			state.language.clone(),
			state.resources.clone(),
			Arc::clone(&state.formats),
			state.use_key_if_missing,
			&self.inner.cache,
			&self.inner.formatter,
		);
	}
}

fn build_translator(
	language: Option<String>,
	resources: Option<Arc<ResourceBundle>>,
	formats: Arc<FormatOptions>,
	use_key_if_missing: bool,
	cache: &LocalizationCache,
	formatter: &Arc<dyn MessageFormatter>,
) -> Translator {
	Translator::build(
		TranslatorInputs {
			language,
			resources,
			formats,
			use_key_if_missing,
		},
		Arc::clone(cache.messages()),
		Arc::clone(formatter),
	)
}

impl std::fmt::Debug for Localizer {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let state = self.inner.state.read();
		f.debug_struct("Localizer")
			.field("language", &state.language)
			.field("languages", &state.resources.as_ref().map(|r| r.len()))
			.field("use_key_if_missing", &state.use_key_if_missing)
			.field("cache", &self.inner.cache)
			.finish_non_exhaustive()
	}
}

/// Builder for [`Localizer`].
///
/// # Example
///
/// ```no_run
/// use loom_i18n::{FormatError, LoadRequest, Localizer, LocalizerConfig};
///
/// # async fn run() -> Result<(), FormatError> {
/// let localizer = Localizer::builder()
///     .config(LocalizerConfig {
///         language: Some("es".to_string()),
///         ..LocalizerConfig::default()
///     })
///     .build();
///
/// localizer
///     .load_resources(LoadRequest::new("https://cdn.example.com/es.json").language("es"))
///     .await;
/// let text = localizer.localize("greet", [("name", "Ana")])?;
/// # let _ = text;
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct LocalizerBuilder {
	config: LocalizerConfig,
	resources: Option<ResourceBundle>,
	formats: Option<FormatOptions>,
	formatter: Option<Arc<dyn MessageFormatter>>,
	fetcher: Option<Arc<dyn ResourceFetcher>>,
	cache: Option<Arc<LocalizationCache>>,
	listeners: Option<ListenerChain>,
	parent_listeners: Option<ListenerChain>,
	extra_listeners: Vec<Arc<dyn LocalizeListener>>,
}

impl LocalizerBuilder {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn config(mut self, config: LocalizerConfig) -> Self {
		self.config = config;
		self
	}

	pub fn language(mut self, language: impl Into<String>) -> Self {
		self.config.language = Some(language.into());
		self
	}

	pub fn use_key_if_missing(mut self, use_key_if_missing: bool) -> Self {
		self.config.use_key_if_missing = use_key_if_missing;
		self
	}

	pub fn resources(mut self, resources: ResourceBundle) -> Self {
		self.resources = Some(resources);
		self
	}

	/// Overrides the formats from the configuration.
	pub fn formats(mut self, formats: FormatOptions) -> Self {
		self.formats = Some(formats);
		self
	}

	/// Defaults to [`IcuMessageFormatter`].
	pub fn formatter(mut self, formatter: impl MessageFormatter + 'static) -> Self {
		self.formatter = Some(Arc::new(formatter));
		self
	}

	/// Fetcher to install in the cache scope if it has none yet.
	///
	/// Defaults to a [`DefaultFetcher`] built from the configuration.
	pub fn fetcher(mut self, fetcher: impl ResourceFetcher + 'static) -> Self {
		self.fetcher = Some(Arc::new(fetcher));
		self
	}

	pub fn fetcher_shared(mut self, fetcher: Arc<dyn ResourceFetcher>) -> Self {
		self.fetcher = Some(fetcher);
		self
	}

	/// Use `cache` instead of the registry entry for the configured scope.
	pub fn cache(mut self, cache: Arc<LocalizationCache>) -> Self {
		self.cache = Some(cache);
		self
	}

	/// Emit notifications on an existing chain.
	pub fn listeners(mut self, listeners: ListenerChain) -> Self {
		self.listeners = Some(listeners);
		self
	}

	/// Emit on a new chain whose bubbling events go to `parent`.
	///
	/// Ignored when [`Self::listeners`] is set.
	pub fn parent_listeners(mut self, parent: ListenerChain) -> Self {
		self.parent_listeners = Some(parent);
		self
	}

	pub fn listener(mut self, listener: impl LocalizeListener + 'static) -> Self {
		self.extra_listeners.push(Arc::new(listener));
		self
	}

	pub fn listener_shared(mut self, listener: Arc<dyn LocalizeListener>) -> Self {
		self.extra_listeners.push(listener);
		self
	}

	pub fn build(self) -> Localizer {
		let cache = self
			.cache
			.unwrap_or_else(|| LocalizationCache::for_scope(&self.config.cache_scope));
		let formatter = self
			.formatter
			.unwrap_or_else(|| Arc::new(IcuMessageFormatter::new()));

		let listeners = match (self.listeners, self.parent_listeners) {
			(Some(listeners), _) => listeners,
			(None, Some(parent)) => ListenerChain::with_parent(parent),
			(None, None) => ListenerChain::new(),
		};
		for listener in self.extra_listeners {
			listeners.add_shared(listener);
		}

		let language = self.config.language.clone();
		let resources = self.resources.map(Arc::new);
		let formats = Arc::new(self.formats.unwrap_or_else(|| self.config.formats.clone()));
		let use_key_if_missing = self.config.use_key_if_missing;
		let translator = build_translator(
			language.clone(),
			resources.clone(),
			Arc::clone(&formats),
			use_key_if_missing,
			&cache,
			&formatter,
		);

		debug!(scope = %cache.scope(), language = ?language, "localizer created");
		Localizer {
			inner: Arc::new(LocalizerInner {
				state: RwLock::new(State {
					language,
					resources,
					formats,
					use_key_if_missing,
					translator,
				}),
				config: self.config,
				cache,
				formatter,
				fetcher: self.fetcher,
				listeners,
			}),
		}
	}
}
