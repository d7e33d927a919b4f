// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Key lookup, fallback and formatting.
//!
//! A [`Translator`] is a snapshot of `(language, resources, formats)`.
//! Building one clears the shared [`MessageCache`] and records the new
//! cache generation, so compiled messages never outlive the inputs they
//! were compiled from, even when a compile is still running during the
//! rebuild.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, trace};

use crate::bundle::ResourceBundle;
use crate::error::Result;
use crate::format::{CompiledMessage, FormatOptions, MessageArgs, MessageFormatter};
use crate::language::{lookup_pattern, resolve_language};

/// Cache-key prefix used when a missing key's own text is formatted.
pub const MISSING_KEY_SENTINEL: &str = "#";

/// Identity of a compiled message: the message key, the locale it was
/// compiled for and its pattern.
///
/// Kept as separate fields so that distinct `(key, locale, pattern)`
/// triples can never collide the way plain concatenation would.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MessageKey {
	pub key: String,
	pub locale: String,
	pub pattern: String,
}

impl MessageKey {
	pub fn new(key: impl Into<String>, locale: impl Into<String>, pattern: impl Into<String>) -> Self {
		Self {
			key: key.into(),
			locale: locale.into(),
			pattern: pattern.into(),
		}
	}
}

#[derive(Default)]
struct CacheState {
	/// Bumped by every [`MessageCache::clear`].
	generation: u64,
	messages: HashMap<MessageKey, Arc<dyn CompiledMessage>>,
}

/// Thread-safe cache of compiled messages.
///
/// Every [`clear`](Self::clear) starts a new generation. Lookups carry the
/// generation their caller was built in, and a caller from an older
/// generation neither reads nor stores entries.
#[derive(Default)]
pub struct MessageCache {
	state: RwLock<CacheState>,
}

impl MessageCache {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn generation(&self) -> u64 {
		self.state.read().generation
	}

	/// Return the cached message for `key`, compiling and storing it on a miss.
	///
	/// The compiled message is only stored if `generation` is still current
	/// once compilation finishes; otherwise it is returned uncached. A failed
	/// compile leaves the cache untouched.
	pub fn get_or_compile<F>(
		&self,
		generation: u64,
		key: MessageKey,
		compile: F,
	) -> Result<Arc<dyn CompiledMessage>>
	where
		F: FnOnce() -> Result<Arc<dyn CompiledMessage>>,
	{
		{
			let state = self.state.read();
			if state.generation == generation {
				if let Some(message) = state.messages.get(&key) {
					trace!(key = %key.key, locale = %key.locale, "compiled message cache hit");
					return Ok(Arc::clone(message));
				}
			}
		}

		let message = compile()?;
		let mut state = self.state.write();
		if state.generation != generation {
			trace!(
				key = %key.key,
				generation,
				current = state.generation,
				"cache cleared during compile, not storing message"
			);
			return Ok(message);
		}
		let entry = state.messages.entry(key).or_insert(message);
		Ok(Arc::clone(entry))
	}

	pub fn contains(&self, key: &MessageKey) -> bool {
		self.state.read().messages.contains_key(key)
	}

	/// Drop every compiled message and start a new generation, returning it.
	pub fn clear(&self) -> u64 {
		let mut state = self.state.write();
		if !state.messages.is_empty() {
			debug!(count = state.messages.len(), "clearing compiled message cache");
		}
		state.messages.clear();
		state.generation = state.generation.wrapping_add(1);
		state.generation
	}

	pub fn len(&self) -> usize {
		self.state.read().messages.len()
	}

	pub fn is_empty(&self) -> bool {
		self.state.read().messages.is_empty()
	}
}

impl std::fmt::Debug for MessageCache {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let state = self.state.read();
		f.debug_struct("MessageCache")
			.field("generation", &state.generation)
			.field("len", &state.messages.len())
			.finish()
	}
}

/// Everything a translator is derived from.
#[derive(Debug, Clone, Default)]
pub struct TranslatorInputs {
	pub language: Option<String>,
	pub resources: Option<Arc<ResourceBundle>>,
	pub formats: Arc<FormatOptions>,
	/// Format the key itself when no pattern exists for it.
	pub use_key_if_missing: bool,
}

/// Resolves message keys to formatted strings.
///
/// Cheap to clone; clones share the same inputs and cache.
#[derive(Clone)]
pub struct Translator {
	inputs: Arc<TranslatorInputs>,
	cache: Arc<MessageCache>,
	generation: u64,
	formatter: Arc<dyn MessageFormatter>,
}

impl Translator {
	/// Build a translator, clearing `cache` whether or not it is ever used.
	pub fn build(
		inputs: TranslatorInputs,
		cache: Arc<MessageCache>,
		formatter: Arc<dyn MessageFormatter>,
	) -> Self {
		let generation = cache.clear();
		debug!(
			language = ?inputs.language,
			generation,
			languages = inputs.resources.as_ref().map(|r| r.len()).unwrap_or(0),
			"translator rebuilt"
		);
		Self {
			inputs: Arc::new(inputs),
			cache,
			generation,
			formatter,
		}
	}

	pub fn inputs(&self) -> &TranslatorInputs {
		&self.inputs
	}

	pub fn cache(&self) -> &Arc<MessageCache> {
		&self.cache
	}

	/// The cache generation this translator was built in.
	pub fn generation(&self) -> u64 {
		self.generation
	}

	/// Resolve and format `key`.
	///
	/// Returns:
	/// - `Ok(None)` when the key is empty, no resources or language are set,
	///   or the bundle has neither the language nor its base language
	/// - `Ok(Some(""))` when the key is missing and key fallback is off
	/// - `Ok(Some(text))` otherwise
	///
	/// Formatter errors (malformed patterns, bad arguments) are returned as-is.
	pub fn translate(&self, key: &str, args: &MessageArgs) -> Result<Option<String>> {
		let inputs = &*self.inputs;
		let (Some(resources), Some(language)) = (inputs.resources.as_deref(), inputs.language.as_deref())
		else {
			return Ok(None);
		};
		if key.is_empty() || language.is_empty() {
			return Ok(None);
		}

		let Some(resolved) = resolve_language(resources, language) else {
			trace!(key, language, "no resources for language");
			return Ok(None);
		};

		let (cache_key, pattern) = match lookup_pattern(resources, resolved, key) {
			Some(pattern) => (key, pattern),
			None if inputs.use_key_if_missing => {
				trace!(key, language, "missing key, formatting key text");
				(MISSING_KEY_SENTINEL, key)
			}
			None => {
				trace!(key, language, "missing key");
				return Ok(Some(String::new()));
			}
		};

		let message = self
			.cache
			.get_or_compile(self.generation, MessageKey::new(cache_key, language, pattern), || {
				debug!(key, language, "compiling message");
				self.formatter.compile(pattern, language, &inputs.formats)
			})?;

		message.format(args).map(Some)
	}
}

impl std::fmt::Debug for Translator {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Translator")
			.field("inputs", &self.inputs)
			.field("cache", &self.cache)
			.field("generation", &self.generation)
			.finish_non_exhaustive()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::error::FormatError;
	use crate::format::IcuMessageFormatter;
	use serde_json::json;
	use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
	use std::sync::Barrier;
	use std::thread;

	/// Delegates to the ICU formatter and counts compilations.
	#[derive(Default)]
	struct CountingFormatter {
		compiles: AtomicUsize,
	}

	impl CountingFormatter {
		fn compiles(&self) -> usize {
			self.compiles.load(Ordering::SeqCst)
		}
	}

	impl MessageFormatter for CountingFormatter {
		fn compile(
			&self,
			pattern: &str,
			locale: &str,
			formats: &FormatOptions,
		) -> Result<Arc<dyn CompiledMessage>> {
			self.compiles.fetch_add(1, Ordering::SeqCst);
			IcuMessageFormatter.compile(pattern, locale, formats)
		}
	}

	/// Blocks its first compile between two barriers so a test can rebuild
	/// while that compile is in flight.
	struct GatedFormatter {
		armed: AtomicBool,
		entered: Barrier,
		release: Barrier,
	}

	impl GatedFormatter {
		fn new() -> Self {
			Self {
				armed: AtomicBool::new(true),
				entered: Barrier::new(2),
				release: Barrier::new(2),
			}
		}
	}

	impl MessageFormatter for GatedFormatter {
		fn compile(
			&self,
			pattern: &str,
			locale: &str,
			formats: &FormatOptions,
		) -> Result<Arc<dyn CompiledMessage>> {
			if self.armed.swap(false, Ordering::SeqCst) {
				self.entered.wait();
				self.release.wait();
			}
			IcuMessageFormatter.compile(pattern, locale, formats)
		}
	}

	/// Starts a translate on a translator built from `stale`, rebuilds the
	/// same cache from `fresh` while the compile is blocked, then lets the
	/// compile finish. Returns the stale result and the fresh translator.
	fn rebuild_during_compile(
		stale: TranslatorInputs,
		fresh: TranslatorInputs,
	) -> (Option<String>, Translator) {
		let cache = Arc::new(MessageCache::new());
		let gate = Arc::new(GatedFormatter::new());

		let stale = Translator::build(stale, cache.clone(), gate.clone());
		let in_flight = thread::spawn(move || {
			stale
				.translate("n", &MessageArgs::from_pairs([("n", 1234.5)]))
				.unwrap()
		});

		gate.entered.wait();
		let fresh = Translator::build(fresh, cache, gate.clone());
		gate.release.wait();

		(in_flight.join().unwrap(), fresh)
	}

	fn resources(entries: &[(&str, &str, &str)]) -> Arc<ResourceBundle> {
		let mut bundle = ResourceBundle::new();
		for (language, key, pattern) in entries {
			bundle.insert(*language, *key, *pattern);
		}
		Arc::new(bundle)
	}

	fn inputs(language: &str, resources: Arc<ResourceBundle>) -> TranslatorInputs {
		TranslatorInputs {
			language: Some(language.to_string()),
			resources: Some(resources),
			..TranslatorInputs::default()
		}
	}

	fn translator(inputs: TranslatorInputs) -> (Translator, Arc<CountingFormatter>) {
		let formatter = Arc::new(CountingFormatter::default());
		let translator = Translator::build(inputs, Arc::new(MessageCache::new()), formatter.clone());
		(translator, formatter)
	}

	#[test]
	fn test_parameter_substitution() {
		let (t, _) = translator(inputs("en", resources(&[("en", "greet", "Hello, {name}!")])));
		let args = MessageArgs::from_pairs([("name", "World")]);
		assert_eq!(t.translate("greet", &args).unwrap(), Some("Hello, World!".to_string()));
	}

	#[test]
	fn test_region_falls_back_to_base_language() {
		let (t, _) = translator(inputs("en-US", resources(&[("en", "greeting", "Hi")])));
		assert_eq!(
			t.translate("greeting", &MessageArgs::new()).unwrap(),
			Some("Hi".to_string())
		);
	}

	#[test]
	fn test_region_entry_without_key_uses_base_language() {
		let (t, _) = translator(inputs(
			"en-US",
			resources(&[("en", "greeting", "Hi"), ("en-US", "color", "color")]),
		));
		assert_eq!(
			t.translate("greeting", &MessageArgs::new()).unwrap(),
			Some("Hi".to_string())
		);
	}

	#[test]
	fn test_unknown_language_is_undefined() {
		let (t, _) = translator(inputs("fr-CA", resources(&[("en", "hi", "hi")])));
		assert_eq!(t.translate("hi", &MessageArgs::new()).unwrap(), None);
	}

	#[test]
	fn test_missing_inputs_are_undefined() {
		let (t, _) = translator(TranslatorInputs::default());
		assert_eq!(t.translate("hi", &MessageArgs::new()).unwrap(), None);

		let (t, _) = translator(TranslatorInputs {
			language: None,
			..inputs("en", resources(&[("en", "hi", "hi")]))
		});
		assert_eq!(t.translate("hi", &MessageArgs::new()).unwrap(), None);

		let (t, _) = translator(inputs("en", resources(&[("en", "hi", "hi")])));
		assert_eq!(t.translate("", &MessageArgs::new()).unwrap(), None);
	}

	#[test]
	fn test_missing_key_is_empty_string() {
		let (t, formatter) = translator(inputs("en", resources(&[("en", "hi", "hi")])));
		assert_eq!(
			t.translate("farewell", &MessageArgs::new()).unwrap(),
			Some(String::new())
		);
		assert_eq!(formatter.compiles(), 0);
	}

	#[test]
	fn test_missing_key_uses_key_when_enabled() {
		let (t, _) = translator(TranslatorInputs {
			use_key_if_missing: true,
			..inputs("en", resources(&[("en", "hi", "hi")]))
		});
		assert_eq!(
			t.translate("farewell", &MessageArgs::new()).unwrap(),
			Some("farewell".to_string())
		);
		assert!(t
			.cache()
			.contains(&MessageKey::new(MISSING_KEY_SENTINEL, "en", "farewell")));
	}

	#[test]
	fn test_missing_key_text_is_itself_formatted() {
		let (t, _) = translator(TranslatorInputs {
			use_key_if_missing: true,
			..inputs("en", resources(&[("en", "hi", "hi")]))
		});
		let args = MessageArgs::from_pairs([("name", "Ada")]);
		assert_eq!(
			t.translate("Welcome {name}", &args).unwrap(),
			Some("Welcome Ada".to_string())
		);
	}

	#[test]
	fn test_second_call_hits_cache() {
		let (t, formatter) = translator(inputs("en", resources(&[("en", "greet", "Hello, {name}!")])));
		let args = MessageArgs::from_pairs([("name", "World")]);

		let first = t.translate("greet", &args).unwrap();
		let second = t.translate("greet", &args).unwrap();

		assert_eq!(first, second);
		assert_eq!(formatter.compiles(), 1);
		assert_eq!(t.cache().len(), 1);
	}

	#[test]
	fn test_rebuild_clears_cache_and_recompiles() {
		let cache = Arc::new(MessageCache::new());
		let formatter = Arc::new(CountingFormatter::default());
		let bundle = resources(&[("en", "greet", "Hello")]);

		let t = Translator::build(inputs("en", bundle.clone()), cache.clone(), formatter.clone());
		t.translate("greet", &MessageArgs::new()).unwrap();
		assert_eq!(cache.len(), 1);

		let t = Translator::build(inputs("en", bundle), cache.clone(), formatter.clone());
		assert!(cache.is_empty());

		t.translate("greet", &MessageArgs::new()).unwrap();
		assert_eq!(formatter.compiles(), 2);
	}

	#[test]
	fn test_same_pattern_under_different_keys_compiles_separately() {
		let (t, formatter) = translator(inputs("en", resources(&[("en", "a", "x"), ("en", "b", "x")])));
		t.translate("a", &MessageArgs::new()).unwrap();
		t.translate("b", &MessageArgs::new()).unwrap();
		assert_eq!(formatter.compiles(), 2);
	}

	#[test]
	fn test_concatenation_lookalikes_do_not_collide() {
		let (t, _) = translator(inputs("en", resources(&[("en", "ab", "c"), ("en", "a", "bc")])));
		assert_eq!(t.translate("ab", &MessageArgs::new()).unwrap(), Some("c".to_string()));
		assert_eq!(t.translate("a", &MessageArgs::new()).unwrap(), Some("bc".to_string()));
		assert_eq!(t.cache().len(), 2);
	}

	#[test]
	fn test_malformed_pattern_propagates_and_is_not_cached() {
		let (t, _) = translator(inputs("en", resources(&[("en", "broken", "Hello, {name")])));
		let err = t.translate("broken", &MessageArgs::new()).unwrap_err();
		assert!(matches!(err, FormatError::Syntax { .. }));
		assert!(t.cache().is_empty());
	}

	#[test]
	fn test_missing_argument_propagates() {
		let (t, _) = translator(inputs("en", resources(&[("en", "greet", "Hello, {name}!")])));
		let err = t.translate("greet", &MessageArgs::new()).unwrap_err();
		assert_eq!(err, FormatError::MissingArgument("name".to_string()));
	}

	#[test]
	fn test_compiles_with_requested_locale() {
		let (t, _) = translator(inputs("de-DE", resources(&[("de", "n", "{n, number}")])));
		let args = MessageArgs::from_pairs([("n", 1234.5)]);
		assert_eq!(t.translate("n", &args).unwrap(), Some("1.234,5".to_string()));
	}

	#[test]
	fn test_compile_finishing_after_rebuild_is_not_cached() {
		let bundle = resources(&[("en", "n", "{n, number}"), ("de", "n", "{n, number}")]);
		let (stale, fresh) = rebuild_during_compile(inputs("en", bundle.clone()), inputs("de", bundle));

		assert_eq!(stale, Some("1,234.5".to_string()));
		assert!(fresh.cache().is_empty());
		assert_eq!(
			fresh
				.translate("n", &MessageArgs::from_pairs([("n", 1234.5)]))
				.unwrap(),
			Some("1.234,5".to_string())
		);
		assert_eq!(fresh.cache().len(), 1);
	}

	#[test]
	fn test_rebuild_with_new_formats_ignores_in_flight_compile() {
		let bundle = resources(&[("en", "n", "{n, number, money}")]);
		let money = |currency: &str| {
			Arc::new(FormatOptions::new().with(
				"number",
				"money",
				json!({ "style": "currency", "currency": currency }),
			))
		};
		let stale = TranslatorInputs {
			formats: money("USD"),
			..inputs("en", bundle.clone())
		};
		let fresh = TranslatorInputs {
			formats: money("EUR"),
			..inputs("en", bundle)
		};

		let (stale, fresh) = rebuild_during_compile(stale, fresh);

		assert_eq!(stale, Some("$1,234.50".to_string()));
		assert_eq!(
			fresh
				.translate("n", &MessageArgs::from_pairs([("n", 1234.5)]))
				.unwrap(),
			Some("€1,234.50".to_string())
		);
	}

	#[test]
	fn test_stale_translator_bypasses_cache() {
		let cache = Arc::new(MessageCache::new());
		let formatter = Arc::new(CountingFormatter::default());
		let bundle = resources(&[("en", "greet", "Hello")]);

		let stale = Translator::build(inputs("en", bundle.clone()), cache.clone(), formatter.clone());
		let fresh = Translator::build(inputs("en", bundle), cache.clone(), formatter.clone());
		assert!(stale.generation() < fresh.generation());

		stale.translate("greet", &MessageArgs::new()).unwrap();
		stale.translate("greet", &MessageArgs::new()).unwrap();
		assert!(cache.is_empty());
		assert_eq!(formatter.compiles(), 2);

		fresh.translate("greet", &MessageArgs::new()).unwrap();
		fresh.translate("greet", &MessageArgs::new()).unwrap();
		assert_eq!(cache.len(), 1);
		assert_eq!(formatter.compiles(), 3);
	}

	#[test]
	fn test_cache_keys_include_locale() {
		let cache = MessageCache::new();
		let generation = cache.clear();
		let compile = |locale: &str| {
			let locale = locale.to_string();
			move || IcuMessageFormatter.compile("{n, number}", &locale, &FormatOptions::new())
		};
		let args = MessageArgs::from_pairs([("n", 1234.5)]);

		let en = cache
			.get_or_compile(generation, MessageKey::new("n", "en", "{n, number}"), compile("en"))
			.unwrap();
		let de = cache
			.get_or_compile(generation, MessageKey::new("n", "de", "{n, number}"), compile("de"))
			.unwrap();

		assert_eq!(cache.len(), 2);
		assert_eq!(en.format(&args).unwrap(), "1,234.5");
		assert_eq!(de.format(&args).unwrap(), "1.234,5");
	}
}
