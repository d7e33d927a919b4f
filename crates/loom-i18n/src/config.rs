// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Layered localizer configuration.
//!
//! Sources are applied in [`Precedence`] order, each overriding the fields
//! set by the ones before it:
//!
//! 1. built-in defaults
//! 2. a TOML file
//! 3. `LOOM_I18N_*` environment variables
//! 4. command-line overrides
//!
//! ```toml
//! language = "en-US"
//! use_key_if_missing = true
//! cache_scope = "docs"
//!
//! [headers]
//! x-locale-version = "7"
//!
//! [[preload]]
//! path = "https://cdn.example.com/locales/es.json"
//! language = "es"
//!
//! [formats.number.EUR]
//! style = "currency"
//! currency = "EUR"
//! ```

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::time::Duration;

use loom_i18n_core::FormatOptions;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

use crate::cache::DEFAULT_SCOPE;
use crate::error::ConfigError;

/// Default HTTP timeout, in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

const ENV_PREFIX: &str = "LOOM_I18N_";

/// A resource file to load when a localizer starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreloadResource {
	pub path: String,
	#[serde(default)]
	pub language: Option<String>,
	#[serde(default = "default_merge")]
	pub merge: bool,
}

fn default_merge() -> bool {
	true
}

/// Resolved localizer configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalizerConfig {
	pub language: Option<String>,
	pub use_key_if_missing: bool,
	/// Let load notifications propagate to the parent listener chain.
	pub bubble_events: bool,
	/// Default credentials flag for resource requests.
	pub with_credentials: bool,
	/// Localizers with the same scope share fetches and compiled messages.
	pub cache_scope: String,
	pub request_timeout_secs: u64,
	/// Headers sent with every resource request.
	pub headers: BTreeMap<String, String>,
	/// Bearer token sent on requests made with credentials.
	#[serde(skip_serializing)]
	pub auth_token: Option<String>,
	pub preload: Vec<PreloadResource>,
	pub formats: FormatOptions,
}

impl Default for LocalizerConfig {
	fn default() -> Self {
		Self {
			language: None,
			use_key_if_missing: false,
			bubble_events: false,
			with_credentials: false,
			cache_scope: DEFAULT_SCOPE.to_string(),
			request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
			headers: BTreeMap::new(),
			auth_token: None,
			preload: Vec::new(),
			formats: FormatOptions::new(),
		}
	}
}

impl LocalizerConfig {
	pub fn request_timeout(&self) -> Duration {
		Duration::from_secs(self.request_timeout_secs)
	}
}

/// A partial configuration as produced by one source.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LocalizerConfigLayer {
	pub language: Option<String>,
	pub use_key_if_missing: Option<bool>,
	pub bubble_events: Option<bool>,
	pub with_credentials: Option<bool>,
	pub cache_scope: Option<String>,
	pub request_timeout_secs: Option<u64>,
	pub headers: Option<BTreeMap<String, String>>,
	pub auth_token: Option<String>,
	pub preload: Option<Vec<PreloadResource>>,
	pub formats: Option<FormatOptions>,
}

impl LocalizerConfigLayer {
	/// Apply `other` on top of `self`.
	///
	/// Header maps are combined key by key; every other field is replaced
	/// when `other` sets it.
	pub fn merge(&mut self, other: LocalizerConfigLayer) {
		if other.language.is_some() {
			self.language = other.language;
		}
		if other.use_key_if_missing.is_some() {
			self.use_key_if_missing = other.use_key_if_missing;
		}
		if other.bubble_events.is_some() {
			self.bubble_events = other.bubble_events;
		}
		if other.with_credentials.is_some() {
			self.with_credentials = other.with_credentials;
		}
		if other.cache_scope.is_some() {
			self.cache_scope = other.cache_scope;
		}
		if other.request_timeout_secs.is_some() {
			self.request_timeout_secs = other.request_timeout_secs;
		}
		if let Some(headers) = other.headers {
			self.headers.get_or_insert_with(BTreeMap::new).extend(headers);
		}
		if other.auth_token.is_some() {
			self.auth_token = other.auth_token;
		}
		if other.preload.is_some() {
			self.preload = other.preload;
		}
		if other.formats.is_some() {
			self.formats = other.formats;
		}
	}

	/// Fill unset fields with defaults and validate the result.
	pub fn finalize(self) -> Result<LocalizerConfig, ConfigError> {
		let defaults = LocalizerConfig::default();
		let config = LocalizerConfig {
			language: self.language,
			use_key_if_missing: self.use_key_if_missing.unwrap_or(defaults.use_key_if_missing),
			bubble_events: self.bubble_events.unwrap_or(defaults.bubble_events),
			with_credentials: self.with_credentials.unwrap_or(defaults.with_credentials),
			cache_scope: self.cache_scope.unwrap_or(defaults.cache_scope),
			request_timeout_secs: self
				.request_timeout_secs
				.unwrap_or(defaults.request_timeout_secs),
			headers: self.headers.unwrap_or_default(),
			auth_token: self.auth_token,
			preload: self.preload.unwrap_or_default(),
			formats: self.formats.unwrap_or_default(),
		};
		validate(&config)?;
		Ok(config)
	}
}

fn validate(config: &LocalizerConfig) -> Result<(), ConfigError> {
	if config.language.as_deref() == Some("") {
		return Err(ConfigError::invalid_value("language", "must not be empty"));
	}
	if config.cache_scope.is_empty() {
		return Err(ConfigError::invalid_value("cache_scope", "must not be empty"));
	}
	if config.request_timeout_secs == 0 {
		return Err(ConfigError::invalid_value(
			"request_timeout_secs",
			"must be greater than zero",
		));
	}
	for (index, resource) in config.preload.iter().enumerate() {
		if resource.path.is_empty() {
			return Err(ConfigError::invalid_value(
				format!("preload[{index}].path"),
				"must not be empty",
			));
		}
	}
	Ok(())
}

/// Source precedence levels (higher overrides lower).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
	Defaults = 10,
	ConfigFile = 20,
	Environment = 50,
	Cli = 100,
}

/// A provider of one configuration layer.
pub trait ConfigSource: Send + Sync {
	fn name(&self) -> &'static str;
	fn precedence(&self) -> Precedence;
	fn load(&self) -> Result<LocalizerConfigLayer, ConfigError>;
}

/// Built-in defaults.
pub struct DefaultsSource;

impl ConfigSource for DefaultsSource {
	fn name(&self) -> &'static str {
		"defaults"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Defaults
	}

	fn load(&self) -> Result<LocalizerConfigLayer, ConfigError> {
		Ok(LocalizerConfigLayer::default())
	}
}

/// A TOML configuration file.
pub struct TomlSource {
	path: PathBuf,
	required: bool,
}

impl TomlSource {
	/// A file that is skipped when it does not exist.
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self {
			path: path.into(),
			required: false,
		}
	}

	/// A file that must exist.
	pub fn required(path: impl Into<PathBuf>) -> Self {
		Self {
			path: path.into(),
			required: true,
		}
	}
}

impl ConfigSource for TomlSource {
	fn name(&self) -> &'static str {
		"toml-config"
	}

	fn precedence(&self) -> Precedence {
		Precedence::ConfigFile
	}

	fn load(&self) -> Result<LocalizerConfigLayer, ConfigError> {
		if !self.required && !self.path.exists() {
			debug!(path = %self.path.display(), "config file not found, skipping");
			return Ok(LocalizerConfigLayer::default());
		}

		debug!(path = %self.path.display(), "loading config file");
		let content = std::fs::read_to_string(&self.path).map_err(|e| ConfigError::FileRead {
			path: self.path.clone(),
			source: e,
		})?;

		let layer = toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
			path: self.path.clone(),
			source: e,
		})?;

		trace!("parsed config layer from TOML");
		Ok(layer)
	}
}

/// `LOOM_I18N_*` environment variables.
///
/// Reads the process environment unless constructed with
/// [`EnvSource::from_vars`].
#[derive(Default)]
pub struct EnvSource {
	vars: Option<HashMap<String, String>>,
}

impl EnvSource {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn from_vars<K, V, I>(vars: I) -> Self
	where
		K: Into<String>,
		V: Into<String>,
		I: IntoIterator<Item = (K, V)>,
	{
		Self {
			vars: Some(vars.into_iter().map(|(k, v)| (k.into(), v.into())).collect()),
		}
	}

	fn var(&self, field: &str) -> Option<String> {
		let name = format!("{ENV_PREFIX}{field}");
		let value = match &self.vars {
			Some(vars) => vars.get(&name).cloned(),
			None => std::env::var(&name).ok(),
		};
		value.filter(|v| !v.is_empty())
	}

	fn bool(&self, field: &str) -> Result<Option<bool>, ConfigError> {
		let Some(value) = self.var(field) else {
			return Ok(None);
		};
		match value.to_ascii_lowercase().as_str() {
			"true" | "1" | "yes" => Ok(Some(true)),
			"false" | "0" | "no" => Ok(Some(false)),
			_ => Err(ConfigError::invalid_value(
				format!("{ENV_PREFIX}{field}"),
				format!("invalid boolean value '{value}'"),
			)),
		}
	}

	fn u64(&self, field: &str) -> Result<Option<u64>, ConfigError> {
		match self.var(field) {
			Some(value) => value.parse().map(Some).map_err(|_| {
				ConfigError::invalid_value(
					format!("{ENV_PREFIX}{field}"),
					format!("invalid u64 value '{value}'"),
				)
			}),
			None => Ok(None),
		}
	}
}

impl ConfigSource for EnvSource {
	fn name(&self) -> &'static str {
		"environment"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Environment
	}

	fn load(&self) -> Result<LocalizerConfigLayer, ConfigError> {
		debug!("loading environment variables");
		Ok(LocalizerConfigLayer {
			language: self.var("LANGUAGE"),
			use_key_if_missing: self.bool("USE_KEY_IF_MISSING")?,
			bubble_events: self.bool("BUBBLE_EVENTS")?,
			with_credentials: self.bool("WITH_CREDENTIALS")?,
			cache_scope: self.var("CACHE_SCOPE"),
			request_timeout_secs: self.u64("REQUEST_TIMEOUT_SECS")?,
			auth_token: self.var("AUTH_TOKEN"),
			..LocalizerConfigLayer::default()
		})
	}
}

/// Overrides given on the command line.
pub struct CliSource(pub LocalizerConfigLayer);

impl ConfigSource for CliSource {
	fn name(&self) -> &'static str {
		"cli"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Cli
	}

	fn load(&self) -> Result<LocalizerConfigLayer, ConfigError> {
		Ok(self.0.clone())
	}
}

/// Merge `sources` in precedence order and finalize the result.
pub fn load_config_from_sources(
	mut sources: Vec<Box<dyn ConfigSource>>,
) -> Result<LocalizerConfig, ConfigError> {
	sources.sort_by_key(|s| s.precedence());

	let mut merged = LocalizerConfigLayer::default();
	for source in sources {
		debug!(source = source.name(), "loading configuration source");
		merged.merge(source.load()?);
	}

	let config = merged.finalize()?;
	info!(
		language = ?config.language,
		cache_scope = %config.cache_scope,
		preload = config.preload.len(),
		"localizer configuration loaded"
	);
	Ok(config)
}

/// Load configuration from defaults, an optional TOML file, the process
/// environment and `cli` overrides.
///
/// An explicitly given file must exist.
pub fn load_config(
	path: Option<&Path>,
	cli: LocalizerConfigLayer,
) -> Result<LocalizerConfig, ConfigError> {
	let mut sources: Vec<Box<dyn ConfigSource>> = vec![
		Box::new(DefaultsSource),
		Box::new(EnvSource::new()),
		Box::new(CliSource(cli)),
	];
	if let Some(path) = path {
		sources.push(Box::new(TomlSource::required(path)));
	}
	load_config_from_sources(sources)
}
