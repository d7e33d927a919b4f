// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Localization SDK for Loom.
//!
//! This crate resolves message keys into formatted strings for a chosen
//! language, loading resource files on demand and caching both the fetches
//! and the compiled messages.
//!
//! # Features
//!
//! - **Resource Loading**: JSON resource files over HTTP(S) or from disk,
//!   merged into or replacing the resource store
//! - **Request De-duplication**: concurrent loads of one path share a fetch
//! - **Base-language Fallback**: `en-US` falls back to `en` per key
//! - **Compiled-message Cache**: shared per cache scope, cleared whenever the
//!   language, resources or formats change
//! - **Load Notifications**: listeners with optional parent chains
//!
//! # Example
//!
//! ```no_run
//! use loom_i18n::{LoadRequest, Localizer};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let localizer = Localizer::builder().language("es-MX").build();
//!
//!     localizer
//!         .load_resources(LoadRequest::new("https://cdn.example.com/es.json").language("es"))
//!         .await;
//!
//!     let text = localizer.localize("greet", [("name", "Ana")])?;
//!     println!("{}", text.unwrap_or_default());
//!     Ok(())
//! }
//! ```

mod cache;
mod config;
mod error;
mod events;
mod fetch;
mod localizer;

pub use cache::{FetchResult, LocalizationCache, SharedFetch, DEFAULT_SCOPE};
pub use config::{
	load_config, load_config_from_sources, CliSource, ConfigSource, DefaultsSource, EnvSource,
	LocalizerConfig, LocalizerConfigLayer, Precedence, PreloadResource, TomlSource,
	DEFAULT_REQUEST_TIMEOUT_SECS,
};
pub use error::{ConfigError, FetchError};
pub use events::{ListenerChain, LocalizeListener, NoOpListener, ResourcesError, ResourcesLoaded};
pub use fetch::{
	user_agent, DefaultFetcher, FetchRequest, FetchedResource, FileFetcher, HttpFetcher,
	ResourceFetcher, DEFAULT_REQUEST_TIMEOUT,
};
pub use localizer::{LoadOutcome, LoadRequest, Localizer, LocalizerBuilder};

// Re-export core types for convenience
pub use loom_i18n_core::{
	fallback_language, BundleError, CompiledMessage, FormatError, FormatOptions,
	IcuMessageFormatter, LanguageResources, MessageArgs, MessageFormatter, ResourceBundle, Result,
	Translator,
};
