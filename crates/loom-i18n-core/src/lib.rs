// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core localization types for Loom.
//!
//! This crate holds the synchronous half of message localization:
//!
//! - [`ResourceBundle`]: language → key → pattern, with deep merge
//! - Base-language fallback (`en-US` → `en`)
//! - The [`MessageFormatter`] seam and the built-in [`IcuMessageFormatter`]
//! - [`Translator`]: key lookup plus a shared cache of compiled messages
//!
//! Fetching resource files and owning a localization context live in
//! `loom-i18n`.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use loom_i18n_core::{
//!     IcuMessageFormatter, MessageArgs, MessageCache, ResourceBundle, Translator,
//!     TranslatorInputs,
//! };
//!
//! let mut bundle = ResourceBundle::new();
//! bundle.insert("en", "greet", "Hello, {name}!");
//!
//! let translator = Translator::build(
//!     TranslatorInputs {
//!         language: Some("en-US".to_string()),
//!         resources: Some(Arc::new(bundle)),
//!         ..Default::default()
//!     },
//!     Arc::new(MessageCache::new()),
//!     Arc::new(IcuMessageFormatter),
//! );
//!
//! let text = translator
//!     .translate("greet", &MessageArgs::from_pairs([("name", "World")]))
//!     .unwrap();
//! assert_eq!(text.as_deref(), Some("Hello, World!"));
//! ```

mod bundle;
mod error;
mod format;
mod language;
mod translator;

pub use bundle::{LanguageResources, ResourceBundle};
pub use error::{BundleError, FormatError, Result};
pub use format::{
	CompiledMessage, FormatOptions, IcuMessageFormatter, MessageArgs, MessageFormatter,
	PluralCategory,
};
pub use language::{fallback_language, lookup_pattern, resolve_language, ResolvedLanguage};
pub use translator::{MessageCache, MessageKey, Translator, TranslatorInputs, MISSING_KEY_SENTINEL};
