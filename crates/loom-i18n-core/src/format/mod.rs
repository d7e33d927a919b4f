// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The message formatter seam.
//!
//! A [`MessageFormatter`] compiles a pattern for a locale into a reusable
//! [`CompiledMessage`], which is then applied to [`MessageArgs`]. The
//! translator only ever talks to these traits; [`IcuMessageFormatter`] is
//! the implementation used unless another one is supplied.

mod args;
mod date;
mod icu;
mod number;
mod plural;

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;

pub use args::MessageArgs;
pub use icu::IcuMessageFormatter;
pub use plural::PluralCategory;

/// Compiles message patterns into reusable formatters.
pub trait MessageFormatter: Send + Sync {
	/// Compile `pattern` for `locale`.
	///
	/// Fails with [`crate::FormatError::Syntax`] when the pattern is malformed.
	fn compile(
		&self,
		pattern: &str,
		locale: &str,
		formats: &FormatOptions,
	) -> Result<Arc<dyn CompiledMessage>>;
}

/// A compiled message pattern.
pub trait CompiledMessage: Send + Sync {
	/// Substitute `args` into the message.
	fn format(&self, args: &MessageArgs) -> Result<String>;
}

/// Named format configurations, keyed by format type and then format name.
///
/// The options are handed to the formatter untouched, e.g.
///
/// ```json
/// { "number": { "USD": { "style": "currency", "currency": "USD" } } }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormatOptions {
	types: BTreeMap<String, BTreeMap<String, Value>>,
}

impl FormatOptions {
	pub fn new() -> Self {
		Self::default()
	}

	/// Register the options for the named format `name` of type `kind`.
	pub fn insert(&mut self, kind: impl Into<String>, name: impl Into<String>, options: Value) {
		self.types
			.entry(kind.into())
			.or_default()
			.insert(name.into(), options);
	}

	/// Builder-style variant of [`FormatOptions::insert`].
	pub fn with(mut self, kind: impl Into<String>, name: impl Into<String>, options: Value) -> Self {
		self.insert(kind, name, options);
		self
	}

	pub fn get(&self, kind: &str, name: &str) -> Option<&Value> {
		self.types.get(kind).and_then(|formats| formats.get(name))
	}

	pub fn is_empty(&self) -> bool {
		self.types.is_empty()
	}
}
