// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Resource bundles: language code to message key to message pattern.
//!
//! Two JSON document shapes are accepted:
//!
//! - a full bundle, `{ "en": { "greet": "Hello, {name}!" } }`
//! - a flat map for a single language, `{ "greet": "Hello, {name}!" }`,
//!   which requires the caller to name the language it belongs to.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::BundleError;

/// Messages for a single language, keyed by message key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LanguageResources {
	messages: BTreeMap<String, String>,
}

impl LanguageResources {
	pub fn new() -> Self {
		Self::default()
	}

	/// Insert a pattern, returning the previous one for the key if any.
	pub fn insert(&mut self, key: impl Into<String>, pattern: impl Into<String>) -> Option<String> {
		self.messages.insert(key.into(), pattern.into())
	}

	pub fn get(&self, key: &str) -> Option<&str> {
		self.messages.get(key).map(String::as_str)
	}

	pub fn contains_key(&self, key: &str) -> bool {
		self.messages.contains_key(key)
	}

	pub fn len(&self) -> usize {
		self.messages.len()
	}

	pub fn is_empty(&self) -> bool {
		self.messages.is_empty()
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
		self.messages.iter().map(|(k, v)| (k.as_str(), v.as_str()))
	}

	/// Overwrite matching keys with the patterns from `other`.
	pub fn merge(&mut self, other: LanguageResources) {
		self.messages.extend(other.messages);
	}

	fn from_object(language: &str, value: Value) -> Result<Self, BundleError> {
		let Value::Object(map) = value else {
			return Err(BundleError::NotAnObject {
				path: language.to_string(),
			});
		};

		let mut messages = BTreeMap::new();
		for (key, pattern) in map {
			match pattern {
				Value::String(pattern) => {
					messages.insert(key, pattern);
				}
				other => {
					return Err(BundleError::InvalidPattern {
						language: language.to_string(),
						key,
						found: json_kind(&other),
					});
				}
			}
		}
		Ok(Self { messages })
	}
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for LanguageResources {
	fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
		Self {
			messages: iter
				.into_iter()
				.map(|(k, v)| (k.into(), v.into()))
				.collect(),
		}
	}
}

/// The full language → key → pattern mapping held by a localization context.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceBundle {
	languages: BTreeMap<String, LanguageResources>,
}

impl ResourceBundle {
	pub fn new() -> Self {
		Self::default()
	}

	/// Build a bundle from a fetched JSON document.
	///
	/// With `language` set, the document is a flat key → pattern map for
	/// exactly that language. Otherwise it must be a full bundle.
	pub fn from_document(document: Value, language: Option<&str>) -> Result<Self, BundleError> {
		let mut bundle = Self::new();

		if let Some(language) = language {
			let resources = LanguageResources::from_object(language, document)?;
			bundle.languages.insert(language.to_string(), resources);
			return Ok(bundle);
		}

		let Value::Object(map) = document else {
			return Err(BundleError::NotAnObject {
				path: "$".to_string(),
			});
		};
		for (language, messages) in map {
			let resources = LanguageResources::from_object(&language, messages)?;
			bundle.languages.insert(language, resources);
		}
		Ok(bundle)
	}

	/// Deep-merge `other` into this bundle.
	///
	/// Languages and keys present in only one side are kept; where both
	/// define the same language and key, the pattern from `other` wins.
	pub fn merge(&mut self, other: ResourceBundle) {
		for (language, resources) in other.languages {
			self.languages.entry(language).or_default().merge(resources);
		}
	}

	pub fn insert(
		&mut self,
		language: impl Into<String>,
		key: impl Into<String>,
		pattern: impl Into<String>,
	) -> Option<String> {
		self.languages
			.entry(language.into())
			.or_default()
			.insert(key, pattern)
	}

	pub fn insert_language(&mut self, language: impl Into<String>, resources: LanguageResources) {
		self.languages.insert(language.into(), resources);
	}

	pub fn get(&self, language: &str) -> Option<&LanguageResources> {
		self.languages.get(language)
	}

	pub fn contains_language(&self, language: &str) -> bool {
		self.languages.contains_key(language)
	}

	/// Look up a single pattern without any fallback.
	pub fn pattern(&self, language: &str, key: &str) -> Option<&str> {
		self.get(language).and_then(|resources| resources.get(key))
	}

	pub fn languages(&self) -> impl Iterator<Item = &str> {
		self.languages.keys().map(String::as_str)
	}

	/// Number of languages in the bundle.
	pub fn len(&self) -> usize {
		self.languages.len()
	}

	pub fn is_empty(&self) -> bool {
		self.languages.is_empty()
	}
}

fn json_kind(value: &Value) -> &'static str {
	match value {
		Value::Null => "null",
		Value::Bool(_) => "boolean",
		Value::Number(_) => "number",
		Value::String(_) => "string",
		Value::Array(_) => "array",
		Value::Object(_) => "object",
	}
}
