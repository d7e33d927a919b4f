// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Named arguments substituted into a message.

use std::collections::BTreeMap;

use serde_json::Value;

/// Argument values for a message, keyed by parameter name.
///
/// Later values for the same name replace earlier ones.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessageArgs {
	values: BTreeMap<String, Value>,
}

impl MessageArgs {
	pub fn new() -> Self {
		Self::default()
	}

	/// Build arguments from explicit `(name, value)` pairs.
	///
	/// # Example
	///
	/// ```
	/// use loom_i18n_core::MessageArgs;
	///
	/// let args = MessageArgs::from_pairs([("name", "World")]);
	/// assert_eq!(args.get("name"), Some(&serde_json::json!("World")));
	/// ```
	pub fn from_pairs<K, V, I>(pairs: I) -> Self
	where
		K: Into<String>,
		V: Into<Value>,
		I: IntoIterator<Item = (K, V)>,
	{
		let mut args = Self::new();
		for (name, value) in pairs {
			args.insert(name, value);
		}
		args
	}

	/// Build arguments from a flat `name, value, name, value, ...` list.
	///
	/// A trailing name without a value is dropped.
	///
	/// ```
	/// use loom_i18n_core::MessageArgs;
	///
	/// let args = MessageArgs::from_flat(&["name", "World", "unpaired"]);
	/// assert_eq!(args.len(), 1);
	/// ```
	pub fn from_flat<S: AsRef<str>>(items: &[S]) -> Self {
		Self::from_pairs(
			items
				.chunks_exact(2)
				.map(|pair| (pair[0].as_ref(), pair[1].as_ref())),
		)
	}

	pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
		self.values.insert(name.into(), value.into());
	}

	/// Builder-style variant of [`MessageArgs::insert`].
	pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
		self.insert(name, value);
		self
	}

	pub fn get(&self, name: &str) -> Option<&Value> {
		self.values.get(name)
	}

	pub fn len(&self) -> usize {
		self.values.len()
	}

	pub fn is_empty(&self) -> bool {
		self.values.is_empty()
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
		self.values.iter().map(|(k, v)| (k.as_str(), v))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;
	use serde_json::json;

	#[test]
	fn test_from_pairs_keeps_value_types() {
		let args = MessageArgs::from_pairs([("count", json!(3)), ("name", json!("Ada"))]);
		assert_eq!(args.get("count"), Some(&json!(3)));
		assert_eq!(args.get("name"), Some(&json!("Ada")));
	}

	#[test]
	fn test_later_pair_wins() {
		let args = MessageArgs::from_pairs([("name", "first"), ("name", "second")]);
		assert_eq!(args.len(), 1);
		assert_eq!(args.get("name"), Some(&json!("second")));
	}

	#[test]
	fn test_from_flat_pairs_positions() {
		let args = MessageArgs::from_flat(&["a", "1", "b", "2"]);
		assert_eq!(args.get("a"), Some(&json!("1")));
		assert_eq!(args.get("b"), Some(&json!("2")));
	}

	#[test]
	fn test_from_flat_drops_unpaired_name() {
		let args = MessageArgs::from_flat(&["a", "1", "b"]);
		assert_eq!(args.len(), 1);
		assert_eq!(args.get("b"), None);
	}

	#[test]
	fn test_from_flat_empty() {
		let items: [&str; 0] = [];
		assert!(MessageArgs::from_flat(&items).is_empty());
	}

	proptest! {
		#[test]
		fn from_flat_uses_floor_half_of_items(names in prop::collection::btree_set("[a-z]{1,6}", 0..8), extra in any::<bool>()) {
			let mut items = Vec::new();
			for name in &names {
				items.push(name.clone());
				items.push(format!("{name}-value"));
			}
			if extra {
				items.push("dangling".to_string());
			}

			let args = MessageArgs::from_flat(&items);
			prop_assert_eq!(args.len(), names.len());
			for name in &names {
				prop_assert_eq!(args.get(name), Some(&json!(format!("{name}-value"))));
			}
		}
	}
}
