// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Language resolution and pattern lookup with base-language fallback.

use icu::locale::{locale, Locale};
use tracing::debug;

use crate::bundle::ResourceBundle;

/// Separator between a base language and its region or script subtags.
pub const SUBTAG_SEPARATOR: char = '-';

/// Return the base language of a region-qualified code.
///
/// # Example
///
/// ```
/// use loom_i18n_core::fallback_language;
///
/// assert_eq!(fallback_language("en-US"), "en");
/// assert_eq!(fallback_language("zh-Hant-TW"), "zh");
/// assert_eq!(fallback_language("fr"), "fr");
/// ```
pub fn fallback_language(language: &str) -> &str {
	match language.split_once(SUBTAG_SEPARATOR) {
		Some((base, _)) => base,
		None => language,
	}
}

/// Parse a language tag for the locale-data formatters.
///
/// Tags ICU cannot parse fall back to the root locale.
pub(crate) fn data_locale(language: &str) -> Locale {
	language.replace('_', "-").parse().unwrap_or_else(|_| {
		debug!(language, "unparseable language tag, using root locale data");
		locale!("und")
	})
}

/// The languages a lookup will consult, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedLanguage<'a> {
	/// The exact language if the bundle has it, otherwise the base language.
	pub effective: &'a str,
	/// The base language, consulted when `effective` lacks a key.
	pub fallback: &'a str,
}

/// Decide which bundle entries serve `language`.
///
/// Resolution order:
/// 1. The exact language, if the bundle has an entry for it
/// 2. Otherwise the base language (the part before the first `-`)
///
/// Returns `None` when neither is present.
pub fn resolve_language<'a>(
	resources: &ResourceBundle,
	language: &'a str,
) -> Option<ResolvedLanguage<'a>> {
	let fallback = fallback_language(language);
	let effective = if resources.contains_language(language) {
		language
	} else {
		fallback
	};

	if !resources.contains_language(effective) {
		return None;
	}

	Some(ResolvedLanguage {
		effective,
		fallback,
	})
}

/// Look up `key` in the effective language, then in the base language.
///
/// Empty patterns count as missing so that a regional bundle can blank out
/// an entry and still pick up the base language's text.
pub fn lookup_pattern<'r>(
	resources: &'r ResourceBundle,
	resolved: ResolvedLanguage<'_>,
	key: &str,
) -> Option<&'r str> {
	let found = |language: &str| {
		resources
			.pattern(language, key)
			.filter(|pattern| !pattern.is_empty())
	};

	found(resolved.effective).or_else(|| {
		if resolved.fallback != resolved.effective {
			found(resolved.fallback)
		} else {
			None
		}
	})
}
