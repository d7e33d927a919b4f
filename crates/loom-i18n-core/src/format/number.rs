// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Locale-aware number rendering for `{n, number, ...}` arguments.
//!
//! Digits, separators and grouping come from ICU4X's [`DecimalFormatter`].
//! Stable ICU4X has no currency or percent formatter, so the symbol and its
//! placement are applied around the formatted digits here.

use std::fmt;

use fixed_decimal::{Decimal, FloatPrecision};
use icu::decimal::options::{DecimalFormatterOptions, GroupingStrategy};
use icu::decimal::DecimalFormatter;
use icu::locale::Locale;
use serde_json::Value;

use crate::error::{FormatError, Result};
use crate::format::FormatOptions;
use crate::language::fallback_language;

const MAX_FRACTION_DIGITS: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum NumberStyle {
	Decimal,
	Percent,
	Currency(String),
}

/// Resolved options for a number argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct NumberOptions {
	pub style: NumberStyle,
	pub min_fraction: usize,
	pub max_fraction: usize,
	pub grouping: bool,
}

impl Default for NumberOptions {
	fn default() -> Self {
		Self {
			style: NumberStyle::Decimal,
			min_fraction: 0,
			max_fraction: 3,
			grouping: true,
		}
	}
}

impl NumberOptions {
	/// Resolve a style keyword or a named format from `formats`.
	pub(crate) fn resolve(style: Option<&str>, formats: &FormatOptions) -> Result<Self> {
		match style {
			None => Ok(Self::default()),
			Some("integer") => Ok(Self {
				max_fraction: 0,
				..Self::default()
			}),
			Some("percent") => Ok(Self::percent()),
			Some(name) => {
				let options = formats
					.get("number", name)
					.ok_or_else(|| FormatError::UnknownFormat {
						kind: "number".to_string(),
						name: name.to_string(),
					})?;
				Self::from_json(name, options)
			}
		}
	}

	fn percent() -> Self {
		Self {
			style: NumberStyle::Percent,
			max_fraction: 0,
			..Self::default()
		}
	}

	fn from_json(name: &str, options: &Value) -> Result<Self> {
		let invalid = |message: &str| FormatError::UnknownFormat {
			kind: "number".to_string(),
			name: format!("{name} ({message})"),
		};

		let Value::Object(map) = options else {
			return Err(invalid("options must be an object"));
		};

		let mut resolved = match map.get("style").and_then(Value::as_str) {
			None | Some("decimal") => Self::default(),
			Some("percent") => Self::percent(),
			Some("currency") => {
				let code = map
					.get("currency")
					.and_then(Value::as_str)
					.ok_or_else(|| invalid("currency style requires a currency code"))?
					.to_ascii_uppercase();
				let digits = minor_units(&code);
				Self {
					style: NumberStyle::Currency(code),
					min_fraction: digits,
					max_fraction: digits,
					grouping: true,
				}
			}
			Some(_) => return Err(invalid("unsupported style")),
		};

		let digits = |field: &str| {
			map.get(field)
				.and_then(Value::as_u64)
				.map(|d| (d as usize).min(MAX_FRACTION_DIGITS))
		};
		if let Some(min) = digits("minimumFractionDigits") {
			resolved.min_fraction = min;
			resolved.max_fraction = resolved.max_fraction.max(min);
		}
		if let Some(max) = digits("maximumFractionDigits") {
			resolved.max_fraction = max;
			resolved.min_fraction = resolved.min_fraction.min(max);
		}
		if let Some(grouping) = map.get("useGrouping").and_then(Value::as_bool) {
			resolved.grouping = grouping;
		}

		Ok(resolved)
	}
}

/// ISO 4217 minor units.
fn minor_units(code: &str) -> usize {
	match code {
		"JPY" | "KRW" | "VND" | "CLP" | "ISK" | "UGX" | "PYG" | "XAF" | "XOF" => 0,
		"BHD" | "IQD" | "JOD" | "KWD" | "LYD" | "OMR" | "TND" => 3,
		_ => 2,
	}
}

fn currency_symbol(code: &str) -> Option<&'static str> {
	match code {
		"USD" => Some("$"),
		"EUR" => Some("€"),
		"GBP" => Some("£"),
		"JPY" => Some("¥"),
		"INR" => Some("₹"),
		_ => None,
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Placement {
	Before,
	BeforeSpaced,
	After,
}

/// Where a locale puts currency symbols and the percent sign.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Affixes {
	currency: Placement,
	percent_spaced: bool,
}

impl Affixes {
	fn for_locale(locale: &Locale) -> Self {
		let tag = locale.to_string();
		let currency = match (tag.as_str(), fallback_language(&tag)) {
			("pt-PT", _) => Placement::After,
			(_, "nl" | "pt") => Placement::BeforeSpaced,
			(
				_,
				"de" | "fr" | "es" | "it" | "ru" | "uk" | "pl" | "cs" | "sk" | "fi" | "sv" | "nb" | "da"
				| "et" | "lv" | "lt" | "hu" | "ro" | "bg" | "hr" | "sl" | "sr" | "el" | "ca",
			) => Placement::After,
			_ => Placement::Before,
		};
		let percent_spaced = matches!(
			fallback_language(&tag),
			"de" | "fr" | "es" | "ru" | "uk" | "sv" | "nb" | "fi" | "cs" | "sk" | "da" | "et"
		);
		Self {
			currency,
			percent_spaced,
		}
	}
}

/// A number argument compiled for one locale.
pub(crate) struct NumberFormat {
	options: NumberOptions,
	decimal: DecimalFormatter,
	affixes: Affixes,
}

impl NumberFormat {
	pub(crate) fn try_new(locale: &Locale, options: NumberOptions) -> Result<Self> {
		let mut decimal_options = DecimalFormatterOptions::default();
		if !options.grouping {
			decimal_options.grouping_strategy = Some(GroupingStrategy::Never);
		}
		let decimal = DecimalFormatter::try_new(locale.clone().into(), decimal_options)
			.map_err(|err| FormatError::locale_data("number", locale, err))?;

		Ok(Self {
			options,
			decimal,
			affixes: Affixes::for_locale(locale),
		})
	}

	/// Render `value`.
	pub(crate) fn format(&self, value: f64) -> String {
		if value.is_nan() {
			return "NaN".to_string();
		}

		let (body, is_zero) = if value.is_infinite() {
			("∞".to_string(), false)
		} else {
			self.digits(value.abs())
		};
		let sign = if value.is_sign_negative() && !is_zero {
			"-"
		} else {
			""
		};

		match &self.options.style {
			NumberStyle::Decimal => format!("{sign}{body}"),
			NumberStyle::Percent if self.affixes.percent_spaced => format!("{sign}{body}\u{a0}%"),
			NumberStyle::Percent => format!("{sign}{body}%"),
			NumberStyle::Currency(code) => {
				let (symbol, placement) = match currency_symbol(code) {
					Some(symbol) => (symbol, self.affixes.currency),
					None if self.affixes.currency == Placement::After => (code.as_str(), Placement::After),
					None => (code.as_str(), Placement::BeforeSpaced),
				};
				match placement {
					Placement::Before => format!("{sign}{symbol}{body}"),
					Placement::BeforeSpaced => format!("{sign}{symbol}\u{a0}{body}"),
					Placement::After => format!("{sign}{body}\u{a0}{symbol}"),
				}
			}
		}
	}

	/// Localized digits for a non-negative finite value, and whether they
	/// round to zero.
	fn digits(&self, abs: f64) -> (String, bool) {
		let scaled = match self.options.style {
			NumberStyle::Percent => abs * 100.0,
			_ => abs,
		};
		let max_fraction = self.options.max_fraction as i16;
		let is_zero = scaled * 10f64.powi(i32::from(max_fraction)) <= 0.5;

		let Ok(mut decimal) = Decimal::try_from_f64(abs, FloatPrecision::RoundTrip) else {
			return (scaled.to_string(), is_zero);
		};
		if self.options.style == NumberStyle::Percent {
			decimal.multiply_pow10(2);
		}
		// Rounding pads short values with zeros, so only round longer ones.
		if *decimal.magnitude_range().start() < -max_fraction {
			decimal.round(-max_fraction);
		}
		decimal.trim_end();
		decimal.pad_end(-(self.options.min_fraction as i16));

		(self.decimal.format(&decimal).to_string(), is_zero)
	}
}

impl fmt::Debug for NumberFormat {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("NumberFormat")
			.field("options", &self.options)
			.field("affixes", &self.affixes)
			.finish_non_exhaustive()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::language::data_locale;
	use serde_json::json;

	fn format(locale: &str, options: NumberOptions, value: f64) -> String {
		NumberFormat::try_new(&data_locale(locale), options)
			.unwrap()
			.format(value)
	}

	fn named(style: serde_json::Value) -> NumberOptions {
		let formats = FormatOptions::new().with("number", "named", style);
		NumberOptions::resolve(Some("named"), &formats).unwrap()
	}

	fn currency(code: &str) -> NumberOptions {
		named(json!({ "style": "currency", "currency": code }))
	}

	#[test]
	fn test_default_decimal_rounds_to_three_places() {
		let options = NumberOptions::default;
		assert_eq!(format("en", options(), 1234.5), "1,234.5");
		assert_eq!(format("en", options(), 3.14159), "3.142");
		assert_eq!(format("en", options(), 1_000_000.0), "1,000,000");
		assert_eq!(format("en", options(), -42.0), "-42");
	}

	#[test]
	fn test_negative_zero_has_no_sign() {
		let options = NumberOptions::resolve(Some("integer"), &FormatOptions::new()).unwrap();
		assert_eq!(format("en", options, -0.2), "0");
	}

	#[test]
	fn test_percent_scales_value() {
		let options = || NumberOptions::resolve(Some("percent"), &FormatOptions::new()).unwrap();
		assert_eq!(format("en", options(), 0.256), "26%");
		assert_eq!(format("de", options(), 0.5), "50\u{a0}%");
	}

	#[test]
	fn test_locale_separators() {
		let options = NumberOptions::default;
		assert_eq!(format("de-DE", options(), 1234.5), "1.234,5");
		assert_eq!(format("fr", options(), 1234.5), "1\u{202f}234,5");
	}

	#[test]
	fn test_currency_symbol_before_digits() {
		assert_eq!(format("en", currency("usd"), 1234.5), "$1,234.50");
		assert_eq!(format("en", currency("EUR"), -5.0), "-€5.00");
	}

	#[test]
	fn test_currency_symbol_after_digits() {
		assert_eq!(format("de", currency("EUR"), 1234.5), "1.234,50\u{a0}€");
		assert_eq!(format("pt-PT", currency("EUR"), 5.0), "5,00\u{a0}€");
	}

	#[test]
	fn test_currency_uses_minor_units() {
		assert_eq!(format("en", currency("JPY"), 1234.4), "¥1,234");
		assert_eq!(format("en", currency("KWD"), 1.5), "KWD\u{a0}1.500");
	}

	#[test]
	fn test_unknown_currency_uses_code() {
		assert_eq!(format("en", currency("CHF"), 5.0), "CHF\u{a0}5.00");
	}

	#[test]
	fn test_named_fraction_digits_and_grouping() {
		let options = named(json!({ "minimumFractionDigits": 2, "maximumFractionDigits": 2, "useGrouping": false }));
		assert_eq!(format("en", options, 12345.0), "12345.00");
	}

	#[test]
	fn test_explicit_digits_override_currency_default() {
		let options = named(json!({ "style": "currency", "currency": "USD", "maximumFractionDigits": 0 }));
		assert_eq!(options.min_fraction, 0);
		assert_eq!(format("en", options, 9.2), "$9");
	}

	#[test]
	fn test_unknown_named_format_fails() {
		let err = NumberOptions::resolve(Some("missing"), &FormatOptions::new()).unwrap_err();
		assert!(matches!(err, FormatError::UnknownFormat { ref name, .. } if name == "missing"));
	}

	#[test]
	fn test_non_finite_values() {
		let options = NumberOptions::default;
		assert_eq!(format("en", options(), f64::NAN), "NaN");
		assert_eq!(format("en", options(), f64::NEG_INFINITY), "-∞");
	}
}
