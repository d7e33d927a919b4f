// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! CLDR plural rules, backed by ICU4X compiled data.

use std::fmt;
use std::str::FromStr;

use icu::locale::Locale;
use icu::plurals::{PluralCategory as IcuCategory, PluralOperands, PluralRules as IcuRules};

use crate::error::{FormatError, Result};

/// A CLDR plural category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PluralCategory {
	Zero,
	One,
	Two,
	Few,
	Many,
	Other,
}

impl PluralCategory {
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Zero => "zero",
			Self::One => "one",
			Self::Two => "two",
			Self::Few => "few",
			Self::Many => "many",
			Self::Other => "other",
		}
	}
}

impl fmt::Display for PluralCategory {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for PluralCategory {
	type Err = ();

	fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
		match s {
			"zero" => Ok(Self::Zero),
			"one" => Ok(Self::One),
			"two" => Ok(Self::Two),
			"few" => Ok(Self::Few),
			"many" => Ok(Self::Many),
			"other" => Ok(Self::Other),
			_ => Err(()),
		}
	}
}

impl From<IcuCategory> for PluralCategory {
	#[allow(unreachable_patterns)]
	fn from(category: IcuCategory) -> Self {
		match category {
			IcuCategory::Zero => Self::Zero,
			IcuCategory::One => Self::One,
			IcuCategory::Two => Self::Two,
			IcuCategory::Few => Self::Few,
			IcuCategory::Many => Self::Many,
			_ => Self::Other,
		}
	}
}

/// Cardinal or ordinal plural rules for one locale.
pub(crate) struct PluralRules {
	rules: IcuRules,
	ordinal: bool,
}

impl PluralRules {
	/// Rules for `{n, plural, ...}`.
	pub(crate) fn cardinal(locale: &Locale) -> Result<Self> {
		let rules = IcuRules::try_new_cardinal(locale.clone().into())
			.map_err(|err| FormatError::locale_data("plural", locale, err))?;
		Ok(Self {
			rules,
			ordinal: false,
		})
	}

	/// Rules for `{n, selectordinal, ...}`.
	pub(crate) fn ordinal(locale: &Locale) -> Result<Self> {
		let rules = IcuRules::try_new_ordinal(locale.clone().into())
			.map_err(|err| FormatError::locale_data("ordinal", locale, err))?;
		Ok(Self {
			rules,
			ordinal: true,
		})
	}

	/// The category of `n`. Visible fraction digits count, so `1.5` is not `one`
	/// in English.
	pub(crate) fn category(&self, n: f64) -> PluralCategory {
		if !n.is_finite() {
			return PluralCategory::Other;
		}
		// f64's Display is the shortest round-trip form and never uses an exponent.
		match n.abs().to_string().parse::<PluralOperands>() {
			Ok(operands) => self.rules.category_for(operands).into(),
			Err(_) => PluralCategory::Other,
		}
	}
}

impl fmt::Debug for PluralRules {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("PluralRules")
			.field("ordinal", &self.ordinal)
			.finish_non_exhaustive()
	}
}
