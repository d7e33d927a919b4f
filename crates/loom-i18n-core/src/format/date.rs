// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! `{d, date, ...}` and `{t, time, ...}` arguments.

use std::fmt;

use chrono::{DateTime, Datelike, FixedOffset, Timelike};
use icu::calendar::{Date, Iso};
use icu::datetime::fieldsets::{
	self,
	enums::{DateFieldSet, TimeFieldSet},
};
use icu::datetime::input::{DateTime as IcuDateTime, Time};
use icu::datetime::options::Length;
use icu::datetime::DateTimeFormatter;
use icu::locale::Locale;
use serde_json::Value;

use crate::error::{FormatError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DateTimeKind {
	Date,
	Time,
}

impl DateTimeKind {
	fn as_str(&self) -> &'static str {
		match self {
			Self::Date => "date",
			Self::Time => "time",
		}
	}
}

enum Formatter {
	Date(DateTimeFormatter<DateFieldSet>),
	Time(DateTimeFormatter<TimeFieldSet>),
}

/// A date or time argument compiled for one locale and style.
///
/// Styles are `short`, `medium` (the default), `long` and `full`. Times are
/// rendered in the offset the instant carries; zone names are not shown.
pub(crate) struct DateTimeFormat {
	kind: DateTimeKind,
	style: &'static str,
	formatter: Formatter,
}

impl DateTimeFormat {
	pub(crate) fn try_new(locale: &Locale, kind: DateTimeKind, style: Option<&str>) -> Result<Self> {
		let (style, length) = match style {
			Some("short") => ("short", Length::Short),
			None | Some("medium") => ("medium", Length::Medium),
			Some("long") => ("long", Length::Long),
			Some("full") => ("full", Length::Long),
			Some(name) => {
				return Err(FormatError::UnknownFormat {
					kind: kind.as_str().to_string(),
					name: name.to_string(),
				})
			}
		};
		let load_error = |err| FormatError::locale_data(kind.as_str(), locale, err);

		let formatter = match kind {
			DateTimeKind::Date => {
				let field_set = if style == "full" {
					DateFieldSet::YMDE(fieldsets::YMDE::for_length(length))
				} else {
					DateFieldSet::YMD(fieldsets::YMD::for_length(length))
				};
				Formatter::Date(DateTimeFormatter::try_new(locale.clone().into(), field_set).map_err(load_error)?)
			}
			DateTimeKind::Time => {
				let field_set = match length {
					Length::Short => fieldsets::T::hm().with_length(length),
					_ => fieldsets::T::hms().with_length(length),
				};
				Formatter::Time(
					DateTimeFormatter::try_new(locale.clone().into(), TimeFieldSet::T(field_set))
						.map_err(load_error)?,
				)
			}
		};

		Ok(Self {
			kind,
			style,
			formatter,
		})
	}

	pub(crate) fn format(&self, name: &str, instant: &DateTime<FixedOffset>) -> Result<String> {
		let local = instant.naive_local();
		let out_of_range = || FormatError::InvalidArgument {
			name: name.to_string(),
			expected: "a date within the ISO calendar's range",
		};

		let date = Date::try_new_iso(local.year(), local.month() as u8, local.day() as u8)
			.map_err(|_| out_of_range())?;
		let time = Time::try_new(
			local.hour() as u8,
			local.minute() as u8,
			local.second() as u8,
			local.nanosecond().min(999_999_999),
		)
		.map_err(|_| out_of_range())?;
		let input: IcuDateTime<Iso> = IcuDateTime { date, time };

		Ok(match &self.formatter {
			Formatter::Date(formatter) => formatter.format(&input).to_string(),
			Formatter::Time(formatter) => formatter.format(&input).to_string(),
		})
	}
}

impl fmt::Debug for DateTimeFormat {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("DateTimeFormat")
			.field("kind", &self.kind)
			.field("style", &self.style)
			.finish_non_exhaustive()
	}
}

/// Interpret an argument as an instant: epoch milliseconds or RFC 3339.
pub(crate) fn parse_instant(name: &str, value: &Value) -> Result<DateTime<FixedOffset>> {
	let invalid = || FormatError::InvalidArgument {
		name: name.to_string(),
		expected: "epoch milliseconds or an RFC 3339 timestamp",
	};

	match value {
		Value::Number(n) => n
			.as_f64()
			.and_then(|ms| DateTime::from_timestamp_millis(ms as i64))
			.map(|utc| utc.fixed_offset())
			.ok_or_else(invalid),
		Value::String(s) => DateTime::parse_from_rfc3339(s.trim()).map_err(|_| invalid()),
		_ => Err(invalid()),
	}
}
