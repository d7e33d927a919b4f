// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for resource bundles and message formatting.

use thiserror::Error;

/// Errors raised while turning a JSON document into a [`crate::ResourceBundle`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BundleError {
	/// The document (or a language entry inside it) is not a JSON object.
	#[error("expected a JSON object at '{path}'")]
	NotAnObject { path: String },

	/// A message pattern is not a string.
	#[error("pattern for '{key}' in language '{language}' must be a string, found {found}")]
	InvalidPattern {
		language: String,
		key: String,
		found: &'static str,
	},
}

/// Errors raised by a message formatter, either while compiling a pattern
/// or while applying arguments to a compiled message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
	/// The pattern is malformed.
	#[error("syntax error at offset {offset}: {message}")]
	Syntax { offset: usize, message: String },

	/// The pattern references an argument that was not supplied.
	#[error("missing value for argument '{0}'")]
	MissingArgument(String),

	/// The supplied argument cannot be used with the argument's type.
	#[error("argument '{name}' must be {expected}")]
	InvalidArgument { name: String, expected: &'static str },

	/// A named format was referenced but not configured.
	#[error("unknown {kind} format '{name}'")]
	UnknownFormat { kind: String, name: String },

	/// The argument type is not understood by the formatter.
	#[error("unsupported argument type '{0}'")]
	UnsupportedType(String),

	/// Locale data for a formatter could not be loaded.
	#[error("no {kind} data for locale '{locale}': {message}")]
	LocaleData {
		kind: &'static str,
		locale: String,
		message: String,
	},
}

impl FormatError {
	pub(crate) fn syntax(offset: usize, message: impl Into<String>) -> Self {
		Self::Syntax {
			offset,
			message: message.into(),
		}
	}

	pub(crate) fn locale_data(
		kind: &'static str,
		locale: &impl std::fmt::Display,
		err: impl std::fmt::Display,
	) -> Self {
		Self::LocaleData {
			kind,
			locale: locale.to_string(),
			message: err.to_string(),
		}
	}
}

/// Result type alias for formatting operations.
pub type Result<T> = std::result::Result<T, FormatError>;
