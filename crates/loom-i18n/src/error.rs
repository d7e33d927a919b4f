// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for the localization SDK.

use std::path::PathBuf;

use loom_i18n_core::BundleError;
use thiserror::Error;

/// Errors from fetching a resource file.
///
/// `Clone` because one in-flight fetch is shared by every caller that asked
/// for the same path, and each of them receives the outcome.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
	/// The HTTP request could not be completed.
	#[error("HTTP request failed: {0}")]
	Request(String),

	/// The server answered with a non-success status.
	#[error("server returned status {status} for {url}")]
	Status { url: String, status: u16 },

	/// A local resource file could not be read.
	#[error("failed to read {path}: {message}")]
	Io { path: PathBuf, message: String },

	/// The body is not valid JSON.
	#[error("invalid JSON in {url}: {message}")]
	Decode { url: String, message: String },

	/// The resource path cannot be interpreted.
	#[error("invalid resource URL: {0}")]
	InvalidUrl(String),
}

impl From<reqwest::Error> for FetchError {
	fn from(err: reqwest::Error) -> Self {
		Self::Request(err.to_string())
	}
}

/// Why a resource load failed. Only logged; listeners get no cause.
#[derive(Debug, Error)]
pub(crate) enum LoadError {
	#[error(transparent)]
	Fetch(#[from] FetchError),

	#[error("invalid resource document: {0}")]
	Document(#[from] BundleError),
}

/// Errors from loading localizer configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// The configuration file exists but could not be read.
	#[error("failed to read config file {path}: {source}")]
	FileRead {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	/// The configuration file is not valid TOML.
	#[error("TOML parse error in {path}: {source}")]
	TomlParse {
		path: PathBuf,
		#[source]
		source: toml::de::Error,
	},

	/// A value has the wrong shape.
	#[error("invalid value for {field}: {message}")]
	InvalidValue { field: String, message: String },
}

impl ConfigError {
	pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
		Self::InvalidValue {
			field: field.into(),
			message: message.into(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_status_error_message() {
		let err = FetchError::Status {
			url: "https://example.com/locales/en.json".to_string(),
			status: 404,
		};
		assert_eq!(
			err.to_string(),
			"server returned status 404 for https://example.com/locales/en.json"
		);
	}

	#[test]
	fn test_load_error_wraps_document_error() {
		let err = LoadError::from(BundleError::NotAnObject {
			path: "$".to_string(),
		});
		assert_eq!(
			err.to_string(),
			"invalid resource document: expected a JSON object at '$'"
		);
	}

	#[test]
	fn test_invalid_value_helper() {
		let err = ConfigError::invalid_value("language", "must not be empty");
		assert_eq!(err.to_string(), "invalid value for language: must not be empty");
	}
}
