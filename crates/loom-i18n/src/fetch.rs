// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Resource fetching over HTTP and from the local filesystem.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, instrument};
use url::Url;

use crate::error::FetchError;

/// Default timeout for HTTP resource requests.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// A single resource request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchRequest {
	pub url: String,
	/// Send the fetcher's credentials along with the request.
	pub with_credentials: bool,
	pub headers: BTreeMap<String, String>,
}

impl FetchRequest {
	pub fn new(url: impl Into<String>) -> Self {
		Self {
			url: url.into(),
			..Self::default()
		}
	}
}

/// A successfully fetched JSON document.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedResource {
	pub url: String,
	pub status: u16,
	pub body: Value,
}

/// Retrieves JSON resource documents.
#[async_trait]
pub trait ResourceFetcher: Send + Sync {
	async fn fetch(&self, request: &FetchRequest) -> Result<FetchedResource, FetchError>;
}

/// Returns the User-Agent sent with HTTP resource requests.
///
/// Format: `loom-i18n/{version}`
pub fn user_agent() -> String {
	format!("loom-i18n/{}", env!("CARGO_PKG_VERSION"))
}

/// Fetches resources over HTTP(S).
#[derive(Debug, Clone)]
pub struct HttpFetcher {
	client: Client,
	auth_token: Option<String>,
}

impl HttpFetcher {
	/// Creates a fetcher with the standard User-Agent and the given timeout.
	pub fn new(timeout: Duration) -> Result<Self, FetchError> {
		let client = Client::builder()
			.user_agent(user_agent())
			.timeout(timeout)
			.build()?;
		Ok(Self::with_client(client))
	}

	/// Creates a fetcher around an existing client.
	pub fn with_client(client: Client) -> Self {
		Self {
			client,
			auth_token: None,
		}
	}

	/// Bearer token sent on requests made with credentials.
	pub fn auth_token(mut self, token: impl Into<String>) -> Self {
		self.auth_token = Some(token.into());
		self
	}
}

#[async_trait]
impl ResourceFetcher for HttpFetcher {
	#[instrument(skip(self, request), fields(url = %request.url))]
	async fn fetch(&self, request: &FetchRequest) -> Result<FetchedResource, FetchError> {
		let mut builder = self.client.get(&request.url);
		for (name, value) in &request.headers {
			builder = builder.header(name.as_str(), value.as_str());
		}
		if request.with_credentials {
			if let Some(token) = &self.auth_token {
				builder = builder.bearer_auth(token);
			}
		}

		let response = builder.send().await?;
		let status = response.status();
		if !status.is_success() {
			return Err(FetchError::Status {
				url: request.url.clone(),
				status: status.as_u16(),
			});
		}

		let bytes = response.bytes().await?;
		let body = serde_json::from_slice(&bytes).map_err(|e| FetchError::Decode {
			url: request.url.clone(),
			message: e.to_string(),
		})?;

		debug!(status = status.as_u16(), bytes = bytes.len(), "fetched resource");
		Ok(FetchedResource {
			url: request.url.clone(),
			status: status.as_u16(),
			body,
		})
	}
}

/// Reads resources from `file://` URLs or plain filesystem paths.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileFetcher;

impl FileFetcher {
	fn path_for(url: &str) -> Result<PathBuf, FetchError> {
		if url.starts_with("file:") {
			let parsed = Url::parse(url).map_err(|_| FetchError::InvalidUrl(url.to_string()))?;
			return parsed
				.to_file_path()
				.map_err(|_| FetchError::InvalidUrl(url.to_string()));
		}
		Ok(PathBuf::from(url))
	}
}

#[async_trait]
impl ResourceFetcher for FileFetcher {
	#[instrument(skip(self, request), fields(url = %request.url))]
	async fn fetch(&self, request: &FetchRequest) -> Result<FetchedResource, FetchError> {
		let path = Self::path_for(&request.url)?;
		let bytes = tokio::fs::read(&path).await.map_err(|e| FetchError::Io {
			path: path.clone(),
			message: e.to_string(),
		})?;
		let body = serde_json::from_slice(&bytes).map_err(|e| FetchError::Decode {
			url: request.url.clone(),
			message: e.to_string(),
		})?;

		debug!(path = %path.display(), bytes = bytes.len(), "read resource file");
		Ok(FetchedResource {
			url: request.url.clone(),
			status: 200,
			body,
		})
	}
}

/// Routes `http(s)://` URLs to [`HttpFetcher`] and everything else to
/// [`FileFetcher`].
#[derive(Debug, Clone)]
pub struct DefaultFetcher {
	http: HttpFetcher,
	file: FileFetcher,
}

impl DefaultFetcher {
	pub fn new(http: HttpFetcher) -> Self {
		Self {
			http,
			file: FileFetcher,
		}
	}
}

enum Route {
	Http,
	File,
}

fn route(url: &str) -> Result<Route, FetchError> {
	match Url::parse(url) {
		Ok(parsed) => match parsed.scheme() {
			"http" | "https" => Ok(Route::Http),
			"file" => Ok(Route::File),
			// A Windows drive letter parses as a one-letter scheme.
			scheme if scheme.len() == 1 => Ok(Route::File),
			_ => Err(FetchError::InvalidUrl(url.to_string())),
		},
		Err(_) => Ok(Route::File),
	}
}

#[async_trait]
impl ResourceFetcher for DefaultFetcher {
	async fn fetch(&self, request: &FetchRequest) -> Result<FetchedResource, FetchError> {
		match route(&request.url)? {
			Route::Http => self.http.fetch(request).await,
			Route::File => self.file.fetch(request).await,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;
	use std::io::Write;
	use wiremock::matchers::{header, method, path};
	use wiremock::{Mock, MockServer, ResponseTemplate};

	fn http() -> HttpFetcher {
		HttpFetcher::new(Duration::from_secs(5)).unwrap()
	}

	#[tokio::test]
	async fn test_http_fetch_returns_json_body() {
		let server = MockServer::start().await;
		Mock::given(method("GET"))
			.and(path("/locales/es.json"))
			.respond_with(ResponseTemplate::new(200).set_body_json(json!({ "hi": "hola" })))
			.expect(1)
			.mount(&server)
			.await;

		let url = format!("{}/locales/es.json", server.uri());
		let resource = http().fetch(&FetchRequest::new(&url)).await.unwrap();

		assert_eq!(resource.status, 200);
		assert_eq!(resource.url, url);
		assert_eq!(resource.body, json!({ "hi": "hola" }));
	}

	#[tokio::test]
	async fn test_http_fetch_reports_status() {
		let server = MockServer::start().await;
		Mock::given(method("GET"))
			.respond_with(ResponseTemplate::new(404))
			.mount(&server)
			.await;

		let url = format!("{}/missing.json", server.uri());
		let err = http().fetch(&FetchRequest::new(&url)).await.unwrap_err();
		assert_eq!(err, FetchError::Status { url, status: 404 });
	}

	#[tokio::test]
	async fn test_http_fetch_rejects_invalid_json() {
		let server = MockServer::start().await;
		Mock::given(method("GET"))
			.respond_with(ResponseTemplate::new(200).set_body_string("not json"))
			.mount(&server)
			.await;

		let err = http()
			.fetch(&FetchRequest::new(server.uri()))
			.await
			.unwrap_err();
		assert!(matches!(err, FetchError::Decode { .. }));
	}

	#[tokio::test]
	async fn test_http_fetch_forwards_headers() {
		let server = MockServer::start().await;
		Mock::given(method("GET"))
			.and(header("x-locale-version", "7"))
			.respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
			.expect(1)
			.mount(&server)
			.await;

		let mut request = FetchRequest::new(server.uri());
		request
			.headers
			.insert("x-locale-version".to_string(), "7".to_string());
		http().fetch(&request).await.unwrap();
	}

	#[tokio::test]
	async fn test_bearer_token_only_sent_with_credentials() {
		let server = MockServer::start().await;
		Mock::given(method("GET"))
			.and(header("authorization", "Bearer secret"))
			.respond_with(ResponseTemplate::new(200).set_body_json(json!({ "with": true })))
			.mount(&server)
			.await;
		Mock::given(method("GET"))
			.respond_with(ResponseTemplate::new(401))
			.mount(&server)
			.await;

		let fetcher = http().auth_token("secret");

		let mut request = FetchRequest::new(server.uri());
		let err = fetcher.fetch(&request).await.unwrap_err();
		assert!(matches!(err, FetchError::Status { status: 401, .. }));

		request.with_credentials = true;
		let resource = fetcher.fetch(&request).await.unwrap();
		assert_eq!(resource.body, json!({ "with": true }));
	}

	#[tokio::test]
	async fn test_file_fetch_reads_plain_path_and_file_url() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		write!(file, r#"{{ "en": {{ "hi": "hi" }} }}"#).unwrap();

		let plain = file.path().to_string_lossy().into_owned();
		let resource = FileFetcher.fetch(&FetchRequest::new(&plain)).await.unwrap();
		assert_eq!(resource.body, json!({ "en": { "hi": "hi" } }));

		let file_url = Url::from_file_path(file.path()).unwrap().to_string();
		let resource = FileFetcher.fetch(&FetchRequest::new(&file_url)).await.unwrap();
		assert_eq!(resource.body, json!({ "en": { "hi": "hi" } }));
	}

	#[tokio::test]
	async fn test_file_fetch_missing_file() {
		let dir = tempfile::tempdir().unwrap();
		let missing = dir.path().join("nope.json");
		let err = FileFetcher
			.fetch(&FetchRequest::new(missing.to_string_lossy()))
			.await
			.unwrap_err();
		assert!(matches!(err, FetchError::Io { .. }));
	}

	#[tokio::test]
	async fn test_default_fetcher_routes_by_scheme() {
		let server = MockServer::start().await;
		Mock::given(method("GET"))
			.respond_with(ResponseTemplate::new(200).set_body_json(json!({ "from": "http" })))
			.mount(&server)
			.await;

		let mut file = tempfile::NamedTempFile::new().unwrap();
		write!(file, r#"{{ "from": "file" }}"#).unwrap();

		let fetcher = DefaultFetcher::new(http());
		let resource = fetcher.fetch(&FetchRequest::new(server.uri())).await.unwrap();
		assert_eq!(resource.body, json!({ "from": "http" }));

		let resource = fetcher
			.fetch(&FetchRequest::new(file.path().to_string_lossy()))
			.await
			.unwrap();
		assert_eq!(resource.body, json!({ "from": "file" }));

		let err = fetcher
			.fetch(&FetchRequest::new("ftp://example.com/en.json"))
			.await
			.unwrap_err();
		assert!(matches!(err, FetchError::InvalidUrl(_)));
	}
}
