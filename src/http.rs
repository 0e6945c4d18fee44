//! Transport primitives for signed and unsigned provider calls.
//!
//! The broker only depends on [`HttpTransport`] and the crate-owned [`HttpRequest`] /
//! [`HttpResponse`] pair, so downstream crates can plug in any HTTP stack (or a fake one in
//! tests). The default reqwest adapter lives behind the `reqwest` feature.

// crates.io
use serde::de::DeserializeOwned;
use time::format_description::well_known::Rfc2822;
// self
use crate::{_prelude::*, error::UpstreamError};
#[cfg(feature = "reqwest")] use crate::error::ConfigError;

/// Boxed future returned by [`HttpTransport::execute`].
pub type HttpFuture<'a> =
	Pin<Box<dyn Future<Output = Result<HttpResponse, UpstreamError>> + 'a + Send>>;

/// Abstraction over HTTP stacks capable of executing a single provider request.
///
/// Implementations must not retry: OAuth 1.0a signatures embed a nonce/timestamp pair that
/// the provider may reject as a replay, so a retry is always a new, re-signed request
/// issued by the caller. A timeout must surface as [`UpstreamError::Timeout`].
pub trait HttpTransport
where
	Self: 'static + Send + Sync,
{
	/// Sends `request` and resolves with whatever status the provider returned.
	fn execute(&self, request: HttpRequest) -> HttpFuture<'_>;
}

/// HTTP methods used by the broker.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HttpMethod {
	/// `GET`
	Get,
	/// `POST`
	Post,
	/// `PUT`
	Put,
	/// `DELETE`
	Delete,
}
impl HttpMethod {
	/// Returns the canonical upper-case method name.
	pub const fn as_str(self) -> &'static str {
		match self {
			HttpMethod::Get => "GET",
			HttpMethod::Post => "POST",
			HttpMethod::Put => "PUT",
			HttpMethod::Delete => "DELETE",
		}
	}
}
impl Display for HttpMethod {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outbound request handed to an [`HttpTransport`].
#[derive(Clone)]
pub struct HttpRequest {
	/// Stable endpoint label used in errors and spans.
	pub endpoint: &'static str,
	/// HTTP method.
	pub method: HttpMethod,
	/// Absolute target URL.
	pub url: Url,
	/// Header name/value pairs.
	pub headers: Vec<(String, String)>,
	/// Optional request body.
	pub body: Option<Vec<u8>>,
}
impl HttpRequest {
	/// Creates a request without headers or body.
	pub fn new(endpoint: &'static str, method: HttpMethod, url: Url) -> Self {
		Self { endpoint, method, url, headers: Vec::new(), body: None }
	}

	/// Appends a header.
	pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.headers.push((name.into(), value.into()));

		self
	}

	/// Attaches a body together with its `Content-Type`.
	pub fn body(mut self, content_type: &str, body: impl Into<Vec<u8>>) -> Self {
		self.body = Some(body.into());

		self.header("Content-Type", content_type)
	}

	/// Returns the first header value matching `name` (case-insensitive).
	pub fn header_value(&self, name: &str) -> Option<&str> {
		find_header(&self.headers, name)
	}
}
impl Debug for HttpRequest {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		let headers = self.headers.iter().map(|(name, _)| name.as_str()).collect::<Vec<_>>();

		f.debug_struct("HttpRequest")
			.field("endpoint", &self.endpoint)
			.field("method", &self.method)
			.field("url", &self.url.path())
			.field("headers", &headers)
			.field("body_len", &self.body.as_ref().map(Vec::len))
			.finish()
	}
}

/// Provider response returned verbatim to callers.
#[derive(Clone, Debug, Default)]
pub struct HttpResponse {
	/// HTTP status code.
	pub status: u16,
	/// Response headers (names lower-cased).
	pub headers: Vec<(String, String)>,
	/// Raw body bytes.
	pub body: Vec<u8>,
}
impl HttpResponse {
	/// Creates a response with the given status and body and no headers.
	pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
		Self { status, headers: Vec::new(), body: body.into() }
	}

	/// Returns true for 2xx statuses.
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}

	/// Returns the first header value matching `name` (case-insensitive).
	pub fn header(&self, name: &str) -> Option<&str> {
		find_header(&self.headers, name)
	}

	/// Decodes the body as UTF-8, replacing invalid sequences.
	pub fn text(&self) -> String {
		String::from_utf8_lossy(&self.body).into_owned()
	}

	/// Parses a `Retry-After` header expressed in seconds or as an RFC 2822 date.
	pub fn retry_after(&self) -> Option<Duration> {
		let raw = self.header("retry-after")?.trim();

		if let Ok(secs) = raw.parse::<u32>() {
			return Some(Duration::seconds(i64::from(secs)));
		}

		if let Ok(moment) = OffsetDateTime::parse(raw, &Rfc2822) {
			let delta = moment - OffsetDateTime::now_utc();

			if delta.is_positive() {
				return Some(delta);
			}
		}

		None
	}

	/// Decodes a JSON body, reporting the failing field path on error.
	pub fn json<T>(&self, endpoint: &'static str) -> Result<T, UpstreamError>
	where
		T: DeserializeOwned,
	{
		let mut deserializer = serde_json::Deserializer::from_slice(&self.body);

		serde_path_to_error::deserialize(&mut deserializer).map_err(|e| {
			let message = format!("{} at `{}`", e.inner(), e.path());

			UpstreamError::MalformedResponse { endpoint, message }
		})
	}

	/// Converts an unexpected response into [`UpstreamError::Status`].
	pub fn into_status_error(self, endpoint: &'static str) -> UpstreamError {
		let retry_after = self.retry_after();

		UpstreamError::Status { endpoint, status: self.status, body: self.text(), retry_after }
	}

	/// Fails with [`UpstreamError::Status`] unless the status is 2xx.
	pub fn ensure_success(self, endpoint: &'static str) -> Result<Self, UpstreamError> {
		if self.is_success() { Ok(self) } else { Err(self.into_status_error(endpoint)) }
	}
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
	headers.iter().find(|(key, _)| key.eq_ignore_ascii_case(name)).map(|(_, value)| value.as_str())
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
///
/// Clients built through [`ReqwestHttpClient::with_timeout`] never follow redirects: token
/// endpoints answer directly, and a redirected signed request would carry a signature for
/// the wrong URL.
#[cfg(feature = "reqwest")]
#[derive(Clone, Default)]
pub struct ReqwestHttpClient(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
	/// Default per-request timeout.
	pub const DEFAULT_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(10);

	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}

	/// Builds a client with the given per-request timeout and redirects disabled.
	pub fn with_timeout(timeout: std::time::Duration) -> Result<Self, ConfigError> {
		let client = ReqwestClient::builder()
			.timeout(timeout)
			.redirect(reqwest::redirect::Policy::none())
			.build()?;

		Ok(Self(client))
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl HttpTransport for ReqwestHttpClient {
	fn execute(&self, request: HttpRequest) -> HttpFuture<'_> {
		let client = self.0.clone();

		Box::pin(async move {
			let endpoint = request.endpoint;
			let method = match request.method {
				HttpMethod::Get => reqwest::Method::GET,
				HttpMethod::Post => reqwest::Method::POST,
				HttpMethod::Put => reqwest::Method::PUT,
				HttpMethod::Delete => reqwest::Method::DELETE,
			};
			let mut builder = client.request(method, request.url);

			for (name, value) in request.headers {
				builder = builder.header(name, value);
			}
			if let Some(body) = request.body {
				builder = builder.body(body);
			}

			let response =
				builder.send().await.map_err(|err| map_reqwest_error(endpoint, err))?;
			let status = response.status().as_u16();
			let headers = response
				.headers()
				.iter()
				.filter_map(|(name, value)| {
					value.to_str().ok().map(|value| (name.as_str().to_owned(), value.to_owned()))
				})
				.collect();
			let body =
				response.bytes().await.map_err(|err| map_reqwest_error(endpoint, err))?.to_vec();

			Ok(HttpResponse { status, headers, body })
		})
	}
}

#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

#[cfg(feature = "reqwest")]
fn map_reqwest_error(endpoint: &'static str, err: ReqwestError) -> UpstreamError {
	if err.is_timeout() {
		UpstreamError::Timeout { endpoint }
	} else {
		UpstreamError::transport(endpoint, err)
	}
}
