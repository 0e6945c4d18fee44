//! Broker-level error types shared across flows, stores, and the catalog client.

// self
use crate::_prelude::*;

/// Broker-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical broker error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Storage-layer failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Provider-side or transport failure while talking to an upstream endpoint.
	#[error(transparent)]
	Upstream(#[from] UpstreamError),
	/// Signature input was malformed.
	#[error(transparent)]
	Signature(#[from] crate::oauth::SignatureError),

	/// Handshake token is unknown to the request-token store or its ttl elapsed.
	#[error("Request token is missing or expired; restart the handshake.")]
	ExpiredOrMissingToken,
	/// Operation requires an access credential pair but none is available.
	#[error("No access credentials are available; complete the handshake first.")]
	NotAuthenticated,
	/// A user-scoped call was given a pair whose username has not been resolved.
	#[error("Access credentials carry no username; resolve it through the identity endpoint.")]
	UnresolvedUsername,
}

/// Configuration and validation failures raised by the broker.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Required environment variable is absent or empty.
	#[error("Environment variable `{name}` is not set.")]
	MissingEnv {
		/// Variable name.
		name: &'static str,
	},
	/// Provider redirect is missing `oauth_token` or `oauth_verifier`.
	#[error("Callback is missing the `{parameter}` parameter.")]
	InvalidCallback {
		/// Missing query parameter.
		parameter: &'static str,
	},
	/// Identifier validation failed.
	#[error(transparent)]
	InvalidIdentifier(#[from] crate::auth::IdentifierError),
	/// Provider descriptor failed validation or could not build a URL.
	#[error(transparent)]
	InvalidDescriptor(#[from] crate::provider::ProviderDescriptorError),
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}

impl From<crate::provider::ProviderDescriptorError> for Error {
	fn from(e: crate::provider::ProviderDescriptorError) -> Self {
		Self::Config(e.into())
	}
}
impl From<crate::auth::IdentifierError> for Error {
	fn from(e: crate::auth::IdentifierError) -> Self {
		Self::Config(e.into())
	}
}

/// Failures observed while calling a provider endpoint.
///
/// Messages carry the endpoint label, status, and response body for diagnostics; request
/// parameters (tokens, secrets, signatures) are never included.
#[derive(Debug, ThisError)]
pub enum UpstreamError {
	/// Provider answered with a status the caller did not expect.
	#[error("The {endpoint} endpoint returned HTTP {status}: {body}.")]
	Status {
		/// Endpoint label.
		endpoint: &'static str,
		/// HTTP status code.
		status: u16,
		/// Response body, verbatim.
		body: String,
		/// Retry-After hint from upstream, if supplied.
		retry_after: Option<Duration>,
	},
	/// Configured HTTP timeout elapsed.
	#[error("Request to the {endpoint} endpoint timed out.")]
	Timeout {
		/// Endpoint label.
		endpoint: &'static str,
	},
	/// Network, TLS, or I/O failure.
	#[error("Network error occurred while calling the {endpoint} endpoint.")]
	Transport {
		/// Endpoint label.
		endpoint: &'static str,
		/// Transport-specific failure.
		#[source]
		source: BoxError,
	},
	/// Provider returned a 2xx response the broker could not interpret.
	#[error("The {endpoint} endpoint returned a malformed response: {message}.")]
	MalformedResponse {
		/// Endpoint label.
		endpoint: &'static str,
		/// Parser message.
		message: String,
	},
}
impl UpstreamError {
	/// Wraps a transport-specific network error.
	pub fn transport(
		endpoint: &'static str,
		src: impl 'static + Send + Sync + std::error::Error,
	) -> Self {
		Self::Transport { endpoint, source: Box::new(src) }
	}

	/// HTTP status code, when the failure came from a response.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::Status { status, .. } => Some(*status),
			_ => None,
		}
	}
}
